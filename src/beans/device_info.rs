use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static PROPERTY_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(.*)\]: \[(.*)\]").expect("property regex"));

/// `host:devices` 返回的一行: `<serial>\t<state>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    pub serial: String,
    pub state: String,
}

impl DeviceEntry {
    pub fn new<S1: Into<String>, S2: Into<String>>(serial: S1, state: S2) -> DeviceEntry {
        DeviceEntry {
            serial: serial.into(),
            state: state.into(),
        }
    }

    pub fn is_online(&self) -> bool {
        self.state == "device"
    }
}

/// 解析设备列表负载。
///
/// 空行与不含 tab 的行 (例如 `adb devices` 的表头) 会被丢弃, 保留原始顺序。
pub fn parse_device_list(payload: &str) -> Vec<DeviceEntry> {
    payload
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let (serial, state) = line.split_once('\t')?;
            let serial = serial.trim();
            if serial.is_empty() {
                return None;
            }
            Some(DeviceEntry::new(serial, state.trim()))
        })
        .collect()
}

/// 解析一行 `[key]: [value]`, 格式不对返回 None
pub fn parse_property_line(line: &str) -> Option<(String, String)> {
    let captures = PROPERTY_LINE.captures(line)?;
    Some((captures[1].to_string(), captures[2].to_string()))
}

/// 解析完整的 getprop 输出, 无法识别的行直接忽略
pub fn parse_properties<'a, I>(lines: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = &'a str>,
{
    lines.into_iter().filter_map(parse_property_line).collect()
}
