use crate::beans::{
    parse_properties, DensityBucket, DeviceEntry, DeviceFilter, DeviceType, FilterTarget,
    SdkVersion,
};
use crate::client::adb_connection::AdbConnection;
use crate::client::transport::{Transport, Transporter};
use crate::connections::adb_socket_config::AdbSocketConfig;
use crate::errors::{AdbError, AdbResult};
use crate::protocols::AdbProtocol;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::thread;

const PROP_MANUFACTURER: &str = "ro.product.manufacturer";
const PROP_MODEL: &str = "ro.product.model";
const PROP_VERSION: &str = "ro.build.version.release";
const PROP_SDK: &str = "ro.build.version.sdk";
const PROP_DENSITY: &str = "ro.sf.lcd_density";
const PROP_DUMP: &str = "getprop";
const PROP_SCREEN_SIZE: &str = "wm size";

const KEYCODE_POWER: u32 = 26;
const KEYCODE_MENU: u32 = 82;

static SCREEN_SIZE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)x(\d+)").expect("screen size regex"));

/// AdbDevice结构体定义了一个ADB设备的基本信息。
///
/// 由设备列表中的一行创建, 在 `update` 中解析一次属性, 之后对调用方只读。
/// 两个序列号相同的设备视为同一设备。
#[derive(Debug, Clone)]
pub struct AdbDevice {
    pub serial: String,
    pub state: String,
    pub manufacturer: String,
    pub model: String,
    pub version: String,
    pub sdk: SdkVersion,
    pub density: DensityBucket,
    pub width: u32,
    pub height: u32,
    pub properties: HashMap<String, String>,
    failures: Vec<(String, String)>,
    config: AdbSocketConfig,
}

impl AdbDevice {
    /// 创建一个新的ADB设备实例, 属性均为空。
    ///
    /// # 参数
    /// - `serial`: 设备的序列号，作为一个唯一标识符。
    /// - `config`: 连接 ADB server 使用的配置。
    pub fn new<S: Into<String>>(serial: S, config: AdbSocketConfig) -> Self {
        AdbDevice {
            serial: serial.into(),
            state: String::new(),
            manufacturer: String::new(),
            model: String::new(),
            version: String::new(),
            sdk: SdkVersion::default(),
            density: DensityBucket::default(),
            width: 0,
            height: 0,
            properties: HashMap::new(),
            failures: Vec::new(),
            config,
        }
    }

    pub(crate) fn from_entry(entry: DeviceEntry, config: AdbSocketConfig) -> Self {
        let mut device = AdbDevice::new(entry.serial, config);
        device.state = entry.state;
        device
    }

    /// 并发解析设备属性。
    ///
    /// 先等待设备就绪, 之后每个属性在自己的线程里走一条新连接, 全部返回后才写回设备。
    /// 单个属性失败时该字段保持空值, 失败原因记录在 `partial_errors` 中。
    pub fn update(&mut self) {
        if let Err(e) = self.wait_for_device() {
            warn!("Wait for {} failed >>> {}", self.serial, e);
        }
        let keys = [
            PROP_MANUFACTURER,
            PROP_MODEL,
            PROP_VERSION,
            PROP_SDK,
            PROP_DENSITY,
            PROP_DUMP,
            PROP_SCREEN_SIZE,
        ];
        let this = &*self;
        let results: Vec<(&str, AdbResult<String>)> = thread::scope(|scope| {
            let handles: Vec<_> = keys
                .iter()
                .map(|key| {
                    let key = *key;
                    (key, scope.spawn(move || this.fetch_property(key)))
                })
                .collect();
            handles
                .into_iter()
                .map(|(key, handle)| {
                    let result = handle.join().unwrap_or_else(|_| {
                        Err(AdbError::unknown(format!("resolver for {} panicked", key)))
                    });
                    (key, result)
                })
                .collect()
        });

        self.failures.clear();
        let mut values = HashMap::new();
        for (key, result) in results {
            match result {
                Ok(value) => {
                    values.insert(key, value);
                }
                Err(e) => {
                    warn!("Resolve {} on {} failed >>> {}", key, self.serial, e);
                    self.failures.push((key.to_string(), e.to_string()));
                }
            }
        }
        let mut take = |key: &str| values.remove(key).unwrap_or_default();

        self.manufacturer = take(PROP_MANUFACTURER);
        self.model = take(PROP_MODEL);
        self.version = take(PROP_VERSION);
        self.sdk = SdkVersion(take(PROP_SDK).trim().parse().unwrap_or_default());
        self.density = DensityBucket(take(PROP_DENSITY).trim().parse().unwrap_or_default());
        self.properties = parse_properties(take(PROP_DUMP).lines());
        let (width, height) = parse_screen_size(&take(PROP_SCREEN_SIZE));
        self.width = width;
        self.height = height;
        info!("Resolved device {}", self);
    }

    fn fetch_property(&self, key: &str) -> AdbResult<String> {
        let output = match key {
            PROP_DUMP | PROP_SCREEN_SIZE => self.shell_sync(key)?,
            _ => self.shell_sync(&["getprop", key])?,
        };
        Ok(output.trim().to_string())
    }

    /// 解析过程中记录的属性失败
    pub fn partial_errors(&self) -> Vec<AdbError> {
        self.failures
            .iter()
            .map(|(property, reason)| AdbError::partial_resolution(&self.serial, property, reason))
            .collect()
    }

    pub fn is_partially_resolved(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn get_prop(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn device_type(&self) -> DeviceType {
        DeviceType::classify(self.width, self.height, self.density)
    }

    pub fn matches(&self, filter: &DeviceFilter) -> bool {
        filter.matches(self)
    }

    /// 通过 `host-serial:<serial>:get-state` 查询设备状态
    pub fn get_state(&self) -> AdbResult<String> {
        let mut conn = self.dial()?;
        let command = format!("host-serial:{}:get-state", self.serial);
        conn.send_cmd_then_check_okay(&command)?;
        let state = conn.read_string_block()?;
        conn.close()?;
        Ok(state)
    }

    /// 阻塞直到设备进入 `device` 状态。
    ///
    /// server 接受请求时回复一次 OKAY, 设备就绪后再回复一次。
    pub fn wait_for_device(&self) -> AdbResult<()> {
        let mut conn = self.dial()?;
        let command = format!("host-serial:{}:wait-for-any-device", self.serial);
        conn.send_cmd_then_check_okay(&command)?;
        conn.check_okay(&command)?;
        conn.close()
    }

    /// 是否安装了第三方应用 `package`
    pub fn has_package(&self, package: &str) -> AdbResult<bool> {
        self.find_value(package, ["pm", "list", "packages", "-3"])
    }

    pub fn send_key(&self, keycode: u32) -> AdbResult<()> {
        let code = keycode.to_string();
        self.shell_sync(&["input", "keyevent", code.as_str()])?;
        Ok(())
    }

    /// 锁屏显示时发送 MENU 键解锁
    pub fn unlock(&self) -> AdbResult<()> {
        if self.find_value("mLockScreenShown true", ["dumpsys", "activity"])? {
            self.send_key(KEYCODE_MENU)?;
        }
        Ok(())
    }

    /// 屏幕状态与期望不一致时按电源键
    pub fn set_screen_on(&self, on: bool) -> AdbResult<()> {
        let screen_off = self.find_value("mScreenOn=false", ["dumpsys", "input_method"])?;
        if screen_off == on {
            self.send_key(KEYCODE_POWER)?;
        }
        Ok(())
    }

    /// 执行 shell 命令, 任一输出行包含 `value` 即返回 true
    fn find_value<const N: usize>(&self, value: &str, command: [&str; N]) -> AdbResult<bool> {
        let stream = self.shell(&command)?;
        for line in stream {
            if line?.contains(value) {
                debug!("Found {:?} on {}", value, self.serial);
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn parse_screen_size(output: &str) -> (u32, u32) {
    // 有 Override size 时取最后一行
    output
        .lines()
        .rev()
        .find_map(|line| {
            let captures = SCREEN_SIZE.captures(line)?;
            Some((captures[1].parse().ok()?, captures[2].parse().ok()?))
        })
        .unwrap_or((0, 0))
}

impl Transporter for AdbDevice {
    fn dial(&self) -> AdbResult<AdbConnection> {
        AdbConnection::dial(&self.config)
    }

    fn select_transport(&self, conn: &mut AdbConnection) -> AdbResult<()> {
        conn.select_transport(&Transport::Serial(self.serial.clone()))
    }
}

impl FilterTarget for AdbDevice {
    fn serial(&self) -> &str {
        &self.serial
    }

    fn sdk(&self) -> SdkVersion {
        self.sdk
    }

    fn density(&self) -> DensityBucket {
        self.density
    }
}

impl PartialEq for AdbDevice {
    fn eq(&self, other: &Self) -> bool {
        self.serial == other.serial
    }
}

impl Eq for AdbDevice {}

impl Display for AdbDevice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\t{} {}\t[{} ({}) {} ]",
            self.serial,
            self.manufacturer,
            self.model,
            self.version,
            self.sdk.name(),
            self.device_type()
        )
    }
}
