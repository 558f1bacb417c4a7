#![allow(dead_code)]

use adbhost::{AdbClient, AdbSocketConfig, Endpoint};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub const LIBDVM_WARNING: &str = "WARNING: linker: libdvm.so has text relocations. This is wasting memory and is a security risk. Please fix.";

/// 进程内的假 ADB server, 每个连接一个线程, 由 handler 决定如何应答
pub struct MockServer {
    pub port: u16,
}

impl MockServer {
    pub fn start<F>(handler: F) -> MockServer
    where
        F: Fn(Session) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handler = Arc::new(handler);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let handler = handler.clone();
                thread::spawn(move || handler(Session { stream }));
            }
        });
        MockServer { port }
    }

    pub fn config(&self) -> AdbSocketConfig {
        AdbSocketConfig::new(Endpoint::new("127.0.0.1", self.port))
    }

    pub fn client(&self) -> AdbClient {
        AdbClient::new(self.config())
    }
}

pub struct Session {
    pub stream: TcpStream,
}

impl Session {
    /// 读取一个 `<hex4><cmd>` 请求, 对端关闭时返回 None
    pub fn read_request(&mut self) -> Option<String> {
        let mut size = [0u8; 4];
        self.stream.read_exact(&mut size).ok()?;
        let size = usize::from_str_radix(std::str::from_utf8(&size).ok()?, 16).ok()?;
        let mut body = vec![0u8; size];
        self.stream.read_exact(&mut body).ok()?;
        String::from_utf8(body).ok()
    }

    pub fn okay(&mut self) {
        let _ = self.stream.write_all(b"OKAY");
    }

    pub fn fail(&mut self, reason: &str) {
        let _ = self.stream.write_all(b"FAIL");
        self.block(reason);
    }

    pub fn block(&mut self, payload: &str) {
        let _ = self
            .stream
            .write_all(format!("{:04x}{}", payload.len(), payload).as_bytes());
    }

    pub fn raw(&mut self, data: &[u8]) {
        let _ = self.stream.write_all(data);
    }

    pub fn read_bytes(&mut self, n: usize) -> Option<Vec<u8>> {
        let mut data = vec![0u8; n];
        self.stream.read_exact(&mut data).ok()?;
        Some(data)
    }

    pub fn read_le_u32(&mut self) -> Option<u32> {
        let data = self.read_bytes(4)?;
        Some(u32::from_le_bytes(data.try_into().ok()?))
    }

    /// 读取一个 sync 请求: `<tag><le u32 len><payload>`
    pub fn read_sync_request(&mut self) -> Option<(String, Vec<u8>)> {
        let tag = String::from_utf8(self.read_bytes(4)?).ok()?;
        let length = self.read_le_u32()? as usize;
        Some((tag, self.read_bytes(length)?))
    }

    pub fn sync_okay(&mut self) {
        self.raw(b"OKAY\0\0\0\0");
    }

    pub fn sync_fail(&mut self, message: &str) {
        let mut data = b"FAIL".to_vec();
        data.extend_from_slice(&(message.len() as u32).to_le_bytes());
        data.extend_from_slice(message.as_bytes());
        self.raw(&data);
    }
}

/// 假设备: 属性值、屏幕尺寸、响应延迟
#[derive(Clone, Debug)]
pub struct FakeDevice {
    pub serial: String,
    pub model: String,
    pub sdk: u32,
    pub density: u32,
    pub size: (u32, u32),
    pub delay: Duration,
    pub broken_model: bool,
}

impl FakeDevice {
    pub fn new(serial: &str, model: &str, sdk: u32, density: u32) -> FakeDevice {
        FakeDevice {
            serial: serial.to_string(),
            model: model.to_string(),
            sdk,
            density,
            size: (1080, 1920),
            delay: Duration::ZERO,
            broken_model: false,
        }
    }

    pub fn with_delay(mut self, millis: u64) -> FakeDevice {
        self.delay = Duration::from_millis(millis);
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> FakeDevice {
        self.size = (width, height);
        self
    }

    pub fn with_broken_model(mut self) -> FakeDevice {
        self.broken_model = true;
        self
    }

    fn props(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ro.product.manufacturer", "Google".to_string()),
            ("ro.product.model", self.model.clone()),
            ("ro.build.version.release", format!("{}.0", self.sdk.saturating_sub(20))),
            ("ro.build.version.sdk", self.sdk.to_string()),
            ("ro.sf.lcd_density", self.density.to_string()),
        ]
    }
}

/// 每个请求的记录: (设备序列号或 "host", 请求)
pub type RequestLog = Arc<Mutex<Vec<(String, String)>>>;

/// 模拟一组设备的 server, 支持 host:devices / host:version / transport / shell
pub fn fleet(devices: Vec<FakeDevice>) -> (MockServer, RequestLog) {
    let log: RequestLog = Arc::new(Mutex::new(Vec::new()));
    let requests = log.clone();
    let by_serial: HashMap<String, FakeDevice> = devices
        .iter()
        .map(|d| (d.serial.clone(), d.clone()))
        .collect();
    let server = MockServer::start(move |mut session| {
        let Some(request) = session.read_request() else { return };
        requests
            .lock()
            .unwrap()
            .push(("host".to_string(), request.clone()));
        let target = if request == "host:devices" {
            session.okay();
            let list: String = devices
                .iter()
                .map(|d| format!("{}\tdevice\n", d.serial))
                .collect();
            session.block(&list);
            return;
        } else if request == "host:version" {
            session.okay();
            session.block("0029");
            return;
        } else if request == "host:kill" {
            session.okay();
            return;
        } else if let Some(addr) = request.strip_prefix("host:connect:") {
            session.okay();
            session.block(&format!("connected to {}", addr));
            return;
        } else if let Some(addr) = request.strip_prefix("host:disconnect:") {
            session.okay();
            session.block(&format!("disconnected {}", addr));
            return;
        } else if let Some(rest) = request.strip_prefix("host-serial:") {
            let Some((serial, service)) = rest.rsplit_once(':') else {
                session.fail("unknown host service");
                return;
            };
            if !by_serial.contains_key(serial) {
                session.fail(&format!("device '{}' not found", serial));
                return;
            }
            match service {
                "get-state" => {
                    session.okay();
                    session.block("device");
                }
                "wait-for-any-device" => {
                    session.okay();
                    session.okay();
                }
                _ => session.fail("unknown host service"),
            }
            return;
        } else if request == "host:transport-any" {
            if devices.len() > 1 {
                session.fail("more than one device/emulator");
                return;
            }
            match devices.first() {
                Some(device) => device.clone(),
                None => {
                    session.fail("no devices/emulators found");
                    return;
                }
            }
        } else if let Some(serial) = request.strip_prefix("host:transport:") {
            match by_serial.get(serial) {
                Some(device) => device.clone(),
                None => {
                    session.fail(&format!("device '{}' not found", serial));
                    return;
                }
            }
        } else {
            session.fail("unknown host service");
            return;
        };
        session.okay();
        let Some(command) = session.read_request() else { return };
        requests
            .lock()
            .unwrap()
            .push((target.serial.clone(), command.clone()));
        serve_device_command(&mut session, &target, &command);
    });
    (server, log)
}

fn serve_device_command(session: &mut Session, device: &FakeDevice, command: &str) {
    thread::sleep(device.delay);
    if let Some(key) = command.strip_prefix("shell:getprop ") {
        if device.broken_model && key == "ro.product.model" {
            session.fail("device offline");
            return;
        }
        session.okay();
        let value = device
            .props()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
            .unwrap_or_default();
        session.raw(format!("{}\r\n", value).as_bytes());
        return;
    }
    session.okay();
    let output = match command {
        "shell:getprop" => device
            .props()
            .iter()
            .map(|(k, v)| format!("[{}]: [{}]\r\n", k, v))
            .collect::<String>()
            + "[persist.sys.locale]: [en-US]\r\nnot a property\r\n",
        "shell:wm size" => format!("Physical size: {}x{}\r\n", device.size.0, device.size.1),
        "shell:dumpsys activity" => "  mLockScreenShown true\r\n".to_string(),
        "shell:dumpsys input_method" => "  mScreenOn=false\r\n".to_string(),
        "shell:pm list packages -3" => "package:com.example.app\r\n".to_string(),
        "shell:echo noisy" | "log:main" => format!(
            "{}\r\nhello\r\nWARNING: kept\r\n{}\r\nworld\r\n",
            LIBDVM_WARNING, LIBDVM_WARNING
        ),
        _ => String::new(),
    };
    session.raw(output.as_bytes());
}
