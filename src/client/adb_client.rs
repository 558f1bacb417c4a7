use crate::beans::{parse_device_list, DeviceEntry, DeviceFilter};
use crate::client::adb_connection::AdbConnection;
use crate::client::adb_device::AdbDevice;
use crate::client::device_tracker::DeviceTracker;
use crate::client::transport::{Transport, Transporter};
use crate::connections::adb_socket_config::AdbSocketConfig;
use crate::errors::{AdbError, AdbResult};
use crate::protocols::AdbProtocol;
use log::{debug, info};
use std::thread;

/// ADB server 客户端。
///
/// 只保存配置, 每个操作自己拨号、自己关闭连接, 可以在多个线程间共享。
#[derive(Debug, Clone, Default)]
pub struct AdbClient {
    pub config: AdbSocketConfig,
    pub transport: Transport,
}

impl AdbClient {
    pub fn new(config: AdbSocketConfig) -> Self {
        AdbClient {
            config,
            transport: Transport::Any,
        }
    }

    /// 指定无序列号时的传输通道: Any / Usb / Emulator
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// 发送一个 host 请求, 读取一个字符串块后关闭连接
    fn host_query(&self, command: &str) -> AdbResult<String> {
        let mut conn = self.dial()?;
        conn.send_cmd_then_check_okay(command)?;
        let resp = conn.read_string_block()?;
        conn.close()?;
        Ok(resp)
    }

    /// 获取 ADB 服务器的版本号。
    ///
    /// # 返回值
    /// 返回十进制的版本号，如果获取失败，则返回错误。
    pub fn server_version(&self) -> AdbResult<u32> {
        let version = self.host_query("host:version")?;
        u32::from_str_radix(version.trim(), 16)
            .map_err(|_| AdbError::protocol_error(format!("invalid version {:?}", version)))
    }

    /// 关闭 ADB 服务器。
    pub fn server_kill(&self) -> AdbResult<()> {
        let mut conn = self.dial()?;
        conn.send_cmd_then_check_okay("host:kill")?;
        conn.close()
    }

    /// 连接到指定的 ADB 设备。
    ///
    /// # 参数
    /// - `addr`: 设备地址, 例如 `192.168.1.2:5555`。
    ///
    /// # 返回值
    /// 返回 server 给出的结果描述。
    pub fn connect_device(&self, addr: &str) -> AdbResult<String> {
        self.host_query(&format!("host:connect:{}", addr))
    }

    /// 断开与指定 ADB 设备的连接。
    pub fn disconnect_device(&self, addr: &str) -> AdbResult<String> {
        if addr.is_empty() {
            return Err(AdbError::protocol_error("disconnect address is empty"));
        }
        self.host_query(&format!("host:disconnect:{}", addr))
    }

    /// `host:devices` 的原始条目, 保持 server 返回的顺序
    pub fn device_entries(&self) -> AdbResult<Vec<DeviceEntry>> {
        let payload = self.host_query("host:devices")?;
        let entries = parse_device_list(&payload);
        debug!("Device entries >>> {:#?}", entries);
        Ok(entries)
    }

    /// 列出并解析所有设备, 返回满足 `filter` 的设备。
    ///
    /// 每台设备在独立线程中解析属性, 全部完成后才过滤;
    /// 结果保持发现顺序。单台设备解析失败不影响其它设备, 失败信息见 `AdbDevice::partial_errors`。
    pub fn list_devices(&self, filter: &DeviceFilter) -> AdbResult<Vec<AdbDevice>> {
        let mut devices = self.resolve_devices(self.device_entries()?);
        devices.retain(|device| device.matches(filter));
        info!("{} device(s) matched filter", devices.len());
        Ok(devices)
    }

    /// 并发解析一组设备条目
    pub fn resolve_devices(&self, entries: Vec<DeviceEntry>) -> Vec<AdbDevice> {
        let mut devices: Vec<AdbDevice> = entries
            .into_iter()
            .map(|entry| AdbDevice::from_entry(entry, self.config.clone()))
            .collect();
        thread::scope(|scope| {
            for device in devices.iter_mut() {
                scope.spawn(move || device.update());
            }
        });
        devices
    }

    /// 按序列号查找设备, 序列号为空时返回全部
    pub fn find_devices<S: AsRef<str>>(&self, serials: &[S]) -> AdbResult<Vec<AdbDevice>> {
        let filter = DeviceFilter::all().with_serials(serials.iter().map(|s| s.as_ref()));
        self.list_devices(&filter)
    }

    pub fn find_device(&self, serial: &str) -> AdbResult<AdbDevice> {
        self.find_devices(&[serial])?
            .into_iter()
            .next()
            .ok_or_else(|| AdbError::device_not_found(serial))
    }

    /// 不解析属性, 直接构造指定序列号的设备
    pub fn device(&self, serial: &str) -> AdbDevice {
        AdbDevice::new(serial, self.config.clone())
    }

    /// 订阅 `host:track-devices`, 每次设备变化产出一份完整快照
    pub fn track_devices(&self) -> AdbResult<DeviceTracker> {
        DeviceTracker::open(self.dial()?)
    }
}

impl Transporter for AdbClient {
    fn dial(&self) -> AdbResult<AdbConnection> {
        AdbConnection::dial(&self.config)
    }

    fn select_transport(&self, conn: &mut AdbConnection) -> AdbResult<()> {
        conn.select_transport(&self.transport)
    }
}
