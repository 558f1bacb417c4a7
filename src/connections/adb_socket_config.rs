use crate::errors::{AdbError, AdbResult};
use crate::utils::start_adb_server;
use log::{debug, error};
use std::fmt::{Display, Formatter};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

const DEFAULT_ADB_PORT: u16 = 5037;
const DEFAULT_ADB_HOST: &str = "127.0.0.1";
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

const ADB_SERVER_ADDRESS_ENV: &str = "ANDROID_ADB_SERVER_ADDRESS";
const ADB_SERVER_PORT_ENV: &str = "ANDROID_ADB_SERVER_PORT";

/// ADB server 的地址 (host + port), 构造后不再改变。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Default for Endpoint {
    fn default() -> Self {
        Endpoint {
            host: DEFAULT_ADB_HOST.to_string(),
            port: DEFAULT_ADB_PORT,
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Endpoint {
            host: addr.ip().to_string(),
            port: addr.port(),
        }
    }
}

impl Endpoint {
    pub fn new<S: Into<String>>(host: S, port: u16) -> Self {
        Endpoint {
            host: host.into(),
            port,
        }
    }

    /// 读取与官方 adb 相同的环境变量, 缺失或无法解析时使用默认值。
    pub fn from_env() -> Self {
        let mut endpoint = Endpoint::default();
        if let Ok(host) = std::env::var(ADB_SERVER_ADDRESS_ENV) {
            if !host.trim().is_empty() {
                endpoint.host = host.trim().to_string();
            }
        }
        if let Ok(port) = std::env::var(ADB_SERVER_PORT_ENV) {
            if let Ok(port) = port.trim().parse::<u16>() {
                endpoint.port = port;
            }
        }
        endpoint
    }

    pub fn resolve(&self) -> AdbResult<Vec<SocketAddr>> {
        let addrs: Vec<SocketAddr> = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| AdbError::connection_failed(format!("resolve {}: {}", self, e)))?
            .collect();
        if addrs.is_empty() {
            return Err(AdbError::connection_failed(format!(
                "{} resolved to no address",
                self
            )));
        }
        Ok(addrs)
    }
}

///
/// Adb Socket相关配置
/// endpoint: adb server 地址, 默认值 127.0.0.1:5037
/// connect_timeout: 拨号超时, 默认 3 秒
/// read_timeout / write_timeout: 读写超时, 默认不限 (track-devices 与 logcat 需要长时间阻塞)
/// auto_start_server: 拨号失败时是否尝试执行 `adb start-server` 后重试一次
#[derive(Clone, Debug)]
pub struct AdbSocketConfig {
    pub endpoint: Endpoint,
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
    pub auto_start_server: bool,
}

///
/// AdbSocketConfig 默认配置
impl Default for AdbSocketConfig {
    fn default() -> Self {
        AdbSocketConfig {
            endpoint: Endpoint::default(),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            read_timeout: None,
            write_timeout: None,
            auto_start_server: false,
        }
    }
}

impl AdbSocketConfig {
    pub fn new<T: Into<Endpoint>>(endpoint: T) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// 使用环境变量中的 server 地址
    pub fn from_env() -> Self {
        Self::new(Endpoint::from_env())
    }

    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn with_auto_start_server(mut self, enabled: bool) -> Self {
        self.auto_start_server = enabled;
        self
    }

    ///
    /// 使用配置连接到Adb Server, 不做任何重试
    pub fn create_socket(&self) -> AdbResult<TcpStream> {
        let mut last_error = None;
        for addr in self.endpoint.resolve()? {
            let attempt = match self.connect_timeout {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => return Ok(stream),
                Err(e) => last_error = Some(e),
            }
        }
        let reason = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no address".to_string());
        Err(AdbError::connection_failed(format!(
            "connect to {}: {}",
            self.endpoint, reason
        )))
    }

    /// 安全尝试连接到ADB服务器。
    ///
    /// # 返回值
    /// 成功时返回已设置好读写超时的 `TcpStream`;
    /// 失败时返回 `ConnectionFailed`。若开启了 `auto_start_server`, 会先启动 adb server 再重试一次。
    pub fn safe_connect(&self) -> AdbResult<TcpStream> {
        let stream = match self.create_socket() {
            Ok(stream) => stream,
            Err(e) if self.auto_start_server => {
                error!(
                    "Connect To Adb Failed, Try To Start Adb Server >>> {:#?}",
                    e
                );
                start_adb_server()?;
                self.create_socket()?
            }
            Err(e) => return Err(e),
        };
        stream.set_read_timeout(self.read_timeout)?;
        stream.set_write_timeout(self.write_timeout)?;
        stream.set_nodelay(true)?;
        debug!("Connected to adb server {}", self.endpoint);
        Ok(stream)
    }
}
