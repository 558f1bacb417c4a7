use std::fmt;
use thiserror::Error;

/// 与 ADB server 交互时的错误分类
#[derive(Error, Debug)]
pub enum AdbError {
    /// 无法连接到 ADB server (拨号失败)
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    /// 按序列号查找时没有匹配的设备
    #[error("Device not found: {serial}")]
    DeviceNotFound { serial: String },

    /// 协议错误: 状态码不对, 长度字段无法解析, 连接提前关闭
    #[error("Protocol error: {message}")]
    ProtocolError { message: String },

    /// 未指定序列号且存在多个候选设备
    #[error("More than one device/emulator, specify a serial: {message}")]
    AmbiguousTarget { message: String },

    /// 单个设备属性解析失败, 记录在设备上, 不影响其它设备
    #[error("Failed to resolve {property} on {serial}: {reason}")]
    PartialResolution {
        serial: String,
        property: String,
        reason: String,
    },

    /// sync 子协议返回 FAIL
    #[error("Sync failed on {path}: {message}")]
    SyncFailed { path: String, message: String },

    /// 拨号或读写超过配置的期限
    #[error("Operation timed out: {operation}")]
    Timeout { operation: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Invalid number: {0}")]
    ParseInt(#[from] std::num::ParseIntError),

    /// 本地文件修改时间早于 UNIX 纪元
    #[error("Invalid file time: {0}")]
    SystemTime(#[from] std::time::SystemTimeError),

    /// 启动 adb server 等外部步骤的错误
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),

    #[error("Unknown error: {message}")]
    Unknown { message: String },
}

pub type AdbResult<T> = Result<T, AdbError>;

impl AdbError {
    pub fn from_display<E: fmt::Display>(err: E) -> Self {
        AdbError::Unknown {
            message: err.to_string(),
        }
    }

    pub fn connection_failed<S: Into<String>>(message: S) -> Self {
        AdbError::ConnectionFailed {
            message: message.into(),
        }
    }

    pub fn device_not_found<S: Into<String>>(serial: S) -> Self {
        AdbError::DeviceNotFound {
            serial: serial.into(),
        }
    }

    pub fn protocol_error<S: Into<String>>(message: S) -> Self {
        AdbError::ProtocolError {
            message: message.into(),
        }
    }

    pub fn ambiguous_target<S: Into<String>>(message: S) -> Self {
        AdbError::AmbiguousTarget {
            message: message.into(),
        }
    }

    pub fn partial_resolution<S1, S2, S3>(serial: S1, property: S2, reason: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        AdbError::PartialResolution {
            serial: serial.into(),
            property: property.into(),
            reason: reason.into(),
        }
    }

    pub fn sync_failed<S1: Into<String>, S2: Into<String>>(path: S1, message: S2) -> Self {
        AdbError::SyncFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn timeout<S: Into<String>>(operation: S) -> Self {
        AdbError::Timeout {
            operation: operation.into(),
        }
    }

    pub fn unknown<S: Into<String>>(message: S) -> Self {
        AdbError::Unknown {
            message: message.into(),
        }
    }

    /// 将底层IO错误按 ADB 语义归类
    ///
    /// 提前 EOF 视为协议错误, 读写超时视为超时错误, 其余保持为 IO 错误。
    pub fn from_io<S: Into<String>>(err: std::io::Error, operation: S) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => AdbError::protocol_error(format!(
                "connection closed while {}",
                operation.into()
            )),
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                AdbError::timeout(operation)
            }
            _ => AdbError::Io(err),
        }
    }

    /// 重新拨号后可能成功的错误
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AdbError::ConnectionFailed { .. } | AdbError::Timeout { .. } | AdbError::Io(_)
        )
    }

    /// 重试也不会改变结果的错误
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AdbError::DeviceNotFound { .. }
                | AdbError::AmbiguousTarget { .. }
        )
    }

    pub fn is_ambiguous_target(&self) -> bool {
        matches!(self, AdbError::AmbiguousTarget { .. })
    }

    /// 稳定的错误码, 便于日志与测试断言
    pub fn error_code(&self) -> &'static str {
        match self {
            AdbError::ConnectionFailed { .. } => "CONNECTION_FAILED",
            AdbError::DeviceNotFound { .. } => "DEVICE_NOT_FOUND",
            AdbError::ProtocolError { .. } => "PROTOCOL_ERROR",
            AdbError::AmbiguousTarget { .. } => "AMBIGUOUS_TARGET",
            AdbError::PartialResolution { .. } => "PARTIAL_RESOLUTION",
            AdbError::SyncFailed { .. } => "SYNC_FAILED",
            AdbError::Timeout { .. } => "TIMEOUT",
            AdbError::Io(_) => "IO_ERROR",
            AdbError::Utf8(_) => "UTF8_ERROR",
            AdbError::ParseInt(_) => "PARSE_INT_ERROR",
            AdbError::SystemTime(_) => "SYSTEM_TIME_ERROR",
            AdbError::Anyhow(_) => "ANYHOW_ERROR",
            AdbError::Unknown { .. } => "UNKNOWN_ERROR",
        }
    }
}

/// 把 anyhow / io 结果转换为 `AdbResult`
pub trait AdbResultExt<T> {
    fn to_adb_error(self) -> AdbResult<T>;

    /// 转换时附加上下文
    fn with_adb_context<F>(self, f: F) -> AdbResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> AdbResultExt<T> for anyhow::Result<T> {
    fn to_adb_error(self) -> AdbResult<T> {
        self.map_err(AdbError::Anyhow)
    }

    fn with_adb_context<F>(self, f: F) -> AdbResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AdbError::Anyhow(e.context(f())))
    }
}

impl<T> AdbResultExt<T> for Result<T, std::io::Error> {
    fn to_adb_error(self) -> AdbResult<T> {
        self.map_err(AdbError::Io)
    }

    fn with_adb_context<F>(self, f: F) -> AdbResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AdbError::Io(std::io::Error::new(e.kind(), format!("{}: {}", f(), e))))
    }
}
