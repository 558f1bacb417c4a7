use std::fmt::{Display, Formatter};

#[cfg(feature = "blocking")]
use crate::beans::AdbCommand;
#[cfg(feature = "blocking")]
use crate::client::adb_connection::AdbConnection;
#[cfg(feature = "blocking")]
use crate::client::shell::ShellStream;
#[cfg(feature = "blocking")]
use crate::errors::AdbResult;

/// 每个新连接都处于 host 上下文, 需要先告诉 server 后续请求发往哪台设备。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Transport {
    #[default]
    Any,
    Usb,
    Emulator,
    Serial(String),
}

impl Transport {
    pub fn command(&self) -> String {
        match self {
            Transport::Any => "host:transport-any".to_string(),
            Transport::Usb => "host:transport-usb".to_string(),
            Transport::Emulator => "host:transport-local".to_string(),
            Transport::Serial(serial) => format!("host:transport:{}", serial),
        }
    }
}

impl Display for Transport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Any => f.write_str("any"),
            Transport::Usb => f.write_str("usb"),
            Transport::Emulator => f.write_str("emulator"),
            Transport::Serial(serial) => f.write_str(serial),
        }
    }
}

/// 能拨号并选择传输通道的对象: `AdbClient` (Any/Usb/Emulator) 与 `AdbDevice` (Serial)。
#[cfg(feature = "blocking")]
pub trait Transporter {
    /// 建立一个新的、尚未选择设备的连接
    fn dial(&self) -> AdbResult<AdbConnection>;

    /// 在已有连接上发送传输选择请求并校验 OKAY
    fn select_transport(&self, conn: &mut AdbConnection) -> AdbResult<()>;

    /// 拨号并选择传输通道, 失败时连接随之关闭
    fn open_transport(&self) -> AdbResult<AdbConnection> {
        let mut conn = self.dial()?;
        self.select_transport(&mut conn)?;
        Ok(conn)
    }

    /// 执行 `shell:<args>`, 返回逐行读取的流
    fn shell<'a, T: Into<AdbCommand<'a>>>(&self, command: T) -> AdbResult<ShellStream>
    where
        Self: Sized,
    {
        let command = format!("shell:{}", command.into().get_command());
        ShellStream::open(self.open_transport()?, &command)
    }

    /// 执行 `log:<args>`, 与 `shell` 相同只是服务名不同
    fn log<'a, T: Into<AdbCommand<'a>>>(&self, command: T) -> AdbResult<ShellStream>
    where
        Self: Sized,
    {
        let command = format!("log:{}", command.into().get_command());
        ShellStream::open(self.open_transport()?, &command)
    }

    /// 阻塞执行 shell 命令, 按顺序用 `\n` 拼接所有输出行
    fn shell_sync<'a, T: Into<AdbCommand<'a>>>(&self, command: T) -> AdbResult<String>
    where
        Self: Sized,
    {
        self.shell(command)?.collect_output()
    }
}
