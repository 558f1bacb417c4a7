use crate::beans::{parse_device_list, AdbCommand, DeviceEntry};
use crate::client::transport::Transport;
use crate::connections::adb_socket_config::AdbSocketConfig;
use crate::errors::{AdbError, AdbResult};
use crate::protocols::protocol_logic::join_output_lines;
use crate::protocols::AsyncAdbProtocol;
use async_stream::try_stream;
use futures_core::Stream;
use log::debug;
use tokio::net::TcpStream;

/// `AdbClient` 的 tokio 版本, 覆盖设备列表、track-devices 与 shell。
#[derive(Debug, Clone, Default)]
pub struct AsyncAdbClient {
    pub config: AdbSocketConfig,
}

impl AsyncAdbClient {
    pub fn new(config: AdbSocketConfig) -> Self {
        AsyncAdbClient { config }
    }

    async fn dial(&self) -> AdbResult<TcpStream> {
        let endpoint = &self.config.endpoint;
        let connect = TcpStream::connect((endpoint.host.as_str(), endpoint.port));
        let stream = match self.config.connect_timeout {
            Some(timeout) => tokio::time::timeout(timeout, connect)
                .await
                .map_err(|_| AdbError::timeout(format!("connect to {}", endpoint)))?,
            None => connect.await,
        }
        .map_err(|e| AdbError::connection_failed(format!("connect to {}: {}", endpoint, e)))?;
        stream.set_nodelay(true)?;
        debug!("Connected to adb server {}", endpoint);
        Ok(stream)
    }

    async fn host_query(&self, command: &str) -> AdbResult<String> {
        let mut stream = self.dial().await?;
        stream.send_cmd_then_check_okay(command).await?;
        stream.read_string_block().await
    }

    /// 获取 ADB 服务器的版本号。
    pub async fn server_version(&self) -> AdbResult<u32> {
        let version = self.host_query("host:version").await?;
        u32::from_str_radix(version.trim(), 16)
            .map_err(|_| AdbError::protocol_error(format!("invalid version {:?}", version)))
    }

    pub async fn device_entries(&self) -> AdbResult<Vec<DeviceEntry>> {
        let payload = self.host_query("host:devices").await?;
        Ok(parse_device_list(&payload))
    }

    /// 在 `transport` 选中的设备上执行 shell 命令, 返回去掉噪声行后的完整输出
    pub async fn shell<'a, T: Into<AdbCommand<'a>>>(
        &self,
        transport: &Transport,
        command: T,
    ) -> AdbResult<String> {
        let command = format!("shell:{}", command.into().get_command());
        let mut stream = self.dial().await?;
        stream.send_cmd_then_check_okay(&transport.command()).await?;
        stream.send_cmd_then_check_okay(&command).await?;
        let output = stream.read_until_close().await?;
        Ok(join_output_lines(&output))
    }

    /// 订阅 `host:track-devices`。
    ///
    /// 丢弃返回的 Stream 即关闭连接; 连接出错时产出一次错误后结束。
    pub fn track_devices(&self) -> impl Stream<Item = AdbResult<Vec<DeviceEntry>>> + '_ {
        try_stream! {
            let mut stream = self.dial().await?;
            stream.send_cmd_then_check_okay("host:track-devices").await?;
            loop {
                let block = stream.read_string_block().await?;
                yield parse_device_list(&block);
            }
        }
    }
}
