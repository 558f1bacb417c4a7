use super::protocol_logic;
use crate::errors::{AdbError, AdbResult};
use async_trait::async_trait;
use log::{debug, trace};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// `AdbProtocol` 的异步版本, 只覆盖 host 协议部分。
#[async_trait]
pub trait AsyncAdbProtocol: AsyncReadExt + AsyncWriteExt + Unpin + Send {
    async fn send(&mut self, data: &[u8]) -> AdbResult<()> {
        trace!(">>>>>>> Send Size: {:#?} >>>>>>>", data.len());
        self.write_all(data)
            .await
            .map_err(|e| AdbError::from_io(e, "writing to adb server"))?;
        self.flush()
            .await
            .map_err(|e| AdbError::from_io(e, "flushing to adb server"))
    }

    async fn send_command(&mut self, command: &str) -> AdbResult<()> {
        debug!("Send COMMAND: <{:#?}>", command);
        let packet = protocol_logic::build_command_packet(command)?;
        self.send(&packet).await
    }

    async fn recv(&mut self, n: usize) -> AdbResult<Vec<u8>> {
        trace!("<<<<<<< Try Recv Size: {:#?} <<<<<<<", n);
        let mut target = vec![0; n];
        self.read_exact(&mut target)
            .await
            .map_err(|e| AdbError::from_io(e, format!("reading {} bytes", n)))?;
        Ok(target)
    }

    async fn read_framed_size(&mut self, digits: usize) -> AdbResult<usize> {
        let data = self.recv(digits).await?;
        protocol_logic::parse_hex_size(&data)
    }

    async fn read_string_block(&mut self) -> AdbResult<String> {
        let size = self
            .read_framed_size(protocol_logic::HEX_SIZE_DIGITS)
            .await?;
        let data = self.recv(size).await?;
        Ok(String::from_utf8_lossy(&data).to_string())
    }

    async fn read_until_close(&mut self) -> AdbResult<Vec<u8>> {
        let mut content = Vec::new();
        self.read_to_end(&mut content)
            .await
            .map_err(|e| AdbError::from_io(e, "reading until close"))?;
        Ok(content)
    }

    async fn check_okay(&mut self, command: &str) -> AdbResult<()> {
        let status = self.recv(4).await?;
        if protocol_logic::is_okay_response(&status) {
            return Ok(());
        }
        if protocol_logic::is_fail_response(&status) {
            let reason = self.read_string_block().await.unwrap_or_default();
            return Err(protocol_logic::fail_status_error(command, &reason));
        }
        Err(protocol_logic::unexpected_status_error(command, &status))
    }

    async fn send_cmd_then_check_okay(&mut self, command: &str) -> AdbResult<()> {
        self.send_command(command).await?;
        self.check_okay(command).await
    }
}

impl<T> AsyncAdbProtocol for T where T: AsyncReadExt + AsyncWriteExt + Unpin + Send {}
