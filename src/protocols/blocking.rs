use super::protocol_logic;
use crate::connections::AdbProtocolRespDataType;
use crate::errors::{AdbError, AdbResult};
use log::{debug, trace};
use std::io::{Read, Write};

/// 基于 `Read + Write` 的 ADB 线协议原语。
///
/// 所有读取都会循环直到拿到要求的字节数; 对端提前关闭时返回 `ProtocolError`。
pub trait AdbProtocol: Read + Write {
    /// 发送原始字节并刷新
    fn send(&mut self, data: &[u8]) -> AdbResult<()> {
        trace!(">>>>>>> Send Size: {:#?} >>>>>>>", data.len());
        self.write_all(data)
            .and_then(|_| self.flush())
            .map_err(|e| AdbError::from_io(e, "writing to adb server"))
    }

    /// 精确读取 `n` 个字节。
    ///
    /// # 参数
    /// - `n`: 要接收的数据大小。
    ///
    /// # 返回值
    /// - 成功返回恰好 `n` 个字节, 连接提前关闭返回协议错误。
    fn recv(&mut self, n: usize) -> AdbResult<Vec<u8>> {
        trace!("<<<<<<< Try Recv Size: {:#?} <<<<<<<", n);
        let mut target = vec![0; n];
        self.read_exact(&mut target)
            .map_err(|e| AdbError::from_io(e, format!("reading {} bytes", n)))?;
        Ok(target)
    }

    /// 发送 `<长度><命令>` 格式的请求, 不读取状态
    fn send_command(&mut self, command: &str) -> AdbResult<()> {
        debug!("Send COMMAND: <{:#?}>", command);
        let packet = protocol_logic::build_command_packet(command)?;
        self.send(&packet)
    }

    fn read_string(&mut self, size: usize) -> AdbResult<String> {
        let data = self.recv(size)?;
        Ok(String::from_utf8_lossy(&data).to_string())
    }

    /// 读取 `digits` 位 ASCII 十六进制长度字段
    fn read_framed_size(&mut self, digits: usize) -> AdbResult<usize> {
        let data = self.recv(digits)?;
        protocol_logic::parse_hex_size(&data)
    }

    /// 读取一个字符串块，以四位十六进制长度开始。
    fn read_string_block(&mut self) -> AdbResult<String> {
        let size = self.read_framed_size(protocol_logic::HEX_SIZE_DIGITS)?;
        self.read_string(size)
    }

    /// 检查 server 返回是否为 "OKAY"。
    ///
    /// `FAIL` 之后跟随十六进制长度的原因文本, 会尽量读出并放进错误信息;
    /// 原因里包含 "more than one" 时返回 `AmbiguousTarget`。
    fn check_okay(&mut self, command: &str) -> AdbResult<()> {
        let status = self.recv(4)?;
        debug!(
            "Check Okay Response >>> {:#?}",
            String::from_utf8_lossy(&status)
        );
        if protocol_logic::is_okay_response(&status) {
            return Ok(());
        }
        if protocol_logic::is_fail_response(&status) {
            let reason = self.read_string_block().unwrap_or_default();
            return Err(protocol_logic::fail_status_error(command, &reason));
        }
        Err(protocol_logic::unexpected_status_error(command, &status))
    }

    fn send_cmd_then_check_okay(&mut self, command: &str) -> AdbResult<()> {
        self.send_command(command)?;
        self.check_okay(command)
    }

    /// sync 模式下的小端 u32
    fn read_le_u32(&mut self) -> AdbResult<u32> {
        let data = self.recv(4)?;
        protocol_logic::parse_le_u32(&data)
    }

    fn read_sync_tag(&mut self) -> AdbResult<[u8; 4]> {
        let mut tag = [0u8; 4];
        self.read_exact(&mut tag)
            .map_err(|e| AdbError::from_io(e, "reading sync tag"))?;
        Ok(tag)
    }

    fn send_sync_request(&mut self, tag: AdbProtocolRespDataType, payload: &[u8]) -> AdbResult<()> {
        debug!(
            "Send SYNC <{}> <{:#?}>",
            tag,
            String::from_utf8_lossy(payload)
        );
        let packet = protocol_logic::build_sync_request(tag, payload)?;
        self.send(&packet)
    }

    /// 读取 sync 模式的状态: `OKAY<0>` 或 `FAIL<长度><原因>`
    fn read_sync_status(&mut self, path: &str) -> AdbResult<()> {
        let tag = self.read_sync_tag()?;
        let length = self.read_le_u32()? as usize;
        match AdbProtocolRespDataType::from_bytes(&tag) {
            Some(AdbProtocolRespDataType::OKAY) => Ok(()),
            Some(AdbProtocolRespDataType::FAIL) => {
                let message = self.read_string(length)?;
                Err(AdbError::sync_failed(path, message))
            }
            _ => Err(AdbError::protocol_error(format!(
                "unexpected sync status {:?}",
                String::from_utf8_lossy(&tag)
            ))),
        }
    }
}

impl<T> AdbProtocol for T where T: Read + Write {}
