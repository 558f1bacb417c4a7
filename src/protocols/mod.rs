#[cfg(feature = "blocking")]
pub mod blocking;
#[cfg(feature = "tokio_async")]
pub mod tokio_async;

#[cfg(feature = "blocking")]
pub use blocking::AdbProtocol;

#[cfg(feature = "tokio_async")]
pub use tokio_async::AsyncAdbProtocol;

/// 与具体 IO 无关的编解码逻辑, 阻塞与异步实现共用。
pub mod protocol_logic {
    use crate::connections::AdbProtocolRespDataType;
    use crate::errors::{AdbError, AdbResult};

    /// host 协议长度字段的位数
    pub const HEX_SIZE_DIGITS: usize = 4;

    /// 请求体的最大长度, 四位十六进制能表示的上限
    pub const MAX_COMMAND_LENGTH: usize = 0xffff;

    const AMBIGUOUS_MARKER: &str = "more than one";

    /// 组装 `<4位小写十六进制长度><命令>` 请求包
    pub fn build_command_packet(command: &str) -> AdbResult<Vec<u8>> {
        let cmd_bytes = command.as_bytes();
        if cmd_bytes.len() > MAX_COMMAND_LENGTH {
            return Err(AdbError::protocol_error(format!(
                "command too long: {} bytes",
                cmd_bytes.len()
            )));
        }
        let length = format!("{:04x}", cmd_bytes.len());
        let mut packet = Vec::with_capacity(HEX_SIZE_DIGITS + cmd_bytes.len());
        packet.extend_from_slice(length.as_bytes());
        packet.extend_from_slice(cmd_bytes);
        Ok(packet)
    }

    /// 解析 ASCII 十六进制长度字段。
    ///
    /// 只接受十六进制数字, `+` 号和空白都视为协议错误。
    pub fn parse_hex_size(data: &[u8]) -> AdbResult<usize> {
        if data.is_empty() || !data.iter().all(u8::is_ascii_hexdigit) {
            return Err(AdbError::protocol_error(format!(
                "invalid hex size {:?}",
                String::from_utf8_lossy(data)
            )));
        }
        let text = std::str::from_utf8(data)?;
        usize::from_str_radix(text, 16)
            .map_err(|_| AdbError::protocol_error(format!("invalid hex size {:?}", text)))
    }

    pub fn is_okay_response(data: &[u8]) -> bool {
        data == AdbProtocolRespDataType::OKAY.code()
    }

    pub fn is_fail_response(data: &[u8]) -> bool {
        data == AdbProtocolRespDataType::FAIL.code()
    }

    pub fn is_ambiguous_reason(reason: &str) -> bool {
        reason.to_ascii_lowercase().contains(AMBIGUOUS_MARKER)
    }

    /// 将 server 返回的 FAIL 原因转换为错误
    pub fn fail_status_error(command: &str, reason: &str) -> AdbError {
        if is_ambiguous_reason(reason) {
            AdbError::ambiguous_target(reason)
        } else {
            AdbError::protocol_error(format!(
                "invalid connection status FAIL for {:?}: {}",
                command, reason
            ))
        }
    }

    pub fn unexpected_status_error(command: &str, status: &[u8]) -> AdbError {
        AdbError::protocol_error(format!(
            "invalid connection status {:?} for {:?}",
            String::from_utf8_lossy(status),
            command
        ))
    }

    /// 部分 Dalvik 固件在每条 shell 输出前打印的噪声行
    pub const LIBDVM_TEXT_RELOCATION_WARNING: &str = "WARNING: linker: libdvm.so has text relocations. This is wasting memory and is a security risk. Please fix.";

    pub fn is_noise_line(line: &str) -> bool {
        line.starts_with(LIBDVM_TEXT_RELOCATION_WARNING)
    }

    /// 去掉行尾的 `\n` / `\r\n`
    pub fn trim_line_ending(line: &[u8]) -> &[u8] {
        let line = line.strip_suffix(b"\n").unwrap_or(line);
        line.strip_suffix(b"\r").unwrap_or(line)
    }

    /// 把一次性读出的输出切成行, 丢弃噪声行后用 `\n` 拼接
    pub fn join_output_lines(output: &[u8]) -> String {
        String::from_utf8_lossy(output)
            .lines()
            .filter(|line| !is_noise_line(line))
            .collect::<Vec<&str>>()
            .join("\n")
    }

    /// sync 子协议请求: `<标签><小端 u32 长度><负载>`
    pub fn build_sync_request(tag: AdbProtocolRespDataType, payload: &[u8]) -> AdbResult<Vec<u8>> {
        let length = u32::try_from(payload.len()).map_err(|_| {
            AdbError::protocol_error(format!("sync payload too long: {}", payload.len()))
        })?;
        let mut packet = Vec::with_capacity(8 + payload.len());
        packet.extend_from_slice(tag.code());
        packet.extend_from_slice(&length.to_le_bytes());
        packet.extend_from_slice(payload);
        Ok(packet)
    }

    /// `SEND` 请求的负载: `<远端路径>,<十进制权限位>`
    pub fn build_send_payload(remote_path: &str, mode: u32) -> String {
        format!("{},{}", remote_path, mode)
    }

    pub fn parse_le_u32(data: &[u8]) -> AdbResult<u32> {
        let bytes: [u8; 4] = data
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| AdbError::protocol_error("short little-endian u32"))?;
        Ok(u32::from_le_bytes(bytes))
    }

}
