use std::fmt::{Display, Formatter};

/// ADB 协议中出现的四字节标签。
///
/// host 协议只使用 `OKAY` / `FAIL`, 其余标签属于 sync 子协议。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdbProtocolRespDataType {
    OKAY, // 操作成功
    FAIL, // 操作失败, 后面跟随错误原因
    DATA, // 数据分段
    DONE, // 操作完成
    DENT, // 目录项
    SEND, // 推送文件
    LIST, // 列目录
    STAT, // 查询文件信息
    RECV, // 拉取文件
}

impl AdbProtocolRespDataType {
    /// 将枚举值转换为对应的静态字符串。
    pub fn as_str(&self) -> &'static str {
        match self {
            AdbProtocolRespDataType::OKAY => "OKAY",
            AdbProtocolRespDataType::FAIL => "FAIL",
            AdbProtocolRespDataType::DATA => "DATA",
            AdbProtocolRespDataType::DONE => "DONE",
            AdbProtocolRespDataType::DENT => "DENT",
            AdbProtocolRespDataType::SEND => "SEND",
            AdbProtocolRespDataType::LIST => "LIST",
            AdbProtocolRespDataType::STAT => "STAT",
            AdbProtocolRespDataType::RECV => "RECV",
        }
    }

    pub fn code(&self) -> &'static [u8; 4] {
        match self {
            AdbProtocolRespDataType::OKAY => b"OKAY",
            AdbProtocolRespDataType::FAIL => b"FAIL",
            AdbProtocolRespDataType::DATA => b"DATA",
            AdbProtocolRespDataType::DONE => b"DONE",
            AdbProtocolRespDataType::DENT => b"DENT",
            AdbProtocolRespDataType::SEND => b"SEND",
            AdbProtocolRespDataType::LIST => b"LIST",
            AdbProtocolRespDataType::STAT => b"STAT",
            AdbProtocolRespDataType::RECV => b"RECV",
        }
    }

    /// 从线上读到的四个字节还原标签, 未知标签返回 None
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        match data {
            b"OKAY" => Some(AdbProtocolRespDataType::OKAY),
            b"FAIL" => Some(AdbProtocolRespDataType::FAIL),
            b"DATA" => Some(AdbProtocolRespDataType::DATA),
            b"DONE" => Some(AdbProtocolRespDataType::DONE),
            b"DENT" => Some(AdbProtocolRespDataType::DENT),
            b"SEND" => Some(AdbProtocolRespDataType::SEND),
            b"LIST" => Some(AdbProtocolRespDataType::LIST),
            b"STAT" => Some(AdbProtocolRespDataType::STAT),
            b"RECV" => Some(AdbProtocolRespDataType::RECV),
            _ => None,
        }
    }
}

impl Display for AdbProtocolRespDataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adb_protocol_resp_data_type_as_str() {
        assert_eq!(AdbProtocolRespDataType::OKAY.as_str(), "OKAY");
        assert_eq!(AdbProtocolRespDataType::FAIL.as_str(), "FAIL");
        assert_eq!(AdbProtocolRespDataType::DATA.as_str(), "DATA");
        assert_eq!(AdbProtocolRespDataType::DONE.as_str(), "DONE");
        assert_eq!(AdbProtocolRespDataType::DENT.to_string(), "DENT");
    }

    #[test]
    fn test_from_bytes() {
        assert_eq!(
            AdbProtocolRespDataType::from_bytes(b"OKAY"),
            Some(AdbProtocolRespDataType::OKAY)
        );
        assert_eq!(
            AdbProtocolRespDataType::from_bytes(b"DENT"),
            Some(AdbProtocolRespDataType::DENT)
        );
        assert_eq!(AdbProtocolRespDataType::from_bytes(b"okay"), None);
        assert_eq!(AdbProtocolRespDataType::from_bytes(b"OKA"), None);
    }
}
