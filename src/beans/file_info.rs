use crate::errors::{AdbError, AdbResult};
use chrono::{DateTime, Utc};

const S_IFMT: u32 = 0o170000;
const S_IFDIR: u32 = 0o040000;
const S_IFREG: u32 = 0o100000;
const S_IFLNK: u32 = 0o120000;

/// sync `DENT` / `STAT` 返回的文件信息
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FileInfo {
    pub mode: u32,
    pub size: u32,
    pub mtime: u32,
    pub mdtime: Option<DateTime<Utc>>,
    pub path: String,
}

/// 解析 `mode, size, mtime` 三个小端 u32 (共 12 字节)
pub fn parse_file_info<T: ToString>(data: &[u8], path: T) -> AdbResult<FileInfo> {
    if data.len() < 12 {
        return Err(AdbError::protocol_error(format!(
            "file info needs 12 bytes, got {}",
            data.len()
        )));
    }
    let field = |i: usize| u32::from_le_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]);
    let (mode, size, mtime) = (field(0), field(4), field(8));
    let mdtime = DateTime::<Utc>::from_timestamp(i64::from(mtime), 0);
    Ok(FileInfo::new(mode, size, mtime, mdtime, path.to_string()))
}

impl FileInfo {
    fn new(
        mode: u32,
        size: u32,
        mtime: u32,
        mdtime: Option<DateTime<Utc>>,
        path: String,
    ) -> FileInfo {
        FileInfo {
            mode,
            size,
            mtime,
            mdtime,
            path,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.mode & S_IFMT == S_IFDIR
    }

    pub fn is_file(&self) -> bool {
        self.mode & S_IFMT == S_IFREG
    }

    pub fn is_symlink(&self) -> bool {
        self.mode & S_IFMT == S_IFLNK
    }

    /// STAT 对不存在的路径返回全 0
    pub fn exists(&self) -> bool {
        self.mode != 0 || self.size != 0 || self.mtime != 0
    }

    pub fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(mode: u32, size: u32, mtime: u32) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&mode.to_le_bytes());
        data.extend_from_slice(&size.to_le_bytes());
        data.extend_from_slice(&mtime.to_le_bytes());
        data
    }

    #[test]
    fn test_parse_directory_entry() {
        let info = parse_file_info(&encode(0o040771, 4096, 1_700_000_000), "Download").unwrap();
        assert!(info.is_dir());
        assert!(!info.is_file());
        assert_eq!(info.permissions(), 0o771);
        assert_eq!(info.size, 4096);
        assert_eq!(info.mdtime.unwrap().timestamp(), 1_700_000_000);
        assert_eq!(info.path, "Download");
    }

    #[test]
    fn test_missing_file_stat() {
        let info = parse_file_info(&encode(0, 0, 0), "/nope").unwrap();
        assert!(!info.exists());
    }

    #[test]
    fn test_short_buffer() {
        assert!(parse_file_info(&[0u8; 8], "x").is_err());
    }
}
