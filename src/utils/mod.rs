use crate::errors::{AdbError, AdbResult, AdbResultExt};
use anyhow::{anyhow, Context};
use log::info;
use std::path::PathBuf;
use std::process::Command;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use which::which;

#[cfg(windows)]
const ADB_EXECUTE_FILE_NAME: &str = "adb.exe";
#[cfg(not(windows))]
const ADB_EXECUTE_FILE_NAME: &str = "adb";

const ADBUTILS_ADB_PATH: &str = "ADBUTILS_ADB_PATH";
const ANDROID_HOME: &str = "ANDROID_HOME";

/// 查找 adb 可执行文件。
///
/// 依次尝试 `ADBUTILS_ADB_PATH`、`$ANDROID_HOME/platform-tools/adb`、`PATH`。
pub fn adb_path() -> AdbResult<PathBuf> {
    if let Ok(path) = std::env::var(ADBUTILS_ADB_PATH) {
        return Ok(PathBuf::from(path));
    }
    if let Ok(home) = std::env::var(ANDROID_HOME) {
        let candidate = PathBuf::from(home)
            .join("platform-tools")
            .join(ADB_EXECUTE_FILE_NAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    which(ADB_EXECUTE_FILE_NAME).map_err(|_| AdbError::from_display("adb not found"))
}

/// 执行 `adb start-server`, 等待命令退出
pub fn start_adb_server() -> AdbResult<()> {
    let path = adb_path()?;
    info!("Start adb server with {:?}", path);
    let output = Command::new(&path)
        .arg("start-server")
        .output()
        .with_context(|| format!("Failed to run {:?}", path))
        .to_adb_error()?;
    if !output.status.success() {
        return Err(AdbError::Anyhow(anyhow!(
            "adb start-server exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}

/// 安装 tracing 日志输出, 级别取自 `RUST_LOG`, 默认 INFO。
///
/// 重复调用不会报错, 测试里可以随意调用。
pub fn init_logger() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(Level::INFO.into()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logger_is_idempotent() {
        init_logger();
        init_logger();
        log::info!("logger installed");
    }
}
