use crate::client::adb_connection::{AdbConnection, ShutdownHandle};
use crate::errors::AdbResult;
use crate::protocols::protocol_logic::{is_noise_line, trim_line_ending};
use crate::protocols::AdbProtocol;
use log::debug;

/// 设备侧流式服务 (`shell:` / `log:`) 的输出。
///
/// 按行产出, 去掉行尾换行符并跳过固件噪声行; 对端关闭后结束。
/// 通过 `shutdown_handle` 从其它线程取消时迭代器直接结束, 不产出错误。
pub struct ShellStream {
    conn: Option<AdbConnection>,
    handle: ShutdownHandle,
}

impl ShellStream {
    /// 在已经选好传输通道的连接上发起服务请求
    pub(crate) fn open(mut conn: AdbConnection, command: &str) -> AdbResult<Self> {
        conn.send_cmd_then_check_okay(command)?;
        let handle = conn.shutdown_handle();
        Ok(ShellStream {
            conn: Some(conn),
            handle,
        })
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.handle.clone()
    }

    /// 读完全部输出并用 `\n` 拼接
    pub fn collect_output(self) -> AdbResult<String> {
        let lines = self.collect::<AdbResult<Vec<String>>>()?;
        Ok(lines.join("\n"))
    }

    /// 提前结束并关闭连接
    pub fn close(mut self) -> AdbResult<()> {
        match self.conn.take() {
            Some(conn) => conn.close(),
            None => Ok(()),
        }
    }

    fn finish(&mut self) {
        if let Some(conn) = self.conn.take() {
            let _ = conn.close();
        }
    }
}

impl Iterator for ShellStream {
    type Item = AdbResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let conn = self.conn.as_mut()?;
            let mut buf = Vec::new();
            let read = match conn.read_line_bytes(&mut buf) {
                Ok(read) => read,
                Err(_) if self.handle.is_cancelled() => {
                    self.finish();
                    return None;
                }
                Err(e) => {
                    self.finish();
                    return Some(Err(e));
                }
            };
            if read == 0 {
                debug!("Shell stream reached end of output");
                self.finish();
                return None;
            }
            let line = String::from_utf8_lossy(trim_line_ending(&buf)).to_string();
            if is_noise_line(&line) {
                continue;
            }
            return Some(Ok(line));
        }
    }
}
