use crate::client::transport::Transport;
use crate::connections::adb_socket_config::AdbSocketConfig;
use crate::errors::{AdbError, AdbResult};
use crate::protocols::AdbProtocol;
use log::debug;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// AdbConnection 结构体定义了与 ADB 服务器的一条连接。
///
/// 一条连接只服务一个请求序列: 拨号 -> 选择传输 -> 一个服务请求 -> 读取响应 -> 关闭。
/// 不在并发任务之间共享, 每个任务自己拨号。`close` 按值消费连接, 关闭后无法再读写;
/// 直接 drop 同样会关闭 socket。
pub struct AdbConnection {
    reader: BufReader<TcpStream>,
    handle: ShutdownHandle,
}

/// 可以从其它线程关闭连接的句柄, 用来打断阻塞中的读操作
#[derive(Clone, Debug)]
pub struct ShutdownHandle {
    stream: Arc<TcpStream>,
    cancelled: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// 关闭底层 socket, 阻塞在该连接上的读会立即返回
    pub fn shutdown(&self) -> AdbResult<()> {
        self.cancelled.store(true, Ordering::SeqCst);
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(AdbError::Io(e)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl AdbConnection {
    /// 按配置拨号
    pub fn dial(config: &AdbSocketConfig) -> AdbResult<Self> {
        let stream = config.safe_connect()?;
        Self::from_stream(stream)
    }

    pub fn from_stream(stream: TcpStream) -> AdbResult<Self> {
        let handle = ShutdownHandle {
            stream: Arc::new(stream.try_clone()?),
            cancelled: Arc::new(AtomicBool::new(false)),
        };
        Ok(AdbConnection {
            reader: BufReader::new(stream),
            handle,
        })
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.handle.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.handle.is_cancelled()
    }

    /// 选择传输通道, server 会回复 OKAY 或 FAIL
    pub fn select_transport(&mut self, transport: &Transport) -> AdbResult<()> {
        self.send_cmd_then_check_okay(&transport.command())
    }

    /// 读取一行原始字节 (包含换行符), 返回 0 表示对端已关闭
    pub fn read_line_bytes(&mut self, buf: &mut Vec<u8>) -> AdbResult<usize> {
        self.reader
            .read_until(b'\n', buf)
            .map_err(|e| AdbError::from_io(e, "reading line"))
    }

    /// 关闭连接
    pub fn close(self) -> AdbResult<()> {
        debug!("Close connection");
        self.handle.shutdown()
    }
}

impl Drop for AdbConnection {
    fn drop(&mut self) {
        // 外部仍持有 ShutdownHandle 时 fd 不会随 drop 释放, 这里显式关闭
        let _ = self.handle.stream.shutdown(Shutdown::Both);
    }
}

impl Read for AdbConnection {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

impl Write for AdbConnection {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.reader.get_mut().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.reader.get_mut().flush()
    }
}
