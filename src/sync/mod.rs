//! `sync:` 子协议: 目录列表、文件状态、拉取与多设备同时推送。
//!
//! 子协议内所有整数都是 4 字节小端, 与 host 协议的十六进制长度不同。

mod sectioned_writer;

pub use sectioned_writer::{SectionedMultiWriter, SYNC_DATA_MAX};

use crate::beans::{parse_file_info, FileInfo};
use crate::client::adb_connection::AdbConnection;
use crate::client::adb_device::AdbDevice;
use crate::client::transport::Transporter;
use crate::connections::AdbProtocolRespDataType;
use crate::errors::{AdbError, AdbResult, AdbResultExt};
use crate::protocols::protocol_logic::{build_send_payload, parse_le_u32};
use crate::protocols::AdbProtocol;
use log::{debug, error, info};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use std::thread;
use std::time::UNIX_EPOCH;

/// `DENT` 文件名长度上限, 与设备端 sync 服务的路径上限一致
pub const SYNC_NAME_MAX: usize = 1024;

/// 拨号、选择传输并进入 sync 模式
fn open_sync<T: Transporter + ?Sized>(target: &T) -> AdbResult<AdbConnection> {
    let mut conn = target.open_transport()?;
    conn.send_cmd_then_check_okay("sync:")?;
    Ok(conn)
}

fn read_sync_fail(conn: &mut AdbConnection, path: &str) -> AdbError {
    let message = conn
        .read_le_u32()
        .and_then(|length| check_length(length, SYNC_DATA_MAX, "FAIL message"))
        .and_then(|length| conn.read_string(length))
        .unwrap_or_default();
    error!("Sync Error With Error Message >>> {:#?}", message);
    AdbError::sync_failed(path, message)
}

/// server 给出的长度超过 `max` 视为协议错误
fn check_length(length: u32, max: usize, what: &str) -> AdbResult<usize> {
    let length = length as usize;
    if length > max {
        return Err(AdbError::protocol_error(format!(
            "{} length {} exceeds {}",
            what, length, max
        )));
    }
    Ok(length)
}

fn unexpected_tag(tag: &[u8]) -> AdbError {
    AdbError::protocol_error(format!(
        "unexpected sync tag {:?}",
        String::from_utf8_lossy(tag)
    ))
}

/// 列出远端目录, 每个 `DENT` 对应一项, 遇到 `DONE` 结束
pub fn list<T: Transporter + ?Sized>(target: &T, path: &str) -> AdbResult<Vec<FileInfo>> {
    let mut conn = open_sync(target)?;
    conn.send_sync_request(AdbProtocolRespDataType::LIST, path.as_bytes())?;
    let mut entries = Vec::new();
    loop {
        let tag = conn.read_sync_tag()?;
        match AdbProtocolRespDataType::from_bytes(&tag) {
            Some(AdbProtocolRespDataType::DENT) => {
                let header = conn.recv(16)?;
                let name_length =
                    check_length(parse_le_u32(&header[12..])?, SYNC_NAME_MAX, "DENT name")?;
                let name = conn.read_string(name_length)?;
                entries.push(parse_file_info(&header[..12], name)?);
            }
            Some(AdbProtocolRespDataType::DONE) => break,
            Some(AdbProtocolRespDataType::FAIL) => return Err(read_sync_fail(&mut conn, path)),
            _ => return Err(unexpected_tag(&tag)),
        }
    }
    conn.close()?;
    debug!("Listed {} entries under {}", entries.len(), path);
    Ok(entries)
}

/// `STAT`: 远端路径不存在时 mode/size/mtime 全为 0
pub fn stat<T: Transporter + ?Sized>(target: &T, path: &str) -> AdbResult<FileInfo> {
    let mut conn = open_sync(target)?;
    conn.send_sync_request(AdbProtocolRespDataType::STAT, path.as_bytes())?;
    let tag = conn.read_sync_tag()?;
    if AdbProtocolRespDataType::from_bytes(&tag) != Some(AdbProtocolRespDataType::STAT) {
        return Err(unexpected_tag(&tag));
    }
    let data = conn.recv(12)?;
    conn.close()?;
    parse_file_info(&data, path)
}

/// `RECV`: 把远端文件写入 `writer`, 返回写入的字节数
pub fn pull<T, W>(target: &T, remote: &str, writer: &mut W) -> AdbResult<usize>
where
    T: Transporter + ?Sized,
    W: Write,
{
    let mut conn = open_sync(target)?;
    conn.send_sync_request(AdbProtocolRespDataType::RECV, remote.as_bytes())?;
    let mut size = 0;
    loop {
        let tag = conn.read_sync_tag()?;
        match AdbProtocolRespDataType::from_bytes(&tag) {
            Some(AdbProtocolRespDataType::DATA) => {
                let length = check_length(conn.read_le_u32()?, SYNC_DATA_MAX, "DATA")?;
                let chunk = conn.recv(length)?;
                writer.write_all(&chunk)?;
                size += length;
            }
            Some(AdbProtocolRespDataType::DONE) => break,
            Some(AdbProtocolRespDataType::FAIL) => return Err(read_sync_fail(&mut conn, remote)),
            _ => return Err(unexpected_tag(&tag)),
        }
    }
    writer.flush()?;
    conn.close()?;
    info!("Pulled {} ({} bytes)", remote, size);
    Ok(size)
}

/// 推送本地文件到一个设备
pub fn push<T: Transporter + Sync>(target: &T, local: &Path, remote: &str) -> AdbResult<()> {
    push_all(std::slice::from_ref(target), local, remote)
}

/// 推送到一组已经解析好的设备
pub fn push_devices(devices: &[AdbDevice], local: &Path, remote: &str) -> AdbResult<()> {
    push_all(devices, local, remote)
}

/// 同时推送本地文件到多个目标, 权限位与修改时间取自本地文件
pub fn push_all<T: Transporter + Sync>(targets: &[T], local: &Path, remote: &str) -> AdbResult<()> {
    let file = File::open(local).with_adb_context(|| format!("open {}", local.display()))?;
    let metadata = file.metadata()?;
    let mode = file_mode(&metadata);
    let mtime = metadata.modified()?.duration_since(UNIX_EPOCH)?.as_secs() as u32;
    push_reader(targets, BufReader::new(file), remote, mode, mtime)
}

#[cfg(unix)]
fn file_mode(metadata: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn file_mode(_metadata: &std::fs::Metadata) -> u32 {
    0o644
}

/// 从任意 `Read` 推送。
///
/// 每个目标在自己的线程里完成拨号与 `SEND` 握手; 之后由当前线程读取数据,
/// 以相同的 `DATA` 帧广播给所有目标, 最后发送 `DONE<mtime>` 并校验每个目标的状态。
/// 任一目标失败则整个推送失败, 所有连接都会关闭。
pub fn push_reader<T, R>(
    targets: &[T],
    mut reader: R,
    remote: &str,
    mode: u32,
    mtime: u32,
) -> AdbResult<()>
where
    T: Transporter + Sync,
    R: Read,
{
    let payload = build_send_payload(remote, mode);
    let opened: Vec<AdbResult<AdbConnection>> = thread::scope(|scope| {
        let handles: Vec<_> = targets
            .iter()
            .map(|target| {
                let payload = payload.as_str();
                scope.spawn(move || -> AdbResult<AdbConnection> {
                    let mut conn = open_sync(target)?;
                    conn.send_sync_request(AdbProtocolRespDataType::SEND, payload.as_bytes())?;
                    Ok(conn)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(AdbError::unknown("push setup panicked")))
            })
            .collect()
    });
    let mut conns = opened.into_iter().collect::<AdbResult<Vec<AdbConnection>>>()?;
    info!("Push {} to {} target(s)", remote, conns.len());

    let mut sections = SectionedMultiWriter::new(conns.iter_mut().collect());
    let copied = std::io::copy(&mut reader, &mut sections)?;
    let count = sections.sections();
    sections.finish()?;
    debug!("Streamed {} bytes in {} full section(s)", copied, count);

    let mut done = Vec::with_capacity(8);
    done.extend_from_slice(AdbProtocolRespDataType::DONE.code());
    done.extend_from_slice(&mtime.to_le_bytes());
    for conn in conns.iter_mut() {
        conn.send(&done)?;
    }
    for conn in conns.iter_mut() {
        conn.read_sync_status(remote)?;
    }
    for conn in conns {
        conn.close()?;
    }
    info!("Pushed {} ({} bytes)", remote, copied);
    Ok(())
}
