use crate::beans::{parse_device_list, DeviceEntry};
use crate::client::adb_connection::{AdbConnection, ShutdownHandle};
use crate::errors::AdbResult;
use crate::protocols::AdbProtocol;
use log::{debug, info};

/// `host:track-devices` 的持续订阅。
///
/// 每次 server 端设备集合变化都会推送一份完整快照, 迭代器每次产出一份。
/// 连接关闭或被 `ShutdownHandle` 取消时结束。
pub struct DeviceTracker {
    conn: Option<AdbConnection>,
    handle: ShutdownHandle,
}

impl DeviceTracker {
    pub(crate) fn open(mut conn: AdbConnection) -> AdbResult<Self> {
        conn.send_cmd_then_check_okay("host:track-devices")?;
        info!("Tracking devices");
        let handle = conn.shutdown_handle();
        Ok(DeviceTracker {
            conn: Some(conn),
            handle,
        })
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.handle.clone()
    }

    pub fn close(mut self) -> AdbResult<()> {
        match self.conn.take() {
            Some(conn) => conn.close(),
            None => Ok(()),
        }
    }
}

impl Iterator for DeviceTracker {
    type Item = AdbResult<Vec<DeviceEntry>>;

    fn next(&mut self) -> Option<Self::Item> {
        let conn = self.conn.as_mut()?;
        match conn.read_string_block() {
            Ok(block) => {
                let entries = parse_device_list(&block);
                debug!("Device snapshot >>> {:#?}", entries);
                Some(Ok(entries))
            }
            Err(e) => {
                let cancelled = self.handle.is_cancelled();
                if let Some(conn) = self.conn.take() {
                    let _ = conn.close();
                }
                if cancelled {
                    None
                } else {
                    Some(Err(e))
                }
            }
        }
    }
}
