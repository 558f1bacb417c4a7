//! ADB host 协议客户端: 设备发现与属性解析、shell/log 流、track-devices 以及 sync 推送。

pub mod beans;
pub mod client;
pub mod connections;
pub mod errors;
pub mod protocols;
#[cfg(feature = "blocking")]
pub mod sync;
pub mod utils;

pub use beans::{
    AdbCommand, DensityBucket, DeviceEntry, DeviceFilter, DeviceType, FileInfo, SdkVersion,
};
pub use client::Transport;
#[cfg(feature = "blocking")]
pub use client::{
    AdbClient, AdbConnection, AdbDevice, DeviceTracker, ShellStream, ShutdownHandle, Transporter,
};
#[cfg(feature = "tokio_async")]
pub use client::AsyncAdbClient;
pub use connections::{AdbSocketConfig, Endpoint};
pub use errors::{AdbError, AdbResult};
pub use utils::{adb_path, init_logger};
