pub mod transport;

#[cfg(feature = "blocking")]
pub mod adb_client;
#[cfg(feature = "blocking")]
pub mod adb_connection;
#[cfg(feature = "blocking")]
pub mod adb_device;
#[cfg(feature = "blocking")]
pub mod device_tracker;
#[cfg(feature = "blocking")]
pub mod shell;

#[cfg(feature = "tokio_async")]
pub mod async_client;

pub use transport::Transport;

#[cfg(feature = "blocking")]
pub use adb_client::AdbClient;
#[cfg(feature = "blocking")]
pub use adb_connection::{AdbConnection, ShutdownHandle};
#[cfg(feature = "blocking")]
pub use adb_device::AdbDevice;
#[cfg(feature = "blocking")]
pub use device_tracker::DeviceTracker;
#[cfg(feature = "blocking")]
pub use shell::ShellStream;
#[cfg(feature = "blocking")]
pub use transport::Transporter;

#[cfg(feature = "tokio_async")]
pub use async_client::AsyncAdbClient;
