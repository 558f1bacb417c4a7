pub mod adb_protocol;
pub mod adb_socket_config;

pub use adb_protocol::AdbProtocolRespDataType;
pub use adb_socket_config::{AdbSocketConfig, Endpoint};
