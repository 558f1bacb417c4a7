pub(crate) mod command;
pub(crate) mod device_filter;
pub(crate) mod device_info;
pub(crate) mod file_info;

pub use command::AdbCommand;
pub use device_filter::{DensityBucket, DeviceFilter, DeviceType, FilterTarget, SdkVersion};
pub use device_info::{parse_device_list, parse_properties, parse_property_line, DeviceEntry};
pub use file_info::{parse_file_info, FileInfo};
