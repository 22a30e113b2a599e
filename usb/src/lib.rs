pub use rusb;
pub mod commands;
pub mod device;
pub mod devices;
pub mod error;
pub mod outlet;
pub mod transfer;

pub use device::{
    find_device_by_serial, find_device_by_serial_with_products, find_devices,
    find_devices_with_products,
};
