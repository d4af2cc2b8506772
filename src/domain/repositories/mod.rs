//! Repository traits (interfaces)
//!
//! These traits define the contracts the domain services depend on.
//! Concrete implementations live in the infrastructure layer.

mod block_device;
mod media_source;

pub use block_device::{BlockDeviceError, BlockDeviceReader, DeviceInfo};
pub use media_source::{DirEntry, MediaError, MediaSource, VolumeInfo};
