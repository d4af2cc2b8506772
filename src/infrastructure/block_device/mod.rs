//! Block device implementations
//!
//! `DeviceReader` tries a memory map first and falls back to seek-and-read
//! for sources that cannot be mapped.

mod file_block_device;
mod mmap_block_device;

pub use file_block_device::FileBlockDevice;
pub use mmap_block_device::MmapBlockDevice;

use crate::domain::repositories::{BlockDeviceError, BlockDeviceReader, DeviceInfo};
use std::path::Path;

pub enum DeviceReader {
    Mmap(MmapBlockDevice),
    File(FileBlockDevice),
}

impl DeviceReader {
    /// Opens `path`, preferring a memory map.
    ///
    /// Missing files, permission failures and empty files are reported
    /// straight away; any other mapping failure falls back to file reads.
    pub fn open(path: &Path) -> Result<Self, BlockDeviceError> {
        match MmapBlockDevice::open(path) {
            Ok(device) => Ok(DeviceReader::Mmap(device)),
            Err(
                e @ (BlockDeviceError::DeviceNotFound(_)
                | BlockDeviceError::PermissionDenied(_)
                | BlockDeviceError::Empty(_)),
            ) => Err(e),
            Err(e) => {
                tracing::debug!("Memory map unavailable for {}: {}", path.display(), e);
                Ok(DeviceReader::File(FileBlockDevice::open(path)?))
            }
        }
    }

    #[inline]
    pub fn is_mmap(&self) -> bool {
        matches!(self, DeviceReader::Mmap(_))
    }

    pub fn device_info(&self) -> DeviceInfo {
        match self {
            DeviceReader::Mmap(d) => d.device_info(),
            DeviceReader::File(d) => d.device_info(),
        }
    }

    pub fn read_at(&self, offset: u64, length: usize) -> Result<Vec<u8>, BlockDeviceError> {
        match self {
            DeviceReader::Mmap(d) => d.read_at(offset, length),
            DeviceReader::File(d) => d.read_at(offset, length),
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            DeviceReader::Mmap(d) => d.size(),
            DeviceReader::File(d) => d.size(),
        }
    }
}
