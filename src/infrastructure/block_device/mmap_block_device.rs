//! Memory-mapped block device implementation
//!
//! Zero-copy access to image files. Regular files are mapped whole; the
//! mapping is released when the device is dropped.

use crate::domain::repositories::{BlockDeviceError, BlockDeviceReader, DeviceInfo};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

pub struct MmapBlockDevice {
    mmap: Mmap,
    path: String,
}

impl MmapBlockDevice {
    /// Returns a slice at the specified offset and length
    #[inline]
    pub fn slice_at(&self, offset: u64, length: usize) -> Option<&[u8]> {
        let start = usize::try_from(offset).ok()?;
        let end = start.checked_add(length)?;
        self.mmap.get(start..end)
    }
}

impl BlockDeviceReader for MmapBlockDevice {
    fn open(path: &Path) -> Result<Self, BlockDeviceError> {
        let file = File::open(path).map_err(|e| BlockDeviceError::from_open(path, e))?;

        let metadata = file.metadata()?;
        if !metadata.is_file() {
            return Err(BlockDeviceError::ReadError {
                offset: 0,
                message: format!("{} is not a regular file", path.display()),
            });
        }
        if metadata.len() == 0 {
            return Err(BlockDeviceError::Empty(path.display().to_string()));
        }

        // SAFETY: mapped read-only; the image is not expected to change while it is identified
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| BlockDeviceError::ReadError {
            offset: 0,
            message: format!("Failed to memory-map file: {}", e),
        })?;

        Ok(Self {
            mmap,
            path: path.display().to_string(),
        })
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            path: self.path.clone(),
            size: self.size(),
            mapped: true,
        }
    }

    fn read_at(&self, offset: u64, length: usize) -> Result<Vec<u8>, BlockDeviceError> {
        self.check_range(offset, length)?;
        self.slice_at(offset, length)
            .map(<[u8]>::to_vec)
            .ok_or(BlockDeviceError::InvalidRange {
                offset,
                length,
                device_size: self.size(),
            })
    }

    fn size(&self) -> u64 {
        self.mmap.len() as u64
    }
}
