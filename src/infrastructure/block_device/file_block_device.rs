//! File-backed block device implementation
//!
//! Seek-and-read access for sources that cannot be memory-mapped, such as
//! block devices and character special files.

use crate::domain::repositories::{BlockDeviceError, BlockDeviceReader, DeviceInfo};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

pub struct FileBlockDevice {
    file: Mutex<File>,
    path: String,
    size: u64,
}

impl BlockDeviceReader for FileBlockDevice {
    fn open(path: &Path) -> Result<Self, BlockDeviceError> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(false)
            .open(path)
            .map_err(|e| BlockDeviceError::from_open(path, e))?;

        if file.metadata()?.is_dir() {
            return Err(BlockDeviceError::ReadError {
                offset: 0,
                message: format!("{} is a directory", path.display()),
            });
        }

        #[cfg(target_os = "linux")]
        {
            use rustix::fs::{Advice, fadvise};

            // Probing touches a handful of sectors near the start
            let _ = fadvise(&file, 0, None, Advice::Random);
        }

        // Block devices report zero in metadata; seeking gives the real size
        let size = file.seek(SeekFrom::End(0))?;
        file.seek(SeekFrom::Start(0))?;

        if size == 0 {
            return Err(BlockDeviceError::Empty(path.display().to_string()));
        }

        Ok(Self {
            file: Mutex::new(file),
            path: path.display().to_string(),
            size,
        })
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            path: self.path.clone(),
            size: self.size,
            mapped: false,
        }
    }

    fn read_at(&self, offset: u64, length: usize) -> Result<Vec<u8>, BlockDeviceError> {
        self.check_range(offset, length)?;

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;

        let mut buffer = vec![0u8; length];
        file.read_exact(&mut buffer).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                BlockDeviceError::ReadError {
                    offset,
                    message: "Unexpected end of device".to_string(),
                }
            } else {
                BlockDeviceError::IoError(e)
            }
        })?;

        Ok(buffer)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
