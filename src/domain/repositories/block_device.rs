//! Block device reader trait
//!
//! Byte-level access to an image file or device. The media reader sits on
//! top of this and never touches files directly.

use std::io;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when reading from a block device
#[derive(Error, Debug)]
pub enum BlockDeviceError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Device {0} is empty")]
    Empty(String),

    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("Invalid range: {offset}+{length} exceeds device size {device_size}")]
    InvalidRange {
        offset: u64,
        length: usize,
        device_size: u64,
    },

    #[error("Read error at offset {offset}: {message}")]
    ReadError { offset: u64, message: String },
}

impl BlockDeviceError {
    /// Maps an `open(2)` failure onto the matching variant.
    pub fn from_open(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => BlockDeviceError::DeviceNotFound(path.display().to_string()),
            io::ErrorKind::PermissionDenied => {
                BlockDeviceError::PermissionDenied(path.display().to_string())
            }
            _ => BlockDeviceError::IoError(error),
        }
    }
}

/// Information about an opened device
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: String,
    /// Total size in bytes
    pub size: u64,
    /// True when reads are served from a memory map
    pub mapped: bool,
}

/// Trait for reading raw bytes from an image or device
///
/// Reads are exact: a range that runs past the end of the device is an
/// `InvalidRange` error rather than a short read.
pub trait BlockDeviceReader: Send + Sync {
    /// Opens the device for reading
    fn open(path: &Path) -> Result<Self, BlockDeviceError>
    where
        Self: Sized;

    fn device_info(&self) -> DeviceInfo;

    /// Reads exactly `length` bytes at `offset`
    fn read_at(&self, offset: u64, length: usize) -> Result<Vec<u8>, BlockDeviceError>;

    fn size(&self) -> u64;

    /// Checks `offset + length` against the device size.
    fn check_range(&self, offset: u64, length: usize) -> Result<(), BlockDeviceError> {
        let end = offset.checked_add(length as u64);
        match end {
            Some(end) if end <= self.size() => Ok(()),
            _ => Err(BlockDeviceError::InvalidRange {
                offset,
                length,
                device_size: self.size(),
            }),
        }
    }
}
