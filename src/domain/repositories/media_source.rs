//! Media source trait
//!
//! The uniform surface an opened medium exposes to the analyzers: raw
//! byte ranges, a read-only file view and volume metadata.

use super::BlockDeviceError;
use crate::domain::entities::MediaFormat;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("Media unreadable: {0}")]
    Unreadable(String),

    #[error("Unrecognized media format")]
    UnrecognizedFormat,

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Range {offset}+{length} is outside media of {size} bytes")]
    OutOfRange { offset: u64, length: usize, size: u64 },
}

impl From<BlockDeviceError> for MediaError {
    fn from(error: BlockDeviceError) -> Self {
        match error {
            BlockDeviceError::Empty(_) => MediaError::UnrecognizedFormat,
            BlockDeviceError::InvalidRange {
                offset,
                length,
                device_size,
            } => MediaError::OutOfRange {
                offset,
                length,
                size: device_size,
            },
            other => MediaError::Unreadable(other.to_string()),
        }
    }
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
}

/// Volume metadata read from the primary descriptor (or UDF identifiers)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct VolumeInfo {
    pub volume_id: String,
    pub system_id: String,
    pub publisher_id: String,
    pub application_id: String,
}

/// An opened medium
///
/// Paths are relative, case-insensitive and may use `/` or `\`. Formats
/// without a file view answer `NotFound` for every path.
pub trait MediaSource: Send {
    fn format(&self) -> MediaFormat;

    fn size_bytes(&self) -> u64;

    fn sector_size(&self) -> u32;

    /// Reads exactly `length` bytes at `offset`
    fn read_range(&self, offset: u64, length: usize) -> Result<Vec<u8>, MediaError>;

    fn list_path(&self, path: &str) -> Result<Vec<DirEntry>, MediaError>;

    fn read_file(&self, path: &str) -> Result<Vec<u8>, MediaError>;

    /// Reads at most `max_len` bytes from the start of a file
    fn read_file_prefix(&self, path: &str, max_len: usize) -> Result<Vec<u8>, MediaError>;

    /// Looks a path up without reading its contents
    fn stat(&self, path: &str) -> Result<DirEntry, MediaError>;

    fn volume_info(&self) -> Option<&VolumeInfo>;
}
