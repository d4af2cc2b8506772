//! Opened media handle

use super::iso_tree::IsoTree;
use crate::domain::entities::MediaFormat;
use crate::domain::repositories::{DirEntry, MediaError, MediaSource, VolumeInfo};
use crate::infrastructure::block_device::DeviceReader;
use std::path::{Path, PathBuf};

/// An opened disk image
///
/// Owns the mapping or file descriptor of the source; dropping the handle
/// releases it.
pub struct MediaHandle {
    device: DeviceReader,
    source_path: PathBuf,
    format: MediaFormat,
    volume: Option<VolumeInfo>,
    tree: Option<IsoTree>,
}

impl MediaHandle {
    pub(super) fn new(
        device: DeviceReader,
        source_path: PathBuf,
        format: MediaFormat,
        volume: Option<VolumeInfo>,
        tree: Option<IsoTree>,
    ) -> Self {
        Self {
            device,
            source_path,
            format,
            volume,
            tree,
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// True when reads are served from a memory map
    pub fn is_mapped(&self) -> bool {
        self.device.is_mmap()
    }

    /// The name set the file view resolves paths with, if there is one
    pub fn file_view(&self) -> Option<super::iso_tree::NameSet> {
        self.tree.as_ref().map(IsoTree::names)
    }

    /// Releases the handle now rather than at end of scope.
    ///
    /// Consuming `self` drops the device, which unmaps or closes the source.
    pub fn close(self) {
        tracing::debug!("Closing {}", self.source_path.display());
    }

    fn tree(&self, path: &str) -> Result<&IsoTree, MediaError> {
        self.tree
            .as_ref()
            .ok_or_else(|| MediaError::NotFound(path.to_string()))
    }
}

impl std::fmt::Debug for MediaHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let info = self.device.device_info();
        f.debug_struct("MediaHandle")
            .field("source_path", &info.path)
            .field("format", &self.format)
            .field("size_bytes", &info.size)
            .field("mapped", &info.mapped)
            .finish()
    }
}

impl MediaSource for MediaHandle {
    fn format(&self) -> MediaFormat {
        self.format
    }

    fn size_bytes(&self) -> u64 {
        self.device.size()
    }

    fn sector_size(&self) -> u32 {
        self.format.sector_size()
    }

    fn read_range(&self, offset: u64, length: usize) -> Result<Vec<u8>, MediaError> {
        self.device.read_at(offset, length).map_err(MediaError::from)
    }

    fn list_path(&self, path: &str) -> Result<Vec<DirEntry>, MediaError> {
        self.tree(path)?.list(&self.device, path)
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>, MediaError> {
        self.tree(path)?.read(&self.device, path, usize::MAX)
    }

    fn read_file_prefix(&self, path: &str, max_len: usize) -> Result<Vec<u8>, MediaError> {
        self.tree(path)?.read(&self.device, path, max_len)
    }

    fn stat(&self, path: &str) -> Result<DirEntry, MediaError> {
        self.tree(path)?.stat(&self.device, path)
    }

    fn volume_info(&self) -> Option<&VolumeInfo> {
        self.volume.as_ref()
    }
}
