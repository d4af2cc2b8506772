//! ISO9660 directory tree lookups
//!
//! Resolves relative paths against one directory hierarchy (Joliet or
//! primary) by reading directory extents on demand.

use crate::domain::repositories::{DirEntry, MediaError};
use crate::formats::iso9660::{self, DirectoryRecord};
use crate::infrastructure::block_device::DeviceReader;

/// Deepest path resolved before giving up
pub const MAX_PATH_DEPTH: usize = 32;

/// Directory extents larger than this are truncated
const MAX_DIRECTORY_EXTENT: usize = 16 * 1024 * 1024;

/// Which name set the tree is read with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSet {
    Joliet,
    RockRidge,
    Iso9660,
}

#[derive(Debug, Clone)]
pub struct IsoTree {
    root: DirectoryRecord,
    block_size: u32,
    names: NameSet,
}

impl IsoTree {
    /// Builds a tree for a primary hierarchy, probing the root `.` entry for
    /// the SUSP indicator that announces Rock Ridge.
    pub fn primary(
        device: &DeviceReader,
        root: DirectoryRecord,
        block_size: u32,
    ) -> Result<Self, MediaError> {
        let mut tree = Self {
            root,
            block_size,
            names: NameSet::Iso9660,
        };

        let records = match tree.read_directory(device, &tree.root) {
            Ok(records) => records,
            Err(MediaError::Unreadable(detail)) => return Err(MediaError::Unreadable(detail)),
            Err(_) => Vec::new(),
        };
        if records
            .first()
            .is_some_and(|dot| dot.name == "." && dot.has_susp_indicator)
        {
            tree.names = NameSet::RockRidge;
        }

        Ok(tree)
    }

    pub fn joliet(root: DirectoryRecord, block_size: u32) -> Self {
        Self {
            root,
            block_size,
            names: NameSet::Joliet,
        }
    }

    pub fn names(&self) -> NameSet {
        self.names
    }

    fn is_joliet(&self) -> bool {
        self.names == NameSet::Joliet
    }

    fn display_name<'r>(&self, record: &'r DirectoryRecord) -> &'r str {
        record.display_name(self.names == NameSet::RockRidge)
    }

    fn read_directory(
        &self,
        device: &DeviceReader,
        dir: &DirectoryRecord,
    ) -> Result<Vec<DirectoryRecord>, MediaError> {
        let offset = dir.extent_lba as u64 * self.block_size as u64;
        let length = (dir.data_length as usize).min(MAX_DIRECTORY_EXTENT);
        let extent = device.read_at(offset, length).map_err(MediaError::from)?;
        Ok(iso9660::parse_directory(&extent, self.is_joliet()))
    }

    /// Finds the record for `path`. The empty path is the root.
    pub fn resolve(
        &self,
        device: &DeviceReader,
        path: &str,
    ) -> Result<DirectoryRecord, MediaError> {
        let components = split_path(path);
        if components.len() > MAX_PATH_DEPTH {
            return Err(MediaError::NotFound(path.to_string()));
        }

        let mut current = self.root.clone();
        for component in components {
            if !current.is_directory() {
                return Err(MediaError::NotFound(path.to_string()));
            }

            let records = self.read_directory(device, &current).map_err(|e| match e {
                MediaError::Unreadable(detail) => MediaError::Unreadable(detail),
                _ => MediaError::NotFound(path.to_string()),
            })?;

            let wanted = component.to_lowercase();
            current = records
                .into_iter()
                .filter(|record| !record.is_special())
                .find(|record| self.display_name(record).to_lowercase() == wanted)
                .ok_or_else(|| MediaError::NotFound(path.to_string()))?;
        }

        Ok(current)
    }

    pub fn stat(&self, device: &DeviceReader, path: &str) -> Result<DirEntry, MediaError> {
        let record = self.resolve(device, path)?;
        Ok(self.to_entry(&record))
    }

    pub fn list(&self, device: &DeviceReader, path: &str) -> Result<Vec<DirEntry>, MediaError> {
        let dir = self.resolve(device, path)?;
        if !dir.is_directory() {
            return Err(MediaError::NotFound(path.to_string()));
        }

        let records = self.read_directory(device, &dir).map_err(|e| match e {
            MediaError::Unreadable(detail) => MediaError::Unreadable(detail),
            _ => MediaError::NotFound(path.to_string()),
        })?;

        Ok(records
            .iter()
            .filter(|record| !record.is_special())
            .map(|record| self.to_entry(record))
            .collect())
    }

    /// Reads up to `max_len` bytes of a file.
    pub fn read(
        &self,
        device: &DeviceReader,
        path: &str,
        max_len: usize,
    ) -> Result<Vec<u8>, MediaError> {
        let record = self.resolve(device, path)?;
        if record.is_directory() {
            return Err(MediaError::NotFound(path.to_string()));
        }

        let offset = record.extent_lba as u64 * self.block_size as u64;
        let length = (record.data_length as usize).min(max_len);
        device.read_at(offset, length).map_err(MediaError::from)
    }

    fn to_entry(&self, record: &DirectoryRecord) -> DirEntry {
        DirEntry {
            name: self.display_name(record).to_string(),
            is_dir: record.is_directory(),
            size: record.data_length as u64,
        }
    }
}

/// Splits on `/` and `\`, dropping empty components.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split(['/', '\\'])
        .filter(|component| !component.is_empty() && *component != ".")
        .collect()
}
