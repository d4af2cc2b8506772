//! Fingerprint extractor
//!
//! Collects the identifying evidence of a medium: volume identifiers,
//! which well-known marker files exist and the contents of version files.

use crate::domain::entities::Fingerprint;
use crate::domain::repositories::{MediaError, MediaSource};

/// Marker paths probed on every medium
pub const MARKER_FILES: &[&str] = &[
    // Windows
    "sources/install.wim",
    "sources/install.esd",
    "sources/boot.wim",
    "sources/idwbinfo.txt",
    "setup.exe",
    "bootmgr",
    "i386/txtsetup.sif",
    "win51",
    // Linux
    ".disk/info",
    ".treeinfo",
    "casper/vmlinuz",
    "live/vmlinuz",
    "isolinux/isolinux.cfg",
    "boot/grub/grub.cfg",
    "images/pxeboot/vmlinuz",
    "arch/boot/x86_64/vmlinuz-linux",
    "boot/x86_64/loader/linux",
    "README.diskdefines",
    // BSD
    "bin/freebsd-version",
    "boot/loader",
    "bsd.rd",
    "usr/mdec/boot",
    // EFI
    "efi/boot/bootx64.efi",
    "efi/boot/bootaa64.efi",
];

/// Files whose lines are collected as version strings, in probe order
pub const VERSION_FILES: &[&str] = &[
    ".disk/info",
    ".treeinfo",
    "sources/idwbinfo.txt",
    "README.diskdefines",
    "bin/freebsd-version",
];

pub const DEFAULT_MAX_VERSION_FILE_SIZE: usize = 64 * 1024;

pub const MAX_LINES_PER_FILE: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct FingerprintExtractor {
    max_version_file_size: usize,
}

impl Default for FingerprintExtractor {
    fn default() -> Self {
        Self {
            max_version_file_size: DEFAULT_MAX_VERSION_FILE_SIZE,
        }
    }
}

impl FingerprintExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_version_file_size(mut self, size: usize) -> Self {
        self.max_version_file_size = size;
        self
    }

    /// Extracts the fingerprint. Only a reader I/O failure is an error.
    pub fn extract(&self, source: &dyn MediaSource) -> Result<Fingerprint, MediaError> {
        let mut fingerprint = Fingerprint::default();

        if let Some(info) = source.volume_info() {
            fingerprint.volume_label = info.volume_id.clone();
            fingerprint.system_id = info.system_id.clone();
            fingerprint.publisher_id = info.publisher_id.clone();
            fingerprint.application_id = info.application_id.clone();
        }

        for path in MARKER_FILES {
            match source.stat(path) {
                Ok(entry) if !entry.is_dir => fingerprint.add_marker(path),
                Ok(_) => {}
                Err(MediaError::Unreadable(detail)) => return Err(MediaError::Unreadable(detail)),
                Err(_) => {}
            }
        }

        for path in VERSION_FILES {
            let data = match source.read_file_prefix(path, self.max_version_file_size) {
                Ok(data) => data,
                Err(MediaError::Unreadable(detail)) => return Err(MediaError::Unreadable(detail)),
                Err(_) => continue,
            };
            let lines = version_lines(&data);
            tracing::debug!("{} version line(s) from {}", lines.len(), path);
            fingerprint.version_strings.extend(lines);
        }

        tracing::debug!(
            "Fingerprint: label {:?}, {} marker(s), {} version string(s)",
            fingerprint.volume_label,
            fingerprint.marker_files.len(),
            fingerprint.version_strings.len()
        );

        Ok(fingerprint)
    }
}

/// Usable lines of a version file: trimmed, no blanks, comments or
/// `[section]` headers, at most `MAX_LINES_PER_FILE`.
pub fn version_lines(data: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(data)
        .lines()
        .map(|line| line.trim_matches(|c: char| c.is_whitespace() || c == '\0'))
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with('#') && !line.starts_with(';'))
        .filter(|line| !(line.starts_with('[') && line.ends_with(']')))
        .take(MAX_LINES_PER_FILE)
        .map(str::to_string)
        .collect()
}
