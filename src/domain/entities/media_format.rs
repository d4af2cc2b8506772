//! Media container format

use serde::Serialize;
use std::fmt;

/// Container format detected by probing the byte stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaFormat {
    /// ISO9660 optical image
    Iso9660,
    /// UDF optical image, including ISO9660/UDF bridge discs
    Udf,
    /// Partitioned raw block image
    Raw,
    /// ISO9660 image that also carries a partition table
    Hybrid,
    /// Placeholder; never produced by a successful open
    #[default]
    Unknown,
}

impl MediaFormat {
    /// Sector size the format is addressed in
    pub fn sector_size(&self) -> u32 {
        match self {
            MediaFormat::Raw => 512,
            _ => 2048,
        }
    }

    /// Whether the format carries optical volume descriptors
    pub fn is_optical(&self) -> bool {
        matches!(
            self,
            MediaFormat::Iso9660 | MediaFormat::Udf | MediaFormat::Hybrid
        )
    }

    /// Whether the format carries an MBR/GPT partition table
    pub fn is_partitioned(&self) -> bool {
        matches!(self, MediaFormat::Raw | MediaFormat::Hybrid)
    }

    pub fn name(&self) -> &'static str {
        match self {
            MediaFormat::Iso9660 => "ISO9660",
            MediaFormat::Udf => "UDF",
            MediaFormat::Raw => "RAW",
            MediaFormat::Hybrid => "HYBRID",
            MediaFormat::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
