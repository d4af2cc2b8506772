//! ISO9660 volume descriptors and directory records
//!
//! Volume descriptors start at sector 16 and run until a set terminator
//! (type 255). Every descriptor is one 2048-byte sector beginning with a
//! type byte, the `CD001` identifier and a version byte.

use super::{FormatError, decode_padded, decode_ucs2_be, ensure_len};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

/// ISO9660 logical sector size
pub const SECTOR_SIZE: usize = 2048;

/// First sector of the volume descriptor set
pub const VOLUME_DESCRIPTOR_START: u64 = 16;

/// Upper bound on descriptors walked before giving up on a terminator
pub const MAX_VOLUME_DESCRIPTORS: u64 = 64;

pub const STANDARD_IDENTIFIER: &[u8; 5] = b"CD001";

const ROOT_RECORD_OFFSET: usize = 156;
const DIRECTORY_RECORD_MIN: usize = 34;

/// Joliet escape sequences (UCS-2 level 1, 2 and 3)
const JOLIET_ESCAPES: [&[u8; 3]; 3] = [b"%/@", b"%/C", b"%/E"];

/// Type code of a volume descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorType {
    BootRecord,
    Primary,
    Supplementary,
    Partition,
    Terminator,
    Other(u8),
}

impl DescriptorType {
    fn from_code(code: u8) -> Self {
        match code {
            0 => DescriptorType::BootRecord,
            1 => DescriptorType::Primary,
            2 => DescriptorType::Supplementary,
            3 => DescriptorType::Partition,
            255 => DescriptorType::Terminator,
            other => DescriptorType::Other(other),
        }
    }
}

/// Returns the descriptor type if the sector carries a valid ISO9660 header.
pub fn descriptor_type(sector: &[u8]) -> Option<DescriptorType> {
    if sector.len() < 7 {
        return None;
    }
    if &sector[1..6] != STANDARD_IDENTIFIER || sector[6] != 1 {
        return None;
    }
    Some(DescriptorType::from_code(sector[0]))
}

/// Primary or supplementary volume descriptor (ECMA-119 8.4 / 8.5)
#[derive(Debug, Clone)]
pub struct VolumeDescriptor {
    pub kind: DescriptorType,
    pub system_id: String,
    pub volume_id: String,
    pub volume_space_size: u32,
    pub logical_block_size: u16,
    pub publisher_id: String,
    pub application_id: String,
    pub root: DirectoryRecord,
    /// True for a supplementary descriptor announcing Joliet UCS-2 names
    pub joliet: bool,
}

impl VolumeDescriptor {
    pub fn parse(sector: &[u8]) -> Result<Self, FormatError> {
        ensure_len(sector, SECTOR_SIZE)?;

        let kind = descriptor_type(sector).ok_or(FormatError::BadSignature("volume descriptor"))?;
        if !matches!(kind, DescriptorType::Primary | DescriptorType::Supplementary) {
            return Err(FormatError::Invalid(format!(
                "descriptor type {:?} has no volume fields",
                kind
            )));
        }

        let joliet = kind == DescriptorType::Supplementary
            && JOLIET_ESCAPES
                .iter()
                .any(|escape| sector[88..120].windows(3).any(|w| w == escape.as_slice()));

        let text = |range: std::ops::Range<usize>| {
            if joliet {
                decode_ucs2_be(&sector[range])
            } else {
                decode_padded(&sector[range])
            }
        };

        let mut cursor = Cursor::new(sector);

        cursor.set_position(80);
        let volume_space_size = cursor.read_u32::<LittleEndian>()?;

        cursor.set_position(128);
        let logical_block_size = cursor.read_u16::<LittleEndian>()?;

        let root = DirectoryRecord::parse(
            &sector[ROOT_RECORD_OFFSET..ROOT_RECORD_OFFSET + DIRECTORY_RECORD_MIN],
            false,
        )?;

        Ok(Self {
            kind,
            system_id: text(8..40),
            volume_id: text(40..72),
            volume_space_size,
            logical_block_size,
            publisher_id: text(318..446),
            application_id: text(574..702),
            root,
            joliet,
        })
    }

    /// Logical block size, falling back to the sector size when unset.
    pub fn block_size(&self) -> u32 {
        match self.logical_block_size {
            0 => SECTOR_SIZE as u32,
            size => size as u32,
        }
    }
}

/// A single directory record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRecord {
    pub extent_lba: u32,
    pub data_length: u32,
    pub flags: u8,
    pub name: String,
    /// Rock Ridge alternate name, when an `NM` entry is present
    pub rock_ridge_name: Option<String>,
    /// True when the system use area opens with the SUSP `SP` indicator
    pub has_susp_indicator: bool,
}

impl DirectoryRecord {
    const FLAG_DIRECTORY: u8 = 0x02;

    /// Parses one record. `joliet` selects UCS-2 decoding of the identifier.
    pub fn parse(data: &[u8], joliet: bool) -> Result<Self, FormatError> {
        ensure_len(data, DIRECTORY_RECORD_MIN - 1)?;

        let length = data[0] as usize;
        if length < DIRECTORY_RECORD_MIN - 1 || length > data.len() {
            return Err(FormatError::Invalid(format!(
                "directory record length {}",
                length
            )));
        }

        let name_len = data[32] as usize;
        if 33 + name_len > length {
            return Err(FormatError::Invalid(format!(
                "identifier length {} overruns record of {}",
                name_len, length
            )));
        }

        let mut cursor = Cursor::new(data);

        cursor.set_position(2);
        let extent_lba = cursor.read_u32::<LittleEndian>()?;

        cursor.set_position(10);
        let data_length = cursor.read_u32::<LittleEndian>()?;

        cursor.set_position(25);
        let flags = cursor.read_u8()?;
        let raw_name = &data[33..33 + name_len];

        let name = match raw_name {
            [0x00] => ".".to_string(),
            [0x01] => "..".to_string(),
            _ if joliet => normalize_name(&decode_ucs2_be(raw_name)),
            _ => normalize_name(&String::from_utf8_lossy(raw_name)),
        };

        let padding = if name_len % 2 == 0 { 1 } else { 0 };
        let system_use_start = (33 + name_len + padding).min(length);
        let system_use = &data[system_use_start..length];

        Ok(Self {
            extent_lba,
            data_length,
            flags,
            name,
            rock_ridge_name: rock_ridge_name(system_use),
            has_susp_indicator: system_use.len() >= 7
                && &system_use[0..2] == b"SP"
                && system_use[4] == 0xBE
                && system_use[5] == 0xEF,
        })
    }

    pub fn is_directory(&self) -> bool {
        self.flags & Self::FLAG_DIRECTORY != 0
    }

    /// True for the `.` and `..` self/parent entries
    pub fn is_special(&self) -> bool {
        self.name == "." || self.name == ".."
    }

    /// The name the record should be looked up by.
    pub fn display_name(&self, use_rock_ridge: bool) -> &str {
        match (&self.rock_ridge_name, use_rock_ridge) {
            (Some(name), true) => name,
            _ => &self.name,
        }
    }
}

/// Strips the `;version` suffix and the trailing dot of extension-less names.
pub fn normalize_name(raw: &str) -> String {
    let without_version = match raw.rfind(';') {
        Some(pos) => &raw[..pos],
        None => raw,
    };
    without_version.trim_end_matches('.').to_string()
}

/// Walks the System Use Sharing Protocol entries looking for Rock Ridge `NM`.
fn rock_ridge_name(system_use: &[u8]) -> Option<String> {
    let mut name = String::new();
    let mut found = false;
    let mut pos = 0usize;

    while pos + 4 <= system_use.len() {
        let signature = &system_use[pos..pos + 2];
        let entry_len = system_use[pos + 2] as usize;
        if entry_len < 4 || pos + entry_len > system_use.len() {
            break;
        }

        if signature == b"NM" && entry_len >= 5 {
            let flags = system_use[pos + 4];
            // CURRENT (0x02) and PARENT (0x04) carry no name bytes
            if flags & 0x06 == 0 {
                name.push_str(&String::from_utf8_lossy(&system_use[pos + 5..pos + entry_len]));
                found = true;
            }
        } else if signature == b"ST" {
            break;
        }

        pos += entry_len;
    }

    if found && !name.is_empty() { Some(name) } else { None }
}

/// Splits a directory extent into records.
///
/// Records never straddle a sector boundary; a zero length byte pads the
/// rest of the sector. Malformed records end the walk early.
pub fn parse_directory(extent: &[u8], joliet: bool) -> Vec<DirectoryRecord> {
    let mut records = Vec::new();
    let mut pos = 0usize;

    while pos < extent.len() {
        let length = extent[pos] as usize;
        if length == 0 {
            let next_sector = (pos / SECTOR_SIZE + 1) * SECTOR_SIZE;
            pos = next_sector;
            continue;
        }

        if pos + length > extent.len() {
            break;
        }

        match DirectoryRecord::parse(&extent[pos..pos + length], joliet) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Stopping directory walk at byte {}: {}", pos, e);
                break;
            }
        }

        pos += length;
    }

    records
}
