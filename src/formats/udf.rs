//! UDF volume recognition and volume identifiers
//!
//! Only the structures needed to recognise a UDF volume and read its
//! label are decoded: the volume recognition sequence, the anchor volume
//! descriptor pointer and the primary / logical volume descriptors.

use super::{FormatError, decode_ucs2_be, ensure_len};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

/// Sector holding the anchor volume descriptor pointer
pub const ANCHOR_SECTOR: u64 = 256;

const TAG_PRIMARY_VOLUME: u16 = 1;
const TAG_ANCHOR: u16 = 2;
const TAG_LOGICAL_VOLUME: u16 = 6;
const TAG_TERMINATING: u16 = 8;

const RECOGNITION_IDS: [&[u8; 5]; 4] = [b"BEA01", b"NSR02", b"NSR03", b"TEA01"];

/// True when a volume structure descriptor names a UDF recognition id.
pub fn is_recognition_sector(sector: &[u8]) -> bool {
    sector.len() >= 7
        && sector[0] == 0
        && RECOGNITION_IDS
            .iter()
            .any(|id| &sector[1..6] == id.as_slice())
}

/// True for `NSR02`/`NSR03`, the descriptors that actually announce UDF.
pub fn is_nsr_sector(sector: &[u8]) -> bool {
    sector.len() >= 6 && (&sector[1..6] == b"NSR02" || &sector[1..6] == b"NSR03")
}

/// Descriptor tag (ECMA-167 3/7.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorTag {
    pub identifier: u16,
}

impl DescriptorTag {
    pub fn parse(data: &[u8]) -> Result<Self, FormatError> {
        ensure_len(data, 16)?;

        let checksum = data[..16]
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 4)
            .fold(0u8, |acc, (_, b)| acc.wrapping_add(*b));
        if checksum != data[4] {
            return Err(FormatError::BadChecksum("UDF descriptor tag"));
        }

        let identifier = Cursor::new(data).read_u16::<LittleEndian>()?;
        Ok(Self { identifier })
    }
}

/// Extent of the main volume descriptor sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtentAd {
    pub length: u32,
    pub location: u32,
}

/// Reads the main volume descriptor sequence extent from the anchor.
pub fn parse_anchor(sector: &[u8]) -> Result<ExtentAd, FormatError> {
    ensure_len(sector, 24)?;

    let tag = DescriptorTag::parse(sector)?;
    if tag.identifier != TAG_ANCHOR {
        return Err(FormatError::BadSignature("UDF anchor volume descriptor pointer"));
    }

    let mut cursor = Cursor::new(sector);
    cursor.set_position(16);
    let length = cursor.read_u32::<LittleEndian>()?;
    let location = cursor.read_u32::<LittleEndian>()?;

    Ok(ExtentAd { length, location })
}

/// Identifiers gathered from the volume descriptor sequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UdfVolumeIds {
    pub volume_id: String,
    pub logical_volume_id: String,
}

impl UdfVolumeIds {
    /// The label callers should show: logical volume id, then primary.
    pub fn label(&self) -> &str {
        if self.logical_volume_id.is_empty() {
            &self.volume_id
        } else {
            &self.logical_volume_id
        }
    }
}

/// Walks the descriptor sequence sectors collecting volume identifiers.
///
/// Sectors with a bad tag are skipped; the walk ends at the terminating
/// descriptor or when the input runs out.
pub fn parse_volume_sequence(sectors: &[u8], sector_size: usize) -> UdfVolumeIds {
    let mut ids = UdfVolumeIds::default();

    for sector in sectors.chunks(sector_size) {
        let Ok(tag) = DescriptorTag::parse(sector) else {
            continue;
        };

        match tag.identifier {
            TAG_PRIMARY_VOLUME if sector.len() >= 56 => {
                ids.volume_id = decode_dstring(&sector[24..56]);
            }
            TAG_LOGICAL_VOLUME if sector.len() >= 212 => {
                ids.logical_volume_id = decode_dstring(&sector[84..212]);
            }
            TAG_TERMINATING => break,
            _ => {}
        }
    }

    ids
}

/// Decodes an OSTA compressed unicode dstring.
///
/// Byte 0 is the compression id, the last byte the used length.
pub fn decode_dstring(field: &[u8]) -> String {
    if field.len() < 2 {
        return String::new();
    }

    let used = (field[field.len() - 1] as usize).min(field.len() - 1);
    if used == 0 {
        return String::new();
    }
    let body = &field[1..used];

    match field[0] {
        8 => body
            .iter()
            .map(|&b| b as char)
            .collect::<String>()
            .trim_end_matches(['\0', ' '])
            .to_string(),
        16 => decode_ucs2_be(body),
        _ => String::new(),
    }
}
