//! GUID partition table header and entries

use super::{FormatError, ensure_len};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

pub const GPT_SIGNATURE: &[u8; 8] = b"EFI PART";

/// EFI System Partition type GUID C12A7328-F81F-11D2-BA4B-00A0C93EC93B, on-disk order
pub const ESP_TYPE_GUID: [u8; 16] = [
    0x28, 0x73, 0x2A, 0xC1, 0x1F, 0xF8, 0xD2, 0x11, 0xBA, 0x4B, 0x00, 0xA0, 0xC9, 0x3E, 0xC9, 0x3B,
];

/// Upper bound on entries read from a header, regardless of what it claims
pub const MAX_ENTRIES: u32 = 256;

/// Largest partition entry accepted; real tables use 128 bytes
pub const MAX_ENTRY_SIZE: u32 = 4096;

const MIN_ENTRY_SIZE: u32 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GptHeader {
    pub entries_lba: u64,
    pub entry_count: u32,
    pub entry_size: u32,
}

impl GptHeader {
    pub fn parse(sector: &[u8]) -> Result<Self, FormatError> {
        ensure_len(sector, 92)?;

        if &sector[0..8] != GPT_SIGNATURE {
            return Err(FormatError::BadSignature("GPT header"));
        }

        let mut cursor = Cursor::new(sector);

        cursor.set_position(72);
        let entries_lba = cursor.read_u64::<LittleEndian>()?;
        let entry_count = cursor.read_u32::<LittleEndian>()?;
        let entry_size = cursor.read_u32::<LittleEndian>()?;

        if !(MIN_ENTRY_SIZE..=MAX_ENTRY_SIZE).contains(&entry_size) || entry_size % 8 != 0 {
            return Err(FormatError::Invalid(format!(
                "GPT partition entry size {}",
                entry_size
            )));
        }

        Ok(Self {
            entries_lba,
            entry_count,
            entry_size,
        })
    }

    /// Bytes spanned by the entry array, using the capped entry count.
    ///
    /// Never more than `MAX_ENTRIES * MAX_ENTRY_SIZE`.
    pub fn entries_len(&self) -> usize {
        self.entry_count.min(MAX_ENTRIES) as usize * self.entry_size as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GptEntry {
    pub type_guid: [u8; 16],
}

impl GptEntry {
    pub fn is_esp(&self) -> bool {
        self.type_guid == ESP_TYPE_GUID
    }
}

/// Parses the partition entry array, skipping unused (all-zero type) slots.
pub fn parse_entries(data: &[u8], header: &GptHeader) -> Vec<GptEntry> {
    let size = header.entry_size as usize;
    if size == 0 {
        return Vec::new();
    }

    data.chunks_exact(size)
        .take(header.entry_count.min(MAX_ENTRIES) as usize)
        .filter_map(|raw| {
            let mut type_guid = [0u8; 16];
            Cursor::new(raw).read_exact(&mut type_guid).ok()?;
            if type_guid == [0u8; 16] {
                return None;
            }
            Some(GptEntry { type_guid })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(count: u32) -> Vec<u8> {
        let mut sector = vec![0u8; 512];
        sector[0..8].copy_from_slice(GPT_SIGNATURE);
        sector[8..12].copy_from_slice(&0x0001_0000u32.to_le_bytes());
        sector[24..32].copy_from_slice(&1u64.to_le_bytes());
        sector[72..80].copy_from_slice(&2u64.to_le_bytes());
        sector[80..84].copy_from_slice(&count.to_le_bytes());
        sector[84..88].copy_from_slice(&128u32.to_le_bytes());
        sector
    }

    #[test]
    fn test_parse_header() {
        let parsed = GptHeader::parse(&header(128)).unwrap();
        assert_eq!(parsed.entries_lba, 2);
        assert_eq!(parsed.entry_count, 128);
        assert_eq!(parsed.entries_len(), 128 * 128);
    }

    #[test]
    fn test_header_caps_entry_count() {
        let parsed = GptHeader::parse(&header(u32::MAX)).unwrap();
        assert_eq!(parsed.entries_len(), MAX_ENTRIES as usize * 128);
    }

    #[test]
    fn test_bad_entry_size() {
        let mut sector = header(4);
        sector[84..88].copy_from_slice(&7u32.to_le_bytes());
        assert!(GptHeader::parse(&sector).is_err());
    }

    #[test]
    fn test_oversized_entry_rejected() {
        let mut sector = header(MAX_ENTRIES);
        sector[84..88].copy_from_slice(&(8u32 << 20).to_le_bytes());
        assert!(matches!(
            GptHeader::parse(&sector),
            Err(FormatError::Invalid(_))
        ));

        sector[84..88].copy_from_slice(&MAX_ENTRY_SIZE.to_le_bytes());
        let parsed = GptHeader::parse(&sector).unwrap();
        assert_eq!(parsed.entries_len(), (MAX_ENTRIES * MAX_ENTRY_SIZE) as usize);
    }

    #[test]
    fn test_entries_detect_esp() {
        let parsed = GptHeader::parse(&header(4)).unwrap();
        let mut entries = vec![0u8; 4 * 128];
        entries[0..16].copy_from_slice(&ESP_TYPE_GUID);
        entries[32..40].copy_from_slice(&34u64.to_le_bytes());
        entries[40..48].copy_from_slice(&2081u64.to_le_bytes());
        entries[128] = 0xAF;

        let list = parse_entries(&entries, &parsed);
        assert_eq!(list.len(), 2);
        assert!(list[0].is_esp());
        assert!(!list[1].is_esp());
    }
}
