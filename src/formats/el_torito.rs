//! El Torito boot record and boot catalog
//!
//! The boot record volume descriptor points at the boot catalog, a list of
//! 32-byte entries: a validation entry, the initial/default entry, then
//! optional section headers each followed by their section entries.

use super::{FormatError, ensure_len};
use byteorder::{LittleEndian, ReadBytesExt};
use serde::Serialize;
use std::fmt;
use std::io::Cursor;

pub const BOOT_SYSTEM_ID: &[u8] = b"EL TORITO SPECIFICATION";

const CATALOG_POINTER_OFFSET: usize = 0x47;
const ENTRY_SIZE: usize = 32;

const HEADER_VALIDATION: u8 = 0x01;
const HEADER_SECTION_MORE: u8 = 0x90;
const HEADER_SECTION_FINAL: u8 = 0x91;
const INDICATOR_BOOTABLE: u8 = 0x88;
const EXTENSION_INDICATOR: u8 = 0x44;

/// Platform identifier of a validation entry or section header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BootPlatform {
    X86,
    PowerPc,
    Mac,
    Efi,
    Other(u8),
}

impl BootPlatform {
    pub fn from_id(id: u8) -> Self {
        match id {
            0x00 => BootPlatform::X86,
            0x01 => BootPlatform::PowerPc,
            0x02 => BootPlatform::Mac,
            0xEF => BootPlatform::Efi,
            other => BootPlatform::Other(other),
        }
    }
}

impl fmt::Display for BootPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootPlatform::X86 => write!(f, "x86"),
            BootPlatform::PowerPc => write!(f, "PowerPC"),
            BootPlatform::Mac => write!(f, "Mac"),
            BootPlatform::Efi => write!(f, "EFI"),
            BootPlatform::Other(id) => write!(f, "platform 0x{:02X}", id),
        }
    }
}

/// Returns the boot catalog sector if this is an El Torito boot record.
pub fn parse_boot_record(sector: &[u8]) -> Result<u32, FormatError> {
    ensure_len(sector, CATALOG_POINTER_OFFSET + 4)?;

    if sector[0] != 0 || &sector[1..6] != b"CD001" {
        return Err(FormatError::BadSignature("boot record descriptor"));
    }
    if !sector[7..].starts_with(BOOT_SYSTEM_ID) {
        return Err(FormatError::BadSignature("El Torito boot system identifier"));
    }

    let mut cursor = Cursor::new(sector);
    cursor.set_position(CATALOG_POINTER_OFFSET as u64);
    Ok(cursor.read_u32::<LittleEndian>()?)
}

/// One initial/default or section entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootEntry {
    pub platform: BootPlatform,
    pub bootable: bool,
}

impl BootEntry {
    fn parse(entry: &[u8], platform: BootPlatform) -> Self {
        Self {
            platform,
            bootable: entry[0] == INDICATOR_BOOTABLE,
        }
    }
}

/// Parsed boot catalog
#[derive(Debug, Clone)]
pub struct BootCatalog {
    pub platform: BootPlatform,
    pub default_entry: BootEntry,
    pub sections: Vec<BootEntry>,
}

impl BootCatalog {
    /// Parses the catalog, validating the validation entry first.
    ///
    /// `data` should hold the catalog sector (and any following sectors
    /// the caller read). Section parsing stops quietly at the end of data
    /// or at the first entry that is neither a header nor a section entry.
    pub fn parse(data: &[u8]) -> Result<Self, FormatError> {
        ensure_len(data, ENTRY_SIZE * 2)?;

        let validation = &data[..ENTRY_SIZE];
        if validation[0] != HEADER_VALIDATION {
            return Err(FormatError::BadSignature("boot catalog validation header"));
        }
        if validation[30] != 0x55 || validation[31] != 0xAA {
            return Err(FormatError::BadSignature("boot catalog key bytes"));
        }
        if validation_checksum(validation) != 0 {
            return Err(FormatError::BadChecksum("boot catalog validation entry"));
        }

        let platform = BootPlatform::from_id(validation[1]);
        let default_entry = BootEntry::parse(&data[ENTRY_SIZE..ENTRY_SIZE * 2], platform);

        let mut sections = Vec::new();
        let mut pos = ENTRY_SIZE * 2;

        'headers: while pos + ENTRY_SIZE <= data.len() {
            let header = &data[pos..pos + ENTRY_SIZE];
            let is_final = match header[0] {
                HEADER_SECTION_MORE => false,
                HEADER_SECTION_FINAL => true,
                _ => break,
            };
            let mut cursor = Cursor::new(header);
            cursor.set_position(1);
            let section_platform = BootPlatform::from_id(cursor.read_u8()?);
            let count = cursor.read_u16::<LittleEndian>()? as usize;
            pos += ENTRY_SIZE;

            let mut seen = 0;
            while seen < count {
                if pos + ENTRY_SIZE > data.len() {
                    break 'headers;
                }
                let entry = &data[pos..pos + ENTRY_SIZE];
                pos += ENTRY_SIZE;
                if entry[0] == EXTENSION_INDICATOR {
                    continue;
                }
                sections.push(BootEntry::parse(entry, section_platform));
                seen += 1;
            }

            if is_final {
                break;
            }
        }

        Ok(Self {
            platform,
            default_entry,
            sections,
        })
    }

    /// Every entry carrying the 0x88 boot indicator, default entry first.
    pub fn bootable_entries(&self) -> impl Iterator<Item = &BootEntry> {
        std::iter::once(&self.default_entry)
            .chain(self.sections.iter())
            .filter(|entry| entry.bootable)
    }
}

/// Sum of the sixteen little-endian words of the validation entry.
///
/// A well-formed entry sums to zero.
pub fn validation_checksum(entry: &[u8]) -> u16 {
    let mut cursor = Cursor::new(&entry[..ENTRY_SIZE.min(entry.len())]);
    let mut sum = 0u16;
    while let Ok(word) = cursor.read_u16::<LittleEndian>() {
        sum = sum.wrapping_add(word);
    }
    sum
}
