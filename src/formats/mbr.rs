//! Master boot record partition table

use super::{FormatError, ensure_len};
use byteorder::ReadBytesExt;
use std::io::Cursor;

pub const MBR_SIZE: usize = 512;

const TABLE_OFFSET: usize = 446;
const ENTRY_SIZE: usize = 16;
const BOOT_SIGNATURE: [u8; 2] = [0x55, 0xAA];

pub const STATUS_ACTIVE: u8 = 0x80;
pub const TYPE_GPT_PROTECTIVE: u8 = 0xEE;
pub const TYPE_EFI_SYSTEM: u8 = 0xEF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionEntry {
    pub status: u8,
    pub partition_type: u8,
}

impl PartitionEntry {
    fn parse(entry: &[u8]) -> Result<Self, FormatError> {
        let mut cursor = Cursor::new(entry);

        let status = cursor.read_u8()?;

        cursor.set_position(4);
        let partition_type = cursor.read_u8()?;

        Ok(Self {
            status,
            partition_type,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.partition_type == 0
    }

    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }

    pub fn is_protective(&self) -> bool {
        self.partition_type == TYPE_GPT_PROTECTIVE
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterBootRecord {
    pub partitions: [PartitionEntry; 4],
}

impl MasterBootRecord {
    /// Parses sector 0. Requires the `0x55AA` boot signature.
    pub fn parse(sector: &[u8]) -> Result<Self, FormatError> {
        ensure_len(sector, MBR_SIZE)?;

        if sector[510..512] != BOOT_SIGNATURE {
            return Err(FormatError::BadSignature("MBR boot signature"));
        }

        let entry = |index: usize| {
            let start = TABLE_OFFSET + index * ENTRY_SIZE;
            PartitionEntry::parse(&sector[start..start + ENTRY_SIZE])
        };

        let partitions = [entry(0)?, entry(1)?, entry(2)?, entry(3)?];

        // Status bytes other than 0x00/0x80 mean this is a VBR or boot code, not a table
        if partitions
            .iter()
            .any(|p| p.status != 0 && p.status != STATUS_ACTIVE)
        {
            return Err(FormatError::Invalid(
                "partition status byte outside 0x00/0x80".to_string(),
            ));
        }

        Ok(Self { partitions })
    }

    pub fn used_partitions(&self) -> impl Iterator<Item = &PartitionEntry> {
        self.partitions.iter().filter(|p| !p.is_empty())
    }

    pub fn has_partitions(&self) -> bool {
        self.used_partitions().next().is_some()
    }

    /// True when the table holds a GPT protective entry.
    pub fn is_protective(&self) -> bool {
        self.used_partitions().any(PartitionEntry::is_protective)
    }

    /// Boot-flagged entries that are not the GPT protective partition.
    pub fn active_partitions(&self) -> impl Iterator<Item = &PartitionEntry> {
        self.used_partitions()
            .filter(|p| p.is_active() && !p.is_protective())
    }
}
