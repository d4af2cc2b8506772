//! Boot structure analyzer
//!
//! Decides whether a medium is bootable and by which mechanism. Optical
//! formats are checked for an El Torito catalog; partitioned formats for
//! a boot-flagged MBR entry or a GPT EFI System Partition. Hybrid images
//! get both checks, El Torito first.

use crate::domain::entities::{BootEvidence, BootMechanism, BootPlatform};
use crate::domain::repositories::{MediaError, MediaSource};
use crate::formats::el_torito::{self, BootCatalog};
use crate::formats::gpt::{self, GptHeader};
use crate::formats::iso9660::{
    self, DescriptorType, MAX_VOLUME_DESCRIPTORS, SECTOR_SIZE, VOLUME_DESCRIPTOR_START,
};
use crate::formats::mbr::{MBR_SIZE, MasterBootRecord};
use crate::formats::udf;

const LOGICAL_BLOCK: u64 = 512;

/// Boot catalogs larger than this are truncated before parsing
const MAX_CATALOG_SECTORS: usize = 4;

#[derive(Debug, Default, Clone, Copy)]
pub struct BootAnalyzer;

impl BootAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyzes the boot structures of an opened medium.
    ///
    /// Malformed structures yield a non-bootable result; only a failure to
    /// read the medium is an error.
    pub fn analyze(&self, source: &dyn MediaSource) -> Result<BootEvidence, MediaError> {
        let format = source.format();

        if format.is_optical() {
            if let Some(evidence) = self.analyze_el_torito(source)? {
                tracing::debug!("El Torito boot catalog found: {:?}", evidence.platforms);
                return Ok(evidence);
            }
        }

        if format.is_partitioned() {
            if let Some(evidence) = self.analyze_partition_table(source)? {
                tracing::debug!("Partition table boot mechanism: {}", evidence.boot_mechanism);
                return Ok(evidence);
            }
        }

        tracing::debug!("No boot structure found on {} media", format);
        Ok(BootEvidence::not_bootable())
    }

    fn analyze_el_torito(
        &self,
        source: &dyn MediaSource,
    ) -> Result<Option<BootEvidence>, MediaError> {
        let Some(catalog_lba) = self.find_boot_record(source)? else {
            return Ok(None);
        };

        let offset = catalog_lba as u64 * SECTOR_SIZE as u64;
        let available = source.size_bytes().saturating_sub(offset) as usize;
        let length = available.min(SECTOR_SIZE * MAX_CATALOG_SECTORS);
        let Some(data) = tolerate(source.read_range(offset, length))? else {
            tracing::warn!("Boot catalog at sector {} lies outside the media", catalog_lba);
            return Ok(None);
        };

        let catalog = match BootCatalog::parse(&data) {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::warn!("Rejecting boot catalog at sector {}: {}", catalog_lba, e);
                return Ok(None);
            }
        };

        let mut platforms: Vec<BootPlatform> = Vec::new();
        for entry in catalog.bootable_entries() {
            if !platforms.contains(&entry.platform) {
                platforms.push(entry.platform);
            }
        }

        if platforms.is_empty() {
            tracing::debug!("Boot catalog has no entry with the bootable indicator");
            return Ok(None);
        }

        Ok(Some(
            BootEvidence::bootable(BootMechanism::ElTorito).with_platforms(platforms),
        ))
    }

    /// Walks the volume descriptor set looking for the El Torito boot record.
    fn find_boot_record(&self, source: &dyn MediaSource) -> Result<Option<u32>, MediaError> {
        for index in 0..MAX_VOLUME_DESCRIPTORS {
            let offset = (VOLUME_DESCRIPTOR_START + index) * SECTOR_SIZE as u64;
            let Some(sector) = tolerate(source.read_range(offset, SECTOR_SIZE))? else {
                break;
            };

            match iso9660::descriptor_type(&sector) {
                Some(DescriptorType::BootRecord) => match el_torito::parse_boot_record(&sector) {
                    Ok(lba) => return Ok(Some(lba)),
                    Err(e) => {
                        tracing::debug!("Boot record at sector {} skipped: {}", 16 + index, e)
                    }
                },
                Some(DescriptorType::Terminator) => break,
                Some(_) => {}
                // UDF recognition descriptors share the sector range on bridge discs
                None if udf::is_recognition_sector(&sector) => {}
                None => break,
            }
        }

        Ok(None)
    }

    fn analyze_partition_table(
        &self,
        source: &dyn MediaSource,
    ) -> Result<Option<BootEvidence>, MediaError> {
        let Some(sector) = tolerate(source.read_range(0, MBR_SIZE))? else {
            return Ok(None);
        };
        let mbr = match MasterBootRecord::parse(&sector) {
            Ok(mbr) => mbr,
            Err(e) => {
                tracing::debug!("No usable MBR: {}", e);
                return Ok(None);
            }
        };

        if mbr.is_protective() {
            if self.has_esp(source)? {
                return Ok(Some(BootEvidence::bootable(BootMechanism::GptEsp)));
            }
            let flagged = mbr
                .used_partitions()
                .any(|p| p.is_protective() && p.is_active());
            if flagged {
                return Ok(Some(BootEvidence::bootable(BootMechanism::UnknownBootable)));
            }
            return Ok(None);
        }

        if mbr.active_partitions().next().is_some() {
            return Ok(Some(BootEvidence::bootable(BootMechanism::HybridMbr)));
        }

        Ok(None)
    }

    fn has_esp(&self, source: &dyn MediaSource) -> Result<bool, MediaError> {
        let Some(sector) = tolerate(source.read_range(LOGICAL_BLOCK, LOGICAL_BLOCK as usize))?
        else {
            return Ok(false);
        };
        let header = match GptHeader::parse(&sector) {
            Ok(header) => header,
            Err(e) => {
                tracing::warn!("Protective MBR without a usable GPT header: {}", e);
                return Ok(false);
            }
        };

        let Some(offset) = header.entries_lba.checked_mul(LOGICAL_BLOCK) else {
            return Ok(false);
        };
        let Some(entries) = tolerate(source.read_range(offset, header.entries_len()))? else {
            tracing::warn!("GPT entry array at LBA {} is truncated", header.entries_lba);
            return Ok(false);
        };

        Ok(gpt::parse_entries(&entries, &header)
            .iter()
            .any(gpt::GptEntry::is_esp))
    }
}

/// Turns "structure not there" read failures into `None`.
///
/// Reads past the end of the media mean a pointer is bogus, which is a
/// malformed structure rather than an unreadable medium.
fn tolerate<T>(result: Result<T, MediaError>) -> Result<Option<T>, MediaError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(MediaError::OutOfRange { .. }) | Err(MediaError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
