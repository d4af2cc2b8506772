//! Media reader
//!
//! Opens an image, probes its byte stream for optical volume structures
//! and partition tables, and classifies the container format. The file
//! extension is never consulted.

use super::handle::MediaHandle;
use super::iso_tree::IsoTree;
use crate::domain::entities::MediaFormat;
use crate::domain::repositories::{MediaError, VolumeInfo};
use crate::formats::iso9660::{
    self, DescriptorType, MAX_VOLUME_DESCRIPTORS, SECTOR_SIZE, VOLUME_DESCRIPTOR_START,
    VolumeDescriptor,
};
use crate::formats::{gpt, mbr, udf};
use crate::infrastructure::block_device::DeviceReader;
use std::path::Path;

/// Descriptor sequences longer than this are not walked further
const MAX_UDF_SEQUENCE_SECTORS: usize = 64;

/// What the probes found
#[derive(Debug, Default)]
struct Probe {
    primary: Option<VolumeDescriptor>,
    joliet: Option<VolumeDescriptor>,
    udf: bool,
    udf_ids: Option<udf::UdfVolumeIds>,
    partitioned: bool,
}

impl Probe {
    fn format(&self) -> MediaFormat {
        match (self.primary.is_some(), self.udf, self.partitioned) {
            (true, _, true) => MediaFormat::Hybrid,
            (true, true, false) => MediaFormat::Udf,
            (true, false, false) => MediaFormat::Iso9660,
            (false, true, _) => MediaFormat::Udf,
            (false, false, true) => MediaFormat::Raw,
            (false, false, false) => MediaFormat::Unknown,
        }
    }
}

/// Opens a disk image or device and identifies its container format.
///
/// A source nothing recognises, including an empty or truncated one, is
/// `UnrecognizedFormat`; a source that cannot be opened is `Unreadable`.
pub fn open(path: impl AsRef<Path>) -> Result<MediaHandle, MediaError> {
    let path = path.as_ref();
    let device = DeviceReader::open(path).map_err(MediaError::from)?;
    tracing::debug!(
        "Opened {} ({} bytes, mmap: {})",
        path.display(),
        device.size(),
        device.is_mmap()
    );

    let probe = probe(&device)?;
    let format = probe.format();
    if format == MediaFormat::Unknown {
        tracing::debug!("No recognisable structure in {}", path.display());
        return Err(MediaError::UnrecognizedFormat);
    }

    let volume = volume_info(&probe);

    let tree = match (&probe.joliet, &probe.primary) {
        (Some(svd), _) => Some(IsoTree::joliet(svd.root.clone(), svd.block_size())),
        (None, Some(pvd)) => Some(IsoTree::primary(&device, pvd.root.clone(), pvd.block_size())?),
        (None, None) => None,
    };

    tracing::debug!(
        "Classified {} as {} (file view: {:?})",
        path.display(),
        format,
        tree.as_ref().map(IsoTree::names)
    );

    Ok(MediaHandle::new(
        device,
        path.to_path_buf(),
        format,
        volume,
        tree,
    ))
}

fn probe(device: &DeviceReader) -> Result<Probe, MediaError> {
    let mut probe = Probe::default();
    probe_volume_descriptors(device, &mut probe)?;
    if probe.udf {
        probe.udf_ids = probe_udf_identifiers(device)?;
    }
    probe.partitioned = probe_partition_table(device)?;
    Ok(probe)
}

/// Reads `length` bytes, mapping a read past the end to `None`.
fn read_optional(
    device: &DeviceReader,
    offset: u64,
    length: usize,
) -> Result<Option<Vec<u8>>, MediaError> {
    match device.read_at(offset, length).map_err(MediaError::from) {
        Ok(data) => Ok(Some(data)),
        Err(MediaError::OutOfRange { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Walks sector 16 onward: ISO9660 descriptors up to the set terminator,
/// then (or instead) the UDF volume recognition sequence.
fn probe_volume_descriptors(device: &DeviceReader, probe: &mut Probe) -> Result<(), MediaError> {
    let mut terminated = false;

    for index in 0..MAX_VOLUME_DESCRIPTORS {
        let offset = (VOLUME_DESCRIPTOR_START + index) * SECTOR_SIZE as u64;
        let Some(sector) = read_optional(device, offset, SECTOR_SIZE)? else {
            break;
        };

        if udf::is_recognition_sector(&sector) {
            probe.udf |= udf::is_nsr_sector(&sector);
            continue;
        }

        match iso9660::descriptor_type(&sector) {
            Some(_) if terminated => break,
            Some(DescriptorType::Terminator) => terminated = true,
            Some(DescriptorType::Primary) if probe.primary.is_none() => {
                match VolumeDescriptor::parse(&sector) {
                    Ok(pvd) => probe.primary = Some(pvd),
                    Err(e) => tracing::warn!("Ignoring malformed primary volume descriptor: {}", e),
                }
            }
            Some(DescriptorType::Supplementary) if probe.joliet.is_none() => {
                if let Ok(svd) = VolumeDescriptor::parse(&sector) {
                    if svd.joliet {
                        probe.joliet = Some(svd);
                    }
                }
            }
            Some(_) => {}
            None => break,
        }
    }

    // Joliet without a primary descriptor is not a usable ISO9660 volume
    if probe.primary.is_none() {
        probe.joliet = None;
    }

    Ok(())
}

fn probe_udf_identifiers(device: &DeviceReader) -> Result<Option<udf::UdfVolumeIds>, MediaError> {
    let anchor_offset = udf::ANCHOR_SECTOR * SECTOR_SIZE as u64;
    let Some(anchor) = read_optional(device, anchor_offset, SECTOR_SIZE)? else {
        return Ok(None);
    };

    let extent = match udf::parse_anchor(&anchor) {
        Ok(extent) => extent,
        Err(e) => {
            tracing::debug!("UDF anchor not usable: {}", e);
            return Ok(None);
        }
    };

    let sectors = (extent.length as usize / SECTOR_SIZE).clamp(1, MAX_UDF_SEQUENCE_SECTORS);
    let offset = extent.location as u64 * SECTOR_SIZE as u64;
    let Some(sequence) = read_optional(device, offset, sectors * SECTOR_SIZE)? else {
        return Ok(None);
    };

    Ok(Some(udf::parse_volume_sequence(&sequence, SECTOR_SIZE)))
}

/// True when sector 0 holds a populated MBR or LBA 1 a GPT header.
fn probe_partition_table(device: &DeviceReader) -> Result<bool, MediaError> {
    let Some(sector) = read_optional(device, 0, mbr::MBR_SIZE)? else {
        return Ok(false);
    };
    if mbr::MasterBootRecord::parse(&sector).is_ok_and(|table| table.has_partitions()) {
        return Ok(true);
    }

    let Some(header) = read_optional(device, mbr::MBR_SIZE as u64, mbr::MBR_SIZE)? else {
        return Ok(false);
    };
    Ok(gpt::GptHeader::parse(&header).is_ok())
}

fn volume_info(probe: &Probe) -> Option<VolumeInfo> {
    if let Some(pvd) = &probe.primary {
        return Some(VolumeInfo {
            volume_id: pvd.volume_id.clone(),
            system_id: pvd.system_id.clone(),
            publisher_id: pvd.publisher_id.clone(),
            application_id: pvd.application_id.clone(),
        });
    }

    probe.udf_ids.as_ref().map(|ids| VolumeInfo {
        volume_id: ids.label().to_string(),
        ..Default::default()
    })
}
