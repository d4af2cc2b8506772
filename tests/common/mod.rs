//! Test image builders
//!
//! Builds small but structurally valid ISO9660 (optionally El Torito,
//! Joliet, Rock Ridge, UDF bridge, isohybrid MBR) and raw MBR/GPT disk
//! images in memory, plus helpers to write them and signature
//! definitions to a temporary directory.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const SECTOR: usize = 2048;
pub const LBA: usize = 512;

pub const PLATFORM_X86: u8 = 0x00;
pub const PLATFORM_EFI: u8 = 0xEF;

pub const ESP_TYPE_GUID: [u8; 16] = [
    0x28, 0x73, 0x2A, 0xC1, 0x1F, 0xF8, 0xD2, 0x11, 0xBA, 0x4B, 0x00, 0xA0, 0xC9, 0x3E, 0xC9, 0x3B,
];

/// El Torito catalog options
#[derive(Debug, Clone, Copy)]
pub struct CatalogOptions {
    pub platform: u8,
    pub bootable: bool,
    pub valid_checksum: bool,
    /// Extra EFI section after the default entry
    pub efi_section: bool,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            platform: PLATFORM_X86,
            bootable: true,
            valid_checksum: true,
            efi_section: false,
        }
    }
}

#[derive(Default)]
struct DirNode {
    subdirs: BTreeSet<String>,
    files: Vec<(String, usize)>,
}

pub struct IsoBuilder {
    volume_id: String,
    system_id: String,
    publisher_id: String,
    application_id: String,
    files: Vec<(String, Vec<u8>)>,
    boot: Option<CatalogOptions>,
    joliet: bool,
    rock_ridge: bool,
    udf_label: Option<String>,
    hybrid_mbr: bool,
}

impl IsoBuilder {
    pub fn new(volume_id: &str) -> Self {
        Self {
            volume_id: volume_id.to_string(),
            system_id: String::new(),
            publisher_id: String::new(),
            application_id: String::new(),
            files: Vec::new(),
            boot: None,
            joliet: false,
            rock_ridge: false,
            udf_label: None,
            hybrid_mbr: false,
        }
    }

    pub fn system_id(mut self, id: &str) -> Self {
        self.system_id = id.to_string();
        self
    }

    pub fn publisher_id(mut self, id: &str) -> Self {
        self.publisher_id = id.to_string();
        self
    }

    pub fn application_id(mut self, id: &str) -> Self {
        self.application_id = id.to_string();
        self
    }

    pub fn file(mut self, path: &str, data: &[u8]) -> Self {
        self.files.push((path.to_string(), data.to_vec()));
        self
    }

    /// Bootable x86 El Torito catalog
    pub fn el_torito(self) -> Self {
        self.boot(CatalogOptions::default())
    }

    pub fn boot(mut self, options: CatalogOptions) -> Self {
        self.boot = Some(options);
        self
    }

    pub fn joliet(mut self) -> Self {
        self.joliet = true;
        self
    }

    pub fn rock_ridge(mut self) -> Self {
        self.rock_ridge = true;
        self
    }

    pub fn udf(mut self, label: &str) -> Self {
        self.udf_label = Some(label.to_string());
        self
    }

    pub fn hybrid_mbr(mut self) -> Self {
        self.hybrid_mbr = true;
        self
    }

    fn tree(&self) -> BTreeMap<String, DirNode> {
        let mut dirs: BTreeMap<String, DirNode> = BTreeMap::new();
        dirs.insert(String::new(), DirNode::default());

        for (index, (path, _)) in self.files.iter().enumerate() {
            let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
            let Some((file_name, parents)) = components.split_last() else {
                continue;
            };

            let mut parent = String::new();
            for component in parents {
                let child = join(&parent, component);
                dirs.entry(child.clone()).or_default();
                if let Some(node) = dirs.get_mut(&parent) {
                    node.subdirs.insert(component.to_string());
                }
                parent = child;
            }
            if let Some(node) = dirs.get_mut(&parent) {
                node.files.push((file_name.to_string(), index));
            }
        }

        dirs
    }

    pub fn build(&self) -> Vec<u8> {
        let dirs = self.tree();

        let mut next = 16usize;
        let pvd_lba = next;
        next += 1;
        let boot_record_lba = self.boot.map(|_| {
            next += 1;
            next - 1
        });
        let svd_lba = self.joliet.then(|| {
            next += 1;
            next - 1
        });
        let terminator_lba = next;
        next += 1;
        let vrs_lba = self.udf_label.as_ref().map(|_| {
            next += 3;
            next - 3
        });
        let catalog_lba = self.boot.map(|_| {
            next += 2;
            next - 2
        });
        if self.udf_label.is_some() {
            next = next.max(260);
        }

        let mut primary_dirs: BTreeMap<String, usize> = BTreeMap::new();
        for dir in dirs.keys() {
            primary_dirs.insert(dir.clone(), next);
            next += 1;
        }
        let mut joliet_dirs: BTreeMap<String, usize> = BTreeMap::new();
        if self.joliet {
            for dir in dirs.keys() {
                joliet_dirs.insert(dir.clone(), next);
                next += 1;
            }
        }

        let mut file_lbas = Vec::new();
        for (_, data) in &self.files {
            file_lbas.push(next);
            next += data.len().div_ceil(SECTOR).max(1);
        }

        let total = next + 1;
        let mut image = vec![0u8; total * SECTOR];

        // Volume descriptors
        let root_record = dir_record(&[0], primary_dirs[""] as u32, SECTOR as u32, true, &[]);
        write_volume_descriptor(
            &mut image,
            pvd_lba,
            1,
            self,
            total as u32,
            &root_record,
            false,
        );

        if let Some(lba) = svd_lba {
            let root = dir_record(&[0], joliet_dirs[""] as u32, SECTOR as u32, true, &[]);
            write_volume_descriptor(&mut image, lba, 2, self, total as u32, &root, true);
        }

        if let (Some(br), Some(catalog), Some(options)) =
            (boot_record_lba, catalog_lba, self.boot)
        {
            write_boot_record(&mut image, br, catalog);
            write_boot_catalog(&mut image, catalog, catalog + 1, options);
        }

        descriptor_header(&mut image, terminator_lba, 255);

        if let (Some(vrs), Some(label)) = (vrs_lba, &self.udf_label) {
            write_udf_structures(&mut image, vrs, label);
        }

        // Directory trees
        for (dir, node) in &dirs {
            self.write_directory(&mut image, dir, node, &primary_dirs, &file_lbas, false);
            if self.joliet {
                self.write_directory(&mut image, dir, node, &joliet_dirs, &file_lbas, true);
            }
        }

        for ((_, data), lba) in self.files.iter().zip(&file_lbas) {
            let start = lba * SECTOR;
            image[start..start + data.len()].copy_from_slice(data);
        }

        if self.hybrid_mbr {
            let sectors = (image.len() / LBA) as u32;
            write_mbr_entry(&mut image, 0, 0x80, 0x17, 0, sectors);
        }

        image
    }

    fn write_directory(
        &self,
        image: &mut [u8],
        dir: &str,
        node: &DirNode,
        lbas: &BTreeMap<String, usize>,
        file_lbas: &[usize],
        joliet: bool,
    ) {
        let lba = lbas[dir];
        let parent_lba = lbas[&parent_of(dir)];
        let rock_ridge = self.rock_ridge && !joliet;

        let dot_su: Vec<u8> = if rock_ridge && dir.is_empty() {
            vec![b'S', b'P', 7, 1, 0xBE, 0xEF, 0]
        } else {
            Vec::new()
        };

        let mut extent = Vec::new();
        extent.extend(dir_record(&[0], lba as u32, SECTOR as u32, true, &dot_su));
        extent.extend(dir_record(&[1], parent_lba as u32, SECTOR as u32, true, &[]));

        for sub in &node.subdirs {
            let name = self.encode_name(sub, true, joliet);
            let su = if rock_ridge { nm_entry(sub) } else { Vec::new() };
            let child = lbas[&join(dir, sub)];
            extent.extend(dir_record(&name, child as u32, SECTOR as u32, true, &su));
        }

        for (file_name, index) in &node.files {
            let name = self.encode_name(file_name, false, joliet);
            let su = if rock_ridge { nm_entry(file_name) } else { Vec::new() };
            let size = self.files[*index].1.len() as u32;
            extent.extend(dir_record(&name, file_lbas[*index] as u32, size, false, &su));
        }

        assert!(extent.len() <= SECTOR, "test directory {dir:?} overflows a sector");
        let start = lba * SECTOR;
        image[start..start + extent.len()].copy_from_slice(&extent);
    }

    fn encode_name(&self, name: &str, is_dir: bool, joliet: bool) -> Vec<u8> {
        let versioned = if is_dir {
            name.to_string()
        } else {
            format!("{};1", name)
        };

        if joliet {
            return ucs2(&versioned);
        }

        let mangled: String = name
            .chars()
            .map(|c| match c {
                'a'..='z' => c.to_ascii_uppercase(),
                'A'..='Z' | '0'..='9' | '.' | '_' => c,
                '-' if !self.rock_ridge => c,
                _ => '_',
            })
            .collect();
        if is_dir {
            mangled.into_bytes()
        } else {
            format!("{};1", mangled).into_bytes()
        }
    }

    /// Builds the image and writes it into a fresh temporary directory.
    pub fn write(&self) -> (TempDir, PathBuf) {
        write_image("image.iso", &self.build())
    }
}

fn join(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{}/{}", parent, child)
    }
}

fn parent_of(dir: &str) -> String {
    match dir.rfind('/') {
        Some(pos) => dir[..pos].to_string(),
        None => String::new(),
    }
}

fn ucs2(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(|u| u.to_be_bytes()).collect()
}

fn nm_entry(name: &str) -> Vec<u8> {
    let mut entry = vec![b'N', b'M', (5 + name.len()) as u8, 1, 0];
    entry.extend_from_slice(name.as_bytes());
    entry
}

pub fn dir_record(name: &[u8], lba: u32, size: u32, is_dir: bool, su: &[u8]) -> Vec<u8> {
    let pad = if name.len() % 2 == 0 { 1 } else { 0 };
    let mut len = 33 + name.len() + pad + su.len();
    if len % 2 == 1 {
        len += 1;
    }

    let mut record = vec![0u8; len];
    record[0] = len as u8;
    record[2..6].copy_from_slice(&lba.to_le_bytes());
    record[6..10].copy_from_slice(&lba.to_be_bytes());
    record[10..14].copy_from_slice(&size.to_le_bytes());
    record[14..18].copy_from_slice(&size.to_be_bytes());
    record[25] = if is_dir { 0x02 } else { 0x00 };
    record[28] = 1;
    record[31] = 1;
    record[32] = name.len() as u8;
    record[33..33 + name.len()].copy_from_slice(name);
    let su_start = 33 + name.len() + pad;
    record[su_start..su_start + su.len()].copy_from_slice(su);
    record
}

fn descriptor_header(image: &mut [u8], lba: usize, kind: u8) {
    let start = lba * SECTOR;
    image[start] = kind;
    image[start + 1..start + 6].copy_from_slice(b"CD001");
    image[start + 6] = 1;
}

fn put_text(image: &mut [u8], start: usize, width: usize, text: &str, joliet: bool) {
    let bytes = if joliet {
        ucs2(text)
    } else {
        let mut padded = text.as_bytes().to_vec();
        padded.resize(width, b' ');
        padded
    };
    let len = bytes.len().min(width);
    image[start..start + len].copy_from_slice(&bytes[..len]);
}

fn write_volume_descriptor(
    image: &mut [u8],
    lba: usize,
    kind: u8,
    builder: &IsoBuilder,
    total_sectors: u32,
    root_record: &[u8],
    joliet: bool,
) {
    descriptor_header(image, lba, kind);
    let s = lba * SECTOR;

    put_text(image, s + 8, 32, &builder.system_id, joliet);
    put_text(image, s + 40, 32, &builder.volume_id, joliet);
    image[s + 80..s + 84].copy_from_slice(&total_sectors.to_le_bytes());
    image[s + 84..s + 88].copy_from_slice(&total_sectors.to_be_bytes());
    if joliet {
        image[s + 88..s + 91].copy_from_slice(b"%/E");
    }
    image[s + 120..s + 122].copy_from_slice(&1u16.to_le_bytes());
    image[s + 122..s + 124].copy_from_slice(&1u16.to_be_bytes());
    image[s + 124..s + 126].copy_from_slice(&1u16.to_le_bytes());
    image[s + 126..s + 128].copy_from_slice(&1u16.to_be_bytes());
    image[s + 128..s + 130].copy_from_slice(&(SECTOR as u16).to_le_bytes());
    image[s + 130..s + 132].copy_from_slice(&(SECTOR as u16).to_be_bytes());
    image[s + 156..s + 156 + root_record.len()].copy_from_slice(root_record);
    put_text(image, s + 318, 128, &builder.publisher_id, joliet);
    put_text(image, s + 574, 128, &builder.application_id, joliet);
    image[s + 881] = 1;
}

fn write_boot_record(image: &mut [u8], lba: usize, catalog_lba: usize) {
    descriptor_header(image, lba, 0);
    let s = lba * SECTOR;
    let id = b"EL TORITO SPECIFICATION";
    image[s + 7..s + 7 + id.len()].copy_from_slice(id);
    image[s + 0x47..s + 0x4B].copy_from_slice(&(catalog_lba as u32).to_le_bytes());
}

pub fn validation_entry(platform: u8, valid_checksum: bool) -> [u8; 32] {
    let mut entry = [0u8; 32];
    entry[0] = 0x01;
    entry[1] = platform;
    entry[4..15].copy_from_slice(b"DELPHI TEST");
    entry[30] = 0x55;
    entry[31] = 0xAA;
    let sum = entry
        .chunks_exact(2)
        .fold(0u16, |acc, w| acc.wrapping_add(u16::from_le_bytes([w[0], w[1]])));
    let fix = 0u16.wrapping_sub(sum);
    let checksum = if valid_checksum { fix } else { fix.wrapping_add(1) };
    entry[28..30].copy_from_slice(&checksum.to_le_bytes());
    entry
}

fn write_boot_catalog(
    image: &mut [u8],
    lba: usize,
    boot_image_lba: usize,
    options: CatalogOptions,
) {
    let s = lba * SECTOR;
    image[s..s + 32].copy_from_slice(&validation_entry(options.platform, options.valid_checksum));

    let default = s + 32;
    image[default] = if options.bootable { 0x88 } else { 0x00 };
    image[default + 6..default + 8].copy_from_slice(&4u16.to_le_bytes());
    image[default + 8..default + 12].copy_from_slice(&(boot_image_lba as u32).to_le_bytes());

    if options.efi_section {
        let header = s + 64;
        image[header] = 0x91;
        image[header + 1] = PLATFORM_EFI;
        image[header + 2..header + 4].copy_from_slice(&1u16.to_le_bytes());
        let entry = s + 96;
        image[entry] = 0x88;
        image[entry + 8..entry + 12].copy_from_slice(&(boot_image_lba as u32).to_le_bytes());
    }

    // Boot image: a plausible boot sector
    let b = boot_image_lba * SECTOR;
    image[b + 510] = 0x55;
    image[b + 511] = 0xAA;
}

fn seal_tag(image: &mut [u8], start: usize) {
    let sum = image[start..start + 16]
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != 4)
        .fold(0u8, |acc, (_, b)| acc.wrapping_add(*b));
    image[start + 4] = sum;
}

fn udf_tag(image: &mut [u8], lba: usize, identifier: u16) {
    let s = lba * SECTOR;
    image[s..s + 2].copy_from_slice(&identifier.to_le_bytes());
    image[s + 2..s + 4].copy_from_slice(&2u16.to_le_bytes());
    image[s + 12..s + 16].copy_from_slice(&(lba as u32).to_le_bytes());
}

fn dstring(image: &mut [u8], start: usize, width: usize, text: &str) {
    image[start] = 8;
    image[start + 1..start + 1 + text.len()].copy_from_slice(text.as_bytes());
    image[start + width - 1] = (text.len() + 1) as u8;
}

/// Volume recognition sequence at `vrs_lba`, anchor at 256, descriptor
/// sequence at 257..=259.
fn write_udf_structures(image: &mut [u8], vrs_lba: usize, label: &str) {
    for (i, id) in [b"BEA01", b"NSR02", b"TEA01"].iter().enumerate() {
        let s = (vrs_lba + i) * SECTOR;
        image[s] = 0;
        image[s + 1..s + 6].copy_from_slice(*id);
        image[s + 6] = 1;
    }

    udf_tag(image, 256, 2);
    let a = 256 * SECTOR;
    image[a + 16..a + 20].copy_from_slice(&(3 * SECTOR as u32).to_le_bytes());
    image[a + 20..a + 24].copy_from_slice(&257u32.to_le_bytes());
    seal_tag(image, a);

    udf_tag(image, 257, 1);
    dstring(image, 257 * SECTOR + 24, 32, label);
    seal_tag(image, 257 * SECTOR);

    udf_tag(image, 258, 6);
    dstring(image, 258 * SECTOR + 84, 128, label);
    seal_tag(image, 258 * SECTOR);

    udf_tag(image, 259, 8);
    seal_tag(image, 259 * SECTOR);
}

/// A UDF-only image with no ISO9660 descriptors
pub fn udf_image(label: &str) -> Vec<u8> {
    let mut image = vec![0u8; 262 * SECTOR];
    write_udf_structures(&mut image, 16, label);
    image
}

pub fn write_mbr_entry(
    image: &mut [u8],
    index: usize,
    status: u8,
    kind: u8,
    start: u32,
    count: u32,
) {
    let base = 446 + index * 16;
    image[base] = status;
    image[base + 4] = kind;
    image[base + 8..base + 12].copy_from_slice(&start.to_le_bytes());
    image[base + 12..base + 16].copy_from_slice(&count.to_le_bytes());
    image[510] = 0x55;
    image[511] = 0xAA;
}

/// A 1 MiB raw disk with one Linux partition
pub fn raw_mbr_disk(active: bool) -> Vec<u8> {
    let mut image = vec![0u8; 2048 * LBA];
    write_mbr_entry(&mut image, 0, if active { 0x80 } else { 0x00 }, 0x83, 63, 1985);
    image
}

/// A 1 MiB GPT disk; the protective entry is boot-flagged when `flagged`
pub fn gpt_disk(with_esp: bool, flagged: bool) -> Vec<u8> {
    let mut image = vec![0u8; 2048 * LBA];
    write_mbr_entry(&mut image, 0, if flagged { 0x80 } else { 0x00 }, 0xEE, 1, 2047);

    let h = LBA;
    image[h..h + 8].copy_from_slice(b"EFI PART");
    image[h + 8..h + 12].copy_from_slice(&0x0001_0000u32.to_le_bytes());
    image[h + 12..h + 16].copy_from_slice(&92u32.to_le_bytes());
    image[h + 24..h + 32].copy_from_slice(&1u64.to_le_bytes());
    image[h + 72..h + 80].copy_from_slice(&2u64.to_le_bytes());
    image[h + 80..h + 84].copy_from_slice(&128u32.to_le_bytes());
    image[h + 84..h + 88].copy_from_slice(&128u32.to_le_bytes());

    let e = 2 * LBA;
    if with_esp {
        image[e..e + 16].copy_from_slice(&ESP_TYPE_GUID);
    } else {
        // Linux filesystem data
        image[e..e + 16].copy_from_slice(&[
            0xAF, 0x3D, 0xC6, 0x0F, 0x83, 0x84, 0x72, 0x47, 0x8E, 0x79, 0x3D, 0x69, 0xD8, 0x47,
            0x7D, 0xE4,
        ]);
    }
    image[e + 32..e + 40].copy_from_slice(&34u64.to_le_bytes());
    image[e + 40..e + 48].copy_from_slice(&2000u64.to_le_bytes());
    image
}

pub fn write_image(name: &str, bytes: &[u8]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(name);
    fs::write(&path, bytes).unwrap();
    (dir, path)
}

/// Signature definitions used across the integration tests
pub const TEST_SIGNATURES: &str = r#"{
    "schema_version": 1,
    "signatures": [
        {
            "os_id": "win10",
            "family": "winnt",
            "version": "10",
            "name": "Microsoft Windows 10",
            "match": { "volume_label": "^WIN10$", "boot_mechanism": "el_torito" }
        },
        {
            "os_id": "win-x64",
            "family": "winnt",
            "match": {
                "volume_label": "^(J_)?(CCSN?A|C?CCOMA)_X64FREE?_",
                "marker_files": ["sources/install.wim"]
            }
        },
        {
            "os_id": "ubuntu22.04",
            "family": "linux",
            "version": "22.04",
            "match": {
                "marker_files": ["casper/vmlinuz", ".disk/info"],
                "version_string": "^Ubuntu 22\\.04"
            }
        },
        {
            "os_id": "archlinux",
            "family": "linux",
            "match": { "marker_files": ["arch/boot/x86_64/vmlinuz-linux"] }
        },
        {
            "os_id": "freebsd14",
            "family": "bsd",
            "version": "14",
            "match": {
                "marker_files": ["bin/freebsd-version"],
                "version_string": "^14\\."
            }
        }
    ]
}"#;

/// Writes `json` as `name` inside `dir`, creating parent directories.
pub fn write_definitions(dir: &std::path::Path, name: &str, json: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, json).unwrap();
    path
}

/// One definition with a single volume label predicate
pub fn label_definition(os_id: &str, family: &str, label: &str) -> String {
    format!(
        r#"{{"schema_version": 1, "signatures": [
            {{"os_id": "{os_id}", "family": "{family}", "match": {{"volume_label": "{label}"}}}}
        ]}}"#
    )
}
