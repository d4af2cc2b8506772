//! Boot evidence entity
//!
//! What the boot structure analyzer learned about whether, and how, a
//! medium can be booted.

use serde::{Deserialize, Serialize};
use std::fmt;

pub use crate::formats::el_torito::BootPlatform;

/// The mechanism by which a medium declares itself bootable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootMechanism {
    #[default]
    None,
    /// El Torito boot catalog with a bootable entry
    ElTorito,
    /// MBR with a boot-flagged, non-protective partition
    HybridMbr,
    /// Protective MBR, GPT header and an EFI System Partition
    GptEsp,
    /// Boot-flagged protective MBR with no recognisable ESP behind it
    UnknownBootable,
}

impl fmt::Display for BootMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BootMechanism::None => "none",
            BootMechanism::ElTorito => "El Torito",
            BootMechanism::HybridMbr => "MBR",
            BootMechanism::GptEsp => "GPT/ESP",
            BootMechanism::UnknownBootable => "unknown",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BootEvidence {
    pub is_bootable: bool,
    pub boot_mechanism: BootMechanism,
    /// Platforms of bootable El Torito entries, in catalog order
    pub platforms: Vec<BootPlatform>,
}

impl BootEvidence {
    pub fn not_bootable() -> Self {
        Self::default()
    }

    pub fn bootable(mechanism: BootMechanism) -> Self {
        Self {
            is_bootable: mechanism != BootMechanism::None,
            boot_mechanism: mechanism,
            platforms: Vec::new(),
        }
    }

    pub fn with_platforms(mut self, platforms: Vec<BootPlatform>) -> Self {
        self.platforms = platforms;
        self
    }
}
