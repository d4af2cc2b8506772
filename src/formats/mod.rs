//! On-disk structure parsers
//!
//! Pure byte-slice parsers for the structures the engine needs to locate
//! boot records and installer fingerprints. Nothing in here performs I/O;
//! callers read the sectors and hand the bytes over.

pub mod el_torito;
pub mod gpt;
pub mod iso9660;
pub mod mbr;
pub mod udf;

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{self, Cursor};
use thiserror::Error;

/// Errors raised while decoding an on-disk structure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Structure truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("Bad signature for {0}")]
    BadSignature(&'static str),

    #[error("Checksum mismatch in {0}")]
    BadChecksum(&'static str),

    #[error("Invalid structure: {0}")]
    Invalid(String),
}

impl From<io::Error> for FormatError {
    fn from(e: io::Error) -> Self {
        FormatError::Invalid(e.to_string())
    }
}

pub(crate) fn ensure_len(data: &[u8], needed: usize) -> Result<(), FormatError> {
    if data.len() < needed {
        return Err(FormatError::Truncated {
            needed,
            available: data.len(),
        });
    }
    Ok(())
}

/// Decodes a fixed-width, space/NUL padded ASCII field.
pub(crate) fn decode_padded(field: &[u8]) -> String {
    String::from_utf8_lossy(field)
        .trim_end_matches(['\0', ' '])
        .trim_start()
        .to_string()
}

/// Decodes big-endian UCS-2 as used by Joliet and UDF.
pub(crate) fn decode_ucs2_be(field: &[u8]) -> String {
    let mut cursor = Cursor::new(field);
    let mut units = Vec::with_capacity(field.len() / 2);
    while let Ok(unit) = cursor.read_u16::<BigEndian>() {
        units.push(unit);
    }

    String::from_utf16_lossy(&units)
        .trim_end_matches(['\0', ' '])
        .to_string()
}
