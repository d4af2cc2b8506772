//! Application layer
//!
//! Use cases that orchestrate the domain services over opened media.

pub mod dto;
mod identify_media;

pub use identify_media::{IdentifyError, Identifier};
