//! Infrastructure layer
//!
//! Concrete implementations of the domain repositories: byte access to
//! images and devices, the media reader built on it, and the loader for
//! signature definition files.

pub mod block_device;
pub mod definitions;
pub mod media;
