//! Domain layer - Core identification logic
//!
//! Entities, the repository traits the services depend on, and the
//! services themselves. Nothing here opens files.

pub mod entities;
pub mod repositories;
pub mod services;
