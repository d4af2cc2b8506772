//! Delphi - bootable media OS identification engine
//!
//! Opens disk images and installation media, works out whether and how
//! they boot, collects identifying evidence and matches it against a
//! versioned database of operating system signatures.
//!
//! ```no_run
//! use delphi::application::Identifier;
//! use delphi::domain::entities::ClassificationResult;
//! use delphi::domain::services::Database;
//!
//! let db = Database::load("/usr/share/delphi/db")?;
//! match Identifier::new(&db).identify("win10.iso")? {
//!     ClassificationResult::Identified { family, .. } => println!("{}", family),
//!     ClassificationResult::BootableUnknown => println!("bootable, unknown"),
//!     ClassificationResult::NotBootable => println!("not bootable"),
//!     ClassificationResult::InvalidMedia { reason } => println!("invalid: {}", reason),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod application;
pub mod domain;
pub mod formats;
pub mod infrastructure;
pub mod logging;
pub mod presentation;

pub use application::{IdentifyError, Identifier};
pub use domain::entities::{ClassificationResult, InvalidMediaReason};
pub use domain::repositories::MediaError;
pub use domain::services::Database;
pub use infrastructure::definitions::LoadError;
