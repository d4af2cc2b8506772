//! Media reader
//!
//! Opens images and exposes them through the `MediaSource` trait.

mod handle;
mod iso_tree;
mod reader;

pub use handle::MediaHandle;
pub use iso_tree::{MAX_PATH_DEPTH, NameSet};
pub use reader::open;
