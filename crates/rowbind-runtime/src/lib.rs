//! Rowbind Runtime
//!
//! Loads a project described by a `rowbind.toml` manifest into a linked
//! mapping model: XML type descriptors go into the type catalog, XML mapper
//! sources and annotated interfaces go through the engine's linker, and the
//! frozen result hands out mapper proxies.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod manifest;
pub mod source;
pub mod types;

use std::path::Path;

pub use error::RuntimeError;
pub use loader::{Loader, SharedLinker};
pub use manifest::{Manifest, ManifestError, MANIFEST_FILE};
pub use source::{parse_source, read_source, SourceError};

pub use rowbind_engine::LinkedModel;

/// Load the project whose manifest is at `path` (or in the directory `path`)
pub fn load(path: &Path) -> Result<LinkedModel, RuntimeError> {
    Loader::from_path(path)?.load()
}
