//! Project manifest parsing (rowbind.toml)
//!
//! A manifest names everything the loader reads, relative to the directory
//! holding the manifest:
//!
//! ```toml
//! types = ["types/blog.xml"]
//! mappers = ["mappers/BlogMapper.xml"]
//! interfaces = ["demo.AuthorMapper"]
//!
//! [settings]
//! map_underscore_to_camel_case = true
//!
//! [aliases]
//! Blog = "demo.Blog"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rowbind_engine::Settings;
use serde::Deserialize;
use thiserror::Error;

/// Default manifest file name
pub const MANIFEST_FILE: &str = "rowbind.toml";

/// Errors that can occur during manifest parsing
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Failed to read manifest file
    #[error("Failed to read manifest file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse manifest: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid manifest: {0}")]
    ValidationError(String),
}

/// Project manifest
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Engine settings
    #[serde(default)]
    pub settings: Settings,

    /// Alias → type name
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,

    /// XML files declaring type descriptors
    #[serde(default)]
    pub types: Vec<String>,

    /// XML mapper resources
    #[serde(default)]
    pub mappers: Vec<String>,

    /// Mapper interfaces registered through their annotations
    #[serde(default)]
    pub interfaces: Vec<String>,
}

impl Manifest {
    /// Load manifest from a file
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse manifest from a string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ManifestError> {
        let manifest: Manifest = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Validate the manifest
    pub fn validate(&self) -> Result<(), ManifestError> {
        for (kind, paths) in [("types", &self.types), ("mappers", &self.mappers)] {
            let mut seen = BTreeMap::new();
            for path in paths {
                if path.trim().is_empty() {
                    return Err(ManifestError::ValidationError(format!(
                        "empty path in '{}'",
                        kind
                    )));
                }
                if Path::new(path).is_absolute() {
                    return Err(ManifestError::ValidationError(format!(
                        "'{}' in '{}' must be relative to the manifest directory",
                        path, kind
                    )));
                }
                if seen.insert(path.as_str(), ()).is_some() {
                    return Err(ManifestError::ValidationError(format!(
                        "'{}' is listed twice in '{}'",
                        path, kind
                    )));
                }
            }
        }

        for name in &self.interfaces {
            if name.trim().is_empty() || name.contains(char::is_whitespace) {
                return Err(ManifestError::ValidationError(format!(
                    "invalid interface name '{}'",
                    name
                )));
            }
        }

        for (alias, target) in &self.aliases {
            if alias.trim().is_empty() || target.trim().is_empty() {
                return Err(ManifestError::ValidationError(format!(
                    "alias '{}' must map to a type name",
                    alias
                )));
            }
        }

        Ok(())
    }

    /// Locate the manifest for a path that is either the manifest itself or
    /// the directory holding it
    pub fn locate(path: &Path) -> PathBuf {
        if path.is_dir() {
            path.join(MANIFEST_FILE)
        } else {
            path.to_path_buf()
        }
    }
}
