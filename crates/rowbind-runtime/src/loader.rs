//! Project loading.
//!
//! A [`Loader`] reads a manifest's type sources into the catalog, registers
//! its aliases, then feeds every mapper source to one shared [`Linker`].
//! Mapper files are read and parsed on separate threads; linking itself
//! happens under the linker's lock, so sources may land in any order.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rowbind_engine::builder::SourceLookup;
use rowbind_engine::{Configuration, LinkedModel, Linker};
use tracing::{debug, warn};

use crate::error::RuntimeError;
use crate::manifest::Manifest;
use crate::source::read_source;
use crate::types::register_types;

/// Linker shared between loader threads
pub type SharedLinker = Arc<Mutex<Linker>>;

/// Loads the project described by a manifest
#[derive(Debug, Clone)]
pub struct Loader {
    manifest: Manifest,
    base_dir: PathBuf,
}

impl Loader {
    /// Loader for a manifest whose relative paths start at `base_dir`
    pub fn new(manifest: Manifest, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            manifest,
            base_dir: base_dir.into(),
        }
    }

    /// Loader for a manifest file, or a directory holding `rowbind.toml`
    pub fn from_path(path: &Path) -> Result<Self, RuntimeError> {
        let manifest_path = Manifest::locate(path);
        let manifest = Manifest::from_file(&manifest_path)?;
        let base_dir = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(Self::new(manifest, base_dir))
    }

    /// The manifest being loaded
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Directory manifest paths are relative to
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Load everything and run the final retry pass
    #[tracing::instrument(level = "debug", skip_all, fields(base = %self.base_dir.display()))]
    pub fn load(&self) -> Result<LinkedModel, RuntimeError> {
        let model = self.link()?.finish()?;
        debug!(
            statements = model.configuration.statements().count(),
            mappers = model.mappers.len(),
            "project loaded"
        );
        Ok(model)
    }

    /// Load every source without the final pass
    ///
    /// The returned linker may still hold parked fragments.
    #[tracing::instrument(level = "debug", skip_all, fields(base = %self.base_dir.display()))]
    pub fn link(&self) -> Result<Linker, RuntimeError> {
        let mut linker = Linker::new(self.configure()?);
        linker.set_source_lookup(companion_lookup(self.base_dir.clone()));

        let shared: SharedLinker = Arc::new(Mutex::new(linker));
        self.load_mappers(&shared)?;
        let mut linker = Arc::try_unwrap(shared)
            .map_err(|_| RuntimeError::Loader("linker is still shared".into()))?
            .into_inner();

        for interface in &self.manifest.interfaces {
            linker.add_mapper(interface)?;
        }
        Ok(linker)
    }

    /// Build the registry: settings, type descriptors, aliases
    fn configure(&self) -> Result<Configuration, RuntimeError> {
        let mut config = Configuration::new(self.manifest.settings.clone());
        for resource in &self.manifest.types {
            let root = read_source(&self.base_dir.join(resource))
                .map_err(|err| RuntimeError::in_source(resource, err))?;
            register_types(config.catalog(), &root)?;
        }
        for (alias, target) in &self.manifest.aliases {
            let ty = config.resolve_type(target)?;
            config.aliases_mut().register(alias, ty)?;
        }
        Ok(config)
    }

    /// Read mapper sources in parallel and link each under the lock
    ///
    /// Every source is attempted; the first failure in manifest order is
    /// returned.
    fn load_mappers(&self, shared: &SharedLinker) -> Result<(), RuntimeError> {
        let results: Vec<Result<(), RuntimeError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = self
                .manifest
                .mappers
                .iter()
                .map(|resource| {
                    let linker = Arc::clone(shared);
                    let path = self.base_dir.join(resource);
                    scope.spawn(move || -> Result<(), RuntimeError> {
                        let root = read_source(&path).map_err(|err| RuntimeError::in_source(resource, err))?;
                        linker.lock().load_mapper(resource, &root)?;
                        Ok(())
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(RuntimeError::Loader("mapper loader thread panicked".into())))
                })
                .collect()
        });
        results.into_iter().collect()
    }
}

/// Finds an interface's companion XML (`demo/BlogMapper.xml`) under `base_dir`
fn companion_lookup(base_dir: PathBuf) -> SourceLookup {
    Box::new(move |resource| {
        let path = base_dir.join(resource);
        if !path.is_file() {
            return None;
        }
        match read_source(&path) {
            Ok(root) => Some(root),
            Err(err) => {
                warn!(%resource, error = %err, "skipping unreadable companion source");
                None
            }
        }
    })
}
