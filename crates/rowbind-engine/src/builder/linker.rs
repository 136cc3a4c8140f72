//! The deferred-resolution linker
//!
//! The linker owns the registry while it is being populated. Each fragment
//! is tried once when read; if it reports [`Resolution::Pending`] it is
//! parked and retried after every source, until a final pass makes no more
//! progress.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::binding::{BindingError, MapperProxy, MapperRegistry};
use crate::executor::{Session, StatementExecutor};
use crate::mapping::Configuration;
use crate::node::Node;

use super::annotation::AnnotationReader;
use super::pending::{FragmentKey, FragmentKind, PendingFragment, PendingRegistry, Resolution, Resolver};
use super::xml::XmlMapperReader;
use super::BuildError;

/// Supplies the mapper source matching a resource path, if one exists
pub type SourceLookup = Box<dyn Fn(&str) -> Option<Node> + Send + Sync>;

/// Resource marker recorded once a namespace's XML source has been read
pub(crate) fn namespace_marker(namespace: &str) -> String {
    format!("namespace:{}", namespace)
}

/// Resource marker recorded once an interface's annotations have been read
pub(crate) fn interface_marker(interface: &str) -> String {
    format!("interface {}", interface)
}

/// Populates a [`Configuration`] from fragments arriving in any order
pub struct Linker {
    config: Configuration,
    pending: PendingRegistry,
    mappers: MapperRegistry,
    source_lookup: Option<SourceLookup>,
}

impl Linker {
    /// Create a linker over an empty registry
    pub fn new(config: Configuration) -> Self {
        Self {
            config,
            pending: PendingRegistry::new(),
            mappers: MapperRegistry::new(),
            source_lookup: None,
        }
    }

    /// The registry being populated
    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    /// The registry being populated, mutable
    pub fn configuration_mut(&mut self) -> &mut Configuration {
        &mut self.config
    }

    /// Parked fragments
    pub fn pending(&self) -> &PendingRegistry {
        &self.pending
    }

    /// Registered mapper interfaces
    pub fn mappers(&self) -> &MapperRegistry {
        &self.mappers
    }

    /// Install the lookup used to find an interface's companion XML source
    pub fn set_source_lookup(&mut self, lookup: SourceLookup) {
        self.source_lookup = Some(lookup);
    }

    pub(crate) fn lookup_source(&self, resource: &str) -> Option<Node> {
        self.source_lookup.as_ref().and_then(|lookup| lookup(resource))
    }

    // ========================================================================
    // Resolution protocol
    // ========================================================================

    /// Try a fragment now; park it if a reference is missing
    pub fn resolve_or_park(
        &mut self,
        key: FragmentKey,
        mut resolver: Resolver,
    ) -> Result<Resolution<()>, BuildError> {
        match resolver(&mut self.config)? {
            Resolution::Resolved(()) => Ok(Resolution::Resolved(())),
            Resolution::Pending(reason) => {
                debug!(fragment = %key, %reason, "parking fragment");
                self.pending.park(PendingFragment {
                    key,
                    reason: reason.clone(),
                    resolver,
                });
                Ok(Resolution::Pending(reason))
            }
        }
    }

    /// Retry every parked fragment once, in kind order
    ///
    /// Returns the number of fragments resolved. A fragment that fails with
    /// a fatal error is dropped and the error returned; the rest stay parked.
    pub fn retry_pending(&mut self) -> Result<usize, BuildError> {
        let mut resolved = 0;
        for kind in FragmentKind::RETRY_ORDER {
            let mut queue = self.pending.take(kind).into_iter();
            let mut still_pending = Vec::new();
            while let Some(mut fragment) = queue.next() {
                match (fragment.resolver)(&mut self.config) {
                    Ok(Resolution::Resolved(())) => {
                        debug!(fragment = %fragment.key, "resolved parked fragment");
                        resolved += 1;
                    }
                    Ok(Resolution::Pending(reason)) => {
                        fragment.reason = reason;
                        still_pending.push(fragment);
                    }
                    Err(err) => {
                        still_pending.extend(queue);
                        self.pending.restore(kind, still_pending);
                        return Err(err);
                    }
                }
            }
            self.pending.restore(kind, still_pending);
        }
        Ok(resolved)
    }

    // ========================================================================
    // Sources
    // ========================================================================

    /// Read one XML mapper source, then retry everything parked so far
    ///
    /// A resource already loaded is not read again.
    #[tracing::instrument(level = "debug", skip_all, fields(resource = %resource))]
    pub fn load_mapper(&mut self, resource: &str, root: &Node) -> Result<(), BuildError> {
        if !self.config.is_resource_loaded(resource) {
            let namespace = XmlMapperReader::new(self, resource)
                .parse(root)
                .map_err(|err| err.in_resource(resource))?;
            self.config.add_loaded_resource(resource);
            self.bind_mapper_for_namespace(&namespace)?;
            debug!(%namespace, "loaded mapper source");
        }
        self.retry_pending()?;
        Ok(())
    }

    /// Register the mapper interface named like a namespace, if the catalog
    /// describes one
    fn bind_mapper_for_namespace(&mut self, namespace: &str) -> Result<(), BuildError> {
        let Some(desc) = self.config.catalog().get(namespace) else {
            return Ok(());
        };
        if desc.is_interface() && !self.mappers.has_mapper(namespace) {
            self.config.add_loaded_resource(&namespace_marker(namespace));
            self.add_mapper(namespace)?;
        }
        Ok(())
    }

    /// Register a mapper interface and read its annotations
    ///
    /// Non-interface types are ignored. If reading fails the interface is
    /// unregistered again.
    #[tracing::instrument(level = "debug", skip_all, fields(interface = %type_name))]
    pub fn add_mapper(&mut self, type_name: &str) -> Result<(), BuildError> {
        let desc = self.config.catalog().require(type_name)?;
        if !self.mappers.add_mapper(desc.clone())? {
            return Ok(());
        }
        if let Err(err) = AnnotationReader::new(self, desc).parse() {
            self.mappers.remove_mapper(type_name);
            return Err(err);
        }
        Ok(())
    }

    /// Run retry passes until nothing changes, then freeze the registry
    ///
    /// Fragments still parked are reported together as
    /// [`BuildError::Unresolved`].
    pub fn finish(mut self) -> Result<LinkedModel, BuildError> {
        while !self.pending.is_empty() {
            if self.retry_pending()? == 0 {
                break;
            }
        }
        if !self.pending.is_empty() {
            let unresolved = self.pending.unresolved();
            for fragment in &unresolved {
                warn!(fragment = %fragment.key, reason = %fragment.reason, "unresolved fragment");
            }
            return Err(BuildError::Unresolved(unresolved));
        }
        self.config.freeze();
        Ok(LinkedModel {
            configuration: Arc::new(self.config),
            mappers: Arc::new(self.mappers),
        })
    }
}

impl std::fmt::Debug for Linker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Linker")
            .field("config", &self.config)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

/// The frozen result of linking
#[derive(Debug, Clone)]
pub struct LinkedModel {
    /// Read-only registry
    pub configuration: Arc<Configuration>,
    /// Registered mapper interfaces
    pub mappers: Arc<MapperRegistry>,
}

impl LinkedModel {
    /// Session executing against the given collaborator
    pub fn session(&self, executor: Arc<dyn StatementExecutor>) -> Session {
        Session::new(self.configuration.clone(), executor)
    }

    /// Proxy for a registered mapper interface
    pub fn mapper(&self, type_name: &str, executor: Arc<dyn StatementExecutor>) -> Result<MapperProxy, BindingError> {
        self.mappers.get_mapper(type_name, self.session(executor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::pending::resolver;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key(id: &str) -> FragmentKey {
        FragmentKey::new(FragmentKind::ResultMap, "demo", id)
    }

    #[test]
    fn test_park_and_retry() {
        let mut linker = Linker::new(Configuration::default());
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let outcome = linker
            .resolve_or_park(
                key("a"),
                resolver(move |config| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    if config.is_resource_loaded("b") {
                        Ok(Resolution::Resolved(()))
                    } else {
                        Ok(Resolution::Pending("b missing".into()))
                    }
                }),
            )
            .unwrap();
        assert!(!outcome.is_resolved());
        assert_eq!(linker.retry_pending().unwrap(), 0);

        linker.configuration_mut().add_loaded_resource("b");
        assert_eq!(linker.retry_pending().unwrap(), 1);
        assert!(linker.pending().is_empty());

        linker.retry_pending().unwrap();
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_fatal_error_drops_fragment() {
        let mut linker = Linker::new(Configuration::default());
        linker
            .resolve_or_park(key("bad"), {
                let mut first = true;
                resolver(move |_| {
                    if std::mem::take(&mut first) {
                        Ok(Resolution::Pending("later".into()))
                    } else {
                        Err(BuildError::MissingNamespace)
                    }
                })
            })
            .unwrap();
        linker
            .resolve_or_park(key("waiting"), resolver(|_| Ok(Resolution::Pending("never".into()))))
            .unwrap();

        assert!(linker.retry_pending().is_err());
        assert_eq!(linker.pending().len(), 1);
    }

    #[test]
    fn test_finish_reports_survivors() {
        let mut linker = Linker::new(Configuration::default());
        linker
            .resolve_or_park(key("a"), resolver(|_| Ok(Resolution::Pending("needs b".into()))))
            .unwrap();
        match linker.finish() {
            Err(BuildError::Unresolved(list)) => {
                assert_eq!(list.len(), 1);
                assert_eq!(list[0].key.qualified_id(), "demo.a");
                assert_eq!(list[0].reason, "needs b");
            }
            other => panic!("expected unresolved error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_finish_freezes() {
        let model = Linker::new(Configuration::default()).finish().unwrap();
        assert!(model.configuration.is_frozen());
    }
}
