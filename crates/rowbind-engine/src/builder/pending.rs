//! Deferred-resolution queues
//!
//! A fragment whose cross-reference is missing is parked here together with
//! the closure that retries it. Queues are kept per fragment kind so a retry
//! pass can visit them in a fixed order.

use std::fmt;

use crate::mapping::Configuration;

use super::BuildError;

/// Outcome of one resolution attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    /// Everything the fragment references exists; the value is committed
    Resolved(T),
    /// A referenced entity is missing; nothing was committed
    Pending(String),
}

impl<T> Resolution<T> {
    /// Check for [`Resolution::Resolved`]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    /// Map the resolved value
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Resolution::Resolved(value) => Resolution::Resolved(f(value)),
            Resolution::Pending(reason) => Resolution::Pending(reason),
        }
    }
}

/// Unwrap a `Result<Resolution<T>, BuildError>`, returning early on error or
/// on a pending reference
macro_rules! try_resolve {
    ($expr:expr) => {
        match $expr? {
            $crate::builder::Resolution::Resolved(value) => value,
            $crate::builder::Resolution::Pending(reason) => {
                return Ok($crate::builder::Resolution::Pending(reason));
            }
        }
    };
}
pub(crate) use try_resolve;

/// Kind of a deferred fragment; the order of [`FragmentKind::RETRY_ORDER`]
/// is the order queues are visited in a retry pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    /// Mapped statement (with its key statement and generated result maps)
    Statement,
    /// Result map
    ResultMap,
    /// Cache reference
    CacheRef,
    /// Annotated interface method
    Method,
}

impl FragmentKind {
    /// Queue visiting order within one retry pass
    pub const RETRY_ORDER: [FragmentKind; 4] = [
        FragmentKind::Statement,
        FragmentKind::ResultMap,
        FragmentKind::CacheRef,
        FragmentKind::Method,
    ];

    fn index(self) -> usize {
        match self {
            FragmentKind::Statement => 0,
            FragmentKind::ResultMap => 1,
            FragmentKind::CacheRef => 2,
            FragmentKind::Method => 3,
        }
    }

    /// Human-readable name
    pub fn name(self) -> &'static str {
        match self {
            FragmentKind::Statement => "statement",
            FragmentKind::ResultMap => "result map",
            FragmentKind::CacheRef => "cache-ref",
            FragmentKind::Method => "method",
        }
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Diagnosable identity of a deferred fragment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FragmentKey {
    /// Fragment kind
    pub kind: FragmentKind,
    /// Namespace the fragment was declared in
    pub namespace: String,
    /// Local id, referenced namespace, or method signature
    pub local_id: String,
}

impl FragmentKey {
    /// Create a key
    pub fn new(kind: FragmentKind, namespace: impl Into<String>, local_id: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            local_id: local_id.into(),
        }
    }

    /// Qualified id of the fragment
    pub fn qualified_id(&self) -> String {
        let local = self.local_id.as_str();
        if self.namespace.is_empty() || local.starts_with(&format!("{}.", self.namespace)) {
            local.to_string()
        } else {
            format!("{}.{}", self.namespace, local)
        }
    }
}

impl fmt::Display for FragmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FragmentKind::CacheRef => {
                write!(f, "cache-ref from '{}' to '{}'", self.namespace, self.local_id)
            }
            kind => write!(f, "{} '{}'", kind, self.qualified_id()),
        }
    }
}

/// Retry closure of a deferred fragment
///
/// Must leave the configuration untouched unless it returns
/// `Ok(Resolution::Resolved(()))`.
pub type Resolver = Box<dyn FnMut(&mut Configuration) -> Result<Resolution<()>, BuildError> + Send>;

/// Box a closure as a [`Resolver`]
pub fn resolver<F>(f: F) -> Resolver
where
    F: FnMut(&mut Configuration) -> Result<Resolution<()>, BuildError> + Send + 'static,
{
    Box::new(f)
}

/// A parked fragment
pub struct PendingFragment {
    /// Identity
    pub key: FragmentKey,
    /// Reason reported by the last attempt
    pub reason: String,
    /// Retry closure
    pub resolver: Resolver,
}

impl fmt::Debug for PendingFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingFragment")
            .field("key", &self.key)
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

/// A fragment left pending after the final pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedFragment {
    /// Identity
    pub key: FragmentKey,
    /// Reason reported by the last attempt
    pub reason: String,
}

impl fmt::Display for UnresolvedFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.key, self.reason)
    }
}

/// Parked fragments, one queue per kind
#[derive(Default)]
pub struct PendingRegistry {
    queues: [Vec<PendingFragment>; 4],
}

impl PendingRegistry {
    /// Create empty queues
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a fragment at the back of its kind's queue
    pub fn park(&mut self, fragment: PendingFragment) {
        self.queues[fragment.key.kind.index()].push(fragment);
    }

    /// Remove every fragment of a kind, in parking order
    pub fn take(&mut self, kind: FragmentKind) -> Vec<PendingFragment> {
        std::mem::take(&mut self.queues[kind.index()])
    }

    /// Put fragments back ahead of anything parked since they were taken
    pub fn restore(&mut self, kind: FragmentKind, fragments: Vec<PendingFragment>) {
        let queue = &mut self.queues[kind.index()];
        let newer = std::mem::replace(queue, fragments);
        queue.extend(newer);
    }

    /// Number of parked fragments of a kind
    pub fn count(&self, kind: FragmentKind) -> usize {
        self.queues[kind.index()].len()
    }

    /// Total number of parked fragments
    pub fn len(&self) -> usize {
        self.queues.iter().map(Vec::len).sum()
    }

    /// Check whether nothing is parked
    pub fn is_empty(&self) -> bool {
        self.queues.iter().all(Vec::is_empty)
    }

    /// Parked fragments in retry order
    pub fn iter(&self) -> impl Iterator<Item = &PendingFragment> {
        FragmentKind::RETRY_ORDER
            .into_iter()
            .flat_map(move |kind| self.queues[kind.index()].iter())
    }

    /// Snapshot of parked fragments for diagnostics
    pub fn unresolved(&self) -> Vec<UnresolvedFragment> {
        self.iter()
            .map(|fragment| UnresolvedFragment {
                key: fragment.key.clone(),
                reason: fragment.reason.clone(),
            })
            .collect()
    }
}

impl fmt::Debug for PendingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter().map(|p| &p.key)).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(kind: FragmentKind, id: &str) -> PendingFragment {
        PendingFragment {
            key: FragmentKey::new(kind, "demo.Blog", id),
            reason: "missing".to_string(),
            resolver: resolver(|_| Ok(Resolution::Pending("missing".to_string()))),
        }
    }

    #[test]
    fn test_iteration_follows_retry_order() {
        let mut pending = PendingRegistry::new();
        pending.park(fragment(FragmentKind::CacheRef, "demo.Post"));
        pending.park(fragment(FragmentKind::ResultMap, "detail"));
        pending.park(fragment(FragmentKind::Statement, "find"));

        let order: Vec<FragmentKind> = pending.iter().map(|p| p.key.kind).collect();
        assert_eq!(
            order,
            vec![FragmentKind::Statement, FragmentKind::ResultMap, FragmentKind::CacheRef]
        );
        assert_eq!(pending.len(), 3);
        assert_eq!(pending.count(FragmentKind::Method), 0);
    }

    #[test]
    fn test_restore_keeps_older_first() {
        let mut pending = PendingRegistry::new();
        pending.park(fragment(FragmentKind::Statement, "a"));
        let taken = pending.take(FragmentKind::Statement);
        pending.park(fragment(FragmentKind::Statement, "b"));
        pending.restore(FragmentKind::Statement, taken);

        let ids: Vec<&str> = pending.iter().map(|p| p.key.local_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_key_display() {
        let key = FragmentKey::new(FragmentKind::ResultMap, "demo.Blog", "detail");
        assert_eq!(key.to_string(), "result map 'demo.Blog.detail'");
        let key = FragmentKey::new(FragmentKind::Statement, "demo.Blog", "demo.Blog.find");
        assert_eq!(key.qualified_id(), "demo.Blog.find");
        let key = FragmentKey::new(FragmentKind::CacheRef, "demo.Post", "demo.Blog");
        assert_eq!(key.to_string(), "cache-ref from 'demo.Post' to 'demo.Blog'");
    }

    #[test]
    fn test_resolution_map() {
        assert_eq!(Resolution::Resolved(2).map(|v| v * 2), Resolution::Resolved(4));
        let pending: Resolution<i32> = Resolution::Pending("x".into());
        assert!(!pending.map(|v| v + 1).is_resolved());
    }
}
