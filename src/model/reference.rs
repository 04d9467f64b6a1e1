//! Non-owning references
//!
//! A [`Reference`] either names its target by identifier or holds the shared
//! target itself. Reading a reference never resolves it; the swap happens
//! only in [`Reference::resolve`], which asks a [`Resolver`] for the target.

use crate::error::{Error, ResolutionError, Result};
use crate::model::notify::{NotificationKind, Observed, Snapshot};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Looks up records by identifier
pub trait Resolver<T> {
    /// Find the record registered under `id`
    fn lookup(&self, id: &str) -> Option<Arc<T>>;
}

impl<T> Resolver<T> for HashMap<String, Arc<T>> {
    fn lookup(&self, id: &str) -> Option<Arc<T>> {
        self.get(id).cloned()
    }
}

/// Reference to a record owned elsewhere
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Reference<T> {
    /// Placeholder carrying the target identifier
    Unresolved(String),
    /// The shared target
    Resolved(Arc<T>),
}

impl<T> Reference<T> {
    /// Placeholder for `id`
    pub fn unresolved(id: impl Into<String>) -> Self {
        Reference::Unresolved(id.into())
    }

    /// Placeholder from an `xlink:href`-style value (`#id` or `id`)
    pub fn from_href(href: &str) -> Self {
        let href = href.trim();
        Reference::Unresolved(href.strip_prefix('#').unwrap_or(href).to_string())
    }

    /// Reference to a target owned by this reference alone
    pub fn resolved(target: T) -> Self {
        Reference::Resolved(Arc::new(target))
    }

    /// Reference to a shared target
    pub fn shared(target: Arc<T>) -> Self {
        Reference::Resolved(target)
    }

    /// Whether the target is available
    pub fn is_resolved(&self) -> bool {
        matches!(self, Reference::Resolved(_))
    }

    /// The target, if resolved
    pub fn get(&self) -> Option<&T> {
        match self {
            Reference::Resolved(target) => Some(target.as_ref()),
            Reference::Unresolved(_) => None,
        }
    }

    /// Identifier of an unresolved reference
    pub fn id(&self) -> Option<&str> {
        match self {
            Reference::Unresolved(id) => Some(id),
            Reference::Resolved(_) => None,
        }
    }

    /// Resolve through `resolver`, replacing the placeholder on success
    ///
    /// Resolving an already resolved reference returns the current target.
    /// On failure the placeholder is left untouched.
    pub fn resolve<R>(&mut self, resolver: &R) -> std::result::Result<Arc<T>, ResolutionError>
    where
        R: Resolver<T> + ?Sized,
    {
        let id = match self {
            Reference::Resolved(target) => return Ok(Arc::clone(target)),
            Reference::Unresolved(id) => id.clone(),
        };

        match resolver.lookup(&id) {
            Some(target) => {
                tracing::debug!(id = %id, target = short_type_name::<T>(), "resolved reference");
                *self = Reference::Resolved(Arc::clone(&target));
                Ok(target)
            }
            None => {
                tracing::debug!(id = %id, target = short_type_name::<T>(), "unresolved reference");
                Err(ResolutionError::new(id)
                    .with_target_type(short_type_name::<T>())
                    .with_reason("no record registered under this id"))
            }
        }
    }
}

impl<T> From<T> for Reference<T> {
    fn from(target: T) -> Self {
        Reference::resolved(target)
    }
}

pub(crate) fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

impl<T> Observed<'_, Reference<T>> {
    /// Resolve with a RESOLVE notification on success
    pub fn resolve<R>(&mut self, resolver: &R) -> std::result::Result<Arc<T>, ResolutionError>
    where
        R: Resolver<T> + ?Sized,
    {
        let old = self.target.id().map(|id| Snapshot::Text(id.to_string()));
        let was_resolved = self.target.is_resolved();
        let target = self.target.resolve(resolver)?;
        if !was_resolved {
            let notification = self
                .notification(NotificationKind::Resolve)
                .with_old(old)
                .with_new(Some(Snapshot::Node(short_type_name::<T>())));
            self.emit(notification);
        }
        Ok(target)
    }
}

/// Identifier-keyed store of shared records, e.g. by `gml:id`
#[derive(Debug)]
pub struct IdRegistry<T> {
    entries: HashMap<String, Arc<T>>,
}

impl<T> IdRegistry<T> {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a record, returning its shared handle
    pub fn register(&mut self, id: impl Into<String>, record: T) -> Result<Arc<T>> {
        let record = Arc::new(record);
        self.register_shared(id, Arc::clone(&record))?;
        Ok(record)
    }

    /// Register an already shared record
    pub fn register_shared(&mut self, id: impl Into<String>, record: Arc<T>) -> Result<()> {
        let id = id.into();
        if self.entries.contains_key(&id) {
            return Err(Error::Duplicate(format!("id '{}' is already registered", id)));
        }
        self.entries.insert(id, record);
        Ok(())
    }

    /// Shared handle for `id`
    pub fn get(&self, id: &str) -> Option<&Arc<T>> {
        self.entries.get(id)
    }

    /// Whether `id` is registered
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of registered records
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for IdRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Resolver<T> for IdRegistry<T> {
    fn lookup(&self, id: &str) -> Option<Arc<T>> {
        self.entries.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::notify::{Observable, Recorder};

    #[derive(Debug, PartialEq)]
    struct Target(&'static str);

    #[test]
    fn test_from_href_strips_fragment_marker() {
        let reference: Reference<Target> = Reference::from_href("#q1");
        assert_eq!(reference.id(), Some("q1"));
        assert!(!reference.is_resolved());
        assert!(reference.get().is_none());
    }

    #[test]
    fn test_resolve_swaps_placeholder() {
        let mut registry = IdRegistry::new();
        let shared = registry.register("q1", Target("states")).unwrap();

        let mut reference = Reference::unresolved("q1");
        let resolved = reference.resolve(&registry).unwrap();

        assert!(Arc::ptr_eq(&resolved, &shared));
        assert_eq!(reference.get(), Some(&Target("states")));
        assert_eq!(reference.id(), None);
    }

    #[test]
    fn test_resolve_failure_keeps_placeholder() {
        let registry: IdRegistry<Target> = IdRegistry::new();
        let mut reference = Reference::unresolved("missing");

        let err = reference.resolve(&registry).unwrap_err();
        assert_eq!(err.reference, "missing");
        assert_eq!(err.target_type.as_deref(), Some("Target"));
        assert_eq!(reference.id(), Some("missing"));
    }

    #[test]
    fn test_registry_rejects_duplicate_ids() {
        let mut registry = IdRegistry::new();
        registry.register("a", Target("x")).unwrap();
        assert!(matches!(registry.register("a", Target("y")), Err(Error::Duplicate(_))));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_observed_resolve_notifies_once() {
        let recorder = Recorder::new();
        let mut map: HashMap<String, Arc<Target>> = HashMap::new();
        map.insert("v1".to_string(), Arc::new(Target("NAME")));

        let mut reference = Reference::unresolved("v1");
        reference.observed(&recorder, "valueReference").resolve(&map).unwrap();
        reference.observed(&recorder, "valueReference").resolve(&map).unwrap();

        let events = recorder.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, NotificationKind::Resolve);
        assert_eq!(events[0].old, Some(Snapshot::Text("v1".to_string())));
    }
}
