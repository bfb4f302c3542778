//! Registry — in-memory target store with endpoint uniqueness.
//!
//! The identifier map and the endpoint index live behind one readers-writer
//! lock and are only ever mutated together. Reads (`list`, `get`) take the
//! shared lock; `create`, `delete`, `upsert`, and `load` take the exclusive
//! lock. Snapshot file I/O always happens outside the lock.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::error::{RegistryError, RegistryResult};
use crate::types::{Target, TargetId};

/// Convert any `Display` error into a `RegistryError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| RegistryError::$variant(e.to_string())
    };
}

#[derive(Debug, Default)]
struct Inner {
    targets: HashMap<TargetId, Target>,
    endpoints: HashSet<String>,
}

/// Thread-safe registry of probe targets.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    inner: Arc<RwLock<Inner>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated from a snapshot file, if one is usable.
    ///
    /// Any load failure is logged and leaves the registry empty.
    pub fn open(path: &Path) -> Self {
        let registry = Self::new();
        match registry.load(path) {
            Ok(count) => info!(?path, count, "loaded targets from snapshot"),
            Err(e) if e.is_missing_file() => {
                info!(?path, "no snapshot found, starting with an empty registry");
            }
            Err(e) => {
                warn!(?path, error = %e, "unable to load snapshot, starting with an empty registry");
            }
        }
        registry
    }

    /// Snapshot of every target. Order is unspecified.
    pub fn list(&self) -> Vec<Target> {
        self.inner.read().targets.values().cloned().collect()
    }

    /// Get a target by identifier.
    pub fn get(&self, id: &str) -> RegistryResult<Target> {
        self.inner
            .read()
            .targets
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Number of registered targets.
    pub fn len(&self) -> usize {
        self.inner.read().targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register a new target. Fails if its endpoint is already registered.
    pub fn create(&self, target: Target) -> RegistryResult<()> {
        let mut inner = self.inner.write();
        if inner.endpoints.contains(&target.endpoint) {
            return Err(RegistryError::AlreadyRegistered(target.endpoint));
        }
        debug!(id = %target.id, endpoint = %target.endpoint, "target registered");
        inner.endpoints.insert(target.endpoint.clone());
        inner.targets.insert(target.id.clone(), target);
        Ok(())
    }

    /// Remove a target by identifier. Returns true if it existed.
    pub fn delete(&self, id: &str) -> bool {
        let mut inner = self.inner.write();
        match inner.targets.remove(id) {
            Some(target) => {
                inner.endpoints.remove(&target.endpoint);
                debug!(%id, endpoint = %target.endpoint, "target removed");
                true
            }
            None => false,
        }
    }

    /// Write a probe result back onto the registered target with the same id.
    ///
    /// Only the result fields are copied; `id` and `endpoint` never change.
    /// Results for identifiers that are no longer registered are rejected
    /// with `NotFound` rather than re-creating the entry.
    pub fn upsert(&self, result: &Target) -> RegistryResult<()> {
        let mut inner = self.inner.write();
        let target = inner
            .targets
            .get_mut(&result.id)
            .ok_or_else(|| RegistryError::NotFound(result.id.clone()))?;
        target.apply_result(result);
        Ok(())
    }

    // ── Snapshots ──────────────────────────────────────────────────

    /// Write every target to `path` as a JSON array.
    ///
    /// The file is written to a temporary sibling first and then renamed.
    pub fn dump(&self, path: &Path) -> RegistryResult<()> {
        let mut targets = self.list();
        targets.sort_by(|a, b| a.id.cmp(&b.id));
        let bytes = serde_json::to_vec(&targets).map_err(map_err!(Serialize))?;

        let io_err = |source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &bytes).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;

        debug!(?path, count = targets.len(), "registry snapshot written");
        Ok(())
    }

    /// Add every target from a snapshot written by [`Registry::dump`].
    ///
    /// A target whose endpoint is already registered is skipped. Returns the
    /// number of targets added.
    pub fn load(&self, path: &Path) -> RegistryResult<usize> {
        let bytes = fs::read(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let targets: Vec<Target> =
            serde_json::from_slice(&bytes).map_err(map_err!(Deserialize))?;

        let mut inner = self.inner.write();
        let mut loaded = 0;
        for target in targets {
            if inner.endpoints.contains(&target.endpoint) || inner.targets.contains_key(&target.id) {
                warn!(id = %target.id, endpoint = %target.endpoint, "skipping duplicate target in snapshot");
                continue;
            }
            inner.endpoints.insert(target.endpoint.clone());
            inner.targets.insert(target.id.clone(), target);
            loaded += 1;
        }
        Ok(loaded)
    }

    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        let inner = self.inner.read();
        inner.targets.len() == inner.endpoints.len()
            && inner
                .targets
                .values()
                .all(|t| inner.endpoints.contains(&t.endpoint))
    }
}
