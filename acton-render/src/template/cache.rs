//! Compiled template cache
//!
//! Maps resolved paths to compiled units for the lifetime of the owning
//! renderer. Entries are never evicted or invalidated.
//!
//! Lookups take a read lock. A miss releases it, builds the unit with no lock
//! held, then takes the write lock and inserts only if no other caller got
//! there first. Two concurrent first misses on the same path may both build;
//! exactly one result is stored and every caller receives the stored one.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::unit::CompiledUnit;
use crate::error::RenderResult;

/// Cache of compiled units keyed by resolved path
#[derive(Debug)]
pub struct TemplateCache {
    units: RwLock<HashMap<PathBuf, Arc<CompiledUnit>>>,
    enabled: bool,
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TemplateCache {
    /// Create a cache; a disabled cache builds on every request
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            units: RwLock::new(HashMap::new()),
            enabled,
        }
    }

    /// Cached unit for `path`
    ///
    /// Returns `None` if caching is disabled or the path has not been built.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<Arc<CompiledUnit>> {
        if !self.enabled {
            return None;
        }

        self.units.read().get(path).cloned()
    }

    /// Return the cached unit for `path`, building it on a miss
    ///
    /// `build` runs outside any lock. Its error is returned to this caller
    /// only and nothing is stored.
    ///
    /// # Errors
    ///
    /// Propagates whatever `build` returns.
    pub fn get_or_build<F>(&self, path: &Path, build: F) -> RenderResult<Arc<CompiledUnit>>
    where
        F: FnOnce() -> RenderResult<CompiledUnit>,
    {
        if !self.enabled {
            return build().map(Arc::new);
        }

        if let Some(unit) = self.units.read().get(path).cloned() {
            tracing::trace!(path = %path.display(), "template cache hit");
            return Ok(unit);
        }

        tracing::debug!(path = %path.display(), "template cache miss");
        let built = Arc::new(build()?);

        let mut units = self.units.write();
        let stored = units
            .entry(path.to_path_buf())
            .or_insert_with(|| {
                tracing::debug!(path = %path.display(), "template cached");
                built
            })
            .clone();
        drop(units);

        Ok(stored)
    }

    /// Whether compiled units are kept
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of cached units
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.read().len()
    }

    /// Whether nothing has been cached yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.read().is_empty()
    }
}
