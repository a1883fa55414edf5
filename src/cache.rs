//! Cleaner profile cache
//!
//! Compiled cleaners keyed by their configuration, so callers that pass the
//! same tag sets on every request (the NIF surface, annotation makers) share
//! one `MarkupCleaner`. Bounded LRU behind a mutex.

use crate::clean::{CleanerConfig, MarkupCleaner};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// Profiles kept by the process-wide cache
pub const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(64) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

static GLOBAL: LazyLock<ProfileCache> = LazyLock::new(|| ProfileCache::new(DEFAULT_CAPACITY));

pub struct ProfileCache {
    cleaners: Mutex<LruCache<CleanerConfig, Arc<MarkupCleaner>>>,
}

impl ProfileCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        ProfileCache {
            cleaners: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// The process-wide cache
    pub fn global() -> &'static ProfileCache {
        &GLOBAL
    }

    /// The cleaner for `config`, compiling it on a miss.
    ///
    /// Compilation runs outside the lock. When two callers miss at once the
    /// first insert wins and both get the same cleaner back.
    pub fn get_or_create(&self, config: &CleanerConfig) -> Arc<MarkupCleaner> {
        if let Some(cleaner) = self.lock().get(config) {
            return Arc::clone(cleaner);
        }

        let compiled = Arc::new(MarkupCleaner::new(config.clone()));
        let mut cleaners = self.lock();
        if let Some(cleaner) = cleaners.get(config) {
            return Arc::clone(cleaner);
        }
        trace!(capacity = cleaners.cap().get(), "caching cleaner profile");
        cleaners.put(config.clone(), Arc::clone(&compiled));
        compiled
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// The cache holds no invariants a panicking holder could break, so a
    /// poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, LruCache<CleanerConfig, Arc<MarkupCleaner>>> {
        self.cleaners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ProfileCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
