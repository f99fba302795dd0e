//! Registry of reload caches sharing one compiler.
//!
//! The registry hands out one [`ReloadCache`] per path, creating it on first
//! request. Caches are kept in an LRU so a long-running host that touches
//! many files does not grow without bound; an evicted path simply starts
//! uninitialized on its next request.
//!
//! Caches with a `get` in progress are also tracked outside the LRU. A request
//! for a path whose cache was evicted or invalidated mid-compile picks up that
//! same cache again and waits on its gate, so a path is never compiled twice
//! at once.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use crate::error::ReloadError;

use super::cache::{ReloadCache, ReloadPolicy};
use super::compiler::{Compiled, Compiler};

/// Default number of per-path caches kept alive.
pub const DEFAULT_RELOAD_CACHE_CAPACITY: usize = 64;

/// Per-path reload caches with LRU eviction.
pub struct ReloadRegistry<T> {
    /// Compiler shared by every cache
    compiler: Arc<dyn Compiler<T>>,

    /// Caches indexed by path
    caches: Mutex<LruCache<PathBuf, Arc<ReloadCache<T>>>>,

    /// Caches with callers inside `get`, not subject to eviction
    in_flight: Mutex<HashMap<PathBuf, InFlight<T>>>,

    /// Policy applied to newly created caches
    policy: ReloadPolicy,
}

/// A cache in use by `get` callers.
struct InFlight<T> {
    cache: Arc<ReloadCache<T>>,
    callers: usize,
}

/// Releases an in-flight registration when `get` returns or unwinds.
struct InFlightGuard<'a, T: Send + Sync + 'static> {
    registry: &'a ReloadRegistry<T>,
    path: &'a Path,
}

impl<T: Send + Sync + 'static> Drop for InFlightGuard<'_, T> {
    fn drop(&mut self) {
        self.registry.release(self.path);
    }
}

impl<T: Send + Sync + 'static> ReloadRegistry<T> {
    /// Create a registry with the default capacity.
    pub fn new(compiler: impl Compiler<T> + 'static) -> Self {
        Self::with_capacity(compiler, DEFAULT_RELOAD_CACHE_CAPACITY)
    }

    /// Create a registry holding at most `capacity` caches (at least one).
    pub fn with_capacity(compiler: impl Compiler<T> + 'static, capacity: usize) -> Self {
        Self {
            compiler: Arc::new(compiler),
            caches: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            in_flight: Mutex::new(HashMap::new()),
            policy: ReloadPolicy::default(),
        }
    }

    /// Set the failure policy for caches created from now on.
    pub fn with_policy(mut self, policy: ReloadPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Return an up-to-date artifact for `path`.
    ///
    /// The registry lock is released before compiling, so requests for
    /// different paths never wait on each other.
    pub fn get(&self, path: impl AsRef<Path>) -> Result<Arc<Compiled<T>>, ReloadError> {
        let path = path.as_ref();
        let cache = self.acquire(path);
        let _guard = InFlightGuard {
            registry: self,
            path,
        };
        cache.get_if_modified()
    }

    /// Return the cache for `path`, creating it if needed.
    pub fn cache_for(&self, path: &Path) -> Arc<ReloadCache<T>> {
        let mut caches = self.caches.lock();
        let in_flight = self.in_flight.lock();
        self.lookup_or_insert(&mut caches, &in_flight, path)
    }

    /// Drop the cache for `path`. Returns `true` if one existed.
    ///
    /// A compile already running for `path` still completes, and requests
    /// arriving meanwhile wait for it.
    pub fn invalidate(&self, path: impl AsRef<Path>) -> bool {
        self.caches.lock().pop(path.as_ref()).is_some()
    }

    /// Drop every cache.
    pub fn clear(&self) {
        self.caches.lock().clear();
    }

    /// Number of live caches.
    pub fn cached_count(&self) -> usize {
        self.caches.lock().len()
    }

    /// Look up or create the cache for `path` and register the caller.
    ///
    /// Both maps are updated under one lock scope, so an eviction cannot
    /// slip in between the lookup and the registration.
    fn acquire(&self, path: &Path) -> Arc<ReloadCache<T>> {
        let mut caches = self.caches.lock();
        let mut in_flight = self.in_flight.lock();
        let cache = self.lookup_or_insert(&mut caches, &in_flight, path);

        in_flight
            .entry(path.to_path_buf())
            .or_insert_with(|| InFlight {
                cache: Arc::clone(&cache),
                callers: 0,
            })
            .callers += 1;
        cache
    }

    fn release(&self, path: &Path) {
        let mut in_flight = self.in_flight.lock();
        if let Some(entry) = in_flight.get_mut(path) {
            entry.callers -= 1;
            if entry.callers == 0 {
                in_flight.remove(path);
            }
        }
    }

    fn lookup_or_insert(
        &self,
        caches: &mut LruCache<PathBuf, Arc<ReloadCache<T>>>,
        in_flight: &HashMap<PathBuf, InFlight<T>>,
        path: &Path,
    ) -> Arc<ReloadCache<T>> {
        if let Some(cache) = caches.get(path) {
            return Arc::clone(cache);
        }

        let cache = match in_flight.get(path) {
            Some(entry) => Arc::clone(&entry.cache),
            None => Arc::new(
                ReloadCache::with_shared_compiler(path, Arc::clone(&self.compiler))
                    .with_policy(self.policy),
            ),
        };
        caches.put(path.to_path_buf(), Arc::clone(&cache));
        cache
    }
}
