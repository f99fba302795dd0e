//! File-backed compiled-resource cache.
//!
//! A [`ReloadCache`] owns one file and one compiler. Every call to
//! [`ReloadCache::get_if_modified`] stats the file; when its modification time
//! is strictly newer than the one recorded with the cached artifact (or nothing
//! is cached yet), the file is read and recompiled in the calling thread.
//!
//! # States
//!
//! ```text
//! Uninitialized ──compile ok──▶ Fresh ──file touched──▶ Stale
//!                                 ▲                      │
//!                                 └─────compile ok───────┘
//! ```
//!
//! A failed compile leaves the cache exactly as it was.
//!
//! # Concurrency
//!
//! Recompiles are serialized per cache: callers that find the entry stale
//! queue on a gate and, once inside, re-check whether a compile that finished
//! meanwhile already covers the current modification time. Results are
//! published with a single atomic pointer swap, so readers see either the old
//! or the new [`Compiled`] value.
//!
//! Modification times are compared at filesystem granularity; two writes
//! within one tick may be seen as a single change.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use arc_swap::ArcSwapOption;
use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::ReloadError;

use super::compiler::{Compiled, Compiler};

// =============================================================================
// Policy and State
// =============================================================================

/// What [`ReloadCache::get_if_modified`] does when the compiler fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReloadPolicy {
    /// Return the compile error. The last good artifact stays reachable
    /// through [`ReloadCache::current`].
    #[default]
    Propagate,

    /// Log the error and keep serving the last good artifact. Propagates if
    /// nothing has compiled successfully yet.
    ///
    /// A failed compile does not record the file's modification time, so a
    /// broken file is read and recompiled (and the warning logged) on every
    /// call until the file changes again.
    ServeStale,
}

/// Freshness of a cache relative to its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Nothing has been compiled yet.
    Uninitialized,
    /// The cached artifact matches the file's modification time.
    Fresh,
    /// The file changed since the cached artifact was compiled.
    Stale,
}

// =============================================================================
// ReloadCache
// =============================================================================

/// Lazily recompiled artifact backed by a file.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use bytes::Bytes;
/// use tile_layer_core::reload::ReloadCache;
///
/// let cache = ReloadCache::new("script.txt", |_: &Path, content: Bytes| {
///     String::from_utf8(content.to_vec())
/// });
///
/// let compiled = cache.get_if_modified()?;
/// println!("{} compiled from {}", compiled.artifact(), compiled.path().display());
/// # Ok::<(), tile_layer_core::ReloadError>(())
/// ```
pub struct ReloadCache<T> {
    /// The watched file
    path: PathBuf,

    /// Collaborator that turns file contents into an artifact
    compiler: Arc<dyn Compiler<T>>,

    /// Last successfully compiled artifact
    current: ArcSwapOption<Compiled<T>>,

    /// Serializes recompiles
    compile_gate: Mutex<()>,

    /// Number of compiler invocations, successful or not
    compile_count: AtomicUsize,

    policy: ReloadPolicy,
}

impl<T: Send + Sync + 'static> ReloadCache<T> {
    /// Create a cache for `path` using `compiler`.
    pub fn new(path: impl Into<PathBuf>, compiler: impl Compiler<T> + 'static) -> Self {
        Self::with_shared_compiler(path, Arc::new(compiler))
    }

    /// Create a cache whose compiler is shared with other caches.
    pub fn with_shared_compiler(path: impl Into<PathBuf>, compiler: Arc<dyn Compiler<T>>) -> Self {
        Self {
            path: path.into(),
            compiler,
            current: ArcSwapOption::empty(),
            compile_gate: Mutex::new(()),
            compile_count: AtomicUsize::new(0),
            policy: ReloadPolicy::default(),
        }
    }

    /// Set the compile failure policy.
    pub fn with_policy(mut self, policy: ReloadPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> ReloadPolicy {
        self.policy
    }

    /// Return an up-to-date artifact, recompiling if the file changed.
    ///
    /// # Errors
    ///
    /// - [`ReloadError::Io`] if the file cannot be stat'ed or read
    /// - [`ReloadError::Compile`] if the compiler fails (unless the policy is
    ///   [`ReloadPolicy::ServeStale`] and a previous artifact exists)
    ///
    /// The cached artifact is untouched on error.
    pub fn get_if_modified(&self) -> Result<Arc<Compiled<T>>, ReloadError> {
        // Fast path: unchanged file, no locking
        let modified = self.modified_time()?;
        if let Some(compiled) = self.fresh_for(modified) {
            return Ok(compiled);
        }

        let _gate = self.compile_gate.lock();

        // A compile may have finished while we waited on the gate
        let modified = self.modified_time()?;
        if let Some(compiled) = self.fresh_for(modified) {
            return Ok(compiled);
        }

        match self.compile(modified) {
            Ok(compiled) => {
                let compiled = Arc::new(compiled);
                self.current.store(Some(Arc::clone(&compiled)));
                Ok(compiled)
            }
            Err(e) => self.handle_failure(e),
        }
    }

    /// Last successfully compiled artifact, without checking the file.
    pub fn current(&self) -> Option<Arc<Compiled<T>>> {
        self.current.load_full()
    }

    /// Whether the file has changed since the last successful compile.
    ///
    /// An uninitialized cache counts as modified.
    pub fn is_modified(&self) -> Result<bool, ReloadError> {
        Ok(self.state()? != CacheState::Fresh)
    }

    /// Current freshness, determined by stat'ing the file.
    pub fn state(&self) -> Result<CacheState, ReloadError> {
        let Some(current) = self.current.load_full() else {
            return Ok(CacheState::Uninitialized);
        };

        if self.modified_time()? > current.modified() {
            Ok(CacheState::Stale)
        } else {
            Ok(CacheState::Fresh)
        }
    }

    /// Number of times the compiler has been invoked.
    pub fn compile_count(&self) -> usize {
        self.compile_count.load(Ordering::SeqCst)
    }

    fn fresh_for(&self, modified: SystemTime) -> Option<Arc<Compiled<T>>> {
        self.current
            .load_full()
            .filter(|compiled| modified <= compiled.modified())
    }

    fn modified_time(&self) -> Result<SystemTime, ReloadError> {
        fs::metadata(&self.path)
            .and_then(|meta| meta.modified())
            .map_err(|source| ReloadError::Io {
                path: self.path.clone(),
                source,
            })
    }

    /// Read and compile the file.
    ///
    /// `modified` is the time stat'ed before reading. If the file changes
    /// between the stat and the read, the newer content is recorded with the
    /// older time and the next call simply compiles again.
    fn compile(&self, modified: SystemTime) -> Result<Compiled<T>, ReloadError> {
        let content = fs::read(&self.path).map_err(|source| ReloadError::Io {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), bytes = content.len(), "Compiling");
        self.compile_count.fetch_add(1, Ordering::SeqCst);

        let artifact = self
            .compiler
            .compile(&self.path, Bytes::from(content))
            .map_err(|source| ReloadError::Compile {
                path: self.path.clone(),
                source,
            })?;

        Ok(Compiled::new(self.path.clone(), modified, artifact))
    }

    fn handle_failure(&self, error: ReloadError) -> Result<Arc<Compiled<T>>, ReloadError> {
        if self.policy == ReloadPolicy::ServeStale && error.is_compile() {
            if let Some(stale) = self.current.load_full() {
                warn!(error = %error, "Serving last good artifact");
                return Ok(stale);
            }
        }
        Err(error)
    }
}

// =============================================================================
// Tests
// =============================================================================
