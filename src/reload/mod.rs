//! Compiled-resource reload cache.
//!
//! This module keeps compiled artifacts in sync with the files they were
//! compiled from, using modification-time invalidation and a pull model: the
//! file is checked when an artifact is requested, never in the background.
//!
//! # Components
//!
//! - [`Compiler`]: collaborator turning file contents into an artifact
//! - [`Compiled`]: artifact tagged with its source path and modification time
//! - [`ReloadCache`]: one file, one compiler, recompiled only when the file changes
//! - [`ReloadRegistry`]: LRU-bounded set of caches sharing a compiler
//! - [`LayerConfigCompiler`]: compiles layer configuration JSON files
//!
//! # Example
//!
//! ```no_run
//! use tile_layer_core::reload::{LayerConfigCompiler, ReloadRegistry};
//! use tile_layer_core::TileLayerConfig;
//!
//! let registry: ReloadRegistry<TileLayerConfig> = ReloadRegistry::new(LayerConfigCompiler);
//!
//! // Compiled on first access, reused until the file changes
//! let layer = registry.get("layers/topp_states.json")?;
//! println!("{} caches {:?}", layer.name(), layer.mime_formats());
//! # Ok::<(), tile_layer_core::ReloadError>(())
//! ```

mod cache;
mod compiler;
mod registry;

pub use cache::{CacheState, ReloadCache, ReloadPolicy};
pub use compiler::{Compiled, Compiler, LayerConfigCompiler};
pub use registry::{ReloadRegistry, DEFAULT_RELOAD_CACHE_CAPACITY};
