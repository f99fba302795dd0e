//! # Tile Layer Core
//!
//! Configuration and dynamic-reload core of a tile caching service.
//!
//! The crate provides two independent pieces:
//!
//! - **Layer configuration**: a [`TileLayerConfig`] entity with deep cloning,
//!   structural equality, case-insensitive parameter filters, derived cached
//!   styles, and one-shot migration of the legacy `autoCacheStyles` flag.
//! - **Reload cache**: a [`ReloadCache`] that keeps a compiled artifact in
//!   sync with its backing file, recompiling only when the file's
//!   modification time advances.
//!
//! ## Architecture
//!
//! - [`layer`] - Tile layer configuration, parameter filters and style resolution
//! - [`reload`] - Compiler seam, reload cache and registry
//! - [`config`] - CLI configuration types
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```rust
//! use tile_layer_core::{StyleParameterFilter, TileLayerConfig};
//!
//! let mut config: TileLayerConfig =
//!     serde_json::from_str(r#"{"name": "topp:states", "autoCacheStyles": true}"#).unwrap();
//!
//! // The legacy flag became an explicit style filter
//! assert!(config.is_auto_cache_styles());
//! assert_eq!(config.legacy_auto_cache_styles(), None);
//!
//! config.add_parameter_filter(StyleParameterFilter::with_styles(["population"]));
//! config.bind_available_styles(["population", "polygon"]);
//! assert!(config.cached_styles().contains("population"));
//! ```

pub mod config;
pub mod error;
pub mod layer;
pub mod reload;

// Re-export commonly used types
pub use config::{CheckConfig, Cli, Command, MigrateConfig, StylesConfig};
pub use error::{BoxError, FilterError, LayerError, ReloadError};
pub use layer::{
    canonical_key, is_expiry_sentinel, ExpirationRule, GridSubsetRef, IntegerParameterFilter,
    ParameterFilter, ParameterFilterStore, RegexParameterFilter, StringParameterFilter,
    StyleParameterFilter, TileLayerConfig, TileLayerConfigRecord, CACHE_DISABLE_CACHE,
    CACHE_NEVER_EXPIRE, CACHE_USE_WMS_BACKEND_VALUE, CACHE_VALUE_UNSET, DEFAULT_GUTTER,
    DEFAULT_META_TILING, STYLES_KEY,
};
pub use reload::{
    CacheState, Compiled, Compiler, LayerConfigCompiler, ReloadCache, ReloadPolicy,
    ReloadRegistry, DEFAULT_RELOAD_CACHE_CAPACITY,
};
