//! Tile layer configuration.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            TileLayerConfig              │
//! │  identity, formats, grids, expiry,      │
//! │  meta-tiling, legacy migration          │
//! └────────────────────┬────────────────────┘
//!                      │ owns
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │         ParameterFilterStore            │
//! │  (case-insensitive key → filter)        │
//! └────────────────────┬────────────────────┘
//!                      │ read by
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │   cached_styles() (style resolution)    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use tile_layer_core::layer::{StyleParameterFilter, TileLayerConfig};
//!
//! let mut config = TileLayerConfig::with_identity("layer-1", "topp:states");
//! config.set_mime_formats(["image/png"]);
//! config.set_meta_tiling_x(2).unwrap();
//! config.add_parameter_filter(StyleParameterFilter::new());
//!
//! assert!(config.is_auto_cache_styles());
//! assert!(config.cached_styles().is_empty());
//! assert_eq!(config.clone(), config);
//! ```

mod filter;
mod grid;
mod info;
mod record;
mod store;
mod styles;

pub use filter::{
    canonical_key, IntegerParameterFilter, ParameterFilter, RegexParameterFilter,
    StringParameterFilter, StyleParameterFilter, STYLES_KEY,
};
pub use grid::{
    is_expiry_sentinel, ExpirationRule, GridSubsetRef, CACHE_DISABLE_CACHE, CACHE_NEVER_EXPIRE,
    CACHE_USE_WMS_BACKEND_VALUE, CACHE_VALUE_UNSET,
};
pub use info::{TileLayerConfig, DEFAULT_GUTTER, DEFAULT_META_TILING};
pub use record::TileLayerConfigRecord;
pub use store::ParameterFilterStore;
