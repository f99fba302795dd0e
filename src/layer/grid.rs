//! Values owned by the grid and expiration subsystems.
//!
//! The layer configuration stores, clones and compares these but never
//! interprets them.

use serde::{Deserialize, Serialize};

// =============================================================================
// Cache Expiry Sentinels
// =============================================================================

/// No expiry has been configured for the layer.
pub const CACHE_VALUE_UNSET: i32 = 0;

/// Cached tiles never expire.
pub const CACHE_NEVER_EXPIRE: i32 = -1;

/// Caching is disabled for the layer.
pub const CACHE_DISABLE_CACHE: i32 = -1;

/// Defer to the expiry reported by the WMS backend.
pub const CACHE_USE_WMS_BACKEND_VALUE: i32 = -2;

/// Returns true if `seconds` is one of the sentinel values rather than a
/// magnitude.
pub fn is_expiry_sentinel(seconds: i32) -> bool {
    matches!(
        seconds,
        CACHE_VALUE_UNSET | CACHE_NEVER_EXPIRE | CACHE_USE_WMS_BACKEND_VALUE
    )
}

// =============================================================================
// Grid Subset Reference
// =============================================================================

/// Reference to a grid subset owned by the grid subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSubsetRef {
    /// Name of the gridset this subset narrows
    pub grid_set_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom_start: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom_stop: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_cached_level: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cached_level: Option<i32>,
}

impl GridSubsetRef {
    /// Create a reference covering the whole gridset.
    pub fn new(grid_set_name: impl Into<String>) -> Self {
        Self {
            grid_set_name: grid_set_name.into(),
            zoom_start: None,
            zoom_stop: None,
            min_cached_level: None,
            max_cached_level: None,
        }
    }

    /// Restrict the subset to a zoom range.
    pub fn with_zoom_range(mut self, start: i32, stop: i32) -> Self {
        self.zoom_start = Some(start);
        self.zoom_stop = Some(stop);
        self
    }
}

// =============================================================================
// Expiration Rule
// =============================================================================

/// Expiration applied from `min_zoom` upwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpirationRule {
    pub min_zoom: i32,

    /// Expiration in seconds (sentinels allowed)
    pub expiration: i32,
}

impl ExpirationRule {
    pub fn new(min_zoom: i32, expiration: i32) -> Self {
        Self {
            min_zoom,
            expiration,
        }
    }
}
