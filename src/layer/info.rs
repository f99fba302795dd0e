//! The tile layer configuration entity.
//!
//! [`TileLayerConfig`] holds everything the caching service knows about one
//! layer: identity, meta-tiling geometry, output formats, grid subsets,
//! expiration policy and parameter filters.
//!
//! # Legacy migration
//!
//! Older configurations carried a boolean `autoCacheStyles` flag instead of a
//! style parameter filter. The flag is kept only as transient input
//! ([`TileLayerConfig::set_legacy_auto_cache_styles`]) and is folded into the
//! filter store by [`TileLayerConfig::normalize`], which then clears it. The
//! filter store is the single authoritative representation afterwards.
//!
//! Materializing an entity from its persisted record always runs
//! `normalize`, while the value is still exclusively owned.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LayerError;

use super::filter::{ParameterFilter, StyleParameterFilter, STYLES_KEY};
use super::grid::{ExpirationRule, GridSubsetRef, CACHE_VALUE_UNSET};
use super::record::TileLayerConfigRecord;
use super::store::ParameterFilterStore;

/// Default meta-tiling factor in both directions.
pub const DEFAULT_META_TILING: i32 = 4;

/// Default gutter in pixels.
pub const DEFAULT_GUTTER: i32 = 0;

// =============================================================================
// TileLayerConfig
// =============================================================================

/// Configuration of a single cached tile layer.
///
/// Equality and hashing are structural over every field, transient ones
/// included. Cloning is a deep copy: no collection is shared between the
/// original and the clone.
#[derive(Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    try_from = "TileLayerConfigRecord",
    into = "TileLayerConfigRecord"
)]
pub struct TileLayerConfig {
    id: String,
    name: String,
    enabled: bool,
    mime_formats: BTreeSet<String>,
    grid_subsets: BTreeSet<GridSubsetRef>,
    meta_tiling: [i32; 2],
    gutter: i32,
    expire_cache: i32,
    expire_cache_rules: Vec<ExpirationRule>,
    expire_clients: i32,
    parameter_filters: ParameterFilterStore,
    legacy_auto_cache_styles: Option<bool>,
}

impl TileLayerConfig {
    /// Create an empty configuration with default geometry.
    pub fn new() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            enabled: false,
            mime_formats: BTreeSet::new(),
            grid_subsets: BTreeSet::new(),
            meta_tiling: [DEFAULT_META_TILING, DEFAULT_META_TILING],
            gutter: DEFAULT_GUTTER,
            expire_cache: CACHE_VALUE_UNSET,
            expire_cache_rules: Vec::new(),
            expire_clients: CACHE_VALUE_UNSET,
            parameter_filters: ParameterFilterStore::new(),
            legacy_auto_cache_styles: None,
        }
    }

    /// Create a configuration with the given identity.
    pub fn with_identity(id: impl Into<String>, name: impl Into<String>) -> Self {
        let mut config = Self::new();
        config.id = id.into();
        config.name = name.into();
        config
    }

    // -------------------------------------------------------------------------
    // Identity
    // -------------------------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    // -------------------------------------------------------------------------
    // Formats and grids
    // -------------------------------------------------------------------------

    pub fn mime_formats(&self) -> &BTreeSet<String> {
        &self.mime_formats
    }

    pub fn mime_formats_mut(&mut self) -> &mut BTreeSet<String> {
        &mut self.mime_formats
    }

    pub fn set_mime_formats<I, S>(&mut self, formats: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mime_formats = formats.into_iter().map(Into::into).collect();
    }

    pub fn grid_subsets(&self) -> &BTreeSet<GridSubsetRef> {
        &self.grid_subsets
    }

    pub fn grid_subsets_mut(&mut self) -> &mut BTreeSet<GridSubsetRef> {
        &mut self.grid_subsets
    }

    pub fn set_grid_subsets(&mut self, subsets: impl IntoIterator<Item = GridSubsetRef>) {
        self.grid_subsets = subsets.into_iter().collect();
    }

    // -------------------------------------------------------------------------
    // Geometry
    // -------------------------------------------------------------------------

    pub fn meta_tiling_x(&self) -> i32 {
        self.meta_tiling[0]
    }

    pub fn meta_tiling_y(&self) -> i32 {
        self.meta_tiling[1]
    }

    /// Set the meta-tiling width. Must be strictly positive.
    pub fn set_meta_tiling_x(&mut self, meta_tiling_x: i32) -> Result<(), LayerError> {
        self.meta_tiling[0] = check_meta_tiling("meta_tiling_x", meta_tiling_x)?;
        Ok(())
    }

    /// Set the meta-tiling height. Must be strictly positive.
    pub fn set_meta_tiling_y(&mut self, meta_tiling_y: i32) -> Result<(), LayerError> {
        self.meta_tiling[1] = check_meta_tiling("meta_tiling_y", meta_tiling_y)?;
        Ok(())
    }

    pub fn gutter(&self) -> i32 {
        self.gutter
    }

    pub fn set_gutter(&mut self, gutter: i32) {
        self.gutter = gutter;
    }

    // -------------------------------------------------------------------------
    // Expiration
    // -------------------------------------------------------------------------

    /// Server-side cache expiry in seconds, or one of the `CACHE_*` sentinels.
    pub fn expire_cache(&self) -> i32 {
        self.expire_cache
    }

    pub fn set_expire_cache(&mut self, seconds: i32) {
        self.expire_cache = seconds;
    }

    pub fn expire_cache_rules(&self) -> &[ExpirationRule] {
        &self.expire_cache_rules
    }

    pub fn set_expire_cache_rules(&mut self, rules: Vec<ExpirationRule>) {
        self.expire_cache_rules = rules;
    }

    /// Client-side expiry in seconds, or one of the `CACHE_*` sentinels.
    pub fn expire_clients(&self) -> i32 {
        self.expire_clients
    }

    pub fn set_expire_clients(&mut self, seconds: i32) {
        self.expire_clients = seconds;
    }

    // -------------------------------------------------------------------------
    // Parameter filters
    // -------------------------------------------------------------------------

    /// Insert a filter, replacing one with the same (case-insensitive) key.
    ///
    /// Returns `true` if an existing filter was replaced.
    pub fn add_parameter_filter(&mut self, filter: impl Into<ParameterFilter>) -> bool {
        self.parameter_filters.add(filter.into())
    }

    /// Returns `true` if a filter was removed.
    pub fn remove_parameter_filter(&mut self, key: &str) -> bool {
        self.parameter_filters.remove(key)
    }

    pub fn parameter_filter(&self, key: &str) -> Option<&ParameterFilter> {
        self.parameter_filters.get(key)
    }

    /// Snapshot of all parameter filters.
    pub fn parameter_filters(&self) -> Vec<ParameterFilter> {
        self.parameter_filters.get_all()
    }

    /// Replace every parameter filter.
    pub fn set_parameter_filters(&mut self, filters: impl IntoIterator<Item = ParameterFilter>) {
        self.parameter_filters = filters.into_iter().collect();
    }

    pub fn parameter_filter_store(&self) -> &ParameterFilterStore {
        &self.parameter_filters
    }

    /// Bind the style filter, if any, to the styles the layer offers.
    pub fn bind_available_styles<I, S>(&mut self, styles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(filter) = self
            .parameter_filters
            .get_mut(STYLES_KEY)
            .and_then(ParameterFilter::as_style_mut)
        {
            filter.bind_available_styles(styles);
        }
    }

    // -------------------------------------------------------------------------
    // Auto-cached styles
    // -------------------------------------------------------------------------

    /// True iff an auto-discovering style filter is registered under `STYLES`.
    pub fn is_auto_cache_styles(&self) -> bool {
        self.parameter_filters
            .get(STYLES_KEY)
            .and_then(ParameterFilter::as_style)
            .is_some_and(StyleParameterFilter::is_auto)
    }

    /// Legacy switch for automatic style caching.
    ///
    /// `true` installs an auto style filter unless one is already present
    /// (an explicit style filter is replaced). `false` removes any style
    /// filter under `STYLES`. Repeated calls are no-ops.
    pub fn set_auto_cache_styles(&mut self, auto_cache_styles: bool) {
        if auto_cache_styles {
            if !self.is_auto_cache_styles() {
                self.add_parameter_filter(StyleParameterFilter::new());
            }
        } else if self
            .parameter_filters
            .get(STYLES_KEY)
            .and_then(ParameterFilter::as_style)
            .is_some()
        {
            self.remove_parameter_filter(STYLES_KEY);
        }
    }

    /// Pending legacy flag, if it has not been resolved yet.
    pub fn legacy_auto_cache_styles(&self) -> Option<bool> {
        self.legacy_auto_cache_styles
    }

    /// Record a legacy `autoCacheStyles` value read from a persisted form.
    ///
    /// The value takes effect on the next [`normalize`](Self::normalize).
    pub fn set_legacy_auto_cache_styles(&mut self, value: Option<bool>) {
        self.legacy_auto_cache_styles = value;
    }

    /// Fold the legacy flag into the filter store and clear it.
    ///
    /// `true` adds an auto style filter if none is auto yet, `false` removes
    /// an auto style filter if present. Running it again does nothing.
    pub fn normalize(&mut self) {
        let Some(auto_cache_styles) = self.legacy_auto_cache_styles.take() else {
            return;
        };

        if auto_cache_styles {
            if !self.is_auto_cache_styles() {
                self.add_parameter_filter(StyleParameterFilter::new());
            }
        } else if self.is_auto_cache_styles() {
            self.remove_parameter_filter(STYLES_KEY);
        }

        debug!(
            layer = %self.name,
            auto_cache_styles,
            "Migrated legacy autoCacheStyles flag"
        );
    }
}

impl Default for TileLayerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for TileLayerConfig {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            enabled: self.enabled,
            mime_formats: self.mime_formats.iter().cloned().collect(),
            grid_subsets: self.grid_subsets.iter().map(GridSubsetRef::clone).collect(),
            meta_tiling: self.meta_tiling,
            gutter: self.gutter,
            expire_cache: self.expire_cache,
            expire_cache_rules: self.expire_cache_rules.to_vec(),
            expire_clients: self.expire_clients,
            parameter_filters: self
                .parameter_filters
                .get_all()
                .into_iter()
                .collect(),
            legacy_auto_cache_styles: self.legacy_auto_cache_styles,
        }
    }
}

impl TryFrom<TileLayerConfigRecord> for TileLayerConfig {
    type Error = LayerError;

    fn try_from(record: TileLayerConfigRecord) -> Result<Self, Self::Error> {
        let mut config = Self::with_identity(record.id, record.name);
        config.enabled = record.enabled;
        config.mime_formats = record.mime_formats.unwrap_or_default();
        config.grid_subsets = record.grid_subsets.unwrap_or_default();

        if let Some([x, y]) = record.meta_width_height {
            config
                .set_meta_tiling_x(x)
                .and_then(|_| config.set_meta_tiling_y(y))
                .map_err(|e| LayerError::Invalid(e.to_string()))?;
        }

        config.gutter = record.gutter;
        config.expire_cache = record.expire_cache;
        config.expire_cache_rules = record.expire_cache_list.unwrap_or_default();
        config.expire_clients = record.expire_clients;
        let filters = record.parameter_filters.unwrap_or_default();
        for filter in &filters {
            filter
                .validate()
                .map_err(|e| LayerError::Invalid(e.to_string()))?;
        }
        config.set_parameter_filters(filters);
        config.legacy_auto_cache_styles = record.auto_cache_styles;

        config.normalize();
        Ok(config)
    }
}

fn check_meta_tiling(field: &'static str, value: i32) -> Result<i32, LayerError> {
    if value <= 0 {
        return Err(LayerError::InvalidArgument {
            field,
            message: format!("must be greater than 0, got {}", value),
        });
    }
    Ok(value)
}

// =============================================================================
// Tests
// =============================================================================
