//! Persisted form of a tile layer configuration.
//!
//! The record mirrors the stored JSON layout: filters are a list rather than
//! a keyed map, collections may be missing or `null`, and the legacy
//! `autoCacheStyles` flag may be present. Converting a record into a
//! [`TileLayerConfig`] normalizes all of that; converting back never writes
//! the legacy flag.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::filter::ParameterFilter;
use super::grid::{ExpirationRule, GridSubsetRef};
use super::info::TileLayerConfig;

/// Serialized layout of a [`TileLayerConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TileLayerConfigRecord {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub mime_formats: Option<BTreeSet<String>>,
    pub grid_subsets: Option<BTreeSet<GridSubsetRef>>,
    pub meta_width_height: Option<[i32; 2]>,
    pub gutter: i32,
    pub expire_cache: i32,
    pub expire_cache_list: Option<Vec<ExpirationRule>>,
    pub expire_clients: i32,
    pub parameter_filters: Option<Vec<ParameterFilter>>,

    /// Accepted on input for older configurations; never written back.
    #[serde(skip_serializing)]
    pub auto_cache_styles: Option<bool>,
}

impl From<TileLayerConfig> for TileLayerConfigRecord {
    fn from(config: TileLayerConfig) -> Self {
        Self {
            id: config.id().to_string(),
            name: config.name().to_string(),
            enabled: config.is_enabled(),
            mime_formats: Some(config.mime_formats().clone()),
            grid_subsets: Some(config.grid_subsets().clone()),
            meta_width_height: Some([config.meta_tiling_x(), config.meta_tiling_y()]),
            gutter: config.gutter(),
            expire_cache: config.expire_cache(),
            expire_cache_list: Some(config.expire_cache_rules().to_vec()),
            expire_clients: config.expire_clients(),
            parameter_filters: Some(config.parameter_filters()),
            auto_cache_styles: None,
        }
    }
}
