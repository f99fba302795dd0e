//! Layer configuration integration tests.
//!
//! Tests verify:
//! - Legacy files migrate into filter form exactly once
//! - Current files load with every field intact
//! - Clones are independent and equal
//! - Parameter filters resolve request values

use std::collections::HashSet;

use tile_layer_core::{
    ExpirationRule, FilterError, GridSubsetRef, LayerError, ParameterFilter,
    StringParameterFilter, StyleParameterFilter, TileLayerConfig, CACHE_USE_WMS_BACKEND_VALUE,
    STYLES_KEY,
};

use super::test_utils::{CURRENT_LAYER_JSON, LEGACY_LAYER_JSON};

// =============================================================================
// Loading and Migration
// =============================================================================

#[test]
fn test_legacy_layer_migrates_to_style_filter() {
    let layer: TileLayerConfig = serde_json::from_str(LEGACY_LAYER_JSON).unwrap();

    assert!(layer.is_auto_cache_styles());
    assert_eq!(layer.legacy_auto_cache_styles(), None);
    assert_eq!(layer.parameter_filters().len(), 1);
    assert!(layer.cached_styles().is_empty());
}

#[test]
fn test_migrated_layer_writes_current_format() {
    let layer: TileLayerConfig = serde_json::from_str(LEGACY_LAYER_JSON).unwrap();
    let json = serde_json::to_value(&layer).unwrap();

    assert!(json.get("autoCacheStyles").is_none());
    assert_eq!(json["parameterFilters"].as_array().unwrap().len(), 1);

    // Reloading the migrated form is stable
    let reloaded: TileLayerConfig = serde_json::from_value(json).unwrap();
    assert_eq!(reloaded, layer);
}

#[test]
fn test_current_layer_loads_all_fields() {
    let layer: TileLayerConfig = serde_json::from_str(CURRENT_LAYER_JSON).unwrap();

    assert_eq!(layer.id(), "LayerInfoImpl-roads");
    assert_eq!(layer.name(), "tiger:roads");
    assert!(layer.is_enabled());
    assert!(layer.mime_formats().contains("image/png8"));
    assert_eq!(
        layer.grid_subsets().iter().next(),
        Some(&GridSubsetRef::new("EPSG:4326").with_zoom_range(0, 14))
    );
    assert_eq!((layer.meta_tiling_x(), layer.meta_tiling_y()), (2, 3));
    assert_eq!(layer.gutter(), 8);
    assert_eq!(layer.expire_cache(), CACHE_USE_WMS_BACKEND_VALUE);
    assert_eq!(
        layer.expire_cache_rules(),
        &[ExpirationRule::new(0, 3600), ExpirationRule::new(10, 60)]
    );
    assert_eq!(layer.expire_clients(), 600);

    let keys: Vec<_> = layer.parameter_filter_store().keys().collect();
    assert_eq!(keys, vec!["ELEVATION", "STYLES", "TIME"]);
    assert!(!layer.is_auto_cache_styles());
}

#[test]
fn test_legacy_flag_does_not_override_explicit_styles() {
    let json = r#"{
        "name": "tiger:roads",
        "autoCacheStyles": false,
        "parameterFilters": [{"type": "style", "styles": ["line"]}]
    }"#;
    let layer: TileLayerConfig = serde_json::from_str(json).unwrap();

    assert_eq!(
        layer.parameter_filter(STYLES_KEY),
        Some(&ParameterFilter::from(StyleParameterFilter::with_styles(["line"])))
    );
}

#[test]
fn test_invalid_meta_tiling_in_file() {
    let json = r#"{"name": "bad", "metaWidthHeight": [4, 0]}"#;
    let err = serde_json::from_str::<TileLayerConfig>(json).unwrap_err();
    assert!(err.to_string().contains("meta_tiling_y"));
}

// =============================================================================
// Entity Behavior
// =============================================================================

#[test]
fn test_clone_independence() {
    let layer: TileLayerConfig = serde_json::from_str(CURRENT_LAYER_JSON).unwrap();
    let mut clone = layer.clone();
    assert_eq!(clone, layer);

    clone.mime_formats_mut().insert("image/jpeg".to_string());
    clone.grid_subsets_mut().insert(GridSubsetRef::new("EPSG:3857"));
    clone.add_parameter_filter(StringParameterFilter::new("ENV", ["a"]));

    assert_ne!(clone, layer);
    assert_eq!(layer.mime_formats().len(), 1);
    assert_eq!(layer.grid_subsets().len(), 1);
    assert!(layer.parameter_filter("ENV").is_none());
}

#[test]
fn test_equal_layers_hash_equal() {
    let a: TileLayerConfig = serde_json::from_str(CURRENT_LAYER_JSON).unwrap();
    let b: TileLayerConfig = serde_json::from_str(CURRENT_LAYER_JSON).unwrap();

    let set: HashSet<TileLayerConfig> = [a, b].into_iter().collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn test_meta_tiling_invariant() {
    let mut layer = TileLayerConfig::new();

    for bad in [0, -1] {
        assert!(matches!(
            layer.set_meta_tiling_x(bad),
            Err(LayerError::InvalidArgument { .. })
        ));
    }
    layer.set_meta_tiling_x(4).unwrap();
    assert_eq!(layer.meta_tiling_x(), 4);
}

#[test]
fn test_auto_cache_styles_toggle_sequence() {
    let mut layer: TileLayerConfig = serde_json::from_str(CURRENT_LAYER_JSON).unwrap();

    layer.set_auto_cache_styles(true);
    let after_true = layer.clone();
    layer.set_auto_cache_styles(true);
    assert_eq!(layer, after_true);

    layer.set_auto_cache_styles(false);
    let after_false = layer.clone();
    layer.set_auto_cache_styles(false);
    assert_eq!(layer, after_false);
    assert!(layer.parameter_filter(STYLES_KEY).is_none());
    assert_eq!(layer.parameter_filters().len(), 2);
}

// =============================================================================
// Filters and Styles
// =============================================================================

#[test]
fn test_cached_styles_after_binding() {
    let mut layer: TileLayerConfig = serde_json::from_str(CURRENT_LAYER_JSON).unwrap();

    // Unbound: masked as empty
    assert!(layer.cached_styles().is_empty());

    layer.bind_available_styles(["line", "casing", "label"]);
    let styles: Vec<_> = layer.cached_styles().into_iter().collect();
    assert_eq!(styles, vec!["casing".to_string(), "line".to_string()]);
}

#[test]
fn test_filters_resolve_request_values() {
    let layer: TileLayerConfig = serde_json::from_str(CURRENT_LAYER_JSON).unwrap();

    let time = layer.parameter_filter("time").unwrap();
    assert_eq!(time.apply(Some("2012")).unwrap(), "2012");
    assert!(matches!(
        time.apply(Some("12")),
        Err(FilterError::IllegalValue { .. })
    ));

    let elevation = layer.parameter_filter("Elevation").unwrap();
    assert!(elevation.applies("100").unwrap());
    assert_eq!(elevation.apply(None).unwrap(), "");

    let styles = layer.parameter_filter("styles").unwrap();
    assert_eq!(styles.apply(None).unwrap(), "line");
}
