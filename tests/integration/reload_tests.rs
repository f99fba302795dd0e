//! Reload cache integration tests.
//!
//! Tests verify:
//! - Artifacts are reused until the file's modification time advances
//! - Compile failures keep the last good artifact
//! - Concurrent readers trigger a single compile
//! - Readers racing a recompile see the old or the new artifact, never a mix
//! - The layer registry picks up edited layer files

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tempfile::TempDir;

use tile_layer_core::{
    CacheState, LayerConfigCompiler, ReloadCache, ReloadError, ReloadPolicy, ReloadRegistry,
    TileLayerConfig,
};

use super::test_utils::{write_at_tick, CountingCompiler, CURRENT_LAYER_JSON, LEGACY_LAYER_JSON};

// =============================================================================
// Freshness
// =============================================================================

#[test]
fn test_untouched_file_compiles_once() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("script.js");
    write_at_tick(&path, "content a", 0);

    let compiler = CountingCompiler::new();
    let cache: ReloadCache<String> = ReloadCache::new(&path, compiler.clone());

    let first = cache.get_if_modified().unwrap();
    for _ in 0..5 {
        assert!(Arc::ptr_eq(&cache.get_if_modified().unwrap(), &first));
    }
    assert_eq!(compiler.count(), 1);
    assert_eq!(first.artifact(), "CONTENT A");
}

#[test]
fn test_rewritten_file_reflects_new_content() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("script.js");
    write_at_tick(&path, "content a", 0);

    let compiler = CountingCompiler::new();
    let cache: ReloadCache<String> = ReloadCache::new(&path, compiler.clone());
    cache.get_if_modified().unwrap();

    write_at_tick(&path, "content b", 1);
    let compiled = cache.get_if_modified().unwrap();

    assert_eq!(compiled.artifact(), "CONTENT B");
    assert_eq!(compiled.path(), path.as_path());
    assert_eq!(compiler.count(), 2);
}

// =============================================================================
// Failure Handling
// =============================================================================

#[test]
fn test_failure_then_fix() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("script.js");
    write_at_tick(&path, "content a", 0);

    let cache: ReloadCache<String> = ReloadCache::new(&path, CountingCompiler::new());
    let good = cache.get_if_modified().unwrap();

    write_at_tick(&path, "error b", 1);
    let err = cache.get_if_modified().unwrap_err();
    assert!(matches!(err, ReloadError::Compile { .. }));
    assert!(err.to_string().contains("unexpected token"));

    // No further change: same failure, previous artifact still available
    assert!(cache.get_if_modified().unwrap_err().is_compile());
    assert!(Arc::ptr_eq(&cache.current().unwrap(), &good));

    write_at_tick(&path, "content c", 2);
    assert_eq!(cache.get_if_modified().unwrap().artifact(), "CONTENT C");
    assert_eq!(cache.state().unwrap(), CacheState::Fresh);
}

#[test]
fn test_serve_stale_keeps_last_good() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("script.js");
    write_at_tick(&path, "content a", 0);

    let cache: ReloadCache<String> =
        ReloadCache::new(&path, CountingCompiler::new()).with_policy(ReloadPolicy::ServeStale);
    cache.get_if_modified().unwrap();

    write_at_tick(&path, "error b", 1);
    assert_eq!(cache.get_if_modified().unwrap().artifact(), "CONTENT A");
}

#[test]
fn test_io_error_is_distinct_from_compile_error() {
    let dir = TempDir::new().unwrap();
    let compiler = CountingCompiler::new();
    let cache: ReloadCache<String> =
        ReloadCache::new(dir.path().join("missing.js"), compiler.clone());

    let err = cache.get_if_modified().unwrap_err();
    assert!(matches!(err, ReloadError::Io { .. }));
    assert!(!err.is_compile());
    assert_eq!(compiler.count(), 0);
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_concurrent_readers_see_complete_artifacts() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("script.js");
    write_at_tick(&path, "content a", 0);

    let compiler = CountingCompiler::new();
    let cache: Arc<ReloadCache<String>> = Arc::new(ReloadCache::new(&path, compiler.clone()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || cache.get_if_modified().unwrap())
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.iter().all(|c| c.artifact() == "CONTENT A"));
    assert_eq!(compiler.count(), 1);
}

#[test]
fn test_readers_during_recompile_see_whole_artifacts() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("script.js");
    write_at_tick(&path, "content a", 0);

    let compiler = CountingCompiler::with_delay(Duration::from_millis(100));
    let cache: ReloadCache<String> = ReloadCache::new(&path, compiler.clone());
    cache.get_if_modified().unwrap();

    write_at_tick(&path, "content b", 1);

    thread::scope(|scope| {
        let refreshers: Vec<_> = (0..6)
            .map(|_| scope.spawn(|| cache.get_if_modified().unwrap()))
            .collect();
        let readers: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    (0..20)
                        .map(|_| {
                            thread::sleep(Duration::from_millis(5));
                            cache.current().unwrap().artifact().clone()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for handle in refreshers {
            assert_eq!(handle.join().unwrap().artifact(), "CONTENT B");
        }
        for handle in readers {
            for seen in handle.join().unwrap() {
                assert!(seen == "CONTENT A" || seen == "CONTENT B", "saw {seen:?}");
            }
        }
    });

    assert_eq!(compiler.count(), 2);
    assert_eq!(cache.current().unwrap().artifact(), "CONTENT B");
}

// =============================================================================
// Layer Registry
// =============================================================================

#[test]
fn test_registry_reloads_edited_layer() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("topp_states.json");
    write_at_tick(&path, LEGACY_LAYER_JSON, 0);

    let registry: ReloadRegistry<TileLayerConfig> = ReloadRegistry::new(LayerConfigCompiler);

    let layer = registry.get(&path).unwrap();
    assert_eq!(layer.name(), "topp:states");
    assert!(layer.is_auto_cache_styles());
    assert!(Arc::ptr_eq(&registry.get(&path).unwrap(), &layer));

    write_at_tick(&path, CURRENT_LAYER_JSON, 1);
    let layer = registry.get(&path).unwrap();
    assert_eq!(layer.name(), "tiger:roads");
    assert!(!layer.is_auto_cache_styles());
}

#[test]
fn test_registry_broken_layer_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    write_at_tick(&path, r#"{"name": "x", "metaWidthHeight": [0, 0]}"#, 0);

    let registry: ReloadRegistry<TileLayerConfig> = ReloadRegistry::new(LayerConfigCompiler);
    let err = registry.get(&path).unwrap_err();

    assert!(err.is_compile());
    assert_eq!(err.path(), Path::new(&path));
}

#[test]
fn test_registry_rejects_layer_with_bad_pattern() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad_pattern.json");
    write_at_tick(
        &path,
        r#"{"name": "x", "parameterFilters": [{"type": "regex", "key": "Time", "regex": "(\\d"}]}"#,
        0,
    );

    let registry: ReloadRegistry<TileLayerConfig> = ReloadRegistry::new(LayerConfigCompiler);
    let err = registry.get(&path).unwrap_err();

    assert!(err.is_compile());
    assert!(err.to_string().contains("Time"));
}
