//! Test utilities for integration tests.
//!
//! Provides helpers for writing fixture files with controlled modification
//! times and a compiler that counts its invocations.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use bytes::Bytes;

use tile_layer_core::{BoxError, Compiler};

/// Write `content` to `path` and set its modification time to `tick` seconds
/// past a fixed base, so freshness checks never depend on clock granularity.
pub fn write_at_tick(path: &Path, content: &str, tick: u64) {
    let mut file = File::create(path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000 + tick))
        .unwrap();
}

/// Legacy layer file: no parameter filters, `autoCacheStyles` set.
pub const LEGACY_LAYER_JSON: &str = r#"{
    "id": "LayerInfoImpl--570ae188:124761b8d78:-7fd0",
    "name": "topp:states",
    "enabled": true,
    "mimeFormats": ["image/png", "image/jpeg"],
    "gridSubsets": [{"gridSetName": "EPSG:4326"}, {"gridSetName": "EPSG:900913"}],
    "metaWidthHeight": [4, 4],
    "gutter": 0,
    "expireCache": 0,
    "expireClients": 0,
    "autoCacheStyles": true
}"#;

/// Current-format layer file with explicit styles and extra filters.
pub const CURRENT_LAYER_JSON: &str = r#"{
    "id": "LayerInfoImpl-roads",
    "name": "tiger:roads",
    "enabled": true,
    "mimeFormats": ["image/png8"],
    "gridSubsets": [{"gridSetName": "EPSG:4326", "zoomStart": 0, "zoomStop": 14}],
    "metaWidthHeight": [2, 3],
    "gutter": 8,
    "expireCache": -2,
    "expireCacheList": [{"minZoom": 0, "expiration": 3600}, {"minZoom": 10, "expiration": 60}],
    "expireClients": 600,
    "parameterFilters": [
        {"type": "style", "defaultValue": "line", "styles": ["line", "casing"]},
        {"type": "regex", "key": "Time", "regex": "\\d{4}"},
        {"type": "integer", "key": "elevation", "values": [0, 100]}
    ]
}"#;

/// Compiler that upper-cases UTF-8 content, fails on content starting with
/// `error`, and counts every invocation.
#[derive(Clone, Default)]
pub struct CountingCompiler {
    count: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl CountingCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `delay` inside every compile.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl Compiler<String> for CountingCompiler {
    fn compile(&self, path: &Path, content: Bytes) -> Result<String, BoxError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        let text = String::from_utf8(content.to_vec())?;
        if text.starts_with("error") {
            return Err(format!("{}: unexpected token", path.display()).into());
        }
        Ok(text.to_uppercase())
    }
}
