//! Cacheable style names derived from the style parameter filter.

use std::collections::BTreeSet;

use tracing::warn;

use super::filter::STYLES_KEY;
use super::info::TileLayerConfig;

impl TileLayerConfig {
    /// Style names whose tiles are cached for this layer.
    ///
    /// Empty when there is no `STYLES` filter, or when the filter is in auto
    /// mode and so has no enumerable list. A filter that has not been bound
    /// to the layer's styles yet is logged and treated as empty; this never
    /// fails.
    pub fn cached_styles(&self) -> BTreeSet<String> {
        let Some(filter) = self.parameter_filter(STYLES_KEY) else {
            return BTreeSet::new();
        };

        match filter.legal_values() {
            Ok(Some(styles)) => styles.into_iter().collect(),
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                warn!(layer = %self.name(), error = %e, "Style filter was not initialized properly");
                BTreeSet::new()
            }
        }
    }
}
