use std::collections::HashMap;

use foundation::{Bounded, Extent};
use tracing::debug;

use crate::feature::{Feature, FeatureId};
use crate::index::{IndexEntry, SpatialIndex};

/// In-memory feature store for one layer plus its bounding-box index.
///
/// Ordering contract:
/// - `get_features` returns features in insertion order, with or without an
///   extent filter.
///
/// Queries are bbox-only: results may include features whose geometry does
/// not actually touch the query extent.
#[derive(Debug, Default)]
pub struct SpatialSource {
    features: Vec<Feature>,
    positions: HashMap<FeatureId, usize>,
    index: SpatialIndex,
}

impl SpatialSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a feature list with a single bulk load.
    pub fn from_features(features: impl IntoIterator<Item = Feature>) -> Self {
        let mut source = Self::new();
        for f in features {
            source.add_feature(f, true);
        }
        source.build_tree();
        source
    }

    /// Append a feature. With `skip_index` the index is left untouched and a
    /// later `build_tree` is expected. An id already present replaces the
    /// stored feature and rebuilds the index.
    pub fn add_feature(&mut self, feature: Feature, skip_index: bool) {
        if let Some(&pos) = self.positions.get(&feature.id) {
            self.features[pos] = feature;
            if !skip_index {
                self.build_tree();
            }
            return;
        }

        if !skip_index {
            if let Some(extent) = feature.extent() {
                self.index.insert(IndexEntry::new(&extent, feature.id.clone()));
            }
        }
        self.positions.insert(feature.id.clone(), self.features.len());
        self.features.push(feature);
    }

    /// Remove by id and rebuild the whole index.
    pub fn remove_feature(&mut self, id: &FeatureId) -> Option<Feature> {
        let pos = self.positions.remove(id)?;
        let removed = self.features.remove(pos);
        for p in self.positions.values_mut() {
            if *p > pos {
                *p -= 1;
            }
        }
        self.build_tree();
        Some(removed)
    }

    /// Replace a stored feature in place and re-index. Returns `false` when the
    /// id is unknown.
    pub fn update_feature(&mut self, feature: Feature) -> bool {
        let Some(&pos) = self.positions.get(&feature.id) else {
            return false;
        };
        self.features[pos] = feature;
        self.build_tree();
        true
    }

    /// Clear the index and bulk-load it from every stored feature.
    pub fn build_tree(&mut self) {
        let entries: Vec<IndexEntry> = self
            .features
            .iter()
            .filter_map(|f| f.extent().map(|e| IndexEntry::new(&e, f.id.clone())))
            .collect();
        debug!(features = self.features.len(), entries = entries.len(), "spatial index rebuilt");
        self.index.load(entries);
    }

    /// All features when `extent` is `None`, otherwise the indexed features
    /// whose bounding box overlaps it.
    pub fn get_features(&self, extent: Option<&Extent>) -> Vec<&Feature> {
        let Some(extent) = extent else {
            return self.features.iter().collect();
        };
        let mut hits: Vec<usize> = self
            .index
            .query(extent)
            .into_iter()
            .filter_map(|id| self.positions.get(id).copied())
            .collect();
        hits.sort_unstable();
        hits.dedup();
        hits.into_iter().map(|pos| &self.features[pos]).collect()
    }

    pub fn get(&self, id: &FeatureId) -> Option<&Feature> {
        self.positions.get(id).map(|&pos| &self.features[pos])
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn clear(&mut self) {
        self.features.clear();
        self.positions.clear();
        self.index.clear();
    }

    /// Bounding box of every stored feature.
    pub fn extent(&self) -> Option<Extent> {
        let mut iter = self.features.iter().filter_map(|f| f.extent());
        let mut out = iter.next()?;
        for e in iter {
            out.add(e);
        }
        Some(out)
    }
}
