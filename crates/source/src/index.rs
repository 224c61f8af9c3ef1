use foundation::Extent;
use rstar::{AABB, RTree, RTreeObject};

use crate::feature::FeatureId;

/// One R-tree item: a feature's bounding box and its id.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub feature_id: FeatureId,
}

impl IndexEntry {
    pub fn new(extent: &Extent, feature_id: FeatureId) -> Self {
        Self {
            min_x: extent.min_x,
            min_y: extent.min_y,
            max_x: extent.max_x,
            max_y: extent.max_y,
            feature_id,
        }
    }
}

impl RTreeObject for IndexEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.min_x, self.min_y], [self.max_x, self.max_y])
    }
}

/// Bounding-box index over feature ids.
#[derive(Debug, Default)]
pub struct SpatialIndex {
    tree: RTree<IndexEntry>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole tree with a bulk-loaded one.
    pub fn load(&mut self, entries: Vec<IndexEntry>) {
        self.tree = RTree::bulk_load(entries);
    }

    pub fn insert(&mut self, entry: IndexEntry) {
        self.tree.insert(entry);
    }

    pub fn clear(&mut self) {
        self.tree = RTree::new();
    }

    /// Ids of entries whose box overlaps `query` (borders included), in tree order.
    pub fn query(&self, query: &Extent) -> Vec<&FeatureId> {
        let mut q = *query;
        q.normalize();
        let envelope = AABB::from_corners([q.min_x, q.min_y], [q.max_x, q.max_y]);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| &entry.feature_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::{IndexEntry, SpatialIndex};
    use crate::feature::FeatureId;
    use foundation::Extent;

    fn entry(id: &str, e: [f64; 4]) -> IndexEntry {
        IndexEntry::new(&Extent::from(e), FeatureId::from(id))
    }

    #[test]
    fn bulk_load_then_query() {
        let mut index = SpatialIndex::new();
        index.load(vec![
            entry("a", [0.0, 0.0, 1.0, 1.0]),
            entry("b", [5.0, 5.0, 6.0, 6.0]),
            entry("c", [0.5, 0.5, 5.5, 5.5]),
        ]);
        assert_eq!(index.len(), 3);

        let mut hits: Vec<String> = index
            .query(&Extent::new(0.9, 0.9, 2.0, 2.0))
            .into_iter()
            .map(|id| id.to_string())
            .collect();
        hits.sort();
        assert_eq!(hits, vec!["a", "c"]);
    }

    #[test]
    fn touching_borders_intersect() {
        let mut index = SpatialIndex::new();
        index.insert(entry("a", [0.0, 0.0, 1.0, 1.0]));
        assert_eq!(index.query(&Extent::new(1.0, 1.0, 2.0, 2.0)).len(), 1);
        // reversed query corners are accepted
        assert_eq!(index.query(&Extent::new(2.0, 2.0, 1.0, 1.0)).len(), 1);
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.query(&Extent::new(0.0, 0.0, 1.0, 1.0)).len(), 0);
    }
}
