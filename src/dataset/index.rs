//! Spatial index over geocoded records.

use rstar::{RTree, RTreeObject, AABB};

use crate::geodesy::BoundingBox;
use crate::models::PostalCodeRecord;

/// R-tree entry pointing back at a record by position
#[derive(Debug, Clone)]
pub struct IndexedRecord {
    pub position: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedRecord {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree keyed by `[lon, lat]`
pub struct RecordIndex {
    tree: RTree<IndexedRecord>,
}

impl std::fmt::Debug for RecordIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordIndex")
            .field("entries", &self.tree.size())
            .finish()
    }
}

impl RecordIndex {
    /// Index every record that has a coordinate
    pub fn build(records: &[PostalCodeRecord]) -> Self {
        let indexed: Vec<IndexedRecord> = records
            .iter()
            .enumerate()
            .filter_map(|(position, r)| {
                r.coordinate.map(|c| IndexedRecord {
                    position,
                    envelope: AABB::from_point(c.as_xy()),
                })
            })
            .collect();

        Self {
            tree: RTree::bulk_load(indexed),
        }
    }

    /// Positions of records inside the box
    pub fn locate_in_box(&self, bbox: &BoundingBox) -> impl Iterator<Item = usize> + '_ {
        let (lower, upper) = bbox.corners();
        let envelope = AABB::from_corners(lower, upper);
        self.tree
            .locate_in_envelope(&envelope)
            .map(|ir| ir.position)
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
