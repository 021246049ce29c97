// ============================================================
// Layer 5 — Polygon Substituter
// ============================================================
// A record whose key is nothing but a recognised region name,
// e.g. ("", "", "Florida"), refers to the whole region rather
// than a point in it. Its Point geometry is replaced by the
// region's boundary polygon.
//
// Two conditions, both required:
//   1. the key is region-only (see RegionCatalog)
//   2. the boundary index has an entry under the same
//      trimmed, lower-cased name
//
// Everything else, including a region-only key with no
// boundary entry, passes through unchanged.

use std::collections::HashMap;

use crate::domain::spatial::{BoundaryPolygon, RegionShape, SpatialRecord};
use crate::spatial::regions::{region_lookup_key, RegionCatalog};

pub struct PolygonSubstituter<'a> {
    catalog: RegionCatalog,
    index:   HashMap<String, &'a RegionShape>,
}

impl<'a> PolygonSubstituter<'a> {
    /// Index `boundaries` by normalised name. When two entries
    /// share a name the first one wins.
    pub fn new(catalog: RegionCatalog, boundaries: &'a [BoundaryPolygon]) -> Self {
        let mut index = HashMap::new();
        for boundary in boundaries {
            index
                .entry(region_lookup_key(&boundary.name))
                .or_insert(&boundary.shape);
        }
        Self { catalog, index }
    }

    /// Replace the geometry of every region-only record that has
    /// a matching boundary
    pub fn substitute(&self, records: Vec<SpatialRecord>) -> Vec<SpatialRecord> {
        tracing::info!("Adding region polygons...");

        let mut substituted = 0usize;
        let out: Vec<SpatialRecord> = records
            .into_iter()
            .map(|mut record| {
                if !self.catalog.is_region_only(record.key()) {
                    return record;
                }
                match self.index.get(&region_lookup_key(&record.key().gpe)) {
                    Some(shape) => {
                        record.geometry    = shape.to_geometry();
                        record.substituted = true;
                        substituted += 1;
                    }
                    None => {
                        tracing::debug!("No boundary for region '{}'", record.key().gpe);
                    }
                }
                record
            })
            .collect();

        tracing::info!("Added {} region polygons", substituted);
        out
    }
}
