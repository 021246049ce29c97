// ============================================================
// Layer 5 — Spatial Joiner
// ============================================================
// Wraps geocoded locations as WGS84 points and, when target
// regions are given, keeps only the points lying strictly
// inside one of those regions.
//
// Region selection is by exact name. Boundaries reach this
// stage already reprojected to WGS84 by the boundary reader,
// so points and polygons share a coordinate system here.
//
// A point inside several selected regions is kept once.

use std::collections::HashSet;

use crate::domain::location::GeocodedLocation;
use crate::domain::spatial::{BoundaryPolygon, SpatialRecord};

pub struct SpatialJoiner;

impl SpatialJoiner {
    pub fn new() -> Self {
        Self
    }

    /// Build one Point record per location
    pub fn to_points(&self, located: Vec<GeocodedLocation>) -> Vec<SpatialRecord> {
        located.into_iter().map(SpatialRecord::from_location).collect()
    }

    /// Keep the records whose point falls within a target region.
    ///
    /// An empty `targets` list disables the filter.
    pub fn filter_within(
        &self,
        records:    Vec<SpatialRecord>,
        boundaries: &[BoundaryPolygon],
        targets:    &[String],
    ) -> Vec<SpatialRecord> {
        if targets.is_empty() {
            return records;
        }

        tracing::info!("Filtering data for regions: {:?}", targets);

        let wanted: HashSet<&str> = targets.iter().map(String::as_str).collect();
        let selected: Vec<&BoundaryPolygon> = boundaries
            .iter()
            .filter(|b| wanted.contains(b.name.as_str()))
            .collect();

        for target in targets {
            if !selected.iter().any(|b| &b.name == target) {
                tracing::warn!("No boundary named '{}' in the dataset", target);
            }
        }

        let kept: Vec<SpatialRecord> = records
            .into_iter()
            .filter(|r| {
                let point = r.point();
                selected.iter().any(|b| b.shape.contains_point(&point))
            })
            .collect();

        tracing::info!("Filtered to {} locations within target regions", kept.len());
        kept
    }
}
