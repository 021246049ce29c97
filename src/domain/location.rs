// ============================================================
// Layer 3 — Location Domain Types
// ============================================================
// A CanonicalLocationKey is the (FAC, LOC, GPE) string triple
// a record collapses to after deduplication. Records with the
// same key are counted together as one LocationGroup, which is
// the unit the geocoder resolves.
//
// Field order matters: the derived Ord compares fac, then loc,
// then gpe, which is the order groups are reported in.

use serde::{Deserialize, Serialize};

/// Canonical `(fac, loc, gpe)` triple identifying one location.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CanonicalLocationKey {
    pub fac: String,
    pub loc: String,
    pub gpe: String,
}

impl CanonicalLocationKey {
    pub fn new(fac: impl Into<String>, loc: impl Into<String>, gpe: impl Into<String>) -> Self {
        Self {
            fac: fac.into(),
            loc: loc.into(),
            gpe: gpe.into(),
        }
    }

    /// True for the `("", "", "")` key of records with no entities
    pub fn is_empty(&self) -> bool {
        self.fac.is_empty() && self.loc.is_empty() && self.gpe.is_empty()
    }

    /// Free-text address submitted to the geocoder.
    ///
    /// Empty fields still contribute their segment, so a GPE-only
    /// key becomes `", , Florida"`.
    pub fn address(&self) -> String {
        format!("{}, {}, {}", self.fac, self.loc, self.gpe)
    }
}

/// A distinct location key and the number of records that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationGroup {
    pub key:   CanonicalLocationKey,
    pub count: usize,
}

impl LocationGroup {
    pub fn new(key: CanonicalLocationKey, count: usize) -> Self {
        Self { key, count }
    }
}

/// WGS84 latitude/longitude in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude:  f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// A group the geocoder resolved.
///
/// Unresolved groups never become a GeocodedLocation, so the
/// coordinates are not optional here.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedLocation {
    pub group:       LocationGroup,
    pub coordinates: Coordinates,
}

impl GeocodedLocation {
    pub fn new(group: LocationGroup, coordinates: Coordinates) -> Self {
        Self { group, coordinates }
    }

    pub fn key(&self) -> &CanonicalLocationKey {
        &self.group.key
    }
}
