// ============================================================
// Layer 5 — Geocoding Stage
// ============================================================
// Sends one address per location group to a ForwardGeocoder
// and keeps only the groups that came back with coordinates.
//
// Rules:
//   - exactly one lookup per group, in group order
//   - each lookup is bounded by `timeout`
//   - no retries and no caching
//   - a timeout, an empty answer or any other lookup error
//     leaves the group unresolved; unresolved groups are
//     dropped, never passed on with missing coordinates

use std::time::Duration;

use crate::domain::location::{GeocodedLocation, LocationGroup};
use crate::domain::traits::{ForwardGeocoder, LookupError};

/// Bound on a single lookup when the caller does not choose one
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolved locations plus counts of what was dropped and why.
#[derive(Debug, Clone, Default)]
pub struct GeocodeOutcome {
    pub located:   Vec<GeocodedLocation>,
    pub not_found: usize,
    pub timed_out: usize,
    pub failed:    usize,
}

pub struct Geocoder<'a> {
    lookup:  &'a dyn ForwardGeocoder,
    timeout: Duration,
}

impl<'a> Geocoder<'a> {
    pub fn new(lookup: &'a dyn ForwardGeocoder, timeout: Duration) -> Self {
        Self { lookup, timeout }
    }

    /// Resolve every group, dropping those without coordinates
    pub fn geocode_all(&self, groups: Vec<LocationGroup>) -> GeocodeOutcome {
        tracing::info!("Geocoding {} addresses...", groups.len());

        let mut outcome = GeocodeOutcome::default();

        for group in groups {
            let address = group.key.address();

            match self.lookup.forward(&address, self.timeout) {
                Ok(Some(coordinates)) => {
                    tracing::debug!(
                        "'{}' → ({:.5}, {:.5})",
                        address,
                        coordinates.latitude,
                        coordinates.longitude
                    );
                    outcome.located.push(GeocodedLocation::new(group, coordinates));
                }
                Ok(None) => {
                    tracing::debug!("No match for '{}'", address);
                    outcome.not_found += 1;
                }
                Err(LookupError::Timeout) => {
                    tracing::debug!("Lookup timed out for '{}'", address);
                    outcome.timed_out += 1;
                }
                Err(e) => {
                    tracing::warn!("Lookup failed for '{}': {}", address, e);
                    outcome.failed += 1;
                }
            }
        }

        tracing::info!(
            "Successfully geocoded {} locations ({} not found, {} timed out, {} failed)",
            outcome.located.len(),
            outcome.not_found,
            outcome.timed_out,
            outcome.failed
        );

        outcome
    }
}
