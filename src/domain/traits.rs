// ============================================================
// Layer 3 — Core Traits (Capabilities)
// ============================================================
// The pipeline depends on three outside collaborators:
//
//   RecordSource     — where annotated text records come from
//   ForwardGeocoder  — turns a free-text address into coordinates
//   BoundarySource   — supplies administrative boundary polygons
//
// The application layer only sees these traits. Production
// implementations live in Layer 4 (JSONL loader) and Layer 6
// (Nominatim client, boundary file reader); tests plug in
// deterministic fakes so no network or dataset is needed.

use std::time::Duration;

use anyhow::Result;
use thiserror::Error;

use crate::domain::entity::AnnotatedRecord;
use crate::domain::location::Coordinates;
use crate::domain::spatial::BoundaryPolygon;

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Any component that can produce the batch of annotated records.
pub trait RecordSource {
    fn load_all(&self) -> Result<Vec<AnnotatedRecord>>;
}

// ─── ForwardGeocoder ──────────────────────────────────────────────────────────
/// Why a single lookup produced no answer.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("geocoding request timed out")]
    Timeout,
    #[error("geocoding transport failure: {0}")]
    Transport(String),
    #[error("geocoding service returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Resolves a free-text address to a coordinate pair.
///
/// `Ok(None)` means the service answered but found nothing.
/// Implementations must give up once `timeout` has elapsed and
/// report it as `LookupError::Timeout`.
pub trait ForwardGeocoder {
    fn forward(&self, address: &str, timeout: Duration) -> Result<Option<Coordinates>, LookupError>;
}

// ─── BoundarySource ───────────────────────────────────────────────────────────
/// Supplies the administrative boundary dataset, already in WGS84.
pub trait BoundarySource {
    fn load_boundaries(&self) -> Result<Vec<BoundaryPolygon>>;
}
