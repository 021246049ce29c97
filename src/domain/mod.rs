// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain structs, enums and traits describing what the pipeline
// works with. No file I/O, no HTTP and no output formats here;
// those belong to Layers 4 and 6.
//
// Data flows through these types strictly forward:
//
//   AnnotatedRecord → ExtractedEntities → CanonicalLocationKey
//     → LocationGroup → GeocodedLocation → SpatialRecord

// Input records, spans and per-record entity lists
pub mod entity;

// Canonical keys, groups and geocoded locations
pub mod location;

// Geometry records, boundary regions and coordinate systems
pub mod spatial;

// Capability traits implemented by the outer layers
pub mod traits;
