// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that talks to the outside world:
//
//   nominatim.rs       — ForwardGeocoder over HTTP against a
//                        Nominatim search endpoint (blocking
//                        reqwest client, per-request timeout)
//
//   boundary_store.rs  — BoundarySource reading administrative
//                        boundaries from a Shapefile or GeoJSON
//                        file, reprojected to WGS84
//
//   exporter.rs        — GeoJSON, Shapefile and CSV output
//
// Keeping these here lets Layers 4 and 5 stay free of HTTP
// clients and file formats, and lets tests swap every one of
// them for an in-memory fake.

/// Nominatim forward-geocoding client
pub mod nominatim;

/// Boundary dataset reader
pub mod boundary_store;

/// GeoJSON / Shapefile / CSV writers
pub mod exporter;
