// ============================================================
// Layer 5 — Spatial Resolution
// ============================================================
// Takes counted location groups to final geometries:
//
//   geocoding.rs   — one bounded lookup per group, unresolved
//                    groups dropped
//   joiner.rs      — Point per location, optional
//                    within-region filter
//   substituter.rs — region-only keys swap their Point for the
//                    region's boundary polygon
//   regions.rs     — the list of region names that qualify
//
// The stages never touch files or the network directly; they
// work through the traits in domain::traits.

pub mod geocoding;
pub mod joiner;
pub mod regions;
pub mod substituter;
