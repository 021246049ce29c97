// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the lower layers to accomplish one goal each:
// resolving a batch of annotated text into an exported map,
// or just reporting how the batch groups by location.
//
// Rules for this layer:
//   - No geometry or text processing here (Layers 4 and 5)
//   - No printing here (that's Layer 1)
//   - No direct HTTP or file-format code (that's Layer 6)
//   - Only workflow coordination

// The full text → geocode → map workflow
pub mod geocode_use_case;

// Grouping only, no network
pub mod groups_use_case;
