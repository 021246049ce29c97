// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the annotator's JSONL output up to counted
// location groups:
//
//   ner.jsonl
//       │
//       ▼
//   JsonlLoader          → AnnotatedRecord per line
//       │
//       ▼
//   EntitySpanExtractor  → FAC / LOC / GPE texts per record
//       │
//       ▼
//   EntityAggregator     → sorted, counted LocationGroups
//
// Each step consumes the previous step's output and returns a
// new collection; nothing is mutated in place.

/// Reads annotated records from line-delimited JSON
pub mod loader;

/// Slices span texts out of each record
pub mod extractor;

/// Deduplicates, canonicalises and groups entity keys
pub mod aggregator;
