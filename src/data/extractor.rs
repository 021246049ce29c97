// ============================================================
// Layer 4 — Entity Span Extractor
// ============================================================
// Slices each span out of its record's text and files the
// substring under FAC, LOC or GPE.
//
// Span offsets are character positions, so slicing walks
// chars rather than indexing bytes (a byte slice could land in
// the middle of a multi-byte character and panic).
//
// Annotation noise is expected upstream:
//   - `end` past the end of the text is clamped to the text
//   - an empty or inverted span after clamping is skipped
// Neither is an error.

use crate::domain::entity::{AnnotatedRecord, ExtractedEntities};

pub struct EntitySpanExtractor;

impl EntitySpanExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the entity texts of one record, preserving span order
    pub fn extract(&self, record: &AnnotatedRecord) -> ExtractedEntities {
        let char_count   = record.text.chars().count();
        let mut entities = ExtractedEntities::default();

        for span in &record.spans {
            let end = span.end.min(char_count);
            if span.start >= end {
                tracing::debug!(
                    "Skipping span [{}, {}) outside text of {} chars",
                    span.start,
                    span.end,
                    char_count
                );
                continue;
            }

            let text: String = record
                .text
                .chars()
                .skip(span.start)
                .take(end - span.start)
                .collect();

            entities.push(span.kind, text);
        }

        if entities.is_empty() && !record.spans.is_empty() {
            tracing::debug!("All {} spans of a record were skipped", record.spans.len());
        }

        entities
    }
}

impl Default for EntitySpanExtractor {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{EntitySpan, EntityType};

    fn record(text: &str, spans: &[(usize, usize, EntityType)]) -> AnnotatedRecord {
        AnnotatedRecord::new(
            text,
            spans.iter().map(|&(s, e, k)| EntitySpan::new(s, e, k)).collect(),
        )
    }

    #[test]
    fn test_routes_by_type() {
        let r = record(
            "City Hall in Tampa near the Bay",
            &[
                (0, 9, EntityType::Fac),
                (13, 18, EntityType::Gpe),
                (28, 31, EntityType::Loc),
            ],
        );
        let e = EntitySpanExtractor::new().extract(&r);
        assert_eq!(e.fac, vec!["City Hall"]);
        assert_eq!(e.gpe, vec!["Tampa"]);
        assert_eq!(e.loc, vec!["Bay"]);
    }

    #[test]
    fn test_keeps_duplicates_and_overlaps() {
        let r = record(
            "Tampa Tampa",
            &[
                (0, 5, EntityType::Gpe),
                (6, 11, EntityType::Gpe),
                (0, 5, EntityType::Loc),
            ],
        );
        let e = EntitySpanExtractor::new().extract(&r);
        assert_eq!(e.gpe, vec!["Tampa", "Tampa"]);
        assert_eq!(e.loc, vec!["Tampa"]);
    }

    #[test]
    fn test_offsets_are_characters_not_bytes() {
        // "São Paulo" has a two-byte character at index 1
        let r = record("Rain in São Paulo", &[(8, 17, EntityType::Gpe)]);
        let e = EntitySpanExtractor::new().extract(&r);
        assert_eq!(e.gpe, vec!["São Paulo"]);
    }

    #[test]
    fn test_out_of_range_spans_are_clamped_or_skipped() {
        let r = record(
            "Ohio",
            &[
                (0, 40, EntityType::Gpe),  // clamped to "Ohio"
                (10, 12, EntityType::Gpe), // starts past the end
                (3, 3, EntityType::Loc),   // empty
                (3, 1, EntityType::Fac),   // inverted
            ],
        );
        let e = EntitySpanExtractor::new().extract(&r);
        assert_eq!(e.gpe, vec!["Ohio"]);
        assert!(e.loc.is_empty());
        assert!(e.fac.is_empty());
    }

    #[test]
    fn test_no_spans_gives_empty_entities() {
        let e = EntitySpanExtractor::new().extract(&record("nothing", &[]));
        assert!(e.is_empty());
    }
}
