// ============================================================
// Layer 3 — Entity Domain Types
// ============================================================
// The raw material of the pipeline: one short text record and
// the NER spans an external annotator found inside it.
//
// Only three entity classes matter for location resolution:
//   FAC — facilities  (airports, bridges, hospitals, ...)
//   LOC — locations   (rivers, coasts, neighbourhoods, ...)
//   GPE — geopolitical entities (countries, states, cities)
//
// Every other label the annotator may emit (PERSON, ORG, ...)
// is ignored rather than rejected.

use serde::{Deserialize, Serialize};

/// The entity classes consumed by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Fac,
    Loc,
    Gpe,
}

impl EntityType {
    /// Map an annotator label onto an entity class.
    /// Returns None for labels outside FAC/LOC/GPE.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "FAC" => Some(Self::Fac),
            "LOC" => Some(Self::Loc),
            "GPE" => Some(Self::Gpe),
            _ => None,
        }
    }
}

/// A half-open `[start, end)` span of characters in a record's text.
///
/// Offsets count Unicode scalar values, not bytes, because the
/// annotator works on character positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitySpan {
    pub start: usize,
    pub end:   usize,
    pub kind:  EntityType,
}

impl EntitySpan {
    pub fn new(start: usize, end: usize, kind: EntityType) -> Self {
        Self { start, end, kind }
    }
}

/// One input record: the text and its spans, in annotator order.
#[derive(Debug, Clone, Default)]
pub struct AnnotatedRecord {
    pub text:  String,
    pub spans: Vec<EntitySpan>,
}

impl AnnotatedRecord {
    pub fn new(text: impl Into<String>, spans: Vec<EntitySpan>) -> Self {
        Self {
            text: text.into(),
            spans,
        }
    }
}

/// Entity texts sliced out of one record, one list per class.
/// Order follows the spans; duplicates are kept at this stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedEntities {
    pub fac: Vec<String>,
    pub loc: Vec<String>,
    pub gpe: Vec<String>,
}

impl ExtractedEntities {
    /// Route one entity text into the list for its class
    pub fn push(&mut self, kind: EntityType, text: String) {
        match kind {
            EntityType::Fac => self.fac.push(text),
            EntityType::Loc => self.loc.push(text),
            EntityType::Gpe => self.gpe.push(text),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fac.is_empty() && self.loc.is_empty() && self.gpe.is_empty()
    }
}
