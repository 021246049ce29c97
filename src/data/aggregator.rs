// ============================================================
// Layer 4 — Entity Aggregator
// ============================================================
// Turns per-record entity lists into counted location groups.
//
// Per record:
//   1. Deduplicate each class (FAC, LOC, GPE) into a set
//   2. Drop from FAC anything also present in LOC
//      (LOC wins; GPE is never touched)
//   3. Canonicalise each set into one string (see `canonicalize`)
//
// Across records:
//   4. Count records per (fac, loc, gpe) key
//   5. Order groups by key
//   6. Drop the ("", "", "") group of entity-less records
//   7. Keep at most `max_rows` groups
//
// Step 2 has to run on the raw sets, before canonicalisation
// changes the strings being compared.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::entity::ExtractedEntities;
use crate::domain::location::{CanonicalLocationKey, LocationGroup};

/// Group cap used when the caller does not choose one
pub const DEFAULT_MAX_ROWS: usize = 300;

/// Separator between entity texts inside one key field
pub const ENTITY_DELIMITER: &str = ", ";

/// Canonicalise a collection of entity texts into one key field.
///
/// Deduplicates the raw texts, then removes every `#`, sorts by
/// code point, joins with `", "` and trims spaces and commas
/// from both ends (an entity that was only `#` would otherwise
/// leave a leading separator).
///
/// Deduplication happens once, before stripping: `#Tampa` and
/// `Tampa` are distinct entities and both survive as `Tampa`.
pub fn canonicalize<I, S>(entities: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let distinct: BTreeSet<String> = entities.into_iter().map(|e| e.as_ref().to_string()).collect();

    let mut cleaned: Vec<String> = distinct.into_iter().map(|e| e.replace('#', "")).collect();
    cleaned.sort();

    let joined = cleaned.join(ENTITY_DELIMITER);

    joined.trim_matches(|c| c == ' ' || c == ',').to_string()
}

/// Build the canonical key of a single record
pub fn canonical_key(entities: &ExtractedEntities) -> CanonicalLocationKey {
    let loc: BTreeSet<&str> = entities.loc.iter().map(String::as_str).collect();
    let gpe: BTreeSet<&str> = entities.gpe.iter().map(String::as_str).collect();
    let fac: BTreeSet<&str> = entities
        .fac
        .iter()
        .map(String::as_str)
        .filter(|f| !loc.contains(f))
        .collect();

    CanonicalLocationKey::new(canonicalize(fac), canonicalize(loc), canonicalize(gpe))
}

/// Result of grouping one batch of records.
#[derive(Debug, Clone, Default)]
pub struct GroupedLocations {
    /// Retained groups in ascending key order
    pub groups: Vec<LocationGroup>,
    /// Number of records fed in
    pub total_records: usize,
    /// Records whose key was ("", "", "")
    pub empty_key_records: usize,
    /// Groups cut off by the row cap
    pub truncated_groups: usize,
}

pub struct EntityAggregator {
    /// 0 disables the cap
    max_rows: usize,
}

impl EntityAggregator {
    pub fn new(max_rows: usize) -> Self {
        Self { max_rows }
    }

    /// Group every record's canonical key and count occurrences
    pub fn aggregate(&self, records: &[ExtractedEntities]) -> GroupedLocations {
        tracing::info!("Processing entities...");

        // ── Count records per key ─────────────────────────────────────────────
        // BTreeMap keeps keys sorted, so iteration order is the
        // (fac, loc, gpe) order groups are reported in.
        let mut counts: BTreeMap<CanonicalLocationKey, usize> = BTreeMap::new();
        for entities in records {
            *counts.entry(canonical_key(entities)).or_insert(0) += 1;
        }

        // ── Drop the entity-less group by predicate, not position ────────────
        let mut empty_key_records = 0;
        let mut groups: Vec<LocationGroup> = Vec::with_capacity(counts.len());
        for (key, count) in counts {
            if key.is_empty() {
                empty_key_records += count;
            } else {
                groups.push(LocationGroup::new(key, count));
            }
        }

        // ── Apply the row cap ─────────────────────────────────────────────────
        let mut truncated_groups = 0;
        if self.max_rows > 0 && groups.len() > self.max_rows {
            truncated_groups = groups.len() - self.max_rows;
            groups.truncate(self.max_rows);
        }

        tracing::info!(
            "Processed {} unique location combinations ({} records without entities, {} groups over the cap)",
            groups.len(),
            empty_key_records,
            truncated_groups
        );

        GroupedLocations {
            groups,
            total_records: records.len(),
            empty_key_records,
            truncated_groups,
        }
    }
}

impl Default for EntityAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ROWS)
    }
}
