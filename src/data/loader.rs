// ============================================================
// Layer 4 — Annotated Record Loader
// ============================================================
// Reads the NER output as line-delimited JSON, one record per
// line:
//
//   {"text": "Flooding near Tampa", "label": [[14, 19, "GPE"]]}
//
// Each label is a [start, end, type] triple of character
// offsets into `text`. Labels with negative offsets or with a
// type other than FAC/LOC/GPE are dropped here; offsets past
// the end of the text are left for the extractor to clamp.
//
// A missing file or a line that is not valid JSON is fatal:
// the input is the one resource the run cannot do without.
//
// Reference: serde_json documentation (from_str)

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::domain::entity::{AnnotatedRecord, EntitySpan, EntityType};
use crate::domain::traits::RecordSource;

/// One JSONL line as written by the annotator
#[derive(Debug, Deserialize)]
struct RawRecord {
    text: String,
    #[serde(default)]
    label: Vec<(i64, i64, String)>,
}

/// Loads annotated records from a `.jsonl` file.
pub struct JsonlLoader {
    path: PathBuf,
}

impl JsonlLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for JsonlLoader {
    fn load_all(&self) -> Result<Vec<AnnotatedRecord>> {
        tracing::info!("Loading data from: {}", self.path.display());

        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open input file '{}'", self.path.display()))?;

        let records = parse_lines(BufReader::new(file), &self.path)?;

        tracing::info!("Loaded {} records", records.len());
        Ok(records)
    }
}

/// Parse every non-blank line of a JSONL stream
fn parse_lines(reader: impl BufRead, path: &Path) -> Result<Vec<AnnotatedRecord>> {
    let mut records = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line    = line
            .with_context(|| format!("Cannot read line {} of '{}'", line_no, path.display()))?;

        if line.trim().is_empty() {
            continue;
        }

        let raw: RawRecord = serde_json::from_str(&line).with_context(|| {
            format!("Malformed record on line {} of '{}'", line_no, path.display())
        })?;

        records.push(into_record(raw));
    }

    Ok(records)
}

fn into_record(raw: RawRecord) -> AnnotatedRecord {
    let spans = raw
        .label
        .into_iter()
        .filter_map(|(start, end, label)| {
            let kind = EntityType::from_label(&label)?;
            if start < 0 || end < 0 {
                tracing::debug!("Dropping span with negative offsets [{}, {})", start, end);
                return None;
            }
            Some(EntitySpan::new(start as usize, end as usize, kind))
        })
        .collect();

    AnnotatedRecord::new(raw.text, spans)
}
