// ============================================================
// Layer 2 — GroupsUseCase
// ============================================================
// Runs only the offline half of the pipeline:
//
//   Step 1: Load annotated records  (Layer 4 - data)
//   Step 2: Extract entity texts    (Layer 4 - data)
//   Step 3: Group canonical keys    (Layer 4 - data)
//   Step 4: Optionally write a CSV  (Layer 6 - infra)
//
// Useful for checking what would be sent to the geocoder
// before spending any requests on it.

use anyhow::Result;
use std::path::Path;

use crate::data::{
    aggregator::{EntityAggregator, GroupedLocations, DEFAULT_MAX_ROWS},
    extractor::EntitySpanExtractor,
    loader::JsonlLoader,
};
use crate::domain::traits::RecordSource;
use crate::infra::exporter::write_groups_csv;

#[derive(Debug, Clone)]
pub struct GroupsConfig {
    pub input:    String,
    pub max_rows: usize,
    pub output:   Option<String>,
}

impl Default for GroupsConfig {
    fn default() -> Self {
        Self {
            input:    String::new(),
            max_rows: DEFAULT_MAX_ROWS,
            output:   None,
        }
    }
}

pub struct GroupsUseCase {
    config:  GroupsConfig,
    records: Box<dyn RecordSource>,
}

impl GroupsUseCase {
    pub fn new(config: GroupsConfig) -> Self {
        let records = Box::new(JsonlLoader::new(&config.input));
        Self::with_source(config, records)
    }

    pub fn with_source(config: GroupsConfig, records: Box<dyn RecordSource>) -> Self {
        Self { config, records }
    }

    pub fn execute(&self) -> Result<GroupedLocations> {
        let cfg = &self.config;

        // ── Step 1: Load ─────────────────────────────────────────────────────
        let records = self.records.load_all()?;

        // ── Step 2: Extract ──────────────────────────────────────────────────
        let extractor = EntitySpanExtractor::new();
        let extracted: Vec<_> = records.iter().map(|r| extractor.extract(r)).collect();

        // ── Step 3: Group ────────────────────────────────────────────────────
        let grouped = EntityAggregator::new(cfg.max_rows).aggregate(&extracted);

        // ── Step 4: Write ────────────────────────────────────────────────────
        if let Some(output) = &cfg.output {
            write_groups_csv(&grouped.groups, Path::new(output))?;
            tracing::info!("Wrote groups to '{}'", output);
        }

        Ok(grouped)
    }
}
