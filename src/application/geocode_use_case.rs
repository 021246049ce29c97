// ============================================================
// Layer 2 — GeocodeUseCase
// ============================================================
// Runs the full pipeline, one stage after the other, each
// stage fully materialised before the next starts:
//
//   Step 1: Load annotated records      (Layer 4 - data)
//   Step 2: Load boundary dataset       (Layer 6 - infra)
//   Step 3: Extract entity texts        (Layer 4 - data)
//   Step 4: Group canonical keys        (Layer 4 - data)
//   Step 5: Geocode each group          (Layer 5 - spatial)
//   Step 6: Points + region filter      (Layer 5 - spatial)
//   Step 7: Region polygon substitution (Layer 5 - spatial)
//   Step 8: Export GeoJSON/Shapefile/CSV (Layer 6 - infra)
//
// The boundary dataset is loaded once, before any network
// traffic, and shared by steps 6 and 7. A missing dataset
// therefore aborts the run before the first lookup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

use crate::data::{
    aggregator::{EntityAggregator, DEFAULT_MAX_ROWS},
    extractor::EntitySpanExtractor,
    loader::JsonlLoader,
};
use crate::domain::entity::ExtractedEntities;
use crate::domain::traits::{BoundarySource, ForwardGeocoder, RecordSource};
use crate::infra::{
    boundary_store::{FileBoundarySource, DEFAULT_BOUNDARY_PATH},
    exporter::{Exporter, LegacyOutputs},
    nominatim::{NominatimGeocoder, DEFAULT_NOMINATIM_URL, DEFAULT_USER_AGENT},
};
use crate::spatial::{
    geocoding::{Geocoder, DEFAULT_LOOKUP_TIMEOUT},
    joiner::SpatialJoiner,
    regions::RegionCatalog,
    substituter::PolygonSubstituter,
};

/// File the effective configuration is saved to
pub const RUN_CONFIG_FILE: &str = "run_config.json";

// ─── Pipeline Configuration ──────────────────────────────────────────────────
// Everything a run needs. Serialisable so the effective
// settings can be written next to the outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub input:          String,
    pub boundaries:     String,
    pub target_regions: Vec<String>,
    /// 0 = no cap
    pub max_rows:       usize,
    pub output_dir:     String,
    pub geojson_name:   String,
    pub shapefile_name: Option<String>,
    pub skip_shapefile: bool,
    pub geocoder_url:   String,
    pub user_agent:     String,
    pub timeout_secs:   u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input:          String::new(),
            boundaries:     DEFAULT_BOUNDARY_PATH.to_string(),
            target_regions: Vec::new(),
            max_rows:       DEFAULT_MAX_ROWS,
            output_dir:     "data/processed".to_string(),
            geojson_name:   "geometry.geojson".to_string(),
            shapefile_name: None,
            skip_shapefile: false,
            geocoder_url:   DEFAULT_NOMINATIM_URL.to_string(),
            user_agent:     DEFAULT_USER_AGENT.to_string(),
            timeout_secs:   DEFAULT_LOOKUP_TIMEOUT.as_secs(),
        }
    }
}

impl PipelineConfig {
    /// Shapefile name: explicit, or the GeoJSON name with `.shp`
    pub fn shapefile_file_name(&self) -> String {
        match &self.shapefile_name {
            Some(name) => name.clone(),
            None => {
                let stem = Path::new(&self.geojson_name)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("geometry");
                format!("{stem}.shp")
            }
        }
    }
}

// ─── Pipeline Report ─────────────────────────────────────────────────────────
/// Per-stage counts and output locations of a finished run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub records:           usize,
    pub empty_key_records: usize,
    pub truncated_groups:  usize,
    pub groups:            usize,
    pub geocoded:          usize,
    pub not_found:         usize,
    pub timed_out:         usize,
    pub failed:            usize,
    /// Records left after the region filter, i.e. exported
    pub locations:         usize,
    pub polygons:          usize,
    pub geojson:           PathBuf,
    pub shapefile:         Option<LegacyOutputs>,
    pub csv:               PathBuf,
}

// ─── GeocodeUseCase ──────────────────────────────────────────────────────────
pub struct GeocodeUseCase {
    config:     PipelineConfig,
    records:    Box<dyn RecordSource>,
    geocoder:   Box<dyn ForwardGeocoder>,
    boundaries: Box<dyn BoundarySource>,
}

impl GeocodeUseCase {
    /// Wire the production collaborators from the config
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let records    = Box::new(JsonlLoader::new(&config.input));
        let geocoder   = Box::new(NominatimGeocoder::new(&config.geocoder_url, &config.user_agent)?);
        let boundaries = Box::new(FileBoundarySource::new(&config.boundaries));
        Ok(Self::with_components(config, records, geocoder, boundaries))
    }

    pub fn with_components(
        config:     PipelineConfig,
        records:    Box<dyn RecordSource>,
        geocoder:   Box<dyn ForwardGeocoder>,
        boundaries: Box<dyn BoundarySource>,
    ) -> Self {
        Self { config, records, geocoder, boundaries }
    }

    /// Execute the pipeline end to end
    pub fn execute(&self) -> Result<PipelineReport> {
        let cfg      = &self.config;
        let exporter = Exporter::new(&cfg.output_dir);

        // ── Step 1: Load annotated records ───────────────────────────────────
        let records = self.records.load_all()?;

        // ── Step 2: Load boundaries before any network traffic ───────────────
        let boundaries = self
            .boundaries
            .load_boundaries()
            .context("Boundary dataset is required for region filtering and polygon substitution")?;

        // ── Step 3: Extract FAC / LOC / GPE texts ────────────────────────────
        let extractor = EntitySpanExtractor::new();
        let extracted: Vec<ExtractedEntities> = records.iter().map(|r| extractor.extract(r)).collect();

        // ── Step 4: Canonicalise and group ───────────────────────────────────
        let grouped = EntityAggregator::new(cfg.max_rows).aggregate(&extracted);
        let groups  = grouped.groups.len();

        // ── Step 5: One bounded lookup per group ─────────────────────────────
        let geocoder = Geocoder::new(self.geocoder.as_ref(), Duration::from_secs(cfg.timeout_secs));
        let outcome  = geocoder.geocode_all(grouped.groups);
        let geocoded = outcome.located.len();

        // ── Step 6: Points, optionally filtered to target regions ────────────
        let joiner = SpatialJoiner::new();
        let points = joiner.to_points(outcome.located);
        let points = joiner.filter_within(points, &boundaries, &cfg.target_regions);

        // ── Step 7: Swap region-only points for boundary polygons ────────────
        let substituter = PolygonSubstituter::new(RegionCatalog::us_states(), &boundaries);
        let finals      = substituter.substitute(points);
        let polygons    = finals.iter().filter(|r| r.substituted).count();

        // ── Step 8: Export ───────────────────────────────────────────────────
        save_run_config(cfg, exporter.output_dir())?;

        let geojson   = exporter.export_geojson(&finals, &cfg.geojson_name)?;
        let shapefile = if cfg.skip_shapefile {
            None
        } else {
            Some(exporter.convert_to_shapefile(&geojson, &cfg.shapefile_file_name())?)
        };
        let csv = exporter.export_csv(&finals)?;

        Ok(PipelineReport {
            records:           grouped.total_records,
            empty_key_records: grouped.empty_key_records,
            truncated_groups:  grouped.truncated_groups,
            groups,
            geocoded,
            not_found:         outcome.not_found,
            timed_out:         outcome.timed_out,
            failed:            outcome.failed,
            locations:         finals.len(),
            polygons,
            geojson,
            shapefile,
            csv,
        })
    }
}

/// Write the effective configuration as pretty JSON
fn save_run_config(cfg: &PipelineConfig, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;

    let path = dir.join(RUN_CONFIG_FILE);
    let json = serde_json::to_string_pretty(cfg)?;
    fs::write(&path, json).with_context(|| format!("Cannot write config to '{}'", path.display()))?;

    tracing::debug!("Saved run config to '{}'", path.display());
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{AnnotatedRecord, EntitySpan, EntityType};
    use crate::domain::location::Coordinates;
    use crate::domain::spatial::{BoundaryPolygon, RegionShape};
    use crate::domain::traits::LookupError;
    use crate::infra::exporter::read_geojson;
    use geo::{polygon, Geometry};
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::rc::Rc;
    use tempfile::TempDir;

    struct FixedRecords(Vec<AnnotatedRecord>);

    impl RecordSource for FixedRecords {
        fn load_all(&self) -> Result<Vec<AnnotatedRecord>> {
            Ok(self.0.clone())
        }
    }

    /// Table-driven geocoder; unknown addresses time out
    struct TableGeocoder {
        table: HashMap<String, Coordinates>,
        calls: Rc<Cell<usize>>,
    }

    impl ForwardGeocoder for TableGeocoder {
        fn forward(&self, address: &str, _timeout: Duration) -> Result<Option<Coordinates>, LookupError> {
            self.calls.set(self.calls.get() + 1);
            self.table.get(address).copied().map(Some).ok_or(LookupError::Timeout)
        }
    }

    struct FixedBoundaries(Vec<BoundaryPolygon>);

    impl BoundarySource for FixedBoundaries {
        fn load_boundaries(&self) -> Result<Vec<BoundaryPolygon>> {
            Ok(self.0.clone())
        }
    }

    struct MissingBoundaries;

    impl BoundarySource for MissingBoundaries {
        fn load_boundaries(&self) -> Result<Vec<BoundaryPolygon>> {
            anyhow::bail!("Boundary dataset not found at 'nowhere.shp'")
        }
    }

    /// Build a record from the text, labelling each listed substring
    fn record(text: &str, labels: &[(&str, EntityType)]) -> AnnotatedRecord {
        let spans = labels
            .iter()
            .map(|(needle, kind)| {
                let byte_start = text.find(needle).unwrap();
                let start      = text[..byte_start].chars().count();
                EntitySpan::new(start, start + needle.chars().count(), *kind)
            })
            .collect();
        AnnotatedRecord::new(text, spans)
    }

    fn florida() -> BoundaryPolygon {
        BoundaryPolygon::new(
            "Florida",
            RegionShape::Polygon(polygon![
                (x: -87.6, y: 24.5),
                (x: -80.0, y: 24.5),
                (x: -80.0, y: 31.0),
                (x: -87.6, y: 31.0),
            ]),
        )
    }

    fn georgia() -> BoundaryPolygon {
        BoundaryPolygon::new(
            "Georgia",
            RegionShape::Polygon(polygon![
                (x: -85.6, y: 31.0),
                (x: -80.8, y: 31.0),
                (x: -80.8, y: 35.0),
                (x: -85.6, y: 35.0),
            ]),
        )
    }

    fn batch() -> Vec<AnnotatedRecord> {
        use EntityType::*;
        vec![
            record("Flooding across Florida tonight", &[("Florida", Gpe)]),
            record("More rain for Florida", &[("Florida", Gpe)]),
            record("Storm surge in the Florida Panhandle", &[("Florida Panhandle", Gpe)]),
            record("City Hall in Tampa is closed", &[("City Hall", Fac), ("Tampa", Gpe)]),
            record("Power out in Atlanta", &[("Atlanta", Gpe)]),
            record("Roads blocked in Slowtown", &[("Slowtown", Gpe)]),
            record("stay safe everyone", &[]),
        ]
    }

    fn geocoder(calls: Rc<Cell<usize>>) -> TableGeocoder {
        let mut table = HashMap::new();
        table.insert(", , Florida".to_string(), Coordinates::new(27.76, -81.68));
        table.insert(", , Florida Panhandle".to_string(), Coordinates::new(30.4, -86.0));
        table.insert("City Hall, , Tampa".to_string(), Coordinates::new(27.95, -82.46));
        table.insert(", , Atlanta".to_string(), Coordinates::new(33.75, -84.39));
        TableGeocoder { table, calls }
    }

    fn config(dir: &TempDir) -> PipelineConfig {
        PipelineConfig {
            input: "in-memory".to_string(),
            output_dir: dir.path().join("out").to_string_lossy().into_owned(),
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_full_pipeline_with_fakes() {
        let dir   = TempDir::new().unwrap();
        let calls = Rc::new(Cell::new(0));

        let use_case = GeocodeUseCase::with_components(
            config(&dir),
            Box::new(FixedRecords(batch())),
            Box::new(geocoder(calls.clone())),
            Box::new(FixedBoundaries(vec![florida(), georgia()])),
        );
        let report = use_case.execute().unwrap();

        assert_eq!(report.records, 7);
        assert_eq!(report.empty_key_records, 1);
        assert_eq!(report.groups, 5);
        // Exactly one lookup per group, no retries
        assert_eq!(calls.get(), 5);
        assert_eq!(report.timed_out, 1);
        assert_eq!(report.locations, 4);
        assert_eq!(report.polygons, 1);

        let features = read_geojson(&report.geojson).unwrap();
        assert_eq!(features.len(), 4);
        assert!(features.iter().all(|f| f.attributes.gpe != "Slowtown"));

        let by_gpe = |gpe: &str| features.iter().find(|f| f.attributes.gpe == gpe).unwrap();
        assert_eq!(by_gpe("Florida").geometry, florida().shape.to_geometry());
        assert_eq!(by_gpe("Florida").attributes.count, 2);
        assert!(matches!(by_gpe("Florida Panhandle").geometry, Geometry::Point(_)));
        assert!(matches!(by_gpe("Tampa").geometry, Geometry::Point(_)));

        let legacy = report.shapefile.unwrap();
        assert!(legacy.points.exists());
        assert!(legacy.regions.unwrap().exists());
        assert!(report.csv.exists());
        assert!(dir.path().join("out").join(RUN_CONFIG_FILE).exists());
    }

    #[test]
    fn test_region_filter_keeps_points_inside_targets() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir);
        cfg.target_regions = vec!["Georgia".to_string()];
        cfg.skip_shapefile = true;

        let use_case = GeocodeUseCase::with_components(
            cfg,
            Box::new(FixedRecords(batch())),
            Box::new(geocoder(Rc::new(Cell::new(0)))),
            Box::new(FixedBoundaries(vec![florida(), georgia()])),
        );
        let report = use_case.execute().unwrap();

        assert_eq!(report.locations, 1);
        assert!(report.shapefile.is_none());
        let features = read_geojson(&report.geojson).unwrap();
        assert_eq!(features[0].attributes.gpe, "Atlanta");
    }

    #[test]
    fn test_missing_boundaries_abort_before_geocoding() {
        let dir   = TempDir::new().unwrap();
        let calls = Rc::new(Cell::new(0));

        let use_case = GeocodeUseCase::with_components(
            config(&dir),
            Box::new(FixedRecords(batch())),
            Box::new(geocoder(calls.clone())),
            Box::new(MissingBoundaries),
        );
        let err = use_case.execute().unwrap_err();

        assert!(format!("{err:#}").contains("not found"));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_empty_batch_still_writes_outputs() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir);
        cfg.skip_shapefile = true;

        let use_case = GeocodeUseCase::with_components(
            cfg,
            Box::new(FixedRecords(vec![record("nothing to see", &[])])),
            Box::new(geocoder(Rc::new(Cell::new(0)))),
            Box::new(FixedBoundaries(vec![florida()])),
        );
        let report = use_case.execute().unwrap();

        assert_eq!(report.locations, 0);
        assert!(read_geojson(&report.geojson).unwrap().is_empty());
        assert!(report.csv.exists());
    }

    #[test]
    fn test_shapefile_name_defaults_to_geojson_stem() {
        let mut cfg = PipelineConfig::default();
        cfg.geojson_name = "storm.geojson".to_string();
        assert_eq!(cfg.shapefile_file_name(), "storm.shp");

        cfg.shapefile_name = Some("legacy.shp".to_string());
        assert_eq!(cfg.shapefile_file_name(), "legacy.shp");
    }
}
