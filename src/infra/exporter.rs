// ============================================================
// Layer 6 — Exporter
// ============================================================
// Writes the final records in three forms:
//
//   1. GeoJSON FeatureCollection (primary)
//        one feature per record, properties
//        FAC, LOC, GPE, count, Latitude, Longitude
//        and the active geometry (Point or region polygon)
//   2. ESRI Shapefile (legacy), produced by re-reading (1)
//   3. CSV table with the geometry as GeoJSON text
//
// A Shapefile can hold a single shape type, so the legacy
// export is split:
//   <stem>.shp          Point features
//   <stem>_regions.shp  Polygon / MultiPolygon features
//                       (only written when there are any)
//
// dBase limits: field names up to 10 characters, character
// values up to 254 bytes. Longer values are cut at a UTF-8
// boundary.
//
// Output directories are created as needed.
//
// Reference: geojson crate documentation (FeatureCollection)
//            shapefile crate documentation (Writer)
//            csv crate documentation (Writer)

use anyhow::{anyhow, bail, Context, Result};
use geo::{Geometry, LineString, Polygon};
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject};
use serde::{Deserialize, Serialize};
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::PolygonRing;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::location::LocationGroup;
use crate::domain::spatial::SpatialRecord;

pub const CSV_FILE_NAME: &str = "processed_locations.csv";

/// Name of the CRS written into the GeoJSON `crs` member
const GEOJSON_CRS_NAME: &str = "urn:ogc:def:crs:OGC:1.3:CRS84";

/// ESRI WKT for WGS84, written as the .prj of every Shapefile
const WGS84_PRJ: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

const DBASE_TEXT_LEN: u8 = 254;

// ─── Feature model ────────────────────────────────────────────────────────────
/// Non-geometry attributes of one exported feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureAttributes {
    #[serde(rename = "FAC")]
    pub fac: String,
    #[serde(rename = "LOC")]
    pub loc: String,
    #[serde(rename = "GPE")]
    pub gpe: String,
    pub count: usize,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
}

/// Attributes plus the active geometry, as written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFeature {
    pub attributes: FeatureAttributes,
    pub geometry:   Geometry<f64>,
}

impl From<&SpatialRecord> for ExportFeature {
    fn from(record: &SpatialRecord) -> Self {
        let key = record.key();
        let c   = record.location.coordinates;
        Self {
            attributes: FeatureAttributes {
                fac:       key.fac.clone(),
                loc:       key.loc.clone(),
                gpe:       key.gpe.clone(),
                count:     record.location.group.count,
                latitude:  c.latitude,
                longitude: c.longitude,
            },
            geometry: record.geometry.clone(),
        }
    }
}

/// Paths produced by the legacy conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyOutputs {
    pub points:  PathBuf,
    pub regions: Option<PathBuf>,
}

// ─── Exporter ─────────────────────────────────────────────────────────────────
pub struct Exporter {
    output_dir: PathBuf,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write the primary GeoJSON file and return its path
    pub fn export_geojson(&self, records: &[SpatialRecord], file_name: &str) -> Result<PathBuf> {
        tracing::info!("Exporting {} features to GeoJSON...", records.len());

        let path     = self.prepare(file_name)?;
        let features: Vec<ExportFeature> = records.iter().map(ExportFeature::from).collect();

        write_geojson(&features, &path)?;

        tracing::info!("Exported GeoJSON to: {}", path.display());
        Ok(path)
    }

    /// Re-read a GeoJSON export and write it as Shapefile(s)
    pub fn convert_to_shapefile(&self, geojson_path: &Path, file_name: &str) -> Result<LegacyOutputs> {
        tracing::info!("Converting GeoJSON to Shapefile...");

        let features = read_geojson(geojson_path)?;
        let points_path = self.prepare(file_name)?;

        let (points, regions): (Vec<&ExportFeature>, Vec<&ExportFeature>) = features
            .iter()
            .partition(|f| matches!(f.geometry, Geometry::Point(_)));

        write_shapefile(&points, &points_path)?;

        let regions_path = if regions.is_empty() {
            None
        } else {
            let path = regions_sibling(&points_path);
            write_shapefile(&regions, &path)?;
            Some(path)
        };

        tracing::info!(
            "Shapefile saved to: {} ({} points, {} regions)",
            points_path.display(),
            points.len(),
            regions.len()
        );

        Ok(LegacyOutputs {
            points:  points_path,
            regions: regions_path,
        })
    }

    /// Write the flat attribute table and return its path
    pub fn export_csv(&self, records: &[SpatialRecord]) -> Result<PathBuf> {
        let path = self.prepare(CSV_FILE_NAME)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)
            .with_context(|| format!("Cannot create '{}'", path.display()))?;

        writer.write_record(["FAC", "LOC", "GPE", "count", "Latitude", "Longitude", "geometry"])?;

        for record in records {
            let f        = ExportFeature::from(record);
            let geometry = serde_json::to_string(&geojson::Geometry::new(geojson::Value::from(&f.geometry)))?;
            writer.write_record([
                f.attributes.fac,
                f.attributes.loc,
                f.attributes.gpe,
                f.attributes.count.to_string(),
                f.attributes.latitude.to_string(),
                f.attributes.longitude.to_string(),
                geometry,
            ])?;
        }
        writer.flush()?;

        tracing::info!("Processed data also saved to: {}", path.display());
        Ok(path)
    }

    /// Resolve a file name inside the output directory, creating
    /// the directory (and any parent of the file) first
    fn prepare(&self, file_name: &str) -> Result<PathBuf> {
        let path = self.output_dir.join(file_name);
        let dir  = path.parent().unwrap_or(&self.output_dir);
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;
        Ok(path)
    }
}

// ─── Location groups ─────────────────────────────────────────────────────────
/// Write canonical groups (no coordinates) as `FAC,LOC,GPE,count`
pub fn write_groups_csv(groups: &[LocationGroup], path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Cannot create '{}'", path.display()))?;

    writer.write_record(["FAC", "LOC", "GPE", "count"])?;
    for g in groups {
        writer.write_record([
            g.key.fac.as_str(),
            g.key.loc.as_str(),
            g.key.gpe.as_str(),
            g.count.to_string().as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

// ─── GeoJSON ──────────────────────────────────────────────────────────────────
fn write_geojson(features: &[ExportFeature], path: &Path) -> Result<()> {
    let mut geo_features = Vec::with_capacity(features.len());
    for f in features {
        let properties = match serde_json::to_value(&f.attributes)? {
            serde_json::Value::Object(map) => map,
            _ => bail!("Feature attributes did not serialise to an object"),
        };
        geo_features.push(Feature {
            bbox:            None,
            geometry:        Some(geojson::Geometry::new(geojson::Value::from(&f.geometry))),
            id:              None,
            properties:      Some(properties),
            foreign_members: None,
        });
    }

    let mut crs = JsonObject::new();
    crs.insert(
        "crs".to_string(),
        serde_json::json!({"type": "name", "properties": {"name": GEOJSON_CRS_NAME}}),
    );

    let collection = GeoJson::FeatureCollection(FeatureCollection {
        bbox:            None,
        features:        geo_features,
        foreign_members: Some(crs),
    });

    fs::write(path, serde_json::to_string_pretty(&collection)?)
        .with_context(|| format!("Cannot write '{}'", path.display()))?;
    Ok(())
}

/// Read features back from a GeoJSON file written by `export_geojson`
pub fn read_geojson(path: &Path) -> Result<Vec<ExportFeature>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    let geojson: GeoJson = text
        .parse()
        .with_context(|| format!("Invalid GeoJSON in '{}'", path.display()))?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => bail!("'{}' is not a FeatureCollection", path.display()),
    };

    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(i, feature)| {
            let properties = feature.properties.unwrap_or_default();
            let attributes: FeatureAttributes = serde_json::from_value(properties.into())
                .with_context(|| format!("Feature {} has missing or invalid attributes", i))?;
            let geometry = feature
                .geometry
                .ok_or_else(|| anyhow!("Feature {} has no geometry", i))?;
            let geometry = Geometry::<f64>::try_from(geometry.value)
                .with_context(|| format!("Feature {} has an unsupported geometry", i))?;
            Ok(ExportFeature { attributes, geometry })
        })
        .collect()
}

// ─── Shapefile ────────────────────────────────────────────────────────────────
/// Build a dBase field name, which must be short ASCII
pub fn field_name(name: &str) -> Result<FieldName> {
    FieldName::try_from(name).map_err(|_| anyhow!("Invalid dBase field name '{}'", name))
}

fn attribute_table() -> Result<TableWriterBuilder> {
    Ok(TableWriterBuilder::new()
        .add_character_field(field_name("FAC")?, DBASE_TEXT_LEN)
        .add_character_field(field_name("LOC")?, DBASE_TEXT_LEN)
        .add_character_field(field_name("GPE")?, DBASE_TEXT_LEN)
        .add_numeric_field(field_name("count")?, 10, 0)
        .add_numeric_field(field_name("Latitude")?, 19, 11)
        .add_numeric_field(field_name("Longitude")?, 19, 11))
}

fn attribute_record(a: &FeatureAttributes) -> Record {
    let mut record = Record::default();
    record.insert("FAC".to_string(), FieldValue::Character(Some(fit_dbase_text(&a.fac))));
    record.insert("LOC".to_string(), FieldValue::Character(Some(fit_dbase_text(&a.loc))));
    record.insert("GPE".to_string(), FieldValue::Character(Some(fit_dbase_text(&a.gpe))));
    record.insert("count".to_string(), FieldValue::Numeric(Some(a.count as f64)));
    record.insert("Latitude".to_string(), FieldValue::Numeric(Some(a.latitude)));
    record.insert("Longitude".to_string(), FieldValue::Numeric(Some(a.longitude)));
    record
}

fn write_shapefile(features: &[&ExportFeature], path: &Path) -> Result<()> {
    let mut writer = shapefile::Writer::from_path(path, attribute_table()?)
        .with_context(|| format!("Cannot create shapefile '{}'", path.display()))?;

    for f in features {
        let record = attribute_record(&f.attributes);
        match &f.geometry {
            Geometry::Point(p) => {
                writer.write_shape_and_record(&shapefile::Point::new(p.x(), p.y()), &record)?
            }
            Geometry::Polygon(p) => writer.write_shape_and_record(&to_shp_polygon([p]), &record)?,
            Geometry::MultiPolygon(mp) => {
                writer.write_shape_and_record(&to_shp_polygon(mp.0.iter()), &record)?
            }
            other => bail!("Cannot write {:?} geometry to a shapefile", other),
        }
    }
    // Dropping the writer finalises the .shp/.shx headers
    drop(writer);

    fs::write(path.with_extension("prj"), WGS84_PRJ)
        .with_context(|| format!("Cannot write projection for '{}'", path.display()))?;
    Ok(())
}

fn to_shp_polygon<'a>(parts: impl IntoIterator<Item = &'a Polygon<f64>>) -> shapefile::Polygon {
    let ring_points = |ls: &LineString<f64>| -> Vec<shapefile::Point> {
        ls.coords().map(|c| shapefile::Point::new(c.x, c.y)).collect()
    };

    let mut rings = Vec::new();
    for polygon in parts {
        rings.push(PolygonRing::Outer(ring_points(polygon.exterior())));
        for hole in polygon.interiors() {
            rings.push(PolygonRing::Inner(ring_points(hole)));
        }
    }
    shapefile::Polygon::with_rings(rings)
}

fn regions_sibling(points_path: &Path) -> PathBuf {
    let stem = points_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("geometry");
    points_path.with_file_name(format!("{stem}_regions.shp"))
}

fn fit_dbase_text(value: &str) -> String {
    let max = DBASE_TEXT_LEN as usize;
    if value.len() <= max {
        return value.to_string();
    }
    let mut end = max;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].to_string()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::location::{CanonicalLocationKey, Coordinates, GeocodedLocation, LocationGroup};
    use geo::{polygon, Point};
    use tempfile::TempDir;

    fn point_record(fac: &str, gpe: &str, lat: f64, lon: f64) -> SpatialRecord {
        SpatialRecord::from_location(GeocodedLocation::new(
            LocationGroup::new(CanonicalLocationKey::new(fac, "", gpe), 4),
            Coordinates::new(lat, lon),
        ))
    }

    fn region_record() -> SpatialRecord {
        let mut r = point_record("", "Florida", 27.99, -81.76);
        r.geometry = Geometry::Polygon(polygon![
            (x: -87.6, y: 24.5),
            (x: -80.0, y: 24.5),
            (x: -80.0, y: 31.0),
            (x: -87.6, y: 31.0),
        ]);
        r.substituted = true;
        r
    }

    #[test]
    fn test_geojson_roundtrip_keeps_attributes_and_geometry() {
        let dir      = TempDir::new().unwrap();
        let exporter = Exporter::new(dir.path().join("nested/out"));
        let records  = vec![point_record("City Hall, Pier", "Tampa", 27.95, -82.46), region_record()];

        let path     = exporter.export_geojson(&records, "geometry.geojson").unwrap();
        let features = read_geojson(&path).unwrap();

        assert_eq!(features.len(), 2);
        assert_eq!(features[0], ExportFeature::from(&records[0]));
        assert_eq!(features[0].attributes.fac, "City Hall, Pier");
        assert_eq!(features[0].attributes.count, 4);
        assert!(matches!(features[1].geometry, Geometry::Polygon(_)));
        // Point coordinates survive on the substituted record
        assert_eq!(features[1].attributes.latitude, 27.99);
    }

    #[test]
    fn test_geojson_carries_crs_member() {
        let dir      = TempDir::new().unwrap();
        let exporter = Exporter::new(dir.path());
        let path     = exporter.export_geojson(&[], "empty.geojson").unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains(GEOJSON_CRS_NAME));
        assert!(read_geojson(&path).unwrap().is_empty());
    }

    fn text_field(record: &Record, name: &str) -> String {
        match record.get(name) {
            Some(FieldValue::Character(Some(v))) => v.trim().to_string(),
            Some(FieldValue::Character(None)) => String::new(),
            other => panic!("unexpected {} value {:?}", name, other),
        }
    }

    fn numeric_field(record: &Record, name: &str) -> f64 {
        match record.get(name) {
            Some(FieldValue::Numeric(Some(v))) => *v,
            other => panic!("unexpected {} value {:?}", name, other),
        }
    }

    fn assert_attributes(record: &Record, expected: &FeatureAttributes) {
        assert_eq!(text_field(record, "FAC"), expected.fac);
        assert_eq!(text_field(record, "LOC"), expected.loc);
        assert_eq!(text_field(record, "GPE"), expected.gpe);
        assert_eq!(numeric_field(record, "count"), expected.count as f64);
        assert!((numeric_field(record, "Latitude") - expected.latitude).abs() < 1e-9);
        assert!((numeric_field(record, "Longitude") - expected.longitude).abs() < 1e-9);
    }

    #[test]
    fn test_shapefile_conversion_splits_points_and_regions() {
        let dir      = TempDir::new().unwrap();
        let exporter = Exporter::new(dir.path());
        let records  = vec![point_record("City Hall", "Tampa", 27.95, -82.46), region_record()];

        let geojson = exporter.export_geojson(&records, "geometry.geojson").unwrap();
        let legacy  = exporter.convert_to_shapefile(&geojson, "geometry.shp").unwrap();

        let points = shapefile::read_as::<_, shapefile::Point, Record>(&legacy.points).unwrap();
        assert_eq!(points.len(), 1);
        let (shape, record) = &points[0];
        assert_eq!(Point::new(shape.x, shape.y), Point::new(-82.46, 27.95));
        assert_attributes(record, &ExportFeature::from(&records[0]).attributes);

        let regions_path = legacy.regions.expect("regions file");
        assert!(regions_path.ends_with("geometry_regions.shp"));
        let regions = shapefile::read_as::<_, shapefile::Polygon, Record>(&regions_path).unwrap();
        assert_eq!(regions.len(), 1);
        let (shape, record) = &regions[0];
        assert_eq!(shape.rings().len(), 1);
        // Substituted record keeps its geocoded coordinates as attributes
        assert_attributes(record, &ExportFeature::from(&records[1]).attributes);

        assert!(dir.path().join("geometry.prj").exists());
        assert!(dir.path().join("geometry_regions.prj").exists());
    }

    #[test]
    fn test_points_only_conversion_writes_no_regions_file() {
        let dir      = TempDir::new().unwrap();
        let exporter = Exporter::new(dir.path());
        let geojson  = exporter
            .export_geojson(&[point_record("", "Tampa", 27.95, -82.46)], "g.geojson")
            .unwrap();
        let legacy = exporter.convert_to_shapefile(&geojson, "g.shp").unwrap();
        assert!(legacy.regions.is_none());
    }

    #[test]
    fn test_csv_has_header_and_geometry_text() {
        let dir      = TempDir::new().unwrap();
        let exporter = Exporter::new(dir.path());
        let path     = exporter
            .export_csv(&[point_record("City Hall, Pier", "Tampa", 27.95, -82.46)])
            .unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers    = reader.headers().unwrap().clone();
        assert_eq!(headers.get(0), Some("FAC"));
        assert_eq!(headers.get(6), Some("geometry"));

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        // The comma inside FAC is quoted, not split
        assert_eq!(rows[0].get(0), Some("City Hall, Pier"));
        assert!(rows[0].get(6).unwrap().contains("\"Point\""));
    }

    #[test]
    fn test_groups_csv() {
        let dir  = TempDir::new().unwrap();
        let path = dir.path().join("groups/location_groups.csv");
        let groups = vec![
            LocationGroup::new(CanonicalLocationKey::new("", "", "Florida"), 7),
            LocationGroup::new(CanonicalLocationKey::new("Pier", "", "Naples"), 1),
        ];
        write_groups_csv(&groups, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines, vec!["FAC,LOC,GPE,count", ",,Florida,7", "Pier,,Naples,1"]);
    }

    #[test]
    fn test_long_text_is_cut_at_char_boundary() {
        let long = "é".repeat(200); // 400 bytes
        let cut  = fit_dbase_text(&long);
        assert!(cut.len() <= 254);
        assert!(cut.chars().all(|c| c == 'é'));
    }
}
