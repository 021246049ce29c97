// ============================================================
// Layer 6 — Boundary Dataset Reader
// ============================================================
// Loads administrative boundary polygons from disk and hands
// them out in WGS84.
//
// Supported inputs:
//   .shp              ESRI Shapefile; region name from the `name`
//                     column of the .dbf, CRS from the sibling
//                     .prj (absent .prj = WGS84)
//   .geojson / .json  FeatureCollection; region name from the
//                     `name` property, CRS from the legacy `crs`
//                     member (absent = WGS84, per RFC 7946)
//
// Web Mercator inputs are reprojected on load; any other CRS
// is rejected. Features without a name, or whose geometry is
// not a Polygon/MultiPolygon, are skipped with a warning.
//
// A missing dataset is fatal: both region filtering and
// polygon substitution depend on it.
//
// Reference: shapefile crate documentation (read_as)
//            geojson crate documentation (TryFrom for geo-types)

use anyhow::{bail, Context, Result};
use geo::{Geometry, LineString, MultiPolygon, Polygon};
use geojson::{GeoJson, JsonObject};
use shapefile::dbase::{FieldValue, Record};
use shapefile::PolygonRing;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::spatial::{BoundaryPolygon, Crs, RegionShape};
use crate::domain::traits::BoundarySource;

/// Attribute holding the region display name
pub const NAME_FIELD: &str = "name";

pub const DEFAULT_BOUNDARY_PATH: &str = "data/boundaries/ne_110m_admin_1_states_provinces.shp";

/// Reads a boundary dataset from a Shapefile or GeoJSON file.
pub struct FileBoundarySource {
    path: PathBuf,
}

impl FileBoundarySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BoundarySource for FileBoundarySource {
    fn load_boundaries(&self) -> Result<Vec<BoundaryPolygon>> {
        if !self.path.exists() {
            bail!("Boundary dataset not found at '{}'", self.path.display());
        }

        let extension = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        let (crs, regions) = match extension.as_str() {
            "shp" => read_shapefile(&self.path)?,
            "geojson" | "json" => read_geojson(&self.path)?,
            other => bail!(
                "Unsupported boundary dataset format '{}' for '{}'",
                other,
                self.path.display()
            ),
        };

        let regions: Vec<BoundaryPolygon> = regions
            .into_iter()
            .map(|b| BoundaryPolygon::new(b.name, b.shape.to_wgs84(crs)))
            .collect();

        tracing::info!(
            "Loaded {} boundary regions from '{}' ({:?})",
            regions.len(),
            self.path.display(),
            crs
        );
        Ok(regions)
    }
}

// ─── Shapefile ────────────────────────────────────────────────────────────────
fn read_shapefile(path: &Path) -> Result<(Crs, Vec<BoundaryPolygon>)> {
    let prj = path.with_extension("prj");
    let crs = if prj.exists() {
        let wkt = fs::read_to_string(&prj)
            .with_context(|| format!("Cannot read projection file '{}'", prj.display()))?;
        crs_from_wkt(&wkt).with_context(|| format!("In '{}'", prj.display()))?
    } else {
        tracing::debug!("No .prj next to '{}', assuming WGS84", path.display());
        Crs::Wgs84
    };

    let shapes = shapefile::read_as::<_, shapefile::Polygon, Record>(path)
        .with_context(|| format!("Cannot read boundary shapefile '{}'", path.display()))?;

    let mut regions = Vec::with_capacity(shapes.len());
    for (polygon, record) in shapes {
        let name = match record.get(NAME_FIELD) {
            // dBase pads character fields; only the padding is removed
            Some(FieldValue::Character(Some(name))) => name.trim_end().to_string(),
            _ => {
                tracing::warn!("Skipping boundary without a '{}' attribute", NAME_FIELD);
                continue;
            }
        };

        match shape_from_rings(&polygon) {
            Some(shape) => regions.push(BoundaryPolygon::new(name, shape)),
            None => tracing::warn!("Skipping boundary '{}' with no outer ring", name),
        }
    }

    Ok((crs, regions))
}

/// Group shapefile rings into polygons: each outer ring starts a
/// new polygon, inner rings attach to the outer ring before them.
fn shape_from_rings(polygon: &shapefile::Polygon) -> Option<RegionShape> {
    let mut parts: Vec<Polygon<f64>> = Vec::new();
    let mut current: Option<(LineString<f64>, Vec<LineString<f64>>)> = None;

    for ring in polygon.rings() {
        let line: LineString<f64> = ring.points().iter().map(|p| (p.x, p.y)).collect();

        match ring {
            PolygonRing::Outer(_) => {
                if let Some((exterior, interiors)) = current.take() {
                    parts.push(Polygon::new(exterior, interiors));
                }
                current = Some((line, Vec::new()));
            }
            PolygonRing::Inner(_) => match current.as_mut() {
                Some((_, interiors)) => interiors.push(line),
                None => tracing::debug!("Ignoring inner ring before any outer ring"),
            },
        }
    }

    if let Some((exterior, interiors)) = current {
        parts.push(Polygon::new(exterior, interiors));
    }

    match parts.len() {
        0 => None,
        1 => parts.pop().map(RegionShape::Polygon),
        _ => Some(RegionShape::MultiPolygon(MultiPolygon::new(parts))),
    }
}

/// Identify the CRS described by a .prj (ESRI WKT) string
fn crs_from_wkt(wkt: &str) -> Result<Crs> {
    let upper = wkt.trim().to_uppercase();

    if upper.starts_with("PROJCS") || upper.starts_with("PROJCRS") {
        let web_mercator = upper.contains("MERCATOR")
            && (upper.contains("PSEUDO") || upper.contains("AUXILIARY_SPHERE") || upper.contains("3857"));
        if web_mercator {
            return Ok(Crs::WebMercator);
        }
        bail!("Unsupported projected CRS; expected WGS84 or Web Mercator");
    }

    if (upper.starts_with("GEOGCS") || upper.starts_with("GEOGCRS"))
        && upper.contains("WGS")
        && upper.contains("84")
    {
        return Ok(Crs::Wgs84);
    }

    bail!("Unsupported CRS; expected WGS84 or Web Mercator")
}

// ─── GeoJSON ──────────────────────────────────────────────────────────────────
fn read_geojson(path: &Path) -> Result<(Crs, Vec<BoundaryPolygon>)> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read boundary file '{}'", path.display()))?;
    let geojson: GeoJson = text
        .parse()
        .with_context(|| format!("Invalid GeoJSON in '{}'", path.display()))?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => bail!("'{}' is not a GeoJSON FeatureCollection", path.display()),
    };

    let crs = crs_from_geojson(collection.foreign_members.as_ref())
        .with_context(|| format!("In '{}'", path.display()))?;

    let mut regions = Vec::with_capacity(collection.features.len());
    for feature in collection.features {
        let name = match feature.property(NAME_FIELD).and_then(|v| v.as_str()) {
            Some(name) => name.to_string(),
            None => {
                tracing::warn!("Skipping boundary feature without a '{}' property", NAME_FIELD);
                continue;
            }
        };

        let Some(geometry) = feature.geometry else {
            tracing::warn!("Skipping boundary '{}' without geometry", name);
            continue;
        };

        match Geometry::<f64>::try_from(geometry.value) {
            Ok(Geometry::Polygon(p)) => regions.push(BoundaryPolygon::new(name, RegionShape::Polygon(p))),
            Ok(Geometry::MultiPolygon(mp)) => {
                regions.push(BoundaryPolygon::new(name, RegionShape::MultiPolygon(mp)))
            }
            Ok(_) => tracing::warn!("Skipping boundary '{}': geometry is not polygonal", name),
            Err(e) => tracing::warn!("Skipping boundary '{}': {}", name, e),
        }
    }

    Ok((crs, regions))
}

/// Read the pre-RFC 7946 `crs` member, if present
fn crs_from_geojson(foreign_members: Option<&JsonObject>) -> Result<Crs> {
    let name = foreign_members
        .and_then(|m| m.get("crs"))
        .and_then(|crs| crs.get("properties"))
        .and_then(|props| props.get("name"))
        .and_then(|name| name.as_str());

    match name {
        None => Ok(Crs::Wgs84),
        Some(n) if n.contains("CRS84") || n.ends_with("4326") => Ok(Crs::Wgs84),
        Some(n) if n.ends_with("3857") || n.ends_with("900913") => Ok(Crs::WebMercator),
        Some(n) => bail!("Unsupported GeoJSON CRS '{}'", n),
    }
}
