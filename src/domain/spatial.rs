// ============================================================
// Layer 3 — Spatial Domain Types
// ============================================================
// Geometry-carrying records and the administrative boundaries
// they are checked against.
//
//   SpatialRecord    — a geocoded location plus its active
//                      geometry (a Point, or a region polygon
//                      once substituted)
//   BoundaryPolygon  — one named administrative region
//   Crs              — the coordinate systems boundary data may
//                      arrive in
//
// All geometry is geo-types with f64 coordinates, x = longitude
// and y = latitude once in WGS84.
//
// Reference: geo crate documentation (Contains, MapCoords)

use geo::{Contains, Coord, Geometry, MapCoords, MultiPolygon, Point, Polygon};

use crate::domain::location::{CanonicalLocationKey, GeocodedLocation};

/// Equatorial radius used by the spherical Web Mercator projection
const WEB_MERCATOR_RADIUS: f64 = 6_378_137.0;

// ─── Crs ──────────────────────────────────────────────────────────────────────
/// Coordinate reference systems understood by the boundary reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crs {
    /// Geographic WGS84 (EPSG:4326 / OGC CRS84), degrees
    Wgs84,
    /// Spherical Web Mercator (EPSG:3857), metres
    WebMercator,
}

impl Crs {
    /// Convert one coordinate from this CRS into WGS84 degrees
    pub fn to_wgs84(self, c: Coord<f64>) -> Coord<f64> {
        match self {
            Crs::Wgs84 => c,
            Crs::WebMercator => {
                let lon = (c.x / WEB_MERCATOR_RADIUS).to_degrees();
                let lat = (2.0 * (c.y / WEB_MERCATOR_RADIUS).exp().atan()
                    - std::f64::consts::FRAC_PI_2)
                    .to_degrees();
                Coord { x: lon, y: lat }
            }
        }
    }
}

// ─── RegionShape ──────────────────────────────────────────────────────────────
/// Polygonal geometry of an administrative region.
///
/// Kept as the dataset delivered it, so a single-part region
/// stays a Polygon and a multi-part one stays a MultiPolygon.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionShape {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl RegionShape {
    /// Exact point-in-polygon test. Points on the boundary are
    /// not contained.
    pub fn contains_point(&self, point: &Point<f64>) -> bool {
        match self {
            RegionShape::Polygon(p) => p.contains(point),
            RegionShape::MultiPolygon(mp) => mp.contains(point),
        }
    }

    /// Reproject every vertex from `crs` into WGS84
    pub fn to_wgs84(&self, crs: Crs) -> Self {
        if crs == Crs::Wgs84 {
            return self.clone();
        }
        match self {
            RegionShape::Polygon(p) => RegionShape::Polygon(p.map_coords(|c| crs.to_wgs84(c))),
            RegionShape::MultiPolygon(mp) => {
                RegionShape::MultiPolygon(mp.map_coords(|c| crs.to_wgs84(c)))
            }
        }
    }

    pub fn to_geometry(&self) -> Geometry<f64> {
        match self {
            RegionShape::Polygon(p) => Geometry::Polygon(p.clone()),
            RegionShape::MultiPolygon(mp) => Geometry::MultiPolygon(mp.clone()),
        }
    }
}

/// One named region from the boundary dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryPolygon {
    pub name:  String,
    pub shape: RegionShape,
}

impl BoundaryPolygon {
    pub fn new(name: impl Into<String>, shape: RegionShape) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }
}

// ─── SpatialRecord ────────────────────────────────────────────────────────────
/// A geocoded location with an active geometry.
///
/// The geocoded coordinates stay on `location` even after the
/// geometry is swapped for a region polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialRecord {
    pub location:    GeocodedLocation,
    pub geometry:    Geometry<f64>,
    pub substituted: bool,
}

impl SpatialRecord {
    /// Wrap a location as a Point at (longitude, latitude)
    pub fn from_location(location: GeocodedLocation) -> Self {
        let c     = location.coordinates;
        let point = Point::new(c.longitude, c.latitude);
        Self {
            location,
            geometry: Geometry::Point(point),
            substituted: false,
        }
    }

    pub fn key(&self) -> &CanonicalLocationKey {
        self.location.key()
    }

    /// The geocoded point, regardless of the active geometry
    pub fn point(&self) -> Point<f64> {
        let c = self.location.coordinates;
        Point::new(c.longitude, c.latitude)
    }
}
