// features.rs - Natural Earth vector layers (land, coastline, borders)

use crate::canvas::fill_rings;
use crate::fetch::{fetch_bytes, FetchError};
use crate::geo::GeoPoint;
use serde::de::IgnoredAny;
use serde::Deserialize;

pub const DEFAULT_FEATURES_URL: &str =
    "https://raw.githubusercontent.com/nvkelso/natural-earth-vector/master/geojson";

const LAND_FILE: &str = "ne_110m_land.geojson";
const COASTLINE_FILE: &str = "ne_110m_coastline.geojson";
const BORDERS_FILE: &str = "ne_110m_admin_0_boundary_lines_land.geojson";

/// Cells per degree in the land mask.
const MASK_RESOLUTION: usize = 4;

/// A sequence of (lon, lat) vertices.
pub type LineString = Vec<(f64, f64)>;

/// Outer ring followed by holes.
pub type Polygon = Vec<LineString>;

#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("invalid GeoJSON in {layer}: {source}")]
    Parse {
        layer: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Option<Geometry>,
}

type Position = Vec<f64>;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
enum Geometry {
    Point(IgnoredAny),
    MultiPoint(IgnoredAny),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

fn to_line(positions: Vec<Position>) -> LineString {
    positions
        .into_iter()
        .filter(|p| p.len() >= 2)
        .map(|p| (p[0], p[1]))
        .collect()
}

fn parse_collection(layer: &'static str, bytes: &[u8]) -> Result<FeatureCollection, FeatureError> {
    serde_json::from_slice(bytes).map_err(|source| FeatureError::Parse { layer, source })
}

/// Every line in a layer; polygon rings count as lines.
pub fn parse_lines(layer: &'static str, bytes: &[u8]) -> Result<Vec<LineString>, FeatureError> {
    let mut lines = Vec::new();
    for feature in parse_collection(layer, bytes)?.features {
        match feature.geometry {
            Some(Geometry::LineString(l)) => lines.push(to_line(l)),
            Some(Geometry::MultiLineString(ls)) => lines.extend(ls.into_iter().map(to_line)),
            Some(Geometry::Polygon(rings)) => lines.extend(rings.into_iter().map(to_line)),
            Some(Geometry::MultiPolygon(polys)) => {
                for rings in polys {
                    lines.extend(rings.into_iter().map(to_line));
                }
            }
            _ => {}
        }
    }
    lines.retain(|l| l.len() >= 2);
    Ok(lines)
}

pub fn parse_polygons(layer: &'static str, bytes: &[u8]) -> Result<Vec<Polygon>, FeatureError> {
    let mut polygons = Vec::new();
    for feature in parse_collection(layer, bytes)?.features {
        match feature.geometry {
            Some(Geometry::Polygon(rings)) => {
                polygons.push(rings.into_iter().map(to_line).collect())
            }
            Some(Geometry::MultiPolygon(polys)) => {
                for rings in polys {
                    polygons.push(rings.into_iter().map(to_line).collect());
                }
            }
            _ => {}
        }
    }
    Ok(polygons)
}

/// Equirectangular land/ocean lookup built from the land polygons.
#[derive(Debug, Clone)]
pub struct LandMask {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl LandMask {
    pub fn rasterize(polygons: &[Polygon]) -> Self {
        let width = 360 * MASK_RESOLUTION;
        let height = 180 * MASK_RESOLUTION;
        let scale = MASK_RESOLUTION as f64;
        let mut cells = vec![false; width * height];

        for polygon in polygons {
            let rings: Vec<Vec<(f64, f64)>> = polygon
                .iter()
                .map(|ring| {
                    ring.iter()
                        .map(|&(lon, lat)| ((lon + 180.0) * scale, (90.0 - lat) * scale))
                        .collect()
                })
                .collect();
            fill_rings(&rings, width, height, |y, x0, x1| {
                let row = y * width;
                for cell in &mut cells[row + x0..row + x1] {
                    *cell = true;
                }
            });
        }

        Self { width, height, cells }
    }

    pub fn is_land(&self, p: GeoPoint) -> bool {
        let scale = MASK_RESOLUTION as f64;
        let x = (((p.lon + 180.0) * scale) as i64).rem_euclid(self.width as i64) as usize;
        let y = (((90.0 - p.lat) * scale) as i64).clamp(0, self.height as i64 - 1) as usize;
        self.cells[y * self.width + x]
    }
}

/// Vector layers for the projection panels.
#[derive(Debug, Clone)]
pub struct MapFeatures {
    pub land: LandMask,
    pub coastlines: Vec<LineString>,
    pub borders: Vec<LineString>,
}

impl MapFeatures {
    pub fn new(land: &[Polygon], coastlines: Vec<LineString>, borders: Vec<LineString>) -> Self {
        Self {
            land: LandMask::rasterize(land),
            coastlines,
            borders,
        }
    }

    /// Fetch and parse all three layers under `base_url`.
    pub fn load(base_url: &str) -> Result<Self, FeatureError> {
        let url = |file: &str| format!("{}/{}", base_url.trim_end_matches('/'), file);

        log::info!("{}", crate::i18n::tr("log.loading_features"));
        let land = parse_polygons("land", &fetch_bytes(&url(LAND_FILE))?)?;
        let coastlines = parse_lines("coastline", &fetch_bytes(&url(COASTLINE_FILE))?)?;
        let borders = parse_lines("borders", &fetch_bytes(&url(BORDERS_FILE))?)?;
        log::debug!(
            "features: {} land polygons, {} coastlines, {} borders",
            land.len(),
            coastlines.len(),
            borders.len()
        );

        Ok(Self::new(&land, coastlines, borders))
    }
}

/// Session-lifetime holder: loads on first use, keeps the result.
///
/// A failed load is not remembered, so the next click tries again.
#[derive(Debug)]
pub struct FeatureCache {
    source: Option<String>,
    loaded: Option<MapFeatures>,
}

impl FeatureCache {
    pub fn remote(base_url: impl Into<String>) -> Self {
        Self {
            source: Some(base_url.into()),
            loaded: None,
        }
    }

    /// No vector layers at all.
    pub fn disabled() -> Self {
        Self {
            source: None,
            loaded: None,
        }
    }

    #[cfg(test)]
    pub fn preloaded(features: MapFeatures) -> Self {
        Self {
            source: None,
            loaded: Some(features),
        }
    }

    pub fn get(&mut self) -> Result<Option<&MapFeatures>, FeatureError> {
        if self.loaded.is_none() {
            if let Some(url) = &self.source {
                self.loaded = Some(MapFeatures::load(url)?);
            }
        }
        Ok(self.loaded.as_ref())
    }
}
