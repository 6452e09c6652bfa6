//! Coordinate reference system handling.
//!
//! Every transform goes through `proj`; a `Proj` is built once per CRS
//! definition and thread.

use std::cell::RefCell;
use std::collections::HashMap;

use once_cell::sync::Lazy;
use proj::Proj;
use regex::Regex;
use serde_json::Value;

static EPSG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)EPSG:{1,2}(\d+)").expect("EPSG pattern compiles"));

thread_local! {
    static TRANSFORMS: RefCell<HashMap<String, Option<Proj>>> = RefCell::new(HashMap::new());
}

/// Representation of a coordinate reference system.
///
/// The definition string is what `proj` resolves; the EPSG code is kept for
/// comparisons and the geographic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crs {
    definition: String,
    epsg: u32,
}

impl Crs {
    pub fn from_epsg(code: u32) -> Self {
        Self {
            definition: format!("EPSG:{code}"),
            epsg: code,
        }
    }

    /// WGS84 geographic coordinates (EPSG:4326).
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Web Mercator (EPSG:3857).
    pub fn web_mercator() -> Self {
        Self::from_epsg(3857)
    }

    /// Amersfoort / RD New (EPSG:28992).
    pub fn rd_new() -> Self {
        Self::from_epsg(28992)
    }

    /// Resolves a CRS name such as `EPSG:28992`, `urn:ogc:def:crs:EPSG::3857` or
    /// `urn:ogc:def:crs:OGC:1.3:CRS84`. Anything unrecognised falls back to WGS84.
    pub fn parse(name: &str) -> Self {
        if name.contains("CRS84") {
            return Self::wgs84();
        }
        match EPSG_RE
            .captures(name)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
        {
            Some(code) => Self::from_epsg(code),
            None => {
                log::warn!("unrecognised CRS '{name}', assuming EPSG:4326");
                Self::wgs84()
            }
        }
    }

    /// Reads a GeoJSON-style `crs` member: either a plain name or
    /// `{ "properties": { "name": ... } }`.
    pub fn from_geojson(value: &Value) -> Self {
        let name = match value {
            Value::String(s) => Some(s.as_str()),
            Value::Object(_) => value
                .get("properties")
                .and_then(|p| p.get("name"))
                .and_then(Value::as_str),
            _ => None,
        };
        Self::parse(name.unwrap_or_default())
    }

    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    pub fn is_geographic(&self) -> bool {
        self.epsg == 4326
    }

    /// Converts `(x, y)` in this CRS to `(longitude, latitude)` in degrees.
    ///
    /// Returns `None` when `proj` cannot resolve the definition or the point
    /// falls outside the transform's domain.
    pub fn to_wgs84(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if self.is_geographic() {
            return Some((x, y));
        }
        TRANSFORMS.with(|cache| {
            let mut cache = cache.borrow_mut();
            let proj = cache
                .entry(self.definition.clone())
                .or_insert_with(|| {
                    Proj::new_known_crs(&self.definition, "EPSG:4326", None)
                        .map_err(|e| {
                            log::warn!("cannot build transform from {}: {e}", self.definition)
                        })
                        .ok()
                })
                .as_ref()?;
            match proj.convert((x, y)) {
                Ok(p) => Some(p),
                Err(e) => {
                    log::warn!("reprojection from {} failed: {e}", self.definition);
                    None
                }
            }
        })
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}
