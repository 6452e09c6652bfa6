//! GeoJSON export in geographic coordinates.

use std::path::Path;

use geojson::{Feature, FeatureCollection, JsonObject, Value as GeoValue};
use serde_json::{json, Value};

use crate::crs::Crs;
use crate::error::DesignResult;
use crate::geometry::{Geometry, Point, Polygon};
use crate::io::project::{GraphicRecord, ProjectFile};

struct Reprojector<'a> {
    crs: &'a Crs,
    warned: bool,
}

impl Reprojector<'_> {
    fn position(&mut self, p: Point) -> Vec<f64> {
        match self.crs.to_wgs84(p.x, p.y) {
            Some((lon, lat)) => vec![lon, lat],
            None => {
                if !self.warned {
                    log::warn!(
                        "cannot reproject from {}, writing coordinates unchanged",
                        self.crs.definition()
                    );
                    self.warned = true;
                }
                vec![p.x, p.y]
            }
        }
    }

    fn ring(&mut self, ring: &[Point]) -> Vec<Vec<f64>> {
        let mut out: Vec<Vec<f64>> = ring.iter().map(|p| self.position(*p)).collect();
        if let Some(first) = out.first().cloned() {
            out.push(first);
        }
        out
    }

    fn polygon(&mut self, poly: &Polygon) -> Vec<Vec<Vec<f64>>> {
        std::iter::once(&poly.exterior)
            .chain(poly.holes.iter())
            .map(|r| self.ring(r))
            .collect()
    }

    fn geometry(&mut self, geometry: &Geometry) -> GeoValue {
        match geometry {
            Geometry::Point(p) => GeoValue::Point(self.position(*p)),
            Geometry::Line(l) => {
                GeoValue::LineString(l.vertices.iter().map(|p| self.position(*p)).collect())
            }
            Geometry::Polygon(p) => GeoValue::Polygon(self.polygon(p)),
            Geometry::Mesh(s) => GeoValue::MultiPolygon(
                (0..s.triangles.len())
                    .filter_map(|i| s.triangle(i))
                    .map(|corners| {
                        let mut ring: Vec<Vec<f64>> = corners
                            .iter()
                            .map(|v| {
                                let mut pos = self.position(v.xy());
                                pos.push(v.z);
                                pos
                            })
                            .collect();
                        ring.push(ring[0].clone());
                        vec![ring]
                    })
                    .collect(),
            ),
        }
    }
}

fn crs_member() -> JsonObject {
    let mut members = JsonObject::new();
    members.insert(
        "crs".to_string(),
        json!({ "type": "name", "properties": { "name": "EPSG:4326" } }),
    );
    members
}

fn feature(reproject: &mut Reprojector<'_>, record: &GraphicRecord, layer: Option<&str>) -> Feature {
    let mut properties: JsonObject = record
        .attributes
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if let Some(layer) = layer {
        properties.insert("layer".to_string(), Value::from(layer));
    }
    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(reproject.geometry(&record.geometry))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Converts graphic records in `crs` to a WGS84 feature collection.
pub fn to_feature_collection(records: &[GraphicRecord], crs: &Crs) -> FeatureCollection {
    let mut reproject = Reprojector { crs, warned: false };
    FeatureCollection {
        bbox: None,
        features: records
            .iter()
            .map(|r| feature(&mut reproject, r, None))
            .collect(),
        foreign_members: Some(crs_member()),
    }
}

/// Every graphic layer of a project, tagged with a `layer` property.
pub fn project_feature_collection(project: &ProjectFile, crs: &Crs) -> FeatureCollection {
    let g = &project.geometries;
    let layers: [(&str, &Vec<GraphicRecord>); 8] = [
        ("design3d", &g.design3d),
        ("design2d", &g.design2d),
        ("ruimtebeslag2d", &g.ruimtebeslag2d),
        ("ruimtebeslag3d", &g.ruimtebeslag3d),
        ("inputLine", &g.input_line),
        ("crossSectionPoints", &g.cross_section_points),
        ("crossSectionLine", &g.cross_section_line),
        ("profilePoints", &g.profile_points),
    ];
    let mut reproject = Reprojector { crs, warned: false };
    let features = layers
        .iter()
        .flat_map(|(name, records)| records.iter().map(move |r| (*name, r)))
        .map(|(name, r)| feature(&mut reproject, r, Some(name)))
        .collect();
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(crs_member()),
    }
}

pub fn write_feature_collection(path: impl AsRef<Path>, fc: &FeatureCollection) -> DesignResult<()> {
    let json = serde_json::to_string_pretty(fc)?;
    crate::io::write_string(path, &json)
}
