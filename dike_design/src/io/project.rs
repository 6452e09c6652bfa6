//! Project file: the persisted state of one design session.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::design::ControlPoint;
use crate::error::DesignResult;
use crate::geometry::{Geometry, Point, Point3, Polygon, Polyline};
use crate::intersection::Constructions;
use crate::profile::ProfilePoint;

pub const PROJECT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub vak: String,
    pub alternatief: String,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub version: String,
}

impl Metadata {
    pub fn new(vak: impl Into<String>, alternatief: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            vak: vak.into(),
            alternatief: alternatief.into(),
            created_at: now,
            last_modified: now,
            version: PROJECT_VERSION.to_string(),
        }
    }
}

/// One graphic as the host draws it: geometry plus free attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphicRecord {
    pub geometry: Geometry,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
}

impl GraphicRecord {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// String attribute, if present.
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

/// Graphic layers of the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Geometries {
    pub design3d: Vec<GraphicRecord>,
    pub design2d: Vec<GraphicRecord>,
    pub ruimtebeslag2d: Vec<GraphicRecord>,
    pub ruimtebeslag3d: Vec<GraphicRecord>,
    pub input_line: Vec<GraphicRecord>,
    pub cross_section_points: Vec<GraphicRecord>,
    pub cross_section_line: Vec<GraphicRecord>,
    pub profile_points: Vec<GraphicRecord>,
}

impl Geometries {
    fn layers_mut(&mut self) -> [&mut Vec<GraphicRecord>; 8] {
        [
            &mut self.design3d,
            &mut self.design2d,
            &mut self.ruimtebeslag2d,
            &mut self.ruimtebeslag3d,
            &mut self.input_line,
            &mut self.cross_section_points,
            &mut self.cross_section_line,
            &mut self.profile_points,
        ]
    }
}

/// Key figures of the design.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DesignValues {
    pub traject_length: f64,
    pub volume_difference: f64,
    pub excavation_volume: f64,
    pub fill_volume: f64,
    #[serde(rename = "area2d")]
    pub area_2d: f64,
    #[serde(rename = "area3d")]
    pub area_3d: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    pub metadata: Metadata,
    #[serde(default)]
    pub geometries: Geometries,
    /// Control points of the active vak.
    #[serde(default)]
    pub chart_data: Vec<ControlPoint>,
    /// Control points of every vak, by name.
    #[serde(default)]
    pub all_chart_data: BTreeMap<String, Vec<ControlPoint>>,
    #[serde(default)]
    pub chart_data_elevation: Vec<ProfilePoint>,
    #[serde(default)]
    pub design_values: DesignValues,
    /// Cost estimate as the host computed it; carried through untouched.
    #[serde(default)]
    pub costs: Value,
    #[serde(default)]
    pub effects: Value,
    #[serde(default)]
    pub constructions: Constructions,
}

fn round_to(v: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (v * f).round() / f
}

fn round_point(p: &mut Point) {
    p.x = round_to(p.x, 2);
    p.y = round_to(p.y, 2);
}

fn round_point3(p: &mut Point3) {
    p.x = round_to(p.x, 2);
    p.y = round_to(p.y, 2);
    p.z = round_to(p.z, 3);
}

fn round_polygon(poly: &mut Polygon) {
    poly.exterior.iter_mut().for_each(round_point);
    poly.holes
        .iter_mut()
        .flat_map(|h| h.iter_mut())
        .for_each(round_point);
}

fn round_polyline(line: &mut Polyline) {
    line.vertices.iter_mut().for_each(round_point);
}

fn round_geometry(geometry: &mut Geometry) {
    match geometry {
        Geometry::Point(p) => round_point(p),
        Geometry::Line(l) => round_polyline(l),
        Geometry::Polygon(p) => round_polygon(p),
        Geometry::Mesh(s) => {
            s.vertices.iter_mut().for_each(round_point3);
            s.outlines.iter_mut().for_each(round_polygon);
        }
    }
}

fn round_control_point(cp: &mut ControlPoint) {
    cp.chainage = round_to(cp.chainage, 2);
    cp.height = round_to(cp.height, 3);
}

impl ProjectFile {
    pub fn new(metadata: Metadata) -> Self {
        Self {
            metadata,
            geometries: Geometries::default(),
            chart_data: Vec::new(),
            all_chart_data: BTreeMap::new(),
            chart_data_elevation: Vec::new(),
            design_values: DesignValues::default(),
            costs: Value::Null,
            effects: Value::Null,
            constructions: Constructions::default(),
        }
    }

    /// Copy with plan coordinates rounded to 2 decimals and elevations to 3.
    pub fn rounded(&self) -> Self {
        let mut out = self.clone();
        for layer in out.geometries.layers_mut() {
            for record in layer.iter_mut() {
                round_geometry(&mut record.geometry);
            }
        }
        out.chart_data.iter_mut().for_each(round_control_point);
        out.all_chart_data
            .values_mut()
            .flat_map(|v| v.iter_mut())
            .for_each(round_control_point);
        for p in &mut out.chart_data_elevation {
            p.chainage = round_to(p.chainage, 2);
            p.x = round_to(p.x, 2);
            p.y = round_to(p.y, 2);
            p.elevation = round_to(p.elevation, 3);
        }
        if let Some(line) = out.constructions.drawn_construction_line.as_mut() {
            round_polyline(line);
        }
        for s in &mut out.constructions.structures {
            round_point(&mut s.point);
            s.chainage = round_to(s.chainage, 2);
            s.top = (round_to(s.top.0, 2), round_to(s.top.1, 3));
            s.bottom = (round_to(s.bottom.0, 2), round_to(s.bottom.1, 3));
        }
        out
    }

    /// Serializes the rounded project.
    pub fn to_json(&self) -> DesignResult<String> {
        Ok(serde_json::to_string_pretty(&self.rounded())?)
    }

    pub fn from_json(json: &str) -> DesignResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

pub fn read_project_json(path: impl AsRef<Path>) -> DesignResult<ProjectFile> {
    let contents = crate::io::read_to_string(path)?;
    ProjectFile::from_json(&contents)
}

pub fn write_project_json(path: impl AsRef<Path>, project: &ProjectFile) -> DesignResult<()> {
    let json = project.to_json()?;
    crate::io::write_string(path, &json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_the_schema() {
        let mut project = ProjectFile::new(Metadata::new("vak 1", "basis"));
        project.design_values.area_2d = 12.0;
        let json: Value = serde_json::from_str(&project.to_json().unwrap()).unwrap();
        assert_eq!(json["metadata"]["vak"], "vak 1");
        assert!(json["metadata"]["createdAt"].is_string());
        assert_eq!(json["designValues"]["area2d"], 12.0);
        assert!(json["geometries"]["ruimtebeslag2d"].is_array());
        assert!(json["geometries"]["crossSectionLine"].is_array());
        assert!(json["constructions"]["structures"].is_array());
        assert!(json.get("chartDataElevation").is_some());
    }

    #[test]
    fn rounding_bounds_precision() {
        let mut project = ProjectFile::new(Metadata::new("A", "B"));
        project.geometries.input_line.push(GraphicRecord::new(Geometry::Line(Polyline::new(vec![
            Point::new(1.23456, 7.891011),
            Point::new(2.0, 3.0),
        ]))));
        project.chart_data_elevation.push(ProfilePoint {
            id: 0,
            chainage: 0.004,
            elevation: 1.23456,
            x: 0.0,
            y: 0.0,
        });
        let rounded = project.rounded();
        match &rounded.geometries.input_line[0].geometry {
            Geometry::Line(l) => assert_eq!(l.vertices[0], Point::new(1.23, 7.89)),
            other => panic!("unexpected {}", other.kind()),
        }
        assert_eq!(rounded.chart_data_elevation[0].elevation, 1.235);
        assert_eq!(rounded.chart_data_elevation[0].chainage, 0.0);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");
        let mut project = ProjectFile::new(Metadata::new("A", "B"));
        project.costs = serde_json::json!({ "total": 1250.5 });
        write_project_json(&path, &project).unwrap();
        let back = read_project_json(&path).unwrap();
        assert_eq!(back, project.rounded());
    }
}
