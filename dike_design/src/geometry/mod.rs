//! Basic geometry primitives for the design engine.

pub mod line;
pub mod point;
pub mod point3;
pub mod polygon;

pub use line::{Line, Polyline};
pub use point::Point;
pub use point3::Point3;
pub use polygon::{from_multi_polygon, to_multi_polygon, Polygon};

use crate::surface::Surface;

/// Calculates the Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
}

/// Calculates the area of a simple polygon using the shoelace formula.
pub fn polygon_area(vertices: &[Point]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..vertices.len() {
        let j = (i + 1) % vertices.len();
        sum += vertices[i].x * vertices[j].y - vertices[j].x * vertices[i].y;
    }
    sum.abs() * 0.5
}

fn subtract(a: Point3, b: Point3) -> Point3 {
    Point3::new(a.x - b.x, a.y - b.y, a.z - b.z)
}

fn cross(a: Point3, b: Point3) -> Point3 {
    Point3 {
        x: a.y * b.z - a.z * b.y,
        y: a.z * b.x - a.x * b.z,
        z: a.x * b.y - a.y * b.x,
    }
}

/// True (sloped) area of a triangle in 3D.
pub fn triangle_area3(a: Point3, b: Point3, c: Point3) -> f64 {
    let n = cross(subtract(b, a), subtract(c, a));
    0.5 * (n.x * n.x + n.y * n.y + n.z * n.z).sqrt()
}

/// Geometry as it travels between the engine and its host: persisted graphics,
/// external feature records and exports all carry one of these.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Geometry {
    Point(Point),
    Line(Polyline),
    Polygon(Polygon),
    /// Triangulated 3D body.
    Mesh(Surface),
}

impl Geometry {
    /// Short name of the variant, used in log messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "point",
            Geometry::Line(_) => "line",
            Geometry::Polygon(_) => "polygon",
            Geometry::Mesh(_) => "mesh",
        }
    }

    /// Plan-view polygons covered by the geometry. Points and lines cover none.
    pub fn plan_polygons(&self) -> Vec<Polygon> {
        match self {
            Geometry::Point(_) | Geometry::Line(_) => Vec::new(),
            Geometry::Polygon(p) => vec![p.clone()],
            Geometry::Mesh(s) => s.outlines.clone(),
        }
    }

    /// Converts to `geo_types` for predicates and boolean operations. A mesh becomes
    /// the multipolygon of its outlines.
    pub fn to_geo(&self) -> geo_types::Geometry<f64> {
        match self {
            Geometry::Point(p) => geo_types::Geometry::Point(geo_types::Point::new(p.x, p.y)),
            Geometry::Line(l) => geo_types::Geometry::LineString(l.into()),
            Geometry::Polygon(p) => geo_types::Geometry::Polygon(p.to_geo()),
            Geometry::Mesh(s) => geo_types::Geometry::MultiPolygon(to_multi_polygon(&s.outlines)),
        }
    }
}
