//! Plan-view polygons.

use super::{polygon_area, Point};

/// Polygon with one exterior ring and optional holes. Rings are stored open
/// (the first vertex is not repeated at the end).
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Polygon {
    pub exterior: Vec<Point>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<Vec<Point>>,
}

impl Polygon {
    pub fn new(exterior: Vec<Point>) -> Self {
        Self {
            exterior: open_ring(exterior),
            holes: Vec::new(),
        }
    }

    pub fn with_holes(exterior: Vec<Point>, holes: Vec<Vec<Point>>) -> Self {
        Self {
            exterior: open_ring(exterior),
            holes: holes.into_iter().map(open_ring).collect(),
        }
    }

    /// Planar area of the exterior minus the holes.
    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|h| polygon_area(h)).sum();
        (polygon_area(&self.exterior) - holes).max(0.0)
    }

    /// A polygon needs at least three distinct corners to enclose anything.
    pub fn is_valid(&self) -> bool {
        self.exterior.len() >= 3
    }

    /// Exterior ring closed by repeating the first vertex.
    pub fn closed_exterior(&self) -> Vec<Point> {
        close_ring(&self.exterior)
    }

    /// Converts to a `geo_types` polygon.
    pub fn to_geo(&self) -> geo_types::Polygon<f64> {
        let ring = |pts: &[Point]| -> geo_types::LineString<f64> {
            close_ring(pts).into_iter().map(|p| (p.x, p.y)).collect()
        };
        geo_types::Polygon::new(
            ring(self.exterior.as_slice()),
            self.holes.iter().map(|h| ring(h.as_slice())).collect(),
        )
    }

    /// Builds from a `geo_types` polygon.
    pub fn from_geo(poly: &geo_types::Polygon<f64>) -> Self {
        let ring = |ls: &geo_types::LineString<f64>| -> Vec<Point> {
            ls.0.iter().map(|c| Point::new(c.x, c.y)).collect()
        };
        Self::with_holes(
            ring(poly.exterior()),
            poly.interiors().iter().map(ring).collect(),
        )
    }
}

fn open_ring(mut ring: Vec<Point>) -> Vec<Point> {
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

fn close_ring(ring: &[Point]) -> Vec<Point> {
    let mut out = ring.to_vec();
    if let Some(first) = ring.first() {
        if ring.last() != Some(first) {
            out.push(*first);
        }
    }
    out
}

/// Converts a set of polygons into one `geo_types` multipolygon without merging them.
pub fn to_multi_polygon(polys: &[Polygon]) -> geo_types::MultiPolygon<f64> {
    geo_types::MultiPolygon::new(
        polys
            .iter()
            .filter(|p| p.is_valid())
            .map(Polygon::to_geo)
            .collect(),
    )
}

/// Splits a `geo_types` multipolygon into our polygons.
pub fn from_multi_polygon(mp: &geo_types::MultiPolygon<f64>) -> Vec<Polygon> {
    mp.0.iter().map(Polygon::from_geo).collect()
}
