//! Plan-view extent (ruimtebeslag) of the design.

use geo::BooleanOps;
use geo_types::MultiPolygon;
use serde::{Deserialize, Serialize};

use crate::geometry::{from_multi_polygon, to_multi_polygon, Point, Polygon};
use crate::measure::Measure;
use crate::surface::Surface;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub polygons: Vec<Polygon>,
}

fn single(poly: geo_types::Polygon<f64>) -> MultiPolygon<f64> {
    MultiPolygon::new(vec![poly])
}

fn disc(center: Point, radius: f64, segments: usize) -> geo_types::Polygon<f64> {
    let n = segments.max(8);
    let ring: Vec<(f64, f64)> = (0..n)
        .map(|i| {
            let a = std::f64::consts::TAU * i as f64 / n as f64;
            (center.x + radius * a.cos(), center.y + radius * a.sin())
        })
        .collect();
    geo_types::Polygon::new(ring.into(), vec![])
}

fn edge_band(a: Point, b: Point, distance: f64) -> Option<geo_types::Polygon<f64>> {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len = (dx * dx + dy * dy).sqrt();
    if len < f64::EPSILON {
        return None;
    }
    let (nx, ny) = (-dy / len * distance, dx / len * distance);
    let ring = vec![
        (a.x + nx, a.y + ny),
        (b.x + nx, b.y + ny),
        (b.x - nx, b.y - ny),
        (a.x - nx, a.y - ny),
    ];
    Some(geo_types::Polygon::new(ring.into(), vec![]))
}

impl Footprint {
    pub fn new(polygons: Vec<Polygon>) -> Self {
        Self { polygons }
    }

    /// Plan outlines of every lofted body of `surface`, not yet merged.
    pub fn from_surface(surface: &Surface) -> Self {
        Self::new(
            surface
                .outlines
                .iter()
                .filter(|p| p.is_valid())
                .cloned()
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn to_geo(&self) -> MultiPolygon<f64> {
        to_multi_polygon(&self.polygons)
    }

    /// Dissolves all polygons into one geometry.
    pub fn union(&self) -> Footprint {
        let merged = self
            .polygons
            .iter()
            .filter(|p| p.is_valid())
            .fold(MultiPolygon::new(vec![]), |acc, p| acc.union(&single(p.to_geo())));
        Footprint::new(from_multi_polygon(&merged))
    }

    /// Grows the footprint by `distance` with rounded corners approximated by
    /// `segments` per full circle. Non-positive distances only dissolve.
    pub fn buffer(&self, distance: f64, segments: usize) -> Footprint {
        let mut grown = self.union().to_geo();
        if distance <= 0.0 {
            return Footprint::new(from_multi_polygon(&grown));
        }
        let rings: Vec<Vec<Point>> = self
            .polygons
            .iter()
            .flat_map(|p| std::iter::once(p.exterior.clone()).chain(p.holes.iter().cloned()))
            .collect();
        for ring in &rings {
            for (i, a) in ring.iter().enumerate() {
                let b = ring[(i + 1) % ring.len()];
                if let Some(band) = edge_band(*a, b, distance) {
                    grown = grown.union(&single(band));
                }
                grown = grown.union(&single(disc(*a, distance, segments)));
            }
        }
        Footprint::new(from_multi_polygon(&grown))
    }

    /// Area of the dissolved footprint.
    pub fn area(&self, measure: &Measure) -> f64 {
        measure.area_multi(&self.union().polygons)
    }
}
