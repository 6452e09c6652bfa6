//! Planar and geodesic measurement of plan geometry.

use geo::{GeodesicArea, GeodesicLength};
use serde::{Deserialize, Serialize};

use crate::crs::Crs;
use crate::geometry::{Point, Polygon, Polyline};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureMode {
    /// Shoelace area and Euclidean length in CRS units.
    #[default]
    Planar,
    /// Ellipsoidal area and length after reprojection to WGS84.
    Geodesic,
}

/// Measures geometry expressed in `crs` according to `mode`.
#[derive(Debug, Clone, PartialEq)]
pub struct Measure {
    pub crs: Crs,
    pub mode: MeasureMode,
}

impl Default for Measure {
    fn default() -> Self {
        Self::planar()
    }
}

impl Measure {
    pub fn new(crs: Crs, mode: MeasureMode) -> Self {
        Self { crs, mode }
    }

    pub fn planar() -> Self {
        Self {
            crs: Crs::default(),
            mode: MeasureMode::Planar,
        }
    }

    fn to_lon_lat(&self, pts: &[Point]) -> Option<Vec<Point>> {
        pts.iter()
            .map(|p| self.crs.to_wgs84(p.x, p.y).map(|(x, y)| Point::new(x, y)))
            .collect()
    }

    /// Area of one polygon in square metres (or square CRS units when planar).
    pub fn area(&self, polygon: &Polygon) -> f64 {
        match self.mode {
            MeasureMode::Planar => polygon.area(),
            MeasureMode::Geodesic => self.geodesic_area(polygon).unwrap_or_else(|| {
                log::warn!(
                    "geodesic area unavailable in {}, using planar area",
                    self.crs.definition()
                );
                polygon.area()
            }),
        }
    }

    fn geodesic_area(&self, polygon: &Polygon) -> Option<f64> {
        let exterior = self.to_lon_lat(&polygon.exterior)?;
        let holes = polygon
            .holes
            .iter()
            .map(|h| self.to_lon_lat(h))
            .collect::<Option<Vec<_>>>()?;
        Some(
            Polygon::with_holes(exterior, holes)
                .to_geo()
                .geodesic_area_unsigned(),
        )
    }

    /// Summed area of several polygons. Overlaps are counted twice; union first when
    /// that matters.
    pub fn area_multi(&self, polygons: &[Polygon]) -> f64 {
        polygons.iter().map(|p| self.area(p)).sum()
    }

    /// Length of a polyline.
    pub fn length(&self, line: &Polyline) -> f64 {
        match self.mode {
            MeasureMode::Planar => line.length(),
            MeasureMode::Geodesic => match self.to_lon_lat(&line.vertices) {
                Some(pts) => geo_types::LineString::from(&Polyline::new(pts)).geodesic_length(),
                None => {
                    log::warn!(
                        "geodesic length unavailable in {}, using planar length",
                        self.crs.definition()
                    );
                    line.length()
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f64, origin: Point) -> Polygon {
        Polygon::new(vec![
            origin,
            origin.translate(side, 0.0),
            origin.translate(side, side),
            origin.translate(0.0, side),
        ])
    }

    #[test]
    fn planar_area_and_length() {
        let m = Measure::planar();
        assert!((m.area(&square(10.0, Point::new(0.0, 0.0))) - 100.0).abs() < 1e-9);
        let line = Polyline::new(vec![Point::new(0.0, 0.0), Point::new(3.0, 4.0)]);
        assert!((m.length(&line) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn geodesic_area_in_rd_is_close_to_planar() {
        let m = Measure::new(Crs::rd_new(), MeasureMode::Geodesic);
        let poly = square(100.0, Point::new(155_000.0, 463_000.0));
        let area = m.area(&poly);
        // RD scale factor is within 0.01 % of unity near Amersfoort
        assert!((area - 10_000.0).abs() < 50.0, "{area}");
        let line = Polyline::new(vec![
            Point::new(155_000.0, 463_000.0),
            Point::new(156_000.0, 463_000.0),
        ]);
        assert!((m.length(&line) - 1000.0).abs() < 2.0);
    }

    #[test]
    fn unknown_crs_falls_back_to_planar() {
        let m = Measure::new(Crs::from_epsg(999_999), MeasureMode::Geodesic);
        assert!((m.area(&square(2.0, Point::new(0.0, 0.0))) - 4.0).abs() < 1e-9);
    }
}
