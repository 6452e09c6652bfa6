//! Line segments and polylines.

use super::{distance, Point};

/// Representation of a 2D line segment between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub start: Point,
    pub end: Point,
}

impl Line {
    /// Creates a new line segment.
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Returns the length of the line segment.
    pub fn length(&self) -> f64 {
        distance(self.start, self.end)
    }

    /// Returns the midpoint of the line segment.
    pub fn midpoint(&self) -> Point {
        Point::new(
            (self.start.x + self.end.x) / 2.0,
            (self.start.y + self.end.y) / 2.0,
        )
    }

    /// Unit direction from start to end, `None` for a zero-length segment.
    pub fn direction(&self) -> Option<(f64, f64)> {
        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        let len = (dx * dx + dy * dy).sqrt();
        if len < f64::EPSILON {
            None
        } else {
            Some((dx / len, dy / len))
        }
    }

    /// Unit normal pointing to the left of the direction of travel.
    pub fn left_normal(&self) -> Option<(f64, f64)> {
        self.direction().map(|(dx, dy)| (-dy, dx))
    }
}

impl From<Line> for geo_types::Line<f64> {
    fn from(l: Line) -> Self {
        geo_types::Line::new(l.start, l.end)
    }
}

/// Representation of a series of connected line segments.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Polyline {
    pub vertices: Vec<Point>,
}

impl Polyline {
    /// Creates a new polyline from a list of vertices.
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    /// Returns the total length of all segments in the polyline.
    pub fn length(&self) -> f64 {
        self.vertices
            .windows(2)
            .map(|pair| distance(pair[0], pair[1]))
            .sum()
    }

    /// Iterates over the consecutive segments.
    pub fn segments(&self) -> impl Iterator<Item = Line> + '_ {
        self.vertices.windows(2).map(|w| Line::new(w[0], w[1]))
    }

    /// First segment, if the polyline has one.
    pub fn first_segment(&self) -> Option<Line> {
        self.segments().next()
    }

    /// Position at distance `station` from the first vertex.
    pub fn point_at(&self, station: f64) -> Option<Point> {
        if self.vertices.len() < 2 || station < 0.0 || station > self.length() {
            return None;
        }
        let mut remaining = station;
        for seg in self.segments() {
            let len = seg.length();
            if remaining <= len {
                let t = if len < f64::EPSILON { 0.0 } else { remaining / len };
                return Some(Point::new(
                    seg.start.x + t * (seg.end.x - seg.start.x),
                    seg.start.y + t * (seg.end.y - seg.start.y),
                ));
            }
            remaining -= len;
        }
        self.vertices.last().copied()
    }

    /// Unit tangent at distance `station` from the first vertex.
    pub fn direction_at(&self, station: f64) -> Option<(f64, f64)> {
        if self.vertices.len() < 2 || station < 0.0 || station > self.length() {
            return None;
        }
        let mut remaining = station;
        let mut last = None;
        for seg in self.segments() {
            let len = seg.length();
            if let Some(dir) = seg.direction() {
                last = Some(dir);
                if remaining <= len {
                    return Some(dir);
                }
            }
            remaining -= len;
        }
        last
    }
}

impl From<&Polyline> for geo_types::LineString<f64> {
    fn from(p: &Polyline) -> Self {
        p.vertices.iter().map(|v| (v.x, v.y)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_length_midpoint() {
        let line = Line::new(Point::new(0.0, 0.0), Point::new(3.0, 4.0));
        assert_eq!(line.length(), 5.0);
        assert_eq!(line.midpoint(), Point::new(1.5, 2.0));
    }

    #[test]
    fn left_normal_of_eastward_segment_points_north() {
        let line = Line::new(Point::new(0.0, 0.0), Point::new(2.0, 0.0));
        let (nx, ny) = line.left_normal().unwrap();
        assert!(nx.abs() < 1e-12);
        assert!((ny - 1.0).abs() < 1e-12);
        assert!(Line::new(Point::new(1.0, 1.0), Point::new(1.0, 1.0))
            .direction()
            .is_none());
    }

    #[test]
    fn polyline_stationing() {
        let pl = Polyline::new(vec![
            Point::new(0.0, 0.0),
            Point::new(3.0, 4.0),
            Point::new(6.0, 8.0),
        ]);
        assert!((pl.length() - 10.0).abs() < 1e-6);
        let p = pl.point_at(7.5).unwrap();
        assert!((p.x - 4.5).abs() < 1e-9);
        assert!((p.y - 6.0).abs() < 1e-9);
        assert!(pl.point_at(10.5).is_none());
        let dir = pl.direction_at(10.0).unwrap();
        assert!((dir.0 - 0.6).abs() < 1e-9);
    }
}
