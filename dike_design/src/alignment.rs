use crate::error::{DesignError, DesignResult};
use crate::geometry::{distance, Line, Point, Polyline};

/// Reference line along which the design is defined.
///
/// Vertices are fixed once the alignment is drawn. Chainage is the distance along
/// the line from the first vertex.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Polyline", into = "Polyline")]
pub struct Alignment {
    vertices: Vec<Point>,
    /// Chainage at each vertex; same length as `vertices`.
    chainages: Vec<f64>,
}

impl Alignment {
    /// Creates an alignment from its vertices. Requires at least two vertices and a
    /// positive length.
    pub fn new(vertices: Vec<Point>) -> DesignResult<Self> {
        if vertices.len() < 2 {
            return Err(DesignError::InvalidAlignment(format!(
                "{} vertices, at least 2 required",
                vertices.len()
            )));
        }
        let mut chainages = Vec::with_capacity(vertices.len());
        let mut total = 0.0;
        chainages.push(0.0);
        for pair in vertices.windows(2) {
            total += distance(pair[0], pair[1]);
            chainages.push(total);
        }
        if total <= f64::EPSILON {
            return Err(DesignError::InvalidAlignment("zero length".into()));
        }
        Ok(Self {
            vertices,
            chainages,
        })
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Total length of the alignment.
    pub fn length(&self) -> f64 {
        self.chainages.last().copied().unwrap_or(0.0)
    }

    /// Index of the segment containing `chainage`, or `None` outside the alignment.
    fn segment_index(&self, chainage: f64) -> Option<usize> {
        if !(0.0..=self.length()).contains(&chainage) {
            return None;
        }
        let idx = self.chainages.partition_point(|c| *c < chainage);
        Some(idx.saturating_sub(1).min(self.vertices.len() - 2))
    }

    /// Returns the position at the given chainage.
    pub fn point_at(&self, chainage: f64) -> Option<Point> {
        let i = self.segment_index(chainage)?;
        let a = self.vertices[i];
        let b = self.vertices[i + 1];
        let len = self.chainages[i + 1] - self.chainages[i];
        let t = if len < f64::EPSILON {
            0.0
        } else {
            (chainage - self.chainages[i]) / len
        };
        Some(Point::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y)))
    }

    /// Returns a unit tangent vector at the given chainage.
    pub fn direction_at(&self, chainage: f64) -> Option<(f64, f64)> {
        let i = self.segment_index(chainage)?;
        // zero-length segments borrow the direction of the next usable one
        (i..self.vertices.len() - 1)
            .chain((0..i).rev())
            .find_map(|j| Line::new(self.vertices[j], self.vertices[j + 1]).direction())
    }

    /// Unit normal to the left of the direction of travel.
    pub fn left_normal_at(&self, chainage: f64) -> Option<(f64, f64)> {
        self.direction_at(chainage).map(|(dx, dy)| (-dy, dx))
    }

    /// Plan position at `chainage`, shifted `offset` to the left (negative: right).
    pub fn offset_point(&self, chainage: f64, offset: f64) -> Option<Point> {
        let center = self.point_at(chainage)?;
        let (nx, ny) = self.left_normal_at(chainage)?;
        Some(Point::new(center.x + offset * nx, center.y + offset * ny))
    }

    /// Projects `p` onto the alignment, returning `(chainage, signed offset)` of the
    /// closest point. Offsets are positive to the left.
    pub fn project(&self, p: Point) -> (f64, f64) {
        let mut best = (0.0, 0.0);
        let mut best_dist = f64::INFINITY;
        for (i, pair) in self.vertices.windows(2).enumerate() {
            let (a, b) = (pair[0], pair[1]);
            let dx = b.x - a.x;
            let dy = b.y - a.y;
            let len2 = dx * dx + dy * dy;
            if len2 < f64::EPSILON {
                continue;
            }
            let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
            let foot = Point::new(a.x + t * dx, a.y + t * dy);
            let d = distance(p, foot);
            if d < best_dist {
                best_dist = d;
                let side = dx * (p.y - a.y) - dy * (p.x - a.x);
                let chainage = self.chainages[i] + t * len2.sqrt();
                best = (chainage, if side < 0.0 { -d } else { d });
            }
        }
        best
    }

    /// The alignment as a plain polyline.
    pub fn to_polyline(&self) -> Polyline {
        Polyline::new(self.vertices.clone())
    }
}

impl TryFrom<Polyline> for Alignment {
    type Error = DesignError;

    fn try_from(value: Polyline) -> Result<Self, Self::Error> {
        Alignment::new(value.vertices)
    }
}

impl From<Alignment> for Polyline {
    fn from(value: Alignment) -> Self {
        Polyline::new(value.vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l_shape() -> Alignment {
        Alignment::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_degenerate_alignments() {
        assert!(Alignment::new(vec![Point::new(0.0, 0.0)]).is_err());
        assert!(matches!(
            Alignment::new(vec![Point::new(1.0, 1.0), Point::new(1.0, 1.0)]),
            Err(DesignError::InvalidAlignment(_))
        ));
    }

    #[test]
    fn point_and_direction() {
        let align = l_shape();
        assert!((align.length() - 20.0).abs() < 1e-9);
        let p = align.point_at(15.0).unwrap();
        assert!((p.x - 10.0).abs() < 1e-9 && (p.y - 5.0).abs() < 1e-9);
        let d = align.direction_at(15.0).unwrap();
        assert!(d.0.abs() < 1e-9 && (d.1 - 1.0).abs() < 1e-9);
        assert!(align.point_at(20.5).is_none());
        assert!(align.point_at(-0.1).is_none());
    }

    #[test]
    fn offsets_are_positive_to_the_left() {
        let align = l_shape();
        let p = align.offset_point(5.0, 2.0).unwrap();
        assert!((p.x - 5.0).abs() < 1e-9 && (p.y - 2.0).abs() < 1e-9);
        let (ch, off) = align.project(Point::new(5.0, -3.0));
        assert!((ch - 5.0).abs() < 1e-9);
        assert!((off + 3.0).abs() < 1e-9);
    }

    #[test]
    fn serde_uses_vertex_list() {
        let align = l_shape();
        let json = serde_json::to_string(&align).unwrap();
        let back: Alignment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, align);
        assert!(serde_json::from_str::<Alignment>(r#"{"vertices":[{"x":0.0,"y":0.0}]}"#).is_err());
    }
}
