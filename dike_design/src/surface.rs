//! Proposed design surface lofted from transverse shapes.

use serde::{Deserialize, Serialize};

use crate::alignment::Alignment;
use crate::cross_section::TransverseShape;
use crate::dtm::triangle_set_elevation;
use crate::error::{DesignError, DesignResult};
use crate::geometry::{polygon_area, triangle_area3, Point, Point3, Polygon};
use crate::profile::ElevationSource;

/// Triangulated 3D body with the plan outline of every lofted part.
///
/// Deserialization rejects triangles that index past the vertex list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SurfaceData")]
pub struct Surface {
    pub vertices: Vec<Point3>,
    pub triangles: Vec<[usize; 3]>,
    pub outlines: Vec<Polygon>,
}

#[derive(Deserialize)]
struct SurfaceData {
    vertices: Vec<Point3>,
    triangles: Vec<[usize; 3]>,
    #[serde(default)]
    outlines: Vec<Polygon>,
}

impl TryFrom<SurfaceData> for Surface {
    type Error = DesignError;

    fn try_from(value: SurfaceData) -> Result<Self, Self::Error> {
        let surface = Surface {
            vertices: value.vertices,
            triangles: value.triangles,
            outlines: value.outlines,
        };
        surface.validate()?;
        Ok(surface)
    }
}

/// Arc-length position of every vertex, normalized to `[0, 1]`.
fn arc_params(points: &[(f64, f64)]) -> Vec<f64> {
    let mut cumulative = Vec::with_capacity(points.len());
    let mut total = 0.0;
    cumulative.push(0.0);
    for w in points.windows(2) {
        total += ((w[1].0 - w[0].0).powi(2) + (w[1].1 - w[0].1).powi(2)).sqrt();
        cumulative.push(total);
    }
    if total > f64::EPSILON {
        cumulative.iter_mut().for_each(|c| *c /= total);
    }
    cumulative
}

/// Sorted union of the normalized breakpoints of two sections.
fn shared_params(a: &[(f64, f64)], b: &[(f64, f64)]) -> Vec<f64> {
    let mut params = arc_params(a);
    params.extend(arc_params(b));
    params.sort_by(f64::total_cmp);
    params.dedup_by(|x, y| (*x - *y).abs() < 1e-9);
    params
}

/// Points of a section polyline at the given normalized arc-length positions.
///
/// Every own breakpoint that appears in `params` comes back unchanged.
fn resample(points: &[(f64, f64)], params: &[f64]) -> Vec<(f64, f64)> {
    let own = arc_params(points);
    let mut out = Vec::with_capacity(params.len());
    let mut seg = 0;
    for &target in params {
        while seg + 2 < points.len() && own[seg + 1] < target {
            seg += 1;
        }
        let span = own[seg + 1] - own[seg];
        let t = if span < f64::EPSILON {
            0.0
        } else {
            ((target - own[seg]) / span).clamp(0.0, 1.0)
        };
        let (a, b) = (points[seg], points[seg + 1]);
        out.push((a.0 + t * (b.0 - a.0), a.1 + t * (b.1 - a.1)));
    }
    out
}

fn section_length(points: &[(f64, f64)]) -> f64 {
    points
        .windows(2)
        .map(|w| ((w[1].0 - w[0].0).powi(2) + (w[1].1 - w[0].1).powi(2)).sqrt())
        .sum()
}

impl Surface {
    /// Lofts consecutive transverse shapes into a ruled surface along `alignment`.
    ///
    /// Stations must be strictly increasing. Shapes without lateral extent are
    /// skipped with a warning; at least two usable stations are required.
    pub fn loft(alignment: &Alignment, shapes: &[TransverseShape]) -> DesignResult<Self> {
        if let Some(w) = shapes.windows(2).find(|w| w[1].chainage <= w[0].chainage) {
            return Err(DesignError::GeometricFailure(format!(
                "stations not increasing at chainage {}",
                w[1].chainage
            )));
        }
        let usable: Vec<&TransverseShape> = shapes
            .iter()
            .filter(|s| {
                let ok = s.points.len() >= 2 && section_length(&s.points) > f64::EPSILON;
                if !ok {
                    log::warn!(
                        "skipping degenerate section at chainage {:.2} ({} points)",
                        s.chainage,
                        s.points.len()
                    );
                }
                ok
            })
            .collect();
        if usable.len() < 2 {
            return Err(DesignError::GeometricFailure(format!(
                "{} usable stations, at least 2 required",
                usable.len()
            )));
        }

        let place = |chainage: f64, offset: f64| {
            alignment
                .offset_point(chainage, offset)
                .ok_or(DesignError::DegenerateSection { chainage })
        };

        // each strip between two stations gets its own columns, so both sections
        // keep all of their vertices
        let mut vertices = Vec::new();
        let mut triangles = Vec::new();
        for pair in usable.windows(2) {
            let params = shared_params(&pair[0].points, &pair[1].points);
            let cols = params.len();
            let base = vertices.len();
            for shape in pair {
                for (offset, height) in resample(&shape.points, &params) {
                    let p = place(shape.chainage, offset)?;
                    vertices.push(Point3::new(p.x, p.y, height));
                }
            }
            for c in 0..cols - 1 {
                let a = base + c;
                let b = a + 1;
                let d = a + cols;
                let e = d + 1;
                triangles.push([a, b, d]);
                triangles.push([b, e, d]);
            }
        }

        // offsets grow to the left, so the last point of a section is on the left edge
        let mut ring: Vec<Point> = Vec::with_capacity(usable.len() * 2);
        for shape in &usable {
            if let Some(&(offset, _)) = shape.points.last() {
                ring.push(place(shape.chainage, offset)?);
            }
        }
        for shape in usable.iter().rev() {
            if let Some(&(offset, _)) = shape.points.first() {
                ring.push(place(shape.chainage, offset)?);
            }
        }
        let outline = Polygon::new(ring);

        log::debug!(
            "lofted {} stations into {} triangles",
            usable.len(),
            triangles.len()
        );
        Ok(Self {
            vertices,
            triangles,
            outlines: vec![outline],
        })
    }

    /// Concatenates surfaces. Coincident vertices are kept as they are.
    pub fn merge<'a>(surfaces: impl IntoIterator<Item = &'a Surface>) -> Surface {
        let mut merged = Surface::default();
        for s in surfaces {
            merged.append(s);
        }
        merged
    }

    pub fn append(&mut self, other: &Surface) {
        let base = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);
        self.triangles.extend(
            other
                .triangles
                .iter()
                .map(|t| [t[0] + base, t[1] + base, t[2] + base]),
        );
        self.outlines.extend(other.outlines.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Checks that every triangle indexes an existing vertex.
    pub fn validate(&self) -> DesignResult<()> {
        let n = self.vertices.len();
        match self.triangles.iter().position(|t| t.iter().any(|&i| i >= n)) {
            Some(i) => Err(DesignError::GeometricFailure(format!(
                "triangle {i} {:?} indexes past {n} vertices",
                self.triangles[i]
            ))),
            None => Ok(()),
        }
    }

    /// Design elevation at `(x, y)`, `None` outside the surface.
    pub fn elevation_at(&self, x: f64, y: f64) -> Option<f64> {
        triangle_set_elevation(&self.vertices, &self.triangles, x, y)
    }

    /// Corner points of triangle `i`; `None` for a missing triangle or vertex.
    pub fn triangle(&self, i: usize) -> Option<[Point3; 3]> {
        let t = self.triangles.get(i)?;
        Some([
            *self.vertices.get(t[0])?,
            *self.vertices.get(t[1])?,
            *self.vertices.get(t[2])?,
        ])
    }

    /// Horizontal (plan) area of all triangles.
    pub fn area_2d(&self) -> f64 {
        (0..self.triangles.len())
            .filter_map(|i| self.triangle(i))
            .map(|[a, b, c]| polygon_area(&[a.xy(), b.xy(), c.xy()]))
            .sum()
    }

    /// Sloped area of all triangles.
    pub fn area_3d(&self) -> f64 {
        (0..self.triangles.len())
            .filter_map(|i| self.triangle(i))
            .map(|[a, b, c]| triangle_area3(a, b, c))
            .sum()
    }
}

impl ElevationSource for Surface {
    fn elevation_at(&self, x: f64, y: f64) -> Option<f64> {
        Surface::elevation_at(self, x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight() -> Alignment {
        Alignment::new(vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)]).unwrap()
    }

    fn shape(chainage: f64, points: Vec<(f64, f64)>) -> TransverseShape {
        TransverseShape { chainage, points }
    }

    #[test]
    fn lofts_flat_strip() {
        let shapes = vec![
            shape(0.0, vec![(-5.0, 1.0), (5.0, 1.0)]),
            shape(10.0, vec![(-5.0, 1.0), (5.0, 1.0)]),
        ];
        let surface = Surface::loft(&straight(), &shapes).unwrap();
        assert_eq!(surface.vertices.len(), 4);
        assert_eq!(surface.triangles.len(), 2);
        assert!((surface.area_2d() - 100.0).abs() < 1e-9);
        assert!((surface.area_3d() - 100.0).abs() < 1e-9);
        assert_eq!(surface.elevation_at(5.0, 0.0), Some(1.0));
        assert!(surface.elevation_at(5.0, 6.0).is_none());
        assert!((surface.outlines[0].area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn uneven_sections_are_resampled() {
        let shapes = vec![
            shape(0.0, vec![(-4.0, 0.0), (4.0, 0.0)]),
            shape(10.0, vec![(-4.0, 0.0), (0.0, 2.0), (4.0, 0.0)]),
        ];
        let surface = Surface::loft(&straight(), &shapes).unwrap();
        assert_eq!(surface.vertices.len(), 6);
        assert_eq!(surface.triangles.len(), 4);
        assert!((surface.vertices[1].y).abs() < 1e-9);
        // the apex of the second section survives
        assert!(surface
            .vertices
            .iter()
            .any(|v| (v.x - 10.0).abs() < 1e-9 && v.y.abs() < 1e-9 && (v.z - 2.0).abs() < 1e-9));
        assert!((surface.elevation_at(10.0, 0.0).unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn resampling_keeps_breakpoints_of_both_sections() {
        let apex = [(-4.0, 0.0), (0.0, 2.0), (4.0, 0.0)];
        let berm = [(-4.0, 0.0), (-3.0, 1.0), (3.0, 1.0), (4.0, 0.0)];
        let params = shared_params(&apex, &berm);
        assert_eq!(params.len(), 5);
        let a = resample(&apex, &params);
        let b = resample(&berm, &params);
        for p in apex {
            assert!(a.iter().any(|q| (q.0 - p.0).abs() < 1e-9 && (q.1 - p.1).abs() < 1e-9));
        }
        for p in berm {
            assert!(b.iter().any(|q| (q.0 - p.0).abs() < 1e-9 && (q.1 - p.1).abs() < 1e-9));
        }
    }

    #[test]
    fn out_of_range_triangles_are_rejected() {
        let json = r#"{"vertices":[{"x":0.0,"y":0.0,"z":0.0},{"x":1.0,"y":0.0,"z":0.0},{"x":0.0,"y":1.0,"z":0.0}],"triangles":[[0,1,99999]]}"#;
        assert!(serde_json::from_str::<Surface>(json).is_err());
        let bad = Surface {
            vertices: vec![Point3::new(0.0, 0.0, 0.0)],
            triangles: vec![[0, 1, 2]],
            outlines: Vec::new(),
        };
        assert!(matches!(bad.validate(), Err(DesignError::GeometricFailure(_))));
        assert!(bad.triangle(0).is_none());
        assert_eq!(bad.area_3d(), 0.0);
        assert!(bad.elevation_at(0.0, 0.0).is_none());
    }

    #[test]
    fn degenerate_stations_are_skipped_or_rejected() {
        let shapes = vec![
            shape(0.0, vec![(-5.0, 1.0), (5.0, 1.0)]),
            shape(5.0, vec![(0.0, 3.0)]),
            shape(10.0, vec![(-5.0, 1.0), (5.0, 1.0)]),
        ];
        let surface = Surface::loft(&straight(), &shapes).unwrap();
        assert_eq!(surface.triangles.len(), 2);

        let lonely = vec![shape(0.0, vec![(-5.0, 1.0), (5.0, 1.0)]), shape(5.0, vec![])];
        assert!(matches!(
            Surface::loft(&straight(), &lonely),
            Err(DesignError::GeometricFailure(_))
        ));
        let backwards = vec![
            shape(10.0, vec![(-5.0, 1.0), (5.0, 1.0)]),
            shape(10.0, vec![(-5.0, 1.0), (5.0, 1.0)]),
        ];
        assert!(Surface::loft(&straight(), &backwards).is_err());
    }

    #[test]
    fn merge_concatenates() {
        let a = Surface::loft(
            &straight(),
            &[
                shape(0.0, vec![(-1.0, 0.0), (1.0, 0.0)]),
                shape(1.0, vec![(-1.0, 0.0), (1.0, 0.0)]),
            ],
        )
        .unwrap();
        let merged = Surface::merge([&a, &a]);
        assert_eq!(merged.vertices.len(), 8);
        assert_eq!(merged.triangles.len(), 4);
        assert_eq!(merged.triangles[2], [4, 5, 6]);
        assert_eq!(merged.outlines.len(), 2);
    }
}
