use crate::geometry::{Point, Point3};
use crate::profile::ElevationSource;

/// Barycentric weights of `p` in triangle `(a, b, c)` projected on the XY plane.
pub(crate) fn barycentric(p: Point, a: Point3, b: Point3, c: Point3) -> Option<(f64, f64, f64)> {
    let det = (b.y - c.y) * (a.x - c.x) + (c.x - b.x) * (a.y - c.y);
    if det.abs() < f64::EPSILON {
        return None;
    }
    let u = ((b.y - c.y) * (p.x - c.x) + (c.x - b.x) * (p.y - c.y)) / det;
    let v = ((c.y - a.y) * (p.x - c.x) + (a.x - c.x) * (p.y - c.y)) / det;
    let w = 1.0 - u - v;
    Some((u, v, w))
}

/// Interpolates the elevation at `(x, y)` over an indexed triangle set.
pub(crate) fn triangle_set_elevation(
    vertices: &[Point3],
    triangles: &[[usize; 3]],
    x: f64,
    y: f64,
) -> Option<f64> {
    const EDGE_TOL: f64 = -1e-9;
    for tri in triangles {
        let (Some(&a), Some(&b), Some(&c)) = (
            vertices.get(tri[0]),
            vertices.get(tri[1]),
            vertices.get(tri[2]),
        ) else {
            continue;
        };
        if let Some((u, v, w)) = barycentric(Point::new(x, y), a, b, c) {
            if u >= EDGE_TOL && v >= EDGE_TOL && w >= EDGE_TOL {
                return Some(u * a.z + v * b.z + w * c.z);
            }
        }
    }
    None
}

/// Triangulated Irregular Network of existing terrain, built from surveyed 3D points.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Tin {
    /// Vertices of the TIN.
    pub vertices: Vec<Point3>,
    /// Indices into `vertices` forming triangles.
    pub triangles: Vec<[usize; 3]>,
}

impl Tin {
    /// Builds a TIN from the provided vertices using Delaunay triangulation on the XY plane.
    pub fn from_points(points: Vec<Point3>) -> Self {
        let coords: Vec<delaunator::Point> = points
            .iter()
            .map(|p| delaunator::Point { x: p.x, y: p.y })
            .collect();
        let triangulation = delaunator::triangulate(&coords);
        let triangles = triangulation
            .triangles
            .chunks(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        Self {
            vertices: points,
            triangles,
        }
    }

    /// Returns the interpolated elevation at (x,y) if the point lies within the TIN.
    pub fn elevation_at(&self, x: f64, y: f64) -> Option<f64> {
        triangle_set_elevation(&self.vertices, &self.triangles, x, y)
    }

    /// `true` when the triangulation produced no triangles (fewer than three
    /// non-collinear points).
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

impl ElevationSource for Tin {
    fn elevation_at(&self, x: f64, y: f64) -> Option<f64> {
        Tin::elevation_at(self, x, y)
    }
}
