//! Intersections between construction lines and plan or profile lines, and the
//! structural elements placed where they meet.

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use serde::{Deserialize, Serialize};

use crate::alignment::Alignment;
use crate::design::CrossSection;
use crate::error::{DesignError, DesignResult};
use crate::geometry::{Line, Point, Polyline};
use crate::offset::{OffsetParams, OffsetSide};
use crate::profile::TerrainProfile;

const DEDUP_TOL: f64 = 1e-9;
const PARALLEL_TOL: f64 = 1e-9;

/// Zero, one or many intersection points.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Intersection {
    #[default]
    Empty,
    Single(Point),
    Multiple(Vec<Point>),
}

impl Intersection {
    fn from_points(mut points: Vec<Point>) -> Self {
        match points.len() {
            0 => Intersection::Empty,
            1 => Intersection::Single(points.remove(0)),
            _ => Intersection::Multiple(points),
        }
    }

    pub fn points(&self) -> Vec<Point> {
        match self {
            Intersection::Empty => Vec::new(),
            Intersection::Single(p) => vec![*p],
            Intersection::Multiple(ps) => ps.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Intersection::Empty)
    }
}

/// Intersection of the finite segments `a1-a2` and `b1-b2`.
///
/// Parallel and degenerate pairs (`|denom| < 1e-9`) never intersect; the point must lie
/// within both segments.
pub fn segment_intersection(a1: Point, a2: Point, b1: Point, b2: Point) -> Option<Point> {
    let (x1, y1, x2, y2) = (a1.x, a1.y, a2.x, a2.y);
    let (x3, y3, x4, y4) = (b1.x, b1.y, b2.x, b2.y);
    let denom = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
    if denom.abs() < PARALLEL_TOL {
        return None;
    }
    let t = ((x1 - x3) * (y3 - y4) - (y1 - y3) * (x3 - x4)) / denom;
    let u = -((x1 - x2) * (y1 - y3) - (y1 - y2) * (x1 - x3)) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(Point::new(x1 + t * (x2 - x1), y1 + t * (y2 - y1)))
    } else {
        None
    }
}

/// Manual pairwise test: every segment of `a` against the first segment of `b`.
///
/// Later segments of `b` are not examined, so a multi-segment target can hide
/// crossings here. This only runs when the exact pass found nothing.
pub fn fallback_intersections(a: &Polyline, b: &Polyline) -> Vec<Point> {
    let Some(target) = b.first_segment() else {
        return Vec::new();
    };
    a.segments()
        .filter_map(|seg| segment_intersection(seg.start, seg.end, target.start, target.end))
        .collect()
}

fn push_unique(points: &mut Vec<Point>, p: Point) {
    if !points.iter().any(|q| q.approx_eq(&p, DEDUP_TOL)) {
        points.push(p);
    }
}

fn exact_intersections(a: &Polyline, b: &Polyline) -> Vec<Point> {
    let mut points = Vec::new();
    for sa in a.segments() {
        for sb in b.segments() {
            let found = line_intersection(
                geo_types::Line::from(sa),
                geo_types::Line::from(sb),
            );
            if let Some(LineIntersection::SinglePoint { intersection, .. }) = found {
                push_unique(&mut points, intersection.into());
            }
        }
    }
    points
}

/// Crossings of polyline `a` with polyline `b`.
///
/// All segment pairs are tested with `geo`'s robust predicate first; collinear
/// overlaps are not points. When that finds nothing the manual fallback runs.
pub fn intersect_polylines(a: &Polyline, b: &Polyline) -> Intersection {
    let exact = exact_intersections(a, b);
    if !exact.is_empty() {
        return Intersection::from_points(exact);
    }
    let mut points = Vec::new();
    for p in fallback_intersections(a, b) {
        push_unique(&mut points, p);
    }
    Intersection::from_points(points)
}

/// Terrain profile as a line in the (chainage, elevation) plane.
pub fn profile_line(profile: &TerrainProfile) -> Polyline {
    Polyline::new(
        profile
            .points()
            .iter()
            .map(|p| Point::new(p.chainage, p.elevation))
            .collect(),
    )
}

/// Longitudinal design line in the (chainage, height) plane.
pub fn design_line(section: &CrossSection) -> Polyline {
    Polyline::new(section.points.iter().map(|&(c, h)| Point::new(c, h)).collect())
}

/// Where a vertical line at `chainage` meets `target`, a line in the
/// (chainage, height) plane.
pub fn intersect_profile_line(chainage: f64, target: &Polyline) -> Intersection {
    let (lo, hi) = target
        .vertices
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.y), hi.max(p.y))
        });
    if !lo.is_finite() {
        return Intersection::Empty;
    }
    let vertical = Polyline::new(vec![
        Point::new(chainage, hi + 1.0),
        Point::new(chainage, lo - 1.0),
    ]);
    intersect_polylines(&vertical, target)
}

/// Vertical structural element (e.g. a sheet pile) at one chainage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureLine {
    pub chainage: f64,
    /// Plan position where the construction line crosses the alignment.
    pub point: Point,
    /// `(chainage, terrain elevation)`.
    pub top: (f64, f64),
    /// `(chainage, tip level)`.
    pub bottom: (f64, f64),
}

impl StructureLine {
    pub fn as_profile_line(&self) -> Line {
        Line::new(
            Point::new(self.top.0, self.top.1),
            Point::new(self.bottom.0, self.bottom.1),
        )
    }
}

/// Places a structural element wherever the plan-view `construction_line` crosses
/// the alignment, running from the terrain down to the absolute level `depth`.
pub fn place_structures(
    construction_line: &Polyline,
    alignment: &Alignment,
    profile: &TerrainProfile,
    depth: f64,
) -> DesignResult<Vec<StructureLine>> {
    if construction_line.vertices.len() < 2 {
        return Err(DesignError::MissingInput("construction line".into()));
    }
    if profile.is_empty() {
        return Err(DesignError::MissingInput("terrain profile".into()));
    }
    let terrain = profile_line(profile);
    let crossings = intersect_polylines(construction_line, &alignment.to_polyline());

    let mut structures = Vec::new();
    for point in crossings.points() {
        let (chainage, _) = alignment.project(point);
        let elevation = intersect_profile_line(chainage, &terrain)
            .points()
            .first()
            .map(|p| p.y)
            .or_else(|| profile.elevation_at_chainage(chainage))
            .ok_or_else(|| DesignError::MissingInput("terrain profile".into()))?;
        structures.push(StructureLine {
            chainage,
            point,
            top: (chainage, elevation),
            bottom: (chainage, depth),
        });
    }
    structures.sort_by(|a, b| a.chainage.total_cmp(&b.chainage));
    log::debug!("placed {} structural elements", structures.len());
    Ok(structures)
}

/// Structural element layout as the user configured it, with the elements placed
/// from it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Constructions {
    /// Free-form element kind, e.g. `"damwand"`.
    pub structure_type: String,
    /// Absolute tip level of every element.
    pub depth: f64,
    pub use_offset: bool,
    pub offset_distance: f64,
    pub offset_side: OffsetSide,
    pub drawn_construction_line: Option<Polyline>,
    pub structures: Vec<StructureLine>,
}

impl Constructions {
    /// The line structures are placed along: the drawn line, offset when enabled.
    pub fn construction_line(&self) -> DesignResult<Polyline> {
        let drawn = self
            .drawn_construction_line
            .as_ref()
            .ok_or_else(|| DesignError::MissingInput("construction line".into()))?;
        if self.use_offset {
            OffsetParams::new(self.offset_distance, self.offset_side).apply(drawn)
        } else {
            Ok(drawn.clone())
        }
    }

    /// Recomputes `structures` against the alignment and terrain profile.
    pub fn place(&mut self, alignment: &Alignment, profile: &TerrainProfile) -> DesignResult<()> {
        let line = self.construction_line()?;
        self.structures = place_structures(&line, alignment, profile, self.depth)?;
        Ok(())
    }
}
