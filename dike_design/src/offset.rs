//! Parallel offsets of construction lines.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DesignError, DesignResult};
use crate::geometry::{Point, Polyline};

/// Miters longer than this multiple of the distance are beveled.
const MITER_LIMIT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetSide {
    #[default]
    Left,
    Right,
}

impl fmt::Display for OffsetSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OffsetSide::Left => "left",
            OffsetSide::Right => "right",
        })
    }
}

impl FromStr for OffsetSide {
    type Err = DesignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "links" => Ok(OffsetSide::Left),
            "right" | "rechts" => Ok(OffsetSide::Right),
            other => Err(DesignError::Parse(format!("unknown offset side '{other}'"))),
        }
    }
}

/// Offset distance in metres with the side it applies to. Joins are always mitered.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OffsetParams {
    pub distance: f64,
    pub side: OffsetSide,
}

impl OffsetParams {
    pub fn new(distance: f64, side: OffsetSide) -> Self {
        Self { distance, side }
    }

    /// Distance with right mapped to negative.
    pub fn signed_distance(&self) -> f64 {
        match self.side {
            OffsetSide::Left => self.distance.abs(),
            OffsetSide::Right => -self.distance.abs(),
        }
    }

    pub fn apply(&self, line: &Polyline) -> DesignResult<Polyline> {
        offset_polyline(line, self.signed_distance())
    }
}

/// Shifts `line` by `distance` along its left normal (negative: right).
pub fn offset_polyline(line: &Polyline, distance: f64) -> DesignResult<Polyline> {
    // drop repeated vertices so every segment has a direction
    let mut pts: Vec<Point> = Vec::with_capacity(line.vertices.len());
    for p in &line.vertices {
        if pts.last().map_or(true, |q| !q.approx_eq(p, 1e-12)) {
            pts.push(*p);
        }
    }
    if pts.len() < 2 {
        return Err(DesignError::GeometricFailure(
            "offset needs a line with non-zero length".into(),
        ));
    }

    let normals: Vec<(f64, f64)> = pts
        .windows(2)
        .map(|w| {
            let (dx, dy) = (w[1].x - w[0].x, w[1].y - w[0].y);
            let len = (dx * dx + dy * dy).sqrt();
            (-dy / len, dx / len)
        })
        .collect();

    let shift = |p: Point, n: (f64, f64)| Point::new(p.x + n.0 * distance, p.y + n.1 * distance);

    let mut out = Vec::with_capacity(pts.len());
    out.push(shift(pts[0], normals[0]));
    for i in 1..pts.len() - 1 {
        let (n0, n1) = (normals[i - 1], normals[i]);
        let cos = n0.0 * n1.0 + n0.1 * n1.1;
        let (mx, my) = (n0.0 + n1.0, n0.1 + n1.1);
        let mlen2 = mx * mx + my * my;
        if (1.0 - cos).abs() < 1e-12 {
            out.push(shift(pts[i], n0));
            continue;
        }
        // unit miter length is 1 / cos(theta / 2) = 2 / |n0 + n1|
        let scale = if mlen2 > f64::EPSILON { 2.0 / mlen2 } else { f64::INFINITY };
        let miter_len = scale * mlen2.sqrt();
        if !scale.is_finite() || miter_len > MITER_LIMIT {
            out.push(shift(pts[i], n0));
            out.push(shift(pts[i], n1));
        } else {
            out.push(shift(pts[i], (mx * scale, my * scale)));
        }
    }
    let last = pts.len() - 1;
    out.push(shift(pts[last], normals[last - 1]));
    Ok(Polyline::new(out))
}
