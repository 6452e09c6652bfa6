//! Longitudinal design input: vakken and their control points.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DesignError, DesignResult};
use crate::profile::{nearest_by_chainage, TerrainProfile};

/// Named location in the transverse profile a control point describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceLocation {
    OuterToe,
    OuterCrest,
    InnerCrest,
    InnerToe,
}

impl ReferenceLocation {
    pub const ALL: [ReferenceLocation; 4] = [
        ReferenceLocation::OuterToe,
        ReferenceLocation::OuterCrest,
        ReferenceLocation::InnerCrest,
        ReferenceLocation::InnerToe,
    ];

    /// `true` for the two crest lines.
    pub fn is_crest(&self) -> bool {
        matches!(self, ReferenceLocation::OuterCrest | ReferenceLocation::InnerCrest)
    }

    /// `true` for locations on the outer (water) side.
    pub fn is_outer(&self) -> bool {
        matches!(self, ReferenceLocation::OuterToe | ReferenceLocation::OuterCrest)
    }

    /// Offset used when a template does not list this location.
    pub fn default_offset(&self, crest_width: f64) -> f64 {
        let half = crest_width / 2.0;
        match self {
            ReferenceLocation::OuterToe => -(half + 12.0),
            ReferenceLocation::OuterCrest => -half,
            ReferenceLocation::InnerCrest => half,
            ReferenceLocation::InnerToe => half + 12.0,
        }
    }
}

impl fmt::Display for ReferenceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReferenceLocation::OuterToe => "outer toe",
            ReferenceLocation::OuterCrest => "outer crest",
            ReferenceLocation::InnerCrest => "inner crest",
            ReferenceLocation::InnerToe => "inner toe",
        };
        f.write_str(label)
    }
}

impl FromStr for ReferenceLocation {
    type Err = DesignError;

    /// Accepts English and Dutch labels, case and separator insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "outertoe" | "buitenteen" => Ok(ReferenceLocation::OuterToe),
            "outercrest" | "buitenkruin" => Ok(ReferenceLocation::OuterCrest),
            "innercrest" | "binnenkruin" => Ok(ReferenceLocation::InnerCrest),
            "innertoe" | "binnenteen" => Ok(ReferenceLocation::InnerToe),
            _ => Err(DesignError::Parse(format!("unknown reference location '{s}'"))),
        }
    }
}

/// User-specified design vertex in the longitudinal profile of one vak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub id: u64,
    pub chainage: f64,
    /// `None` places the point on the design axis (crest line).
    #[serde(default, rename = "referenceLocation")]
    pub reference: Option<ReferenceLocation>,
    pub height: f64,
}

/// Rounds `value` to the nearest multiple of `resolution`, halves away from zero.
pub fn snap(value: f64, resolution: f64) -> f64 {
    if resolution <= 0.0 {
        return value;
    }
    (value / resolution).round() * resolution
}

/// Longitudinal line of one reference location: `(chainage, height)` pairs sorted by chainage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSection {
    pub reference: Option<ReferenceLocation>,
    pub points: Vec<(f64, f64)>,
}

impl CrossSection {
    /// Height at `chainage`, interpolated linearly and held constant beyond the ends.
    pub fn height_at(&self, chainage: f64) -> Option<f64> {
        let first = self.points.first()?;
        if chainage <= first.0 {
            return Some(first.1);
        }
        for pair in self.points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if chainage >= a.0 && chainage <= b.0 {
                let t = if (b.0 - a.0).abs() < f64::EPSILON {
                    0.0
                } else {
                    (chainage - a.0) / (b.0 - a.0)
                };
                return Some(a.1 + t * (b.1 - a.1));
            }
        }
        self.points.last().map(|p| p.1)
    }
}

/// A design sheet: one named set of longitudinal control points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vak {
    pub name: String,
    points: Vec<ControlPoint>,
    next_id: u64,
    #[serde(default)]
    allow_duplicate_chainage: bool,
}

impl Vak {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: Vec::new(),
            next_id: 1,
            allow_duplicate_chainage: false,
        }
    }

    /// Permits two points of the same reference line at one chainage.
    pub fn allow_duplicate_chainage(mut self, allow: bool) -> Self {
        self.allow_duplicate_chainage = allow;
        self
    }

    /// Rebuilds a vak from persisted points, keeping their ids.
    pub fn from_points(name: impl Into<String>, mut points: Vec<ControlPoint>) -> Self {
        points.sort_by(|a, b| a.chainage.total_cmp(&b.chainage));
        let next_id = points.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        Self {
            name: name.into(),
            points,
            next_id,
            allow_duplicate_chainage: false,
        }
    }

    /// Control points sorted by chainage.
    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    pub fn point(&self, id: u64) -> Option<&ControlPoint> {
        self.points.iter().find(|p| p.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn check_free(
        &self,
        chainage: f64,
        reference: Option<ReferenceLocation>,
        ignore: Option<u64>,
    ) -> DesignResult<()> {
        if self.allow_duplicate_chainage {
            return Ok(());
        }
        let taken = self.points.iter().any(|p| {
            Some(p.id) != ignore
                && p.reference == reference
                && (p.chainage - chainage).abs() < 1e-9
        });
        if taken {
            return Err(DesignError::DuplicateChainage {
                vak: self.name.clone(),
                chainage,
            });
        }
        Ok(())
    }

    fn sort(&mut self) {
        self.points.sort_by(|a, b| a.chainage.total_cmp(&b.chainage));
    }

    /// Adds a control point at exactly the given position and returns its id.
    pub fn add_point(
        &mut self,
        chainage: f64,
        reference: Option<ReferenceLocation>,
        height: f64,
    ) -> DesignResult<u64> {
        if chainage < 0.0 {
            return Err(DesignError::GeometricFailure(format!(
                "negative chainage {chainage}"
            )));
        }
        self.check_free(chainage, reference, None)?;
        let id = self.next_id;
        self.next_id += 1;
        self.points.push(ControlPoint {
            id,
            chainage,
            reference,
            height,
        });
        self.sort();
        Ok(id)
    }

    /// Adds a point from a pointer position, snapping both axes to `resolution`.
    pub fn place_point(
        &mut self,
        chainage: f64,
        reference: Option<ReferenceLocation>,
        height: f64,
        resolution: f64,
    ) -> DesignResult<u64> {
        let chainage = snap(chainage, resolution).max(0.0);
        self.add_point(chainage, reference, snap(height, resolution))
    }

    /// Drags point `id` to a new position, snapped to `resolution`. The vak is left
    /// unchanged when the move is rejected.
    pub fn move_point(
        &mut self,
        id: u64,
        chainage: f64,
        height: f64,
        resolution: f64,
    ) -> DesignResult<ControlPoint> {
        let chainage = snap(chainage, resolution).max(0.0);
        let height = snap(height, resolution);
        let reference = self
            .point(id)
            .ok_or(DesignError::UnknownControlPoint(id))?
            .reference;
        self.check_free(chainage, reference, Some(id))?;
        let moved = {
            let p = self
                .points
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or(DesignError::UnknownControlPoint(id))?;
            p.chainage = chainage;
            p.height = height;
            p.clone()
        };
        self.sort();
        Ok(moved)
    }

    pub fn remove_point(&mut self, id: u64) -> DesignResult<ControlPoint> {
        let idx = self
            .points
            .iter()
            .position(|p| p.id == id)
            .ok_or(DesignError::UnknownControlPoint(id))?;
        Ok(self.points.remove(idx))
    }

    /// Reference lines that have at least one point. `None` is the design axis.
    pub fn references(&self) -> BTreeSet<Option<ReferenceLocation>> {
        self.points.iter().map(|p| p.reference).collect()
    }

    /// Longitudinal line of one reference location.
    pub fn longitudinal_line(&self, reference: Option<ReferenceLocation>) -> CrossSection {
        CrossSection {
            reference,
            points: self
                .points
                .iter()
                .filter(|p| p.reference == reference)
                .map(|p| (p.chainage, p.height))
                .collect(),
        }
    }

    /// Chainage range spanned by all control points.
    pub fn chainage_range(&self) -> Option<(f64, f64)> {
        Some((self.points.first()?.chainage, self.points.last()?.chainage))
    }
}

/// Terrain and design height at a control point's chainage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub control_id: u64,
    pub chainage: f64,
    pub terrain_elevation: f64,
    pub design_height: f64,
}

/// Pairs every control point with the nearest terrain sample.
///
/// Returns an empty list when the profile is empty.
pub fn anchor_control_points(points: &[ControlPoint], profile: &TerrainProfile) -> Vec<Anchor> {
    let samples = profile.points();
    points
        .iter()
        .filter_map(|cp| {
            let idx = nearest_by_chainage(samples, cp.chainage, |p| p.chainage)?;
            Some(Anchor {
                control_id: cp.id,
                chainage: cp.chainage,
                terrain_elevation: samples[idx].elevation,
                design_height: cp.height,
            })
        })
        .collect()
}
