//! Terrain elevation profile sampled along an alignment.

use std::sync::Arc;

use crate::alignment::Alignment;
use crate::config::{SamplerConfig, UnresolvedPolicy};
use crate::error::{DesignError, DesignResult};

/// Anything that can answer "what is the terrain elevation at (x, y)".
pub trait ElevationSource {
    /// Elevation at the plan position, `None` when the location cannot be resolved.
    fn elevation_at(&self, x: f64, y: f64) -> Option<f64>;
}

impl<T: ElevationSource + ?Sized> ElevationSource for &T {
    fn elevation_at(&self, x: f64, y: f64) -> Option<f64> {
        (**self).elevation_at(x, y)
    }
}

impl<T: ElevationSource + ?Sized> ElevationSource for Box<T> {
    fn elevation_at(&self, x: f64, y: f64) -> Option<f64> {
        (**self).elevation_at(x, y)
    }
}

impl<T: ElevationSource + ?Sized> ElevationSource for Arc<T> {
    fn elevation_at(&self, x: f64, y: f64) -> Option<f64> {
        (**self).elevation_at(x, y)
    }
}

/// Level terrain at a fixed elevation everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatTerrain(pub f64);

impl ElevationSource for FlatTerrain {
    fn elevation_at(&self, _x: f64, _y: f64) -> Option<f64> {
        Some(self.0)
    }
}

/// Adapts a closure into an [`ElevationSource`].
pub struct ElevationFn<F>(pub F);

impl<F> ElevationSource for ElevationFn<F>
where
    F: Fn(f64, f64) -> Option<f64>,
{
    fn elevation_at(&self, x: f64, y: f64) -> Option<f64> {
        (self.0)(x, y)
    }
}

/// Terrain elevation sampled at a chainage.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProfilePoint {
    /// Stable identity; survives deletion of other points.
    pub id: u64,
    pub chainage: f64,
    pub elevation: f64,
    pub x: f64,
    pub y: f64,
}

/// Ordered terrain profile along an alignment. Chainage is non-decreasing.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TerrainProfile {
    points: Vec<ProfilePoint>,
}

impl TerrainProfile {
    /// Builds a profile from stored points, sorted by chainage.
    pub fn from_points(mut points: Vec<ProfilePoint>) -> Self {
        points.sort_by(|a, b| a.chainage.total_cmp(&b.chainage));
        Self { points }
    }

    pub fn points(&self) -> &[ProfilePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Removes the point with `id`. Remaining points keep their ids.
    pub fn remove(&mut self, id: u64) -> Option<ProfilePoint> {
        let idx = self.points.iter().position(|p| p.id == id)?;
        Some(self.points.remove(idx))
    }

    /// Point nearest to `chainage`. On an exact tie the lower chainage wins, which
    /// is the point a forward scan would meet first.
    pub fn nearest(&self, chainage: f64) -> Option<&ProfilePoint> {
        nearest_by_chainage(&self.points, chainage, |p| p.chainage).map(|i| &self.points[i])
    }

    /// Linear interpolation of terrain elevation, clamped at both ends.
    pub fn elevation_at_chainage(&self, chainage: f64) -> Option<f64> {
        let first = self.points.first()?;
        if chainage <= first.chainage {
            return Some(first.elevation);
        }
        for pair in self.points.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if chainage >= a.chainage && chainage <= b.chainage {
                let span = b.chainage - a.chainage;
                let t = if span.abs() < f64::EPSILON {
                    0.0
                } else {
                    (chainage - a.chainage) / span
                };
                return Some(a.elevation + t * (b.elevation - a.elevation));
            }
        }
        self.points.last().map(|p| p.elevation)
    }

    /// Chainage range covered by the profile.
    pub fn chainage_range(&self) -> Option<(f64, f64)> {
        Some((self.points.first()?.chainage, self.points.last()?.chainage))
    }
}

/// Index of the item whose chainage is nearest to `target` in a slice sorted by
/// chainage. Ties go to the lower index.
pub fn nearest_by_chainage<T>(
    items: &[T],
    target: f64,
    chainage: impl Fn(&T) -> f64,
) -> Option<usize> {
    let idx = items.partition_point(|p| chainage(p) < target);
    let upper = (idx < items.len()).then_some(idx);
    // first item of the run of equal chainages just below the target
    let lower = idx.checked_sub(1).map(|mut i| {
        let c = chainage(&items[i]);
        while i > 0 && chainage(&items[i - 1]) == c {
            i -= 1;
        }
        i
    });
    match (lower, upper) {
        (Some(l), Some(u)) => {
            if target - chainage(&items[l]) <= chainage(&items[u]) - target {
                Some(l)
            } else {
                Some(u)
            }
        }
        (l, u) => l.or(u),
    }
}

/// Chainages at which the alignment is sampled: `0, step, 2·step, ...` and the end.
pub fn sample_chainages(length: f64, config: &SamplerConfig) -> Vec<f64> {
    let mut step = if config.step > 0.0 { config.step } else { 1.0 };
    if config.max_samples > 1 {
        let min_step = length / (config.max_samples - 1) as f64;
        if min_step > step {
            step = min_step;
        }
    }
    let mut out = Vec::new();
    let mut i = 0usize;
    loop {
        let ch = i as f64 * step;
        if ch >= length - 1e-9 {
            break;
        }
        out.push(ch);
        i += 1;
    }
    out.push(length);
    out
}

/// Samples terrain elevation along `alignment`.
///
/// Unresolved samples are handled according to `config.unresolved`: filled from
/// their neighbours, or the run fails. A profile without a single resolved sample
/// always fails with [`DesignError::MissingInput`].
pub fn sample_profile(
    alignment: &Alignment,
    source: &dyn ElevationSource,
    config: &SamplerConfig,
) -> DesignResult<TerrainProfile> {
    let mut raw: Vec<(f64, f64, f64, Option<f64>)> = Vec::new();
    for ch in sample_chainages(alignment.length(), config) {
        let Some(p) = alignment.point_at(ch) else {
            continue;
        };
        let z = source.elevation_at(p.x, p.y);
        if z.is_none() && config.unresolved == UnresolvedPolicy::Fail {
            return Err(DesignError::MissingInput(format!(
                "no terrain elevation at chainage {ch:.2} ({:.2}, {:.2})",
                p.x, p.y
            )));
        }
        raw.push((ch, p.x, p.y, z));
    }

    let resolved: Vec<usize> = raw
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.3.map(|_| i))
        .collect();
    if resolved.is_empty() {
        return Err(DesignError::MissingInput(
            "terrain could not be resolved anywhere along the alignment".into(),
        ));
    }
    let unresolved = raw.len() - resolved.len();
    if unresolved > 0 {
        log::warn!("{unresolved} of {} terrain samples unresolved, interpolating", raw.len());
    }

    let mut points = Vec::with_capacity(raw.len());
    for (i, (ch, x, y, z)) in raw.iter().enumerate() {
        let elevation = match z {
            Some(z) => *z,
            None => fill_gap(&raw, &resolved, i),
        };
        points.push(ProfilePoint {
            id: i as u64,
            chainage: *ch,
            elevation,
            x: *x,
            y: *y,
        });
    }
    log::debug!(
        "sampled {} terrain points over {:.2}",
        points.len(),
        alignment.length()
    );
    Ok(TerrainProfile { points })
}

fn fill_gap(raw: &[(f64, f64, f64, Option<f64>)], resolved: &[usize], i: usize) -> f64 {
    let after = resolved.partition_point(|&r| r < i);
    let next = resolved.get(after).copied();
    let prev = after.checked_sub(1).map(|k| resolved[k]);
    let value = |k: usize| raw[k].3.unwrap_or_default();
    match (prev, next) {
        (Some(a), Some(b)) => {
            let span = raw[b].0 - raw[a].0;
            let t = if span.abs() < f64::EPSILON {
                0.0
            } else {
                (raw[i].0 - raw[a].0) / span
            };
            value(a) + t * (value(b) - value(a))
        }
        (Some(a), None) => value(a),
        (None, Some(b)) => value(b),
        (None, None) => 0.0,
    }
}
