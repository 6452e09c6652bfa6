//! Cut and fill between the design surface and existing terrain.

use serde::{Deserialize, Serialize};

use crate::cross_section::TransverseShape;
use crate::geometry::{Point, Polygon};
use crate::measure::Measure;
use crate::profile::{ElevationSource, TerrainProfile};
use crate::surface::Surface;

/// Excavation and fill totals. Both are non-negative; the net difference is
/// `fill - excavation`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeResult {
    pub excavation: f64,
    pub fill: f64,
    pub net_difference: f64,
}

impl VolumeResult {
    pub fn new(excavation: f64, fill: f64) -> Self {
        Self {
            excavation,
            fill,
            net_difference: fill - excavation,
        }
    }
}

/// Volume plus how many surface cells contributed to it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VolumeReport {
    pub result: VolumeResult,
    pub evaluated_cells: usize,
    /// Cells where the terrain could not be resolved at any sample location.
    pub skipped_cells: usize,
}

/// Integrates the vertical difference between `surface` and `terrain` over every
/// triangle of the surface.
///
/// The terrain is sampled at the triangle corners, falling back to the centroid when
/// no corner resolves. Unresolved cells are skipped and counted, never fatal.
pub fn compute_volume(
    surface: &Surface,
    terrain: &dyn ElevationSource,
    measure: &Measure,
) -> VolumeReport {
    let mut fill = 0.0;
    let mut excavation = 0.0;
    let mut evaluated = 0;
    let mut skipped = 0;

    for i in 0..surface.triangles.len() {
        let Some(corners) = surface.triangle(i) else {
            log::warn!("cell {i} indexes a missing vertex");
            skipped += 1;
            continue;
        };
        let diffs: Vec<f64> = corners
            .iter()
            .filter_map(|p| terrain.elevation_at(p.x, p.y).map(|t| p.z - t))
            .collect();
        let diff = if diffs.is_empty() {
            let cx = corners.iter().map(|p| p.x).sum::<f64>() / 3.0;
            let cy = corners.iter().map(|p| p.y).sum::<f64>() / 3.0;
            let cz = corners.iter().map(|p| p.z).sum::<f64>() / 3.0;
            match terrain.elevation_at(cx, cy) {
                Some(t) => cz - t,
                None => {
                    log::debug!("no terrain under cell {i} at ({cx:.2}, {cy:.2})");
                    skipped += 1;
                    continue;
                }
            }
        } else {
            diffs.iter().sum::<f64>() / diffs.len() as f64
        };

        let cell = Polygon::new(corners.iter().map(|p| Point::new(p.x, p.y)).collect());
        let volume = diff * measure.area(&cell);
        if volume > 0.0 {
            fill += volume;
        } else {
            excavation -= volume;
        }
        evaluated += 1;
    }

    if skipped > 0 {
        log::warn!(
            "volume is partial: {skipped} of {} cells had no terrain",
            surface.triangles.len()
        );
    }
    VolumeReport {
        result: VolumeResult::new(excavation, fill),
        evaluated_cells: evaluated,
        skipped_cells: skipped,
    }
}

/// Fill and cut areas of one section above and below a level terrain line.
///
/// Segments crossing the terrain are split at the crossing so each part is counted
/// on its own side.
pub fn section_areas(shape: &TransverseShape, terrain: f64) -> (f64, f64) {
    let mut fill = 0.0;
    let mut cut = 0.0;
    for w in shape.points.windows(2) {
        let ((o0, h0), (o1, h1)) = (w[0], w[1]);
        let width = o1 - o0;
        let (d0, d1) = (h0 - terrain, h1 - terrain);
        if d0 * d1 >= 0.0 {
            let area = (d0 + d1) * 0.5 * width;
            if area > 0.0 {
                fill += area;
            } else {
                cut -= area;
            }
        } else {
            let split = width * d0.abs() / (d0.abs() + d1.abs());
            let first = d0 * 0.5 * split;
            let second = d1 * 0.5 * (width - split);
            for part in [first, second] {
                if part > 0.0 {
                    fill += part;
                } else {
                    cut -= part;
                }
            }
        }
    }
    (fill, cut)
}

/// Station-interval volume: section areas against the profile elevation at each
/// station, combined with the average end area rule.
pub fn volume_along_profile(shapes: &[TransverseShape], profile: &TerrainProfile) -> VolumeResult {
    let areas: Vec<(f64, f64, f64)> = shapes
        .iter()
        .filter_map(|s| {
            let terrain = profile.elevation_at_chainage(s.chainage)?;
            let (fill, cut) = section_areas(s, terrain);
            Some((s.chainage, fill, cut))
        })
        .collect();

    let mut fill = 0.0;
    let mut cut = 0.0;
    for w in areas.windows(2) {
        let length = w[1].0 - w[0].0;
        fill += (w[0].1 + w[1].1) * 0.5 * length;
        cut += (w[0].2 + w[1].2) * 0.5 * length;
    }
    VolumeResult::new(cut, fill)
}
