//! Transverse shapes derived from the longitudinal control points of a vak.

use serde::{Deserialize, Serialize};

pub use crate::config::TransverseTemplate;
use crate::design::{ReferenceLocation, Vak};
use crate::error::{DesignError, DesignResult};
use crate::profile::TerrainProfile;

/// Design cross-section at one chainage, in the (lateral offset, height) plane.
///
/// Points are sorted by offset, positive to the left of the alignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransverseShape {
    pub chainage: f64,
    pub points: Vec<(f64, f64)>,
}

impl TransverseShape {
    /// Height of the shape at `offset`, `None` outside its lateral extent.
    pub fn height_at(&self, offset: f64) -> Option<f64> {
        self.points.windows(2).find_map(|w| {
            let ((o0, h0), (o1, h1)) = (w[0], w[1]);
            if offset < o0 || offset > o1 {
                return None;
            }
            if (o1 - o0).abs() < f64::EPSILON {
                return Some(h0);
            }
            Some(h0 + (offset - o0) / (o1 - o0) * (h1 - h0))
        })
    }

    /// Lateral extent `(min offset, max offset)`.
    pub fn extent(&self) -> Option<(f64, f64)> {
        Some((self.points.first()?.0, self.points.last()?.0))
    }
}

/// Chainages at which the vak gets a cross-section: every profile sample inside
/// the control-point range plus every control-point chainage.
pub fn station_chainages(vak: &Vak, profile: &TerrainProfile) -> Vec<f64> {
    let Some((lo, hi)) = vak.chainage_range() else {
        return Vec::new();
    };
    let mut stations: Vec<f64> = profile
        .points()
        .iter()
        .map(|p| p.chainage)
        .filter(|c| *c >= lo && *c <= hi)
        .chain(vak.points().iter().map(|p| p.chainage))
        .collect();
    stations.sort_by(f64::total_cmp);
    stations.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
    stations
}

/// Builds one transverse shape per station of `vak`.
///
/// Labelled reference lines sit at their template offset. The unlabelled design
/// axis stands in for missing crest lines at half the crest width, and missing
/// toes are dropped onto the terrain along the template slopes.
pub fn build_transverse_shapes(
    vak: &Vak,
    profile: &TerrainProfile,
    template: &TransverseTemplate,
) -> DesignResult<Vec<TransverseShape>> {
    if vak.is_empty() {
        return Err(DesignError::MissingInput(format!(
            "vak '{}' has no control points",
            vak.name
        )));
    }
    if profile.is_empty() {
        return Err(DesignError::MissingInput("terrain profile".into()));
    }

    let axis = vak.longitudinal_line(None);
    let lines: Vec<_> = ReferenceLocation::ALL
        .iter()
        .map(|loc| (*loc, vak.longitudinal_line(Some(*loc))))
        .filter(|(_, line)| !line.points.is_empty())
        .collect();
    let has = |loc: ReferenceLocation| lines.iter().any(|(l, _)| *l == loc);
    let half_crest = template.crest_width / 2.0;

    let stations = station_chainages(vak, profile);
    let mut shapes = Vec::with_capacity(stations.len());
    for chainage in stations {
        let terrain = profile
            .nearest(chainage)
            .map(|p| p.elevation)
            .ok_or_else(|| DesignError::MissingInput("terrain profile".into()))?;

        let mut points: Vec<(f64, f64)> = lines
            .iter()
            .filter_map(|(loc, line)| Some((template.offset_of(*loc), line.height_at(chainage)?)))
            .collect();

        if let Some(h) = axis.height_at(chainage) {
            if !has(ReferenceLocation::OuterCrest) {
                points.push((-half_crest, h));
            }
            if !has(ReferenceLocation::InnerCrest) {
                points.push((half_crest, h));
            }
        }

        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        // a toe hangs off the outermost point of its own side only
        if !has(ReferenceLocation::OuterToe) {
            if let Some(&(offset, h)) = points.first().filter(|p| p.0 <= 0.0) {
                let run = (h - terrain).abs() * template.outer_slope;
                points.insert(0, (offset - run, terrain));
            }
        }
        if !has(ReferenceLocation::InnerToe) {
            if let Some(&(offset, h)) = points.last().filter(|p| p.0 >= 0.0) {
                let run = (h - terrain).abs() * template.inner_slope;
                points.push((offset + run, terrain));
            }
        }
        points.dedup_by(|a, b| (a.0 - b.0).abs() < 1e-9);

        shapes.push(TransverseShape { chainage, points });
    }
    log::debug!("vak '{}': {} transverse shapes", vak.name, shapes.len());
    Ok(shapes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfilePoint;

    fn flat_profile(length: usize, elevation: f64) -> TerrainProfile {
        TerrainProfile::from_points(
            (0..=length)
                .map(|i| ProfilePoint {
                    id: i as u64,
                    chainage: i as f64 * 10.0,
                    elevation,
                    x: i as f64 * 10.0,
                    y: 0.0,
                })
                .collect(),
        )
    }

    #[test]
    fn axis_only_gets_crests_and_toes() {
        let mut vak = Vak::new("A");
        vak.add_point(0.0, None, 2.0).unwrap();
        vak.add_point(50.0, None, 5.0).unwrap();
        let shapes =
            build_transverse_shapes(&vak, &flat_profile(10, 0.0), &TransverseTemplate::default())
                .unwrap();
        assert_eq!(shapes.len(), 6);
        let mid = &shapes[5];
        assert_eq!(mid.chainage, 50.0);
        assert_eq!(
            mid.points,
            vec![(-17.0, 0.0), (-2.0, 5.0), (2.0, 5.0), (17.0, 0.0)]
        );
        assert!((mid.height_at(-9.5).unwrap() - 2.5).abs() < 1e-9);
        assert!(mid.height_at(20.0).is_none());
    }

    #[test]
    fn labelled_lines_use_template_offsets() {
        let mut vak = Vak::new("A");
        vak.add_point(0.0, Some(ReferenceLocation::OuterToe), 1.0)
            .unwrap();
        vak.add_point(0.0, Some(ReferenceLocation::OuterCrest), 4.0)
            .unwrap();
        vak.add_point(0.0, Some(ReferenceLocation::InnerCrest), 4.0)
            .unwrap();
        vak.add_point(20.0, Some(ReferenceLocation::InnerCrest), 6.0)
            .unwrap();
        vak.add_point(20.0, Some(ReferenceLocation::InnerToe), 0.5)
            .unwrap();
        let shapes =
            build_transverse_shapes(&vak, &flat_profile(4, 0.0), &TransverseTemplate::default())
                .unwrap();
        assert_eq!(shapes.len(), 3);
        // the inner toe line holds its only value back to chainage 0
        assert_eq!(
            shapes[0].points,
            vec![(-14.0, 1.0), (-2.0, 4.0), (2.0, 4.0), (14.0, 0.5)]
        );
        assert_eq!(shapes[1].points[2], (2.0, 5.0));
    }

    #[test]
    fn toes_stay_on_their_own_side() {
        let mut vak = Vak::new("A");
        vak.add_point(0.0, Some(ReferenceLocation::InnerCrest), 4.0)
            .unwrap();
        vak.add_point(10.0, Some(ReferenceLocation::InnerCrest), 4.0)
            .unwrap();
        let shapes =
            build_transverse_shapes(&vak, &flat_profile(1, 0.0), &TransverseTemplate::default())
                .unwrap();
        assert_eq!(shapes[0].points, vec![(2.0, 4.0), (14.0, 0.0)]);

        let mut vak = Vak::new("B");
        vak.add_point(0.0, Some(ReferenceLocation::OuterCrest), 3.0)
            .unwrap();
        let shapes =
            build_transverse_shapes(&vak, &flat_profile(1, 0.0), &TransverseTemplate::default())
                .unwrap();
        assert_eq!(shapes[0].points, vec![(-11.0, 0.0), (-2.0, 3.0)]);
    }

    #[test]
    fn missing_inputs_are_reported() {
        let vak = Vak::new("empty");
        let err = build_transverse_shapes(&vak, &flat_profile(2, 0.0), &TransverseTemplate::default())
            .unwrap_err();
        assert!(matches!(err, DesignError::MissingInput(_)));
        let mut vak = Vak::new("A");
        vak.add_point(0.0, None, 1.0).unwrap();
        assert!(build_transverse_shapes(
            &vak,
            &TerrainProfile::default(),
            &TransverseTemplate::default()
        )
        .is_err());
    }
}
