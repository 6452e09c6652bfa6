//! Tunable parameters of the design engine, persisted as JSON.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::design::ReferenceLocation;
use crate::error::DesignResult;
use crate::measure::MeasureMode;

/// What the profile sampler does when the terrain cannot answer for a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Fill gaps from the nearest resolved neighbours.
    #[default]
    Interpolate,
    /// Abort the whole sampling run.
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Chainage step between samples.
    pub step: f64,
    /// Upper bound on the number of samples; widens the step on long alignments.
    pub max_samples: usize,
    pub unresolved: UnresolvedPolicy,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            step: 1.0,
            max_samples: 10_000,
            unresolved: UnresolvedPolicy::Interpolate,
        }
    }
}

/// Canonical transverse layout of the embankment.
///
/// Lateral offsets are positive to the left of the alignment; the outer (water)
/// side is on the right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransverseTemplate {
    /// Crest width used when only the design axis is given.
    pub crest_width: f64,
    /// Horizontal run per unit of height on the outer slope.
    pub outer_slope: f64,
    /// Horizontal run per unit of height on the inner slope.
    pub inner_slope: f64,
    /// Lateral offset for each reference location.
    pub offsets: BTreeMap<ReferenceLocation, f64>,
}

impl Default for TransverseTemplate {
    fn default() -> Self {
        let offsets = BTreeMap::from([
            (ReferenceLocation::OuterToe, -14.0),
            (ReferenceLocation::OuterCrest, -2.0),
            (ReferenceLocation::InnerCrest, 2.0),
            (ReferenceLocation::InnerToe, 14.0),
        ]);
        Self {
            crest_width: 4.0,
            outer_slope: 3.0,
            inner_slope: 3.0,
            offsets,
        }
    }
}

impl TransverseTemplate {
    /// Lateral offset assigned to `location`.
    pub fn offset_of(&self, location: ReferenceLocation) -> f64 {
        self.offsets
            .get(&location)
            .copied()
            .unwrap_or_else(|| location.default_offset(self.crest_width))
    }
}

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignConfig {
    /// Coordinate reference system of all input geometry.
    pub crs: String,
    pub measure: MeasureMode,
    pub sampler: SamplerConfig,
    /// Grid applied to chainage and height when control points are edited.
    pub snap_resolution: f64,
    pub allow_duplicate_chainage: bool,
    pub template: TransverseTemplate,
    /// Buffer applied to the footprint for the execution-zone queries.
    pub execution_zone_buffer: f64,
    /// Segments per full circle when buffering.
    pub buffer_segments: usize,
    /// Upper bound on feature queries in flight during an effects pass.
    pub max_concurrent_queries: usize,
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            crs: "EPSG:28992".into(),
            measure: MeasureMode::Planar,
            sampler: SamplerConfig::default(),
            snap_resolution: 0.5,
            allow_duplicate_chainage: false,
            template: TransverseTemplate::default(),
            execution_zone_buffer: 10.0,
            buffer_segments: 16,
            max_concurrent_queries: 4,
        }
    }
}

impl DesignConfig {
    /// Reads a configuration file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> DesignResult<Self> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> DesignResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg: DesignConfig =
            serde_json::from_str(r#"{ "snap_resolution": 0.25, "sampler": { "step": 2.0 } }"#)
                .unwrap();
        assert_eq!(cfg.snap_resolution, 0.25);
        assert_eq!(cfg.sampler.step, 2.0);
        assert_eq!(cfg.sampler.max_samples, 10_000);
        assert_eq!(cfg.execution_zone_buffer, 10.0);
        assert_eq!(cfg.template.offset_of(ReferenceLocation::OuterToe), -14.0);
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("design.json");
        let mut cfg = DesignConfig::default();
        cfg.max_concurrent_queries = 1;
        cfg.sampler.unresolved = UnresolvedPolicy::Fail;
        cfg.save(&path).unwrap();
        assert_eq!(DesignConfig::load(&path).unwrap(), cfg);
    }
}
