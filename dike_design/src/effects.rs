//! Spatial effects of the design footprint on external feature datasets.
//!
//! Every category is queried independently. A failing source is logged and its
//! category comes back empty; the other categories are unaffected.

use std::sync::Arc;

use async_trait::async_trait;
use geo::{BooleanOps, Intersects};
use geo_types::MultiPolygon;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::DesignConfig;
use crate::error::QueryError;
use crate::footprint::Footprint;
use crate::geometry::{from_multi_polygon, Polygon};
use crate::gis::{AttributeFilter, Feature};
use crate::measure::Measure;

/// Collaborator answering "which features intersect this geometry".
#[async_trait]
pub trait FeatureQuerySource: Send + Sync {
    async fn query_intersecting(
        &self,
        geometry: &MultiPolygon<f64>,
        where_clause: Option<&str>,
        buffer_distance: Option<f64>,
    ) -> Result<Vec<Feature>, QueryError>;
}

/// Feature source backed by a list held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFeatureSource {
    features: Vec<Feature>,
    buffer_segments: usize,
}

impl InMemoryFeatureSource {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            features,
            buffer_segments: 16,
        }
    }
}

#[async_trait]
impl FeatureQuerySource for InMemoryFeatureSource {
    async fn query_intersecting(
        &self,
        geometry: &MultiPolygon<f64>,
        where_clause: Option<&str>,
        buffer_distance: Option<f64>,
    ) -> Result<Vec<Feature>, QueryError> {
        let filter = AttributeFilter::parse(where_clause.unwrap_or_default())?;
        let hits = self
            .features
            .iter()
            .filter(|f| filter.matches(f))
            .filter(|f| match buffer_distance {
                Some(d) if d > 0.0 && !f.geometry.plan_polygons().is_empty() => {
                    Footprint::new(f.geometry.plan_polygons())
                        .buffer(d, self.buffer_segments)
                        .to_geo()
                        .intersects(geometry)
                }
                _ => f.geometry.to_geo().intersects(geometry),
            })
            .cloned()
            .collect();
        Ok(hits)
    }
}

/// Zone a category is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisZone {
    /// The dissolved footprint itself.
    #[default]
    Footprint,
    /// The footprint grown by the execution-zone buffer.
    ExecutionZone,
}

/// One dataset to test the footprint against.
#[derive(Clone)]
pub struct EffectCategory {
    pub name: String,
    pub source: Arc<dyn FeatureQuerySource>,
    pub where_clause: Option<String>,
    /// Buffer applied to every candidate feature before overlap is measured.
    pub feature_buffer: Option<f64>,
    pub zone: AnalysisZone,
}

impl EffectCategory {
    pub fn new(name: impl Into<String>, source: Arc<dyn FeatureQuerySource>) -> Self {
        Self {
            name: name.into(),
            source,
            where_clause: None,
            feature_buffer: None,
            zone: AnalysisZone::Footprint,
        }
    }

    pub fn filtered(mut self, where_clause: impl Into<String>) -> Self {
        self.where_clause = Some(where_clause.into());
        self
    }

    pub fn buffered(mut self, distance: f64) -> Self {
        self.feature_buffer = Some(distance);
        self
    }

    pub fn in_zone(mut self, zone: AnalysisZone) -> Self {
        self.zone = zone;
        self
    }
}

/// A feature that touches the zone and the part of it inside the zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlapFeature {
    pub feature: Feature,
    pub overlap: Vec<Polygon>,
    pub overlap_area: f64,
}

/// Result of one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryOutcome {
    pub name: String,
    pub features: Vec<OverlapFeature>,
    pub feature_count: usize,
    pub total_overlap_area: f64,
    /// Set when the query failed; the outcome is then empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CategoryOutcome {
    fn empty(name: &str, error: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            features: Vec::new(),
            feature_count: 0,
            total_overlap_area: 0.0,
            error,
        }
    }
}

/// Runs all categories against a footprint with bounded concurrency.
pub struct EffectsAnalyzer {
    categories: Vec<EffectCategory>,
    measure: Measure,
    execution_zone_buffer: f64,
    buffer_segments: usize,
    max_concurrent: usize,
}

impl EffectsAnalyzer {
    pub fn new(config: &DesignConfig, measure: Measure) -> Self {
        Self {
            categories: Vec::new(),
            measure,
            execution_zone_buffer: config.execution_zone_buffer,
            buffer_segments: config.buffer_segments,
            max_concurrent: config.max_concurrent_queries.max(1),
        }
    }

    pub fn add_category(&mut self, category: EffectCategory) -> &mut Self {
        self.categories.push(category);
        self
    }

    pub fn categories(&self) -> &[EffectCategory] {
        &self.categories
    }

    fn overlap(&self, feature: Feature, zone: &MultiPolygon<f64>, buffer: Option<f64>) -> OverlapFeature {
        let polygons = feature.geometry.plan_polygons();
        if polygons.is_empty() {
            return OverlapFeature {
                feature,
                overlap: Vec::new(),
                overlap_area: 0.0,
            };
        }
        let shape = match buffer {
            Some(d) if d > 0.0 => Footprint::new(polygons).buffer(d, self.buffer_segments),
            _ => Footprint::new(polygons).union(),
        };
        let overlap = from_multi_polygon(&shape.to_geo().intersection(zone));
        let overlap_area = self.measure.area_multi(&overlap);
        OverlapFeature {
            feature,
            overlap,
            overlap_area,
        }
    }

    /// Queries every category and measures overlap with the footprint (or the
    /// execution zone). Outcomes are returned in category order.
    pub async fn analyze(&self, footprint: &Footprint) -> Vec<CategoryOutcome> {
        let footprint_zone = footprint.union().to_geo();
        let execution_zone = if self
            .categories
            .iter()
            .any(|c| c.zone == AnalysisZone::ExecutionZone)
        {
            footprint
                .buffer(self.execution_zone_buffer, self.buffer_segments)
                .to_geo()
        } else {
            MultiPolygon::new(vec![])
        };
        let (fz, ez) = (&footprint_zone, &execution_zone);
        let zone_of = move |zone: AnalysisZone| match zone {
            AnalysisZone::Footprint => fz,
            AnalysisZone::ExecutionZone => ez,
        };

        let permits = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();
        for (index, category) in self.categories.iter().enumerate() {
            let source = Arc::clone(&category.source);
            let zone = zone_of(category.zone).clone();
            let where_clause = category.where_clause.clone();
            let buffer = category.feature_buffer;
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                let result = source
                    .query_intersecting(&zone, where_clause.as_deref(), buffer)
                    .await;
                (index, result)
            });
        }

        let mut raw: Vec<Option<Result<Vec<Feature>, QueryError>>> =
            (0..self.categories.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => raw[index] = Some(result),
                Err(e) => log::warn!("effects query task aborted: {e}"),
            }
        }

        self.categories
            .iter()
            .zip(raw)
            .map(|(category, result)| match result {
                Some(Ok(features)) => {
                    let zone = zone_of(category.zone);
                    let features: Vec<OverlapFeature> = features
                        .into_iter()
                        .map(|f| self.overlap(f, zone, category.feature_buffer))
                        .collect();
                    let total_overlap_area = features.iter().map(|f| f.overlap_area).sum();
                    log::info!(
                        "{}: {} features, {:.1} overlap",
                        category.name,
                        features.len(),
                        total_overlap_area
                    );
                    CategoryOutcome {
                        name: category.name.clone(),
                        feature_count: features.len(),
                        features,
                        total_overlap_area,
                        error: None,
                    }
                }
                Some(Err(e)) => {
                    log::warn!("effects category '{}' failed: {e}", category.name);
                    CategoryOutcome::empty(&category.name, Some(e.to_string()))
                }
                None => CategoryOutcome::empty(&category.name, Some("query task aborted".into())),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Geometry, Point};

    fn square(x: f64, y: f64, side: f64) -> Polygon {
        Polygon::new(vec![
            Point::new(x, y),
            Point::new(x + side, y),
            Point::new(x + side, y + side),
            Point::new(x, y + side),
        ])
    }

    struct Offline;

    #[async_trait]
    impl FeatureQuerySource for Offline {
        async fn query_intersecting(
            &self,
            _geometry: &MultiPolygon<f64>,
            _where_clause: Option<&str>,
            _buffer_distance: Option<f64>,
        ) -> Result<Vec<Feature>, QueryError> {
            Err(QueryError::Unavailable("503".into()))
        }
    }

    fn parcels() -> Arc<dyn FeatureQuerySource> {
        Arc::new(InMemoryFeatureSource::new(vec![
            Feature::new(Geometry::Polygon(square(5.0, 5.0, 10.0))).with_attribute("kind", "parcel"),
            Feature::new(Geometry::Polygon(square(30.0, 0.0, 5.0))).with_attribute("kind", "parcel"),
            Feature::new(Geometry::Point(Point::new(1.0, 1.0))).with_attribute("kind", "tree"),
        ]))
    }

    #[tokio::test]
    async fn measures_overlap_per_category() {
        let mut analyzer = EffectsAnalyzer::new(&DesignConfig::default(), Measure::planar());
        analyzer
            .add_category(EffectCategory::new("parcels", parcels()).filtered("kind = 'parcel'"))
            .add_category(EffectCategory::new("trees", parcels()).filtered("kind = 'tree'"));
        let footprint = Footprint::new(vec![square(0.0, 0.0, 10.0)]);
        let outcomes = analyzer.analyze(&footprint).await;
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].feature_count, 1);
        assert!((outcomes[0].total_overlap_area - 25.0).abs() < 1e-6);
        assert_eq!(outcomes[1].name, "trees");
        assert_eq!(outcomes[1].feature_count, 1);
        assert_eq!(outcomes[1].total_overlap_area, 0.0);
    }

    #[tokio::test]
    async fn execution_zone_reaches_further() {
        let mut analyzer = EffectsAnalyzer::new(&DesignConfig::default(), Measure::planar());
        analyzer.add_category(
            EffectCategory::new("parcels", parcels()).in_zone(AnalysisZone::ExecutionZone),
        );
        let footprint = Footprint::new(vec![square(0.0, 0.0, 22.0)]);
        let outcomes = analyzer.analyze(&footprint).await;
        // the far parcel at x = 30 lies within 10 of the footprint edge
        assert_eq!(outcomes[0].feature_count, 3);
    }

    #[tokio::test]
    async fn failing_category_does_not_stop_the_rest() {
        let mut analyzer = EffectsAnalyzer::new(&DesignConfig::default(), Measure::planar());
        analyzer
            .add_category(EffectCategory::new("offline", Arc::new(Offline)))
            .add_category(EffectCategory::new("parcels", parcels()).filtered("kind = 'parcel'"));
        let outcomes = analyzer
            .analyze(&Footprint::new(vec![square(0.0, 0.0, 10.0)]))
            .await;
        assert_eq!(outcomes[0].feature_count, 0);
        assert!(outcomes[0].error.as_deref().unwrap().contains("503"));
        assert_eq!(outcomes[1].feature_count, 1);
    }
}
