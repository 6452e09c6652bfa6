//! Design session: owns the inputs, derives the outputs and tells subscribers
//! what changed.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::alignment::Alignment;
use crate::config::DesignConfig;
use crate::crs::Crs;
use crate::cross_section::{build_transverse_shapes, TransverseShape};
use crate::design::{anchor_control_points, snap, Anchor, ControlPoint, ReferenceLocation, Vak};
use crate::effects::{CategoryOutcome, EffectsAnalyzer};
use crate::error::{DesignError, DesignResult};
use crate::footprint::Footprint;
use crate::geometry::{Geometry, Point, Polyline};
use crate::intersection::{Constructions, StructureLine};
use crate::io::project::{DesignValues, GraphicRecord, Metadata, ProjectFile};
use crate::measure::Measure;
use crate::profile::{sample_profile, ElevationSource, ProfilePoint, TerrainProfile};
use crate::surface::Surface;
use crate::volume::{compute_volume, VolumeReport, VolumeResult};

/// Handle returned by [`Session::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Editing mode deciding what a click on the profile chart does.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EditMode {
    #[default]
    Idle,
    /// The next click adds a control point to `vak`.
    PlacingProfilePoint {
        vak: String,
        reference: Option<ReferenceLocation>,
    },
    /// Clicks extend the reference slope line.
    DrawingReferenceSlope,
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditMode::Idle => f.write_str("idle"),
            EditMode::PlacingProfilePoint { vak, .. } => write!(f, "placing points in '{vak}'"),
            EditMode::DrawingReferenceSlope => f.write_str("drawing reference slope"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    AlignmentChanged,
    ProfileSampled,
    ControlPointsChanged { vak: String },
    SurfaceRebuilt,
    VolumeUpdated(VolumeResult),
    ModeChanged(EditMode),
    SlopeLabelsChanged,
    ConstructionsChanged,
    EffectsUpdated,
}

/// Visible window of the profile chart in (chainage, height).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBounds {
    pub min_chainage: f64,
    pub max_chainage: f64,
    pub min_height: f64,
    pub max_height: f64,
}

impl ViewBounds {
    pub fn contains(&self, chainage: f64, height: f64) -> bool {
        (self.min_chainage..=self.max_chainage).contains(&chainage)
            && (self.min_height..=self.max_height).contains(&height)
    }
}

/// Slope annotation drawn at the midpoint of one slope-line segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SlopeLabel {
    pub chainage: f64,
    pub height: f64,
    pub text: String,
}

/// `1:n` text for a segment, `flat` when the height does not change.
pub fn slope_text(a: (f64, f64), b: (f64, f64)) -> String {
    let dh = b.1 - a.1;
    if dh.abs() < 1e-9 {
        return "flat".to_string();
    }
    format!("1:{:.1}", ((b.0 - a.0) / dh).abs())
}

/// Labels for every segment whose midpoint is visible.
pub fn slope_labels(line: &[(f64, f64)], view: Option<&ViewBounds>) -> Vec<SlopeLabel> {
    line.windows(2)
        .filter_map(|w| {
            let (mc, mh) = ((w[0].0 + w[1].0) / 2.0, (w[0].1 + w[1].1) / 2.0);
            if view.map_or(true, |v| v.contains(mc, mh)) {
                Some(SlopeLabel {
                    chainage: mc,
                    height: mh,
                    text: slope_text(w[0], w[1]),
                })
            } else {
                None
            }
        })
        .collect()
}

type Handler = Box<dyn Fn(&SessionEvent) + Send>;

/// Derived outputs of one recompute, committed together.
#[derive(Debug, Clone, Default)]
struct Derived {
    shapes: BTreeMap<String, Vec<TransverseShape>>,
    surfaces: BTreeMap<String, Surface>,
    surface: Option<Surface>,
    volume: Option<VolumeReport>,
    footprint: Option<Footprint>,
}

/// Owns the design inputs and everything derived from them.
///
/// Getters hand out borrowed snapshots; all mutation goes through the typed
/// setters, which notify subscribers.
pub struct Session {
    config: DesignConfig,
    measure: Measure,
    terrain: Box<dyn ElevationSource + Send>,
    alignment: Option<Alignment>,
    profile: Option<TerrainProfile>,
    vaks: BTreeMap<String, Vak>,
    derived: Derived,
    constructions: Constructions,
    effects: Option<Vec<CategoryOutcome>>,
    costs: Value,
    mode: EditMode,
    slope_line: Vec<(f64, f64)>,
    view: Option<ViewBounds>,
    labels: Vec<SlopeLabel>,
    handlers: Vec<(SubscriptionId, Handler)>,
    next_subscription: u64,
}

impl Session {
    pub fn new(config: DesignConfig, terrain: Box<dyn ElevationSource + Send>) -> Self {
        let measure = Measure::new(Crs::parse(&config.crs), config.measure);
        Self {
            config,
            measure,
            terrain,
            alignment: None,
            profile: None,
            vaks: BTreeMap::new(),
            derived: Derived::default(),
            constructions: Constructions::default(),
            effects: None,
            costs: Value::Null,
            mode: EditMode::Idle,
            slope_line: Vec::new(),
            view: None,
            labels: Vec::new(),
            handlers: Vec::new(),
            next_subscription: 1,
        }
    }

    // ---- subscriptions ----

    pub fn subscribe(&mut self, handler: impl Fn(&SessionEvent) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Returns `false` when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(h, _)| *h != id);
        self.handlers.len() != before
    }

    fn emit(&self, event: SessionEvent) {
        log::trace!("session event {event:?}");
        for (_, handler) in &self.handlers {
            handler(&event);
        }
    }

    // ---- getters ----

    pub fn config(&self) -> &DesignConfig {
        &self.config
    }

    pub fn measure(&self) -> &Measure {
        &self.measure
    }

    pub fn alignment(&self) -> Option<&Alignment> {
        self.alignment.as_ref()
    }

    pub fn profile(&self) -> Option<&TerrainProfile> {
        self.profile.as_ref()
    }

    pub fn vak(&self, name: &str) -> Option<&Vak> {
        self.vaks.get(name)
    }

    pub fn vak_names(&self) -> impl Iterator<Item = &str> {
        self.vaks.keys().map(String::as_str)
    }

    pub fn shapes(&self, vak: &str) -> Option<&[TransverseShape]> {
        self.derived.shapes.get(vak).map(Vec::as_slice)
    }

    pub fn vak_surface(&self, vak: &str) -> Option<&Surface> {
        self.derived.surfaces.get(vak)
    }

    /// All vak surfaces merged.
    pub fn surface(&self) -> Option<&Surface> {
        self.derived.surface.as_ref()
    }

    pub fn volume(&self) -> Option<VolumeResult> {
        self.derived.volume.map(|r| r.result)
    }

    pub fn volume_report(&self) -> Option<&VolumeReport> {
        self.derived.volume.as_ref()
    }

    pub fn footprint(&self) -> Option<&Footprint> {
        self.derived.footprint.as_ref()
    }

    pub fn constructions(&self) -> &Constructions {
        &self.constructions
    }

    pub fn structures(&self) -> &[StructureLine] {
        &self.constructions.structures
    }

    pub fn effects(&self) -> Option<&[CategoryOutcome]> {
        self.effects.as_deref()
    }

    pub fn mode(&self) -> &EditMode {
        &self.mode
    }

    pub fn slope_line(&self) -> &[(f64, f64)] {
        &self.slope_line
    }

    pub fn slope_labels(&self) -> &[SlopeLabel] {
        &self.labels
    }

    pub fn set_costs(&mut self, costs: Value) {
        self.costs = costs;
    }

    // ---- inputs ----

    /// Replaces the alignment and resamples the terrain profile along it.
    ///
    /// On failure the previous alignment and profile stay in place.
    pub fn set_alignment(&mut self, vertices: Vec<Point>) -> DesignResult<()> {
        let alignment = Alignment::new(vertices)?;
        let profile = sample_profile(&alignment, &*self.terrain, &self.config.sampler)?;
        log::info!(
            "alignment set: {:.2} long, {} profile samples",
            alignment.length(),
            profile.len()
        );
        self.alignment = Some(alignment);
        self.profile = Some(profile);
        self.emit(SessionEvent::AlignmentChanged);
        self.emit(SessionEvent::ProfileSampled);
        self.refresh();
        Ok(())
    }

    /// Deletes one terrain sample. Other samples keep their ids.
    pub fn remove_profile_point(&mut self, id: u64) -> DesignResult<ProfilePoint> {
        let profile = self
            .profile
            .as_mut()
            .ok_or_else(|| DesignError::MissingInput("terrain profile".into()))?;
        let removed = profile
            .remove(id)
            .ok_or_else(|| DesignError::MissingInput(format!("profile point {id}")))?;
        self.emit(SessionEvent::ProfileSampled);
        self.refresh();
        Ok(removed)
    }

    /// Adds an empty vak; an existing vak of that name is kept.
    pub fn add_vak(&mut self, name: &str) {
        let allow = self.config.allow_duplicate_chainage;
        self.vaks
            .entry(name.to_string())
            .or_insert_with(|| Vak::new(name).allow_duplicate_chainage(allow));
    }

    pub fn remove_vak(&mut self, name: &str) -> DesignResult<Vak> {
        let vak = self
            .vaks
            .remove(name)
            .ok_or_else(|| DesignError::UnknownVak(name.to_string()))?;
        self.emit(SessionEvent::ControlPointsChanged {
            vak: name.to_string(),
        });
        self.refresh();
        Ok(vak)
    }

    fn vak_mut(&mut self, name: &str) -> DesignResult<&mut Vak> {
        self.vaks
            .get_mut(name)
            .ok_or_else(|| DesignError::UnknownVak(name.to_string()))
    }

    fn points_changed(&mut self, vak: &str) {
        self.emit(SessionEvent::ControlPointsChanged {
            vak: vak.to_string(),
        });
        self.refresh();
    }

    /// Rejects a pointer chainage that snaps past the end of the alignment.
    fn check_on_alignment(&self, chainage: f64) -> DesignResult<()> {
        let snapped = snap(chainage, self.config.snap_resolution);
        match &self.alignment {
            Some(a) if snapped > a.length() + 1e-9 => Err(DesignError::GeometricFailure(format!(
                "chainage {snapped:.3} beyond alignment end {:.3}",
                a.length()
            ))),
            _ => Ok(()),
        }
    }

    /// Adds a control point, snapped to the configured grid.
    pub fn add_control_point(
        &mut self,
        vak: &str,
        chainage: f64,
        reference: Option<ReferenceLocation>,
        height: f64,
    ) -> DesignResult<u64> {
        self.check_on_alignment(chainage)?;
        let resolution = self.config.snap_resolution;
        let id = self
            .vak_mut(vak)?
            .place_point(chainage, reference, height, resolution)?;
        self.points_changed(vak);
        Ok(id)
    }

    /// Drags a control point; the position is snapped to the configured grid.
    pub fn move_control_point(
        &mut self,
        vak: &str,
        id: u64,
        chainage: f64,
        height: f64,
    ) -> DesignResult<ControlPoint> {
        self.check_on_alignment(chainage)?;
        let resolution = self.config.snap_resolution;
        let moved = self
            .vak_mut(vak)?
            .move_point(id, chainage, height, resolution)?;
        self.points_changed(vak);
        Ok(moved)
    }

    pub fn remove_control_point(&mut self, vak: &str, id: u64) -> DesignResult<ControlPoint> {
        let removed = self.vak_mut(vak)?.remove_point(id)?;
        self.points_changed(vak);
        Ok(removed)
    }

    /// Terrain and design height at every control point of `vak`.
    pub fn anchors(&self, vak: &str) -> DesignResult<Vec<Anchor>> {
        let vak = self
            .vaks
            .get(vak)
            .ok_or_else(|| DesignError::UnknownVak(vak.to_string()))?;
        let profile = self
            .profile
            .as_ref()
            .ok_or_else(|| DesignError::MissingInput("terrain profile".into()))?;
        Ok(anchor_control_points(vak.points(), profile))
    }

    // ---- derived values ----

    fn derive(&self) -> DesignResult<Derived> {
        let alignment = self
            .alignment
            .as_ref()
            .ok_or_else(|| DesignError::MissingInput("alignment".into()))?;
        let profile = self
            .profile
            .as_ref()
            .ok_or_else(|| DesignError::MissingInput("terrain profile".into()))?;

        let mut derived = Derived::default();
        for (name, vak) in self.vaks.iter().filter(|(_, v)| !v.is_empty()) {
            let shapes = match build_transverse_shapes(vak, profile, &self.config.template) {
                Ok(shapes) => shapes,
                Err(e) => {
                    log::warn!("vak '{name}' left out of the design: {e}");
                    continue;
                }
            };
            match Surface::loft(alignment, &shapes) {
                Ok(surface) => {
                    derived.surfaces.insert(name.clone(), surface);
                }
                Err(e) => log::warn!("vak '{name}' left out of the design: {e}"),
            }
            derived.shapes.insert(name.clone(), shapes);
        }
        if derived.surfaces.is_empty() {
            return Err(DesignError::MissingInput("control points".into()));
        }
        let merged = Surface::merge(derived.surfaces.values());
        let report = compute_volume(&merged, &*self.terrain, &self.measure);
        derived.footprint = Some(Footprint::from_surface(&merged).union());
        derived.volume = Some(report);
        derived.surface = Some(merged);
        Ok(derived)
    }

    fn commit(&mut self, derived: Derived) {
        let volume = derived.volume.map(|r| r.result);
        self.derived = derived;
        self.effects = None;
        if let (Some(alignment), Some(profile)) = (&self.alignment, &self.profile) {
            if self.constructions.drawn_construction_line.is_some() {
                if let Err(e) = self.constructions.place(alignment, profile) {
                    log::warn!("structural elements not placed: {e}");
                }
            }
        }
        self.emit(SessionEvent::SurfaceRebuilt);
        if let Some(v) = volume {
            self.emit(SessionEvent::VolumeUpdated(v));
        }
    }

    /// Rebuilds shapes, surfaces, volume and footprint from the current inputs.
    ///
    /// On failure the previous derived values are kept.
    pub fn recompute(&mut self) -> DesignResult<()> {
        let derived = self.derive()?;
        self.commit(derived);
        Ok(())
    }

    /// Recompute after an edit. Values that can no longer be derived are cleared.
    fn refresh(&mut self) {
        match self.derive() {
            Ok(derived) => self.commit(derived),
            Err(e) => {
                log::debug!("design not derivable yet: {e}");
                if self.derived.surface.is_some() {
                    self.derived = Derived::default();
                    self.emit(SessionEvent::SurfaceRebuilt);
                }
            }
        }
    }

    // ---- constructions and effects ----

    /// Replaces the structural element layout and places its elements.
    pub fn set_constructions(&mut self, mut constructions: Constructions) -> DesignResult<()> {
        let alignment = self
            .alignment
            .as_ref()
            .ok_or_else(|| DesignError::MissingInput("alignment".into()))?;
        let profile = self
            .profile
            .as_ref()
            .ok_or_else(|| DesignError::MissingInput("terrain profile".into()))?;
        constructions.place(alignment, profile)?;
        self.constructions = constructions;
        self.emit(SessionEvent::ConstructionsChanged);
        Ok(())
    }

    /// Runs the effects pass on the current footprint and keeps the outcomes.
    pub async fn analyze_effects(
        &mut self,
        analyzer: &EffectsAnalyzer,
    ) -> DesignResult<&[CategoryOutcome]> {
        let footprint = self
            .derived
            .footprint
            .as_ref()
            .ok_or_else(|| DesignError::MissingInput("footprint".into()))?;
        let outcomes = analyzer.analyze(footprint).await;
        self.effects = Some(outcomes);
        self.emit(SessionEvent::EffectsUpdated);
        Ok(self.effects.as_deref().unwrap_or(&[]))
    }

    // ---- editing modes ----

    fn enter(&mut self, mode: EditMode) -> DesignResult<()> {
        if self.mode != EditMode::Idle {
            return Err(DesignError::ModeConflict {
                active: self.mode.to_string(),
                requested: mode.to_string(),
            });
        }
        self.set_mode(mode);
        Ok(())
    }

    fn set_mode(&mut self, mode: EditMode) {
        self.mode = mode.clone();
        self.emit(SessionEvent::ModeChanged(mode));
    }

    /// Arms point placement: the next chart click adds a control point to `vak`.
    pub fn begin_placing(
        &mut self,
        vak: &str,
        reference: Option<ReferenceLocation>,
    ) -> DesignResult<()> {
        if !self.vaks.contains_key(vak) {
            return Err(DesignError::UnknownVak(vak.to_string()));
        }
        self.enter(EditMode::PlacingProfilePoint {
            vak: vak.to_string(),
            reference,
        })
    }

    /// Starts a new reference slope line.
    pub fn begin_slope(&mut self) -> DesignResult<()> {
        self.enter(EditMode::DrawingReferenceSlope)?;
        self.slope_line.clear();
        self.update_labels();
        Ok(())
    }

    /// Handles a click on the profile chart at `(chainage, height)`.
    ///
    /// Returns the id of a committed control point. Clicks while idle are ignored.
    pub fn handle_click(&mut self, chainage: f64, height: f64) -> DesignResult<Option<u64>> {
        match self.mode.clone() {
            EditMode::Idle => Ok(None),
            EditMode::PlacingProfilePoint { vak, reference } => {
                let id = self.add_control_point(&vak, chainage, reference, height)?;
                self.set_mode(EditMode::Idle);
                Ok(Some(id))
            }
            EditMode::DrawingReferenceSlope => {
                self.slope_line.push((chainage, height));
                self.update_labels();
                Ok(None)
            }
        }
    }

    /// Ends slope drawing and keeps the line.
    pub fn finish_slope(&mut self) -> &[(f64, f64)] {
        if self.mode == EditMode::DrawingReferenceSlope {
            self.set_mode(EditMode::Idle);
        }
        &self.slope_line
    }

    /// Leaves any mode. A slope line being drawn is discarded.
    pub fn cancel(&mut self) {
        if self.mode == EditMode::DrawingReferenceSlope {
            self.slope_line.clear();
            self.update_labels();
        }
        if self.mode != EditMode::Idle {
            self.set_mode(EditMode::Idle);
        }
    }

    pub fn set_view_bounds(&mut self, bounds: ViewBounds) {
        self.view = Some(bounds);
        self.update_labels();
    }

    fn update_labels(&mut self) {
        self.labels = slope_labels(&self.slope_line, self.view.as_ref());
        self.emit(SessionEvent::SlopeLabelsChanged);
    }

    // ---- persistence ----

    /// Snapshot of the session in the project file schema.
    pub fn to_project(&self, vak: &str, alternatief: &str) -> DesignResult<ProjectFile> {
        let mut project = ProjectFile::new(Metadata::new(vak, alternatief));
        let g = &mut project.geometries;

        if let Some(alignment) = &self.alignment {
            g.input_line
                .push(GraphicRecord::new(Geometry::Line(alignment.to_polyline())));
            project.design_values.traject_length = alignment.length();
        }
        if let Some(profile) = &self.profile {
            project.chart_data_elevation = profile.points().to_vec();
            g.profile_points.extend(profile.points().iter().map(|p| {
                GraphicRecord::new(Geometry::Point(Point::new(p.x, p.y)))
                    .with_attribute("id", p.id)
                    .with_attribute("chainage", p.chainage)
                    .with_attribute("elevation", p.elevation)
            }));
        }
        for (name, surface) in &self.derived.surfaces {
            g.design3d
                .push(GraphicRecord::new(Geometry::Mesh(surface.clone())).with_attribute("vak", name.as_str()));
            g.design2d.extend(surface.outlines.iter().map(|o| {
                GraphicRecord::new(Geometry::Polygon(o.clone())).with_attribute("vak", name.as_str())
            }));
        }
        if let Some(footprint) = &self.derived.footprint {
            g.ruimtebeslag2d.extend(
                footprint
                    .polygons
                    .iter()
                    .map(|p| GraphicRecord::new(Geometry::Polygon(p.clone()))),
            );
        }
        if let Some(surface) = &self.derived.surface {
            g.ruimtebeslag3d
                .push(GraphicRecord::new(Geometry::Mesh(surface.clone())));
        }
        if let (Some(alignment), Some(v)) = (&self.alignment, self.vaks.get(vak)) {
            for cp in v.points() {
                let offset = cp
                    .reference
                    .map(|r| self.config.template.offset_of(r))
                    .unwrap_or(0.0);
                if let Some(p) = alignment.offset_point(cp.chainage, offset) {
                    let mut record = GraphicRecord::new(Geometry::Point(p))
                        .with_attribute("id", cp.id)
                        .with_attribute("height", cp.height);
                    if let Some(r) = cp.reference {
                        record = record.with_attribute("referenceLocation", r.to_string());
                    }
                    g.cross_section_points.push(record);
                }
            }
            let axis = v.longitudinal_line(None);
            if axis.points.len() >= 2 {
                let line: Vec<Point> = axis
                    .points
                    .iter()
                    .filter_map(|(c, _)| alignment.point_at(*c))
                    .collect();
                g.cross_section_line
                    .push(GraphicRecord::new(Geometry::Line(Polyline::new(line))));
            }
        }

        if let Some(v) = self.vaks.get(vak) {
            project.chart_data = v.points().to_vec();
        }
        project.all_chart_data = self
            .vaks
            .iter()
            .map(|(name, v)| (name.clone(), v.points().to_vec()))
            .collect();

        if let Some(report) = &self.derived.volume {
            let r = report.result;
            project.design_values.excavation_volume = r.excavation;
            project.design_values.fill_volume = r.fill;
            project.design_values.volume_difference = r.net_difference;
        }
        if let Some(surface) = &self.derived.surface {
            project.design_values.area_3d = surface.area_3d();
        }
        if let Some(footprint) = &self.derived.footprint {
            project.design_values.area_2d = footprint.area(&self.measure);
        }
        project.costs = self.costs.clone();
        if let Some(effects) = &self.effects {
            project.effects = serde_json::to_value(effects)?;
        }
        project.constructions = self.constructions.clone();
        Ok(project)
    }

    /// Restores inputs and stored geometry from a project file.
    ///
    /// Surfaces and the footprint are taken from the file as saved; the volume is
    /// read from the design values.
    pub fn load_project(&mut self, project: &ProjectFile) -> DesignResult<()> {
        let alignment = project
            .geometries
            .input_line
            .iter()
            .find_map(|r| match &r.geometry {
                Geometry::Line(l) => Some(l.vertices.clone()),
                _ => None,
            })
            .ok_or_else(|| DesignError::MissingInput("inputLine".into()))
            .and_then(Alignment::new)?;

        let mut chart = project.all_chart_data.clone();
        if chart.is_empty() && !project.chart_data.is_empty() {
            chart.insert(project.metadata.vak.clone(), project.chart_data.clone());
        }
        let allow = self.config.allow_duplicate_chainage;
        let vaks: BTreeMap<String, Vak> = chart
            .into_iter()
            .map(|(name, points)| {
                let vak = Vak::from_points(name.clone(), points).allow_duplicate_chainage(allow);
                (name, vak)
            })
            .collect();

        let mut derived = Derived::default();
        for record in &project.geometries.design3d {
            if let Geometry::Mesh(s) = &record.geometry {
                s.validate()?;
                let name = record
                    .attribute_str("vak")
                    .unwrap_or(project.metadata.vak.as_str())
                    .to_string();
                derived.surfaces.insert(name, s.clone());
            }
        }
        if !derived.surfaces.is_empty() {
            derived.surface = Some(Surface::merge(derived.surfaces.values()));
        }
        let footprint: Vec<_> = project
            .geometries
            .ruimtebeslag2d
            .iter()
            .flat_map(|r| r.geometry.plan_polygons())
            .collect();
        if !footprint.is_empty() {
            derived.footprint = Some(Footprint::new(footprint));
        }
        let dv: DesignValues = project.design_values;
        if derived.surface.is_some() {
            derived.volume = Some(VolumeReport {
                result: VolumeResult::new(dv.excavation_volume, dv.fill_volume),
                evaluated_cells: 0,
                skipped_cells: 0,
            });
        }

        self.alignment = Some(alignment);
        self.profile = Some(TerrainProfile::from_points(
            project.chart_data_elevation.clone(),
        ));
        self.vaks = vaks;
        self.derived = derived;
        self.constructions = project.constructions.clone();
        self.costs = project.costs.clone();
        self.effects = None;
        log::info!(
            "project '{}' / '{}' loaded with {} vakken",
            project.metadata.vak,
            project.metadata.alternatief,
            self.vaks.len()
        );

        self.emit(SessionEvent::AlignmentChanged);
        self.emit(SessionEvent::ProfileSampled);
        for name in self.vaks.keys() {
            self.emit(SessionEvent::ControlPointsChanged { vak: name.clone() });
        }
        self.emit(SessionEvent::SurfaceRebuilt);
        if let Some(v) = self.volume() {
            self.emit(SessionEvent::VolumeUpdated(v));
        }
        self.emit(SessionEvent::ConstructionsChanged);
        Ok(())
    }
}
