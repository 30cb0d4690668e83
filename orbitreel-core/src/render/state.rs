use std::fmt;

use crate::{
    dataset::tracks::{EntityStatus, IndexTrack, StatusTrack},
    dataset::trajectory::{EntityRole, TrajectoryDataset},
    foundation::core::{Affine, Color, Position},
    foundation::error::{OrbitError, OrbitResult},
    foundation::math::wrap_angle,
    playback::scrub::index_for,
    render::frontend::StaticPrimitive,
    render::trace::{TraceBook, TraceDelta, TraceStyle, trace_indices},
};

/// Opacity applied to trace strokes.
pub const TRACE_OPACITY: f64 = 0.5;

/// Stable identity of a rendered entity across ticks.
///
/// Dataset entities use `(dataset name, entity index)`; highlights use `(highlight name, 0)`.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct EntityId {
    /// Dataset or highlight name.
    pub group: String,
    /// Entity index inside the group.
    pub index: usize,
}

impl EntityId {
    /// Build an id.
    pub fn new(group: impl Into<String>, index: usize) -> Self {
        Self {
            group: group.into(),
            index,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.group, self.index)
    }
}

/// Maps status codes onto colors.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StatusPalette {
    /// Color of code `i` at position `i`.
    pub colors: Vec<Color>,
    /// Color for codes with no entry.
    pub default: Color,
}

impl Default for StatusPalette {
    fn default() -> Self {
        // nominal, returned, arrived, captured
        Self {
            colors: vec![Color::WHITE, Color::RED, Color::GREEN, Color::YELLOW],
            default: Color::GRAY,
        }
    }
}

impl StatusPalette {
    /// Palette entry for `code`.
    pub fn lookup(&self, code: i64) -> OrbitResult<Color> {
        usize::try_from(code)
            .ok()
            .and_then(|i| self.colors.get(i).copied())
            .ok_or(OrbitError::UnknownStatusCode {
                code,
                palette_len: self.colors.len(),
            })
    }

    /// Palette entry for `code`, or the default color.
    pub fn color_for(&self, code: i64) -> Color {
        self.lookup(code).unwrap_or(self.default)
    }
}

/// How a dataset's entities are colored.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coloring {
    /// Every entity the same color.
    Solid(Color),
    /// Entity `i` gets `colors[i % len]`.
    Cycle(Vec<Color>),
    /// Colors picked by the dataset's status track.
    Status(StatusPalette),
}

impl Coloring {
    /// Default rule for a role: cycled colors for bodies, blue orbits, white ships.
    pub fn for_role(role: EntityRole) -> Self {
        match role {
            EntityRole::Body => Self::Cycle(vec![
                Color::BLUE,
                Color::GRAY,
                Color::RED,
                Color::YELLOW,
                Color::PURPLE,
            ]),
            EntityRole::Orbit => Self::Solid(Color::BLUE),
            EntityRole::Ship => Self::Solid(Color::WHITE),
        }
    }
}

/// A dataset registered for rendering, with its styling rules.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedDataset {
    dataset: TrajectoryDataset,
    coloring: Coloring,
    trace: TraceStyle,
    status: Option<StatusTrack>,
}

impl TrackedDataset {
    /// Track `dataset` with the default coloring for its role and no trace.
    pub fn new(dataset: TrajectoryDataset) -> Self {
        Self {
            coloring: Coloring::for_role(dataset.role()),
            dataset,
            trace: TraceStyle::Off,
            status: None,
        }
    }

    pub fn with_coloring(mut self, coloring: Coloring) -> Self {
        self.coloring = coloring;
        self
    }

    pub fn with_trace(mut self, trace: TraceStyle) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_status(mut self, status: StatusTrack) -> Self {
        self.status = Some(status);
        self
    }

    pub fn dataset(&self) -> &TrajectoryDataset {
        &self.dataset
    }

    /// Swap in a derived dataset, e.g. the same data in another frame.
    pub(crate) fn map_dataset(
        self,
        f: impl FnOnce(&TrajectoryDataset) -> OrbitResult<TrajectoryDataset>,
    ) -> OrbitResult<Self> {
        Ok(Self {
            dataset: f(&self.dataset)?,
            ..self
        })
    }

    pub fn coloring(&self) -> &Coloring {
        &self.coloring
    }

    pub fn trace(&self) -> TraceStyle {
        self.trace
    }

    pub fn status(&self) -> Option<&StatusTrack> {
        self.status.as_ref()
    }

    fn color_at(
        &self,
        step: usize,
        entity: usize,
    ) -> OrbitResult<(Color, Option<EntityStatus>)> {
        let code = match &self.status {
            Some(track) => Some(track.code_at(step, entity)?),
            None => None,
        };
        let status = code.and_then(EntityStatus::from_code);

        let overridden = self.dataset.entities().get(entity).and_then(|m| m.color);
        let color = match (&self.coloring, overridden) {
            (_, Some(c)) => c,
            (Coloring::Solid(c), None) => *c,
            (Coloring::Cycle(colors), None) => colors[entity % colors.len()],
            (Coloring::Status(palette), None) => match code {
                Some(code) => palette.color_for(code),
                None => palette.default,
            },
        };
        Ok((color, status))
    }
}

/// One point-cloud entity singled out, e.g. the best trajectory of a search.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Highlight {
    /// Group name of the rendered entity.
    pub name: String,
    /// Dataset the entity is picked from.
    pub dataset: String,
    /// Entity index, fixed or per step.
    pub index: IndexTrack,
    /// Fill color.
    #[serde(default = "default_highlight_color")]
    pub color: Color,
    /// Trail style.
    #[serde(default = "TraceStyle::accumulate")]
    pub trace: TraceStyle,
}

fn default_highlight_color() -> Color {
    Color::LIME_GREEN
}

impl Highlight {
    /// Lime green highlight with an accumulating trace.
    pub fn new(name: impl Into<String>, dataset: impl Into<String>, index: IndexTrack) -> Self {
        Self {
            name: name.into(),
            dataset: dataset.into(),
            index,
            color: default_highlight_color(),
            trace: TraceStyle::accumulate(),
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_trace(mut self, trace: TraceStyle) -> Self {
        self.trace = trace;
        self
    }
}

/// Constant visual rotation of the whole view, independent of physical time.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ViewSpin {
    /// Radians per second of playback clock.
    pub rate: f64,
    /// Rotation center in display coordinates.
    #[serde(default)]
    pub pivot: Position,
}

/// View rotation in effect for one frame.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ViewTransform {
    /// Rotation angle in `[0, TAU)`.
    pub rotation_rad: f64,
    /// Rotation center.
    pub about: Position,
}

impl ViewTransform {
    /// No rotation.
    pub const IDENTITY: Self = Self {
        rotation_rad: 0.0,
        about: Position::ZERO,
    };

    /// Planar map for frontends.
    pub fn to_affine(self) -> Affine {
        Affine::rotate_about(self.rotation_rad, self.about.xy())
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Renderable state of one entity.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderedEntity {
    pub id: EntityId,
    pub role: EntityRole,
    /// Position in display coordinates, before the view transform.
    pub position: Position,
    pub color: Color,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EntityStatus>,
}

/// Everything a frontend needs to draw one tick, minus traces.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderFrame {
    /// Scrub value the frame was rendered at.
    pub scrub: f64,
    /// View rotation.
    pub view: ViewTransform,
    /// Entities in registration order: datasets first, then highlights.
    pub entities: Vec<RenderedEntity>,
}

impl RenderFrame {
    /// Entity with `id`, if rendered.
    pub fn get(&self, id: &EntityId) -> Option<&RenderedEntity> {
        self.entities.iter().find(|e| &e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Entity that leaves a trail, resolved against its dataset.
enum Traced<'a> {
    Entity {
        layer: &'a TrackedDataset,
        index: usize,
    },
    Highlight {
        highlight: &'a Highlight,
        dataset: &'a TrajectoryDataset,
    },
}

impl Traced<'_> {
    fn dataset(&self) -> &TrajectoryDataset {
        match self {
            Self::Entity { layer, .. } => &layer.dataset,
            Self::Highlight { dataset, .. } => dataset,
        }
    }

    fn position(&self, step: usize) -> OrbitResult<Position> {
        match self {
            Self::Entity { layer, index } => layer.dataset.position(step, *index),
            Self::Highlight { highlight, dataset } => {
                dataset.position(step, highlight.index.at(step)?)
            }
        }
    }

    fn color(&self, step: usize) -> OrbitResult<Color> {
        match self {
            Self::Entity { layer, index } => Ok(layer.color_at(step, *index)?.0),
            Self::Highlight { highlight, .. } => Ok(highlight.color),
        }
    }

    fn points(&self, steps: impl Iterator<Item = usize>) -> OrbitResult<Vec<Position>> {
        steps.map(|j| self.position(j)).collect()
    }
}

/// Pure mapping from a scrub value to renderable entity state.
///
/// Holds datasets already expressed in display coordinates. [`EntityRenderState::render`] reads
/// nothing but its arguments and the registered data, so equal inputs give equal frames.
#[derive(Clone, Debug, Default)]
pub struct EntityRenderState {
    layers: Vec<TrackedDataset>,
    highlights: Vec<Highlight>,
    spin: Option<ViewSpin>,
    statics: Vec<StaticPrimitive>,
}

impl EntityRenderState {
    pub fn new() -> Self {
        Self::default()
    }

    fn group_taken(&self, name: &str) -> bool {
        self.layers.iter().any(|l| l.dataset.name() == name)
            || self.highlights.iter().any(|h| h.name == name)
    }

    /// Register a dataset.
    ///
    /// Status codes with no palette entry are reported here, once per code, and drawn in the
    /// palette's default color.
    pub fn add_dataset(&mut self, layer: TrackedDataset) -> OrbitResult<()> {
        let name = layer.dataset.name();
        if self.group_taken(name) {
            return Err(OrbitError::validation(format!(
                "entity group '{name}' is registered twice"
            )));
        }
        layer.trace.validate()?;
        if let Some(track) = &layer.status {
            track.check_against(&layer.dataset)?;
        }
        match (&layer.coloring, &layer.status) {
            (Coloring::Cycle(colors), _) if colors.is_empty() => {
                return Err(OrbitError::validation(format!(
                    "dataset '{name}': cycle coloring needs at least one color"
                )));
            }
            (Coloring::Status(_), None) => {
                return Err(OrbitError::validation(format!(
                    "dataset '{name}': status coloring needs a status track"
                )));
            }
            (Coloring::Status(palette), Some(track)) => {
                for code in track.distinct_codes() {
                    if let Err(err) = palette.lookup(code) {
                        tracing::warn!(dataset = %name, %err, "drawing in default color");
                    }
                }
            }
            _ => {}
        }
        tracing::debug!(
            dataset = %name,
            steps = layer.dataset.len(),
            entities = layer.dataset.entity_count(),
            "registered dataset"
        );
        self.layers.push(layer);
        Ok(())
    }

    /// Register a highlight on an already registered dataset.
    pub fn add_highlight(&mut self, highlight: Highlight) -> OrbitResult<()> {
        if self.group_taken(&highlight.name) {
            return Err(OrbitError::validation(format!(
                "entity group '{}' is registered twice",
                highlight.name
            )));
        }
        highlight.trace.validate()?;
        let dataset = self.dataset(&highlight.dataset).ok_or_else(|| {
            OrbitError::validation(format!(
                "highlight '{}' refers to unknown dataset '{}'",
                highlight.name, highlight.dataset
            ))
        })?;
        highlight.index.check_against(dataset)?;
        self.highlights.push(highlight);
        Ok(())
    }

    /// Set or clear the view spin.
    pub fn set_spin(&mut self, spin: Option<ViewSpin>) -> OrbitResult<()> {
        if let Some(s) = spin
            && !(s.rate.is_finite() && s.pivot.is_finite())
        {
            return Err(OrbitError::validation("view spin must be finite"));
        }
        self.spin = spin;
        Ok(())
    }

    /// Add a static decoration, already in display coordinates.
    pub fn add_static(&mut self, primitive: StaticPrimitive) {
        self.statics.push(primitive);
    }

    pub fn layers(&self) -> &[TrackedDataset] {
        &self.layers
    }

    pub fn highlights(&self) -> &[Highlight] {
        &self.highlights
    }

    /// Registered dataset called `name`.
    pub fn dataset(&self, name: &str) -> Option<&TrajectoryDataset> {
        self.layers
            .iter()
            .map(|l| &l.dataset)
            .find(|d| d.name() == name)
    }

    /// Number of entities in every frame.
    pub fn entity_count(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.dataset.entity_count())
            .sum::<usize>()
            + self.highlights.len()
    }

    /// Static primitives: decorations plus full-path traces.
    pub fn statics(&self) -> OrbitResult<Vec<StaticPrimitive>> {
        let mut out = self.statics.clone();
        for (id, traced) in self.traced() {
            let Some(stride) = self.trace_style(&traced).full_stride() else {
                continue;
            };
            let last = traced.dataset().len().saturating_sub(1);
            // Full paths have no current step; they keep the initial color.
            out.push(StaticPrimitive::Path {
                id,
                points: traced.points(trace_indices(last, stride))?,
                color: traced.color(0)?.with_opacity(TRACE_OPACITY),
            });
        }
        Ok(out)
    }

    /// View rotation after `elapsed_secs` of playback clock.
    pub fn view_at(&self, elapsed_secs: f64) -> ViewTransform {
        match self.spin {
            Some(spin) => ViewTransform {
                rotation_rad: wrap_angle(spin.rate * elapsed_secs),
                about: spin.pivot,
            },
            None => ViewTransform::IDENTITY,
        }
    }

    /// Render at `scrub` with the view at rest.
    pub fn render(&self, scrub: f64) -> OrbitResult<RenderFrame> {
        self.render_at(scrub, 0.0)
    }

    /// Render at `scrub` with the view spun for `elapsed_secs`.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn render_at(&self, scrub: f64, elapsed_secs: f64) -> OrbitResult<RenderFrame> {
        let mut entities = Vec::with_capacity(self.entity_count());

        for layer in &self.layers {
            let ds = &layer.dataset;
            let step = index_for(scrub, ds.len());
            let snapshot = ds.positions_at(step)?;
            for (e, position) in snapshot.iter() {
                let (color, status) = layer.color_at(step, e)?;
                entities.push(RenderedEntity {
                    id: EntityId::new(ds.name(), e),
                    role: ds.role(),
                    position,
                    color,
                    status,
                });
            }
        }

        for h in &self.highlights {
            let ds = self.highlight_dataset(h)?;
            let step = index_for(scrub, ds.len());
            entities.push(RenderedEntity {
                id: EntityId::new(&h.name, 0),
                role: ds.role(),
                position: ds.position(step, h.index.at(step)?)?,
                color: h.color,
                status: None,
            });
        }

        Ok(RenderFrame {
            scrub,
            view: self.view_at(elapsed_secs),
            entities,
        })
    }

    /// Trace updates taking `book` from what it last sent to the traces at `scrub`.
    ///
    /// Entities whose step did not change produce no delta. Each delta carries the color at the
    /// new step, so a trace follows its entity's status.
    pub fn trace_deltas(
        &self,
        scrub: f64,
        book: &mut TraceBook,
    ) -> OrbitResult<Vec<TraceDelta>> {
        let mut out = Vec::new();
        for (id, traced) in self.traced() {
            let Some(stride) = self.trace_style(&traced).accumulating_stride() else {
                continue;
            };
            let step = index_for(scrub, traced.dataset().len());
            if book.last_step(&id) == Some(step) {
                continue;
            }
            let (keep, steps) = book.advance(&id, step, stride);
            out.push(TraceDelta {
                appended: traced.points(steps.into_iter())?,
                color: traced.color(step)?.with_opacity(TRACE_OPACITY),
                id,
                keep,
            });
        }
        Ok(out)
    }

    /// Full accumulating trace of `id` at `scrub`, independent of any history.
    pub fn trace_at(&self, id: &EntityId, scrub: f64) -> OrbitResult<Vec<Position>> {
        let (_, traced) = self
            .traced()
            .find(|(candidate, _)| candidate == id)
            .ok_or_else(|| OrbitError::validation(format!("no traced entity '{id}'")))?;
        let stride = self
            .trace_style(&traced)
            .accumulating_stride()
            .ok_or_else(|| OrbitError::validation(format!("entity '{id}' has no trace")))?;
        let step = index_for(scrub, traced.dataset().len());
        traced.points(trace_indices(step, stride))
    }

    fn highlight_dataset(&self, h: &Highlight) -> OrbitResult<&TrajectoryDataset> {
        self.dataset(&h.dataset).ok_or_else(|| {
            OrbitError::validation(format!("highlight '{}' lost dataset '{}'", h.name, h.dataset))
        })
    }

    fn trace_style(&self, traced: &Traced<'_>) -> TraceStyle {
        match traced {
            Traced::Entity { layer, .. } => layer.trace,
            Traced::Highlight { highlight, .. } => highlight.trace,
        }
    }

    /// Every entity with a trace style other than off.
    fn traced(&self) -> impl Iterator<Item = (EntityId, Traced<'_>)> + '_ {
        let entities = self
            .layers
            .iter()
            .filter(|l| l.trace != TraceStyle::Off)
            .flat_map(|layer| {
                (0..layer.dataset.entity_count()).map(move |index| {
                    (
                        EntityId::new(layer.dataset.name(), index),
                        Traced::Entity { layer, index },
                    )
                })
            });
        let highlights = self
            .highlights
            .iter()
            .filter(|h| h.trace != TraceStyle::Off)
            .filter_map(|highlight| {
                let dataset = self.dataset(&highlight.dataset)?;
                Some((
                    EntityId::new(&highlight.name, 0),
                    Traced::Highlight { highlight, dataset },
                ))
            });
        entities.chain(highlights)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/state.rs"]
mod tests;
