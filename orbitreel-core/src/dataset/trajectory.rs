use crate::{
    foundation::core::{Color, Dims, Position},
    foundation::error::{OrbitError, OrbitResult},
    playback::scrub::index_for,
};

/// Ordered positions of one entity, one per time step.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    dims: Dims,
    samples: Vec<Position>,
}

impl Trajectory {
    /// Build from raw component rows; every row must have the same length (2 or 3).
    pub fn new(rows: &[Vec<f64>]) -> OrbitResult<Self> {
        let first = rows
            .first()
            .ok_or_else(|| OrbitError::shape("trajectory must have at least one sample"))?;
        let dims = Dims::from_len(first.len())?;
        let mut samples = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            if row.len() != dims.len() {
                return Err(OrbitError::shape(format!(
                    "sample {i} has {} components, expected {}",
                    row.len(),
                    dims.len()
                )));
            }
            samples.push(Position::from_components(row)?);
        }
        Self::from_positions(dims, samples)
    }

    /// Build from already-typed positions.
    pub fn from_positions(dims: Dims, samples: Vec<Position>) -> OrbitResult<Self> {
        if samples.is_empty() {
            return Err(OrbitError::shape("trajectory must have at least one sample"));
        }
        if let Some(i) = samples.iter().position(|p| !p.is_finite()) {
            return Err(OrbitError::validation(format!(
                "trajectory sample {i} is not finite"
            )));
        }
        if dims == Dims::Two && samples.iter().any(|p| p.z != 0.0) {
            return Err(OrbitError::shape("planar trajectory has nonzero z"));
        }
        Ok(Self { dims, samples })
    }

    /// Planar trajectory from `(x, y)` pairs.
    pub fn planar(points: &[(f64, f64)]) -> OrbitResult<Self> {
        let samples = points.iter().map(|&(x, y)| Position::new(x, y)).collect();
        Self::from_positions(Dims::Two, samples)
    }

    /// Number of samples (always >= 1).
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample dimensionality.
    pub fn dims(&self) -> Dims {
        self.dims
    }

    /// Borrow the samples.
    pub fn samples(&self) -> &[Position] {
        &self.samples
    }
}

/// What kind of object a dataset's entities are.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRole {
    /// Massive body (planet, moon, star).
    Body,
    /// Test particle / spacecraft.
    #[default]
    Ship,
    /// Reference path such as a periodic orbit.
    Orbit,
}

/// Per-entity metadata.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EntityMeta {
    /// Display label.
    pub label: String,
    /// Color override; takes precedence over the dataset coloring rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

/// Physical time attached to a dataset's steps.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBase {
    /// Steps are evenly spread over `duration`: `t_i = duration * i / (T - 1)`.
    Span {
        /// Total physical duration covered by the dataset.
        duration: f64,
    },
    /// Fixed physical step: `t_i = i * dt`.
    Step {
        /// Physical time between consecutive samples.
        dt: f64,
    },
}

impl TimeBase {
    /// Reject negative or non-finite values.
    pub fn validate(self) -> OrbitResult<()> {
        let (what, v) = match self {
            Self::Span { duration } => ("duration", duration),
            Self::Step { dt } => ("dt", dt),
        };
        if !v.is_finite() || v < 0.0 {
            return Err(OrbitError::validation(format!(
                "time base {what} must be finite and >= 0, got {v}"
            )));
        }
        Ok(())
    }

    /// Physical time of `step` in a dataset of `steps` samples.
    pub fn time_at(self, step: usize, steps: usize) -> f64 {
        match self {
            Self::Span { duration } => {
                if steps <= 1 {
                    0.0
                } else {
                    duration * (step as f64) / ((steps - 1) as f64)
                }
            }
            Self::Step { dt } => dt * step as f64,
        }
    }

    /// Total physical duration of a dataset of `steps` samples.
    pub fn total(self, steps: usize) -> f64 {
        self.time_at(steps.saturating_sub(1), steps)
    }
}

/// Named collection of equal-length trajectories.
///
/// Positions are stored row-major as `[step][entity]`. The step count `T` is fixed at
/// construction; frame changes produce new datasets instead of mutating this one.
#[derive(Clone, Debug, PartialEq)]
pub struct TrajectoryDataset {
    name: String,
    dims: Dims,
    steps: usize,
    role: EntityRole,
    time: Option<TimeBase>,
    entities: Vec<EntityMeta>,
    positions: Vec<Position>,
}

impl TrajectoryDataset {
    /// Build from `(label, trajectory)` pairs.
    ///
    /// Fails with [`OrbitError::ShapeMismatch`] when any trajectory's length or dimensionality
    /// differs from the first one.
    pub fn from_trajectories(
        name: impl Into<String>,
        trajectories: Vec<(String, Trajectory)>,
    ) -> OrbitResult<Self> {
        let name = name.into();
        let Some((_, first)) = trajectories.first() else {
            return Err(OrbitError::shape(format!(
                "dataset '{name}' must contain at least one entity"
            )));
        };
        let steps = first.len();
        let dims = first.dims();

        for (label, t) in &trajectories {
            if t.len() != steps {
                return Err(OrbitError::shape(format!(
                    "dataset '{name}': entity '{label}' has {} steps, expected {steps}",
                    t.len()
                )));
            }
            if t.dims() != dims {
                return Err(OrbitError::shape(format!(
                    "dataset '{name}': entity '{label}' has {} dims, expected {}",
                    t.dims().len(),
                    dims.len()
                )));
            }
        }

        let n = trajectories.len();
        let mut positions = vec![Position::ZERO; steps * n];
        let mut entities = Vec::with_capacity(n);
        for (e, (label, t)) in trajectories.into_iter().enumerate() {
            for (step, p) in t.samples().iter().enumerate() {
                positions[step * n + e] = *p;
            }
            entities.push(EntityMeta { label, color: None });
        }

        Ok(Self {
            name,
            dims,
            steps,
            role: EntityRole::default(),
            time: None,
            entities,
            positions,
        })
    }

    /// Build from the dense external layout `[steps, entities, dims]`, row-major.
    pub fn from_dense(
        name: impl Into<String>,
        shape: [usize; 3],
        data: &[f64],
    ) -> OrbitResult<Self> {
        let name = name.into();
        let [steps, n, d] = shape;
        if steps == 0 || n == 0 {
            return Err(OrbitError::shape(format!(
                "dataset '{name}' shape {shape:?} has an empty axis"
            )));
        }
        let dims = Dims::from_len(d)?;
        let expected = steps
            .checked_mul(n)
            .and_then(|v| v.checked_mul(d))
            .ok_or_else(|| {
                OrbitError::shape(format!("dataset '{name}' shape {shape:?} is too large"))
            })?;
        if data.len() != expected {
            return Err(OrbitError::shape(format!(
                "dataset '{name}' shape {shape:?} needs {expected} values, got {}",
                data.len()
            )));
        }

        let positions = data
            .chunks_exact(d)
            .map(Position::from_components)
            .collect::<OrbitResult<Vec<_>>>()?;
        if let Some(i) = positions.iter().position(|p| !p.is_finite()) {
            return Err(OrbitError::validation(format!(
                "dataset '{name}': value at step {} entity {} is not finite",
                i / n,
                i % n
            )));
        }
        let entities = (0..n)
            .map(|i| EntityMeta {
                label: format!("{name}[{i}]"),
                color: None,
            })
            .collect();

        Ok(Self {
            name,
            dims,
            steps,
            role: EntityRole::default(),
            time: None,
            entities,
            positions,
        })
    }

    /// Set the entity role.
    pub fn with_role(mut self, role: EntityRole) -> Self {
        self.role = role;
        self
    }

    /// Attach a physical time base.
    pub fn with_time_base(mut self, time: TimeBase) -> OrbitResult<Self> {
        time.validate()?;
        self.time = Some(time);
        Ok(self)
    }

    /// Replace entity labels; must supply exactly one label per entity.
    pub fn with_labels(mut self, labels: Vec<String>) -> OrbitResult<Self> {
        if labels.len() != self.entities.len() {
            return Err(OrbitError::shape(format!(
                "dataset '{}': {} labels for {} entities",
                self.name,
                labels.len(),
                self.entities.len()
            )));
        }
        for (meta, label) in self.entities.iter_mut().zip(labels) {
            meta.label = label;
        }
        Ok(self)
    }

    /// Override one entity's color.
    pub fn with_entity_color(mut self, entity: usize, color: Color) -> OrbitResult<Self> {
        let len = self.entities.len();
        let meta = self
            .entities
            .get_mut(entity)
            .ok_or_else(|| OrbitError::index("entity", entity, len))?;
        meta.color = Some(color);
        Ok(self)
    }

    /// Same data under another name.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Dataset name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of time steps `T`.
    pub fn len(&self) -> usize {
        self.steps
    }

    /// Always false: datasets hold at least one step.
    pub fn is_empty(&self) -> bool {
        self.steps == 0
    }

    /// Number of entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Sample dimensionality.
    pub fn dims(&self) -> Dims {
        self.dims
    }

    /// Entity role.
    pub fn role(&self) -> EntityRole {
        self.role
    }

    /// Physical time base, if any.
    pub fn time_base(&self) -> Option<TimeBase> {
        self.time
    }

    /// Entity metadata.
    pub fn entities(&self) -> &[EntityMeta] {
        &self.entities
    }

    /// Positions of every entity at `step`.
    pub fn positions_at(&self, step: usize) -> OrbitResult<Snapshot<'_>> {
        if step >= self.steps {
            return Err(OrbitError::index("time step", step, self.steps));
        }
        let n = self.entities.len();
        Ok(Snapshot {
            step,
            positions: &self.positions[step * n..(step + 1) * n],
            entities: &self.entities,
        })
    }

    /// Position of one entity at one step.
    pub fn position(&self, step: usize, entity: usize) -> OrbitResult<Position> {
        let n = self.entities.len();
        if entity >= n {
            return Err(OrbitError::index("entity", entity, n));
        }
        Ok(self.positions_at(step)?.positions[entity])
    }

    /// Position of one entity at the step matching `progress` in `[0, 1]`.
    ///
    /// This is how datasets of different lengths are aligned to each other.
    pub fn position_at_progress(&self, progress: f64, entity: usize) -> OrbitResult<Position> {
        self.position(index_for(progress, self.steps), entity)
    }

    /// Every sample of one entity, in time order.
    pub fn trajectory(&self, entity: usize) -> OrbitResult<impl Iterator<Item = Position> + '_> {
        let n = self.entities.len();
        if entity >= n {
            return Err(OrbitError::index("entity", entity, n));
        }
        Ok(self.positions.iter().skip(entity).step_by(n).copied())
    }

    /// Produce a new dataset by mapping every sample; metadata is carried over.
    pub(crate) fn map_positions(
        &self,
        mut f: impl FnMut(usize, usize, Position) -> OrbitResult<Position>,
    ) -> OrbitResult<Self> {
        let n = self.entities.len();
        let mut positions = Vec::with_capacity(self.positions.len());
        for (i, p) in self.positions.iter().enumerate() {
            let q = f(i / n, i % n, *p)?;
            if !q.is_finite() {
                return Err(OrbitError::validation(format!(
                    "dataset '{}': transformed value at step {} entity {} is not finite",
                    self.name,
                    i / n,
                    i % n
                )));
            }
            positions.push(q);
        }
        let dims = if positions.iter().any(|p| p.z != 0.0) {
            Dims::Three
        } else {
            self.dims
        };
        Ok(Self {
            positions,
            dims,
            ..self.clone_meta()
        })
    }

    /// Resample onto `new_len` evenly spaced steps with linear interpolation.
    ///
    /// Use this to put datasets on a common physical time grid before building a scene; scrubbing
    /// itself only ever aligns progress.
    pub fn resample(&self, new_len: usize) -> OrbitResult<Self> {
        if new_len == 0 {
            return Err(OrbitError::validation("resample length must be >= 1"));
        }
        let n = self.entities.len();
        let mut positions = Vec::with_capacity(new_len * n);
        for k in 0..new_len {
            let u = if new_len == 1 || self.steps == 1 {
                0.0
            } else {
                (k as f64) * ((self.steps - 1) as f64) / ((new_len - 1) as f64)
            };
            let lo = (u.floor() as usize).min(self.steps - 1);
            let hi = (lo + 1).min(self.steps - 1);
            let frac = u - lo as f64;
            for e in 0..n {
                let a = self.positions[lo * n + e];
                let b = self.positions[hi * n + e];
                positions.push(a.lerp(b, frac));
            }
        }
        let time = self
            .time
            .map(|tb| TimeBase::Span {
                duration: tb.total(self.steps),
            });
        Ok(Self {
            steps: new_len,
            time,
            positions,
            ..self.clone_meta()
        })
    }

    fn clone_meta(&self) -> Self {
        Self {
            name: self.name.clone(),
            dims: self.dims,
            steps: self.steps,
            role: self.role,
            time: self.time,
            entities: self.entities.clone(),
            positions: Vec::new(),
        }
    }
}

/// Borrowed view of all entity positions at one step.
#[derive(Clone, Copy, Debug)]
pub struct Snapshot<'a> {
    step: usize,
    positions: &'a [Position],
    entities: &'a [EntityMeta],
}

impl<'a> Snapshot<'a> {
    /// Step this snapshot was taken at.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True when the dataset has no entities (never for validated datasets).
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Position of `entity`, if in range.
    pub fn get(&self, entity: usize) -> Option<Position> {
        self.positions.get(entity).copied()
    }

    /// Position of the entity labelled `label`.
    pub fn by_label(&self, label: &str) -> Option<Position> {
        let i = self.entities.iter().position(|m| m.label == label)?;
        self.get(i)
    }

    /// `(entity, position)` pairs in entity order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Position)> + 'a {
        self.positions.iter().copied().enumerate()
    }

    /// Raw slice in entity order.
    pub fn as_slice(&self) -> &'a [Position] {
        self.positions
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dataset/trajectory.rs"]
mod tests;
