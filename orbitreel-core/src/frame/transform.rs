use crate::{
    dataset::trajectory::TrajectoryDataset,
    foundation::core::{Affine, Axis, Position},
    foundation::error::{OrbitError, OrbitResult},
    frame::spec::{FrameSpec, Origin, PrimaryPair},
    playback::scrub::align_index,
};

/// Source of reference datasets for entity-centered frames.
///
/// Reference positions are read in base coordinates.
pub trait ReferenceLookup {
    /// Dataset called `name`, if known.
    fn reference(&self, name: &str) -> Option<&TrajectoryDataset>;
}

impl ReferenceLookup for [TrajectoryDataset] {
    fn reference(&self, name: &str) -> Option<&TrajectoryDataset> {
        self.iter().find(|d| d.name() == name)
    }
}

impl ReferenceLookup for Vec<TrajectoryDataset> {
    fn reference(&self, name: &str) -> Option<&TrajectoryDataset> {
        self.as_slice().reference(name)
    }
}

impl ReferenceLookup for TrajectoryDataset {
    fn reference(&self, name: &str) -> Option<&TrajectoryDataset> {
        (self.name() == name).then_some(self)
    }
}

/// Lookup with no datasets; fine for fixed-origin frames.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoReferences;

impl ReferenceLookup for NoReferences {
    fn reference(&self, _name: &str) -> Option<&TrajectoryDataset> {
        None
    }
}

/// Lower bound on one axis, applied in the target frame after every other step.
///
/// `min` is in unscaled target-frame units. Used to fold mirror-symmetric families onto one
/// half-plane, e.g. `y >= 0` for halo orbit searches.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AxisFloor {
    /// Clamped axis.
    pub axis: Axis,
    /// Lowest allowed value.
    pub min: f64,
}

/// Change of frame for datasets and static points.
///
/// Steps, in order: undo the source frame (unscale, unrotate, add its origin), apply the target
/// frame (subtract its origin, rotate, scale), then clamp floors. Without floors the transform is
/// invertible, see [`FrameTransform::inverse`].
#[derive(Clone, Debug, PartialEq)]
pub struct FrameTransform {
    from: FrameSpec,
    to: FrameSpec,
    system: Option<PrimaryPair>,
    floors: Vec<AxisFloor>,
}

enum OriginTrack {
    Fixed(Position),
    PerStep(Vec<Position>),
}

impl OriginTrack {
    fn at(&self, step: usize) -> Position {
        match self {
            Self::Fixed(p) => *p,
            Self::PerStep(v) => v[step],
        }
    }
}

impl FrameTransform {
    /// Transform from `from` into `to`. Both specs are validated here.
    pub fn new(from: FrameSpec, to: FrameSpec) -> OrbitResult<Self> {
        from.validate()?;
        to.validate()?;
        Ok(Self {
            from,
            to,
            system: None,
            floors: Vec::new(),
        })
    }

    /// Attach the primary pair used to resolve synodic rates and primary origins.
    pub fn with_system(mut self, system: PrimaryPair) -> OrbitResult<Self> {
        system.validate()?;
        self.system = Some(system);
        Ok(self)
    }

    /// Add a floor on `axis`.
    pub fn with_floor(mut self, axis: Axis, min: f64) -> OrbitResult<Self> {
        if !min.is_finite() {
            return Err(OrbitError::validation("axis floor must be finite"));
        }
        self.floors.push(AxisFloor { axis, min });
        Ok(self)
    }

    /// Source frame.
    pub fn from_spec(&self) -> &FrameSpec {
        &self.from
    }

    /// Target frame.
    pub fn to_spec(&self) -> &FrameSpec {
        &self.to
    }

    /// The transform going the other way. Floors cannot be undone.
    pub fn inverse(&self) -> OrbitResult<Self> {
        if !self.floors.is_empty() {
            return Err(OrbitError::frame_spec(
                "a transform with axis floors has no inverse",
            ));
        }
        Ok(Self {
            from: self.to.clone(),
            to: self.from.clone(),
            system: self.system,
            floors: Vec::new(),
        })
    }

    /// Map every sample of `dataset` into the target frame, producing a new dataset.
    ///
    /// Entity origins are looked up in `refs`. A reference dataset with a different length is
    /// aligned by progress, the same rule scrubbing uses.
    #[tracing::instrument(skip(self, dataset, refs), fields(dataset = %dataset.name(), steps = dataset.len()))]
    pub fn apply(
        &self,
        dataset: &TrajectoryDataset,
        refs: &(impl ReferenceLookup + ?Sized),
    ) -> OrbitResult<TrajectoryDataset> {
        let from_origin = self.resolve_origin(&self.from, dataset, refs)?;
        let to_origin = self.resolve_origin(&self.to, dataset, refs)?;
        let w_from = self.from.angular_rate(self.system)?;
        let w_to = self.to.angular_rate(self.system)?;

        let time = if w_from != 0.0 || w_to != 0.0 {
            Some(dataset.time_base().ok_or_else(|| {
                OrbitError::frame_spec(format!(
                    "dataset '{}' has no time base; rotating frames need one",
                    dataset.name()
                ))
            })?)
        } else {
            None
        };

        let steps = dataset.len();
        let mut cached: Option<(usize, Affine, Position)> = None;
        dataset.map_positions(|step, _entity, p| {
            let (affine, dz) = match cached {
                Some((s, a, dz)) if s == step => (a, dz),
                _ => {
                    let t = time.map_or(0.0, |tb| tb.time_at(step, steps));
                    let (a, dz) =
                        self.step_map(w_from, w_to, t, from_origin.at(step), to_origin.at(step));
                    cached = Some((step, a, dz));
                    (a, dz)
                }
            };
            Ok(self.finish(p, affine, dz))
        })
    }

    /// Map one static point, for markers and decorations.
    ///
    /// Both frames must have fixed origins; rotation is evaluated at `t = 0`.
    pub fn apply_static(&self, p: Position) -> OrbitResult<Position> {
        if self.from.is_moving() || self.to.is_moving() {
            return Err(OrbitError::frame_spec(
                "static points need frames with fixed origins",
            ));
        }
        let from_origin = self.fixed_origin(&self.from)?;
        let to_origin = self.fixed_origin(&self.to)?;
        let w_from = self.from.angular_rate(self.system)?;
        let w_to = self.to.angular_rate(self.system)?;
        let (affine, dz) = self.step_map(w_from, w_to, 0.0, from_origin, to_origin);
        Ok(self.finish(p, affine, dz))
    }

    /// Planar map plus z shift for one step.
    fn step_map(
        &self,
        w_from: f64,
        w_to: f64,
        t: f64,
        from_origin: Position,
        to_origin: Position,
    ) -> (Affine, Position) {
        let shift = from_origin.sub(to_origin);
        let affine = self.to.wind_affine(w_to, t)
            * Affine::translate(shift.xy().to_vec2())
            * self.from.unwind_affine(w_from, t);
        (affine, shift)
    }

    fn finish(&self, p: Position, affine: Affine, shift: Position) -> Position {
        let z = (p.z / self.from.scale + shift.z) * self.to.scale;
        let mut q = Position::new3(p.x, p.y, z).map_xy(affine);
        for floor in &self.floors {
            let min = floor.min * self.to.scale;
            if q.get(floor.axis) < min {
                q = q.with(floor.axis, min);
            }
        }
        q
    }

    fn fixed_origin(&self, spec: &FrameSpec) -> OrbitResult<Position> {
        match &spec.origin {
            Origin::Fixed(p) => Ok(*p),
            Origin::Primary(which) => self.system.map(|s| s.position(*which)).ok_or_else(|| {
                OrbitError::frame_spec("primary origin requires a primary pair config")
            }),
            Origin::Entity { dataset, .. } => Err(OrbitError::frame_spec(format!(
                "origin follows dataset '{dataset}', not a fixed point"
            ))),
        }
    }

    fn resolve_origin(
        &self,
        spec: &FrameSpec,
        dataset: &TrajectoryDataset,
        refs: &(impl ReferenceLookup + ?Sized),
    ) -> OrbitResult<OriginTrack> {
        let Origin::Entity {
            dataset: ref_name,
            index,
        } = &spec.origin
        else {
            return self.fixed_origin(spec).map(OriginTrack::Fixed);
        };

        let reference = refs.reference(ref_name).ok_or_else(|| {
            OrbitError::frame_spec(format!("missing reference dataset '{ref_name}'"))
        })?;
        if *index >= reference.entity_count() {
            return Err(OrbitError::frame_spec(format!(
                "missing reference entity {index} in dataset '{ref_name}' ({} entities)",
                reference.entity_count()
            )));
        }

        let steps = dataset.len();
        let ref_steps = reference.len();
        if ref_steps < steps {
            tracing::debug!(
                reference = %ref_name,
                ref_steps,
                steps,
                "aligning shorter reference by progress"
            );
        }
        let track = (0..steps)
            .map(|i| reference.position(align_index(i, steps, ref_steps), *index))
            .collect::<OrbitResult<Vec<_>>>()?;
        Ok(OriginTrack::PerStep(track))
    }
}

/// Transform `dataset` from frame `from` into frame `to`.
pub fn transform(
    dataset: &TrajectoryDataset,
    from: &FrameSpec,
    to: &FrameSpec,
    refs: &(impl ReferenceLookup + ?Sized),
) -> OrbitResult<TrajectoryDataset> {
    FrameTransform::new(from.clone(), to.clone())?.apply(dataset, refs)
}

#[cfg(test)]
#[path = "../../tests/unit/frame/transform.rs"]
mod tests;
