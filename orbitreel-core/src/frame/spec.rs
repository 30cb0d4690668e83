use crate::{
    foundation::core::{Affine, Position},
    foundation::error::{OrbitError, OrbitResult},
};

/// One of the two primaries of a restricted three-body system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primary {
    /// Larger mass, sitting at `(-mu, 0)` in the barycentric frame.
    M1,
    /// Smaller mass, sitting at `(1 - mu, 0)`.
    M2,
}

/// Masses of the two primaries in normalized units (separation 1, G = 1).
///
/// Immutable configuration shared by every frame transform of a scene.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PrimaryPair {
    /// Larger mass.
    pub m1: f64,
    /// Smaller mass.
    pub m2: f64,
}

impl PrimaryPair {
    /// Earth-Moon system.
    pub const EARTH_MOON: Self = Self {
        m1: 1.0,
        m2: 0.0123,
    };

    /// Sun-Earth system.
    pub const SUN_EARTH: Self = Self {
        m1: 1.0,
        m2: 1.0 / 333_000.0,
    };

    const L1_TOLERANCE: f64 = 1e-6;
    const L1_MAX_ITERATIONS: usize = 200;

    /// Reject non-positive or non-finite masses.
    pub fn validate(self) -> OrbitResult<()> {
        if !(self.m1.is_finite() && self.m1 > 0.0) {
            return Err(OrbitError::validation(format!(
                "m1 must be finite and > 0, got {}",
                self.m1
            )));
        }
        if !(self.m2.is_finite() && self.m2 >= 0.0) {
            return Err(OrbitError::validation(format!(
                "m2 must be finite and >= 0, got {}",
                self.m2
            )));
        }
        Ok(())
    }

    /// Mass parameter `m1 * m2 / (m1 + m2)`.
    pub fn mu(self) -> f64 {
        self.m1 * self.m2 / (self.m1 + self.m2)
    }

    /// Angular rate of the synodic frame, `(m1 + m2) / m1`.
    pub fn omega(self) -> f64 {
        (self.m1 + self.m2) / self.m1
    }

    /// Barycentric position of a primary.
    pub fn position(self, which: Primary) -> Position {
        let mu = self.mu();
        match which {
            Primary::M1 => Position::new(-mu, 0.0),
            Primary::M2 => Position::new(1.0 - mu, 0.0),
        }
    }

    /// x coordinate of the L1 point in the synodic barycentric frame.
    ///
    /// Bisection on the rotating-frame force balance between the two primaries.
    pub fn l1_x(self) -> OrbitResult<f64> {
        self.validate()?;
        let mu = self.mu();
        let (x1, x2) = (-mu, 1.0 - mu);
        let omega = self.omega();

        let eps = Self::L1_TOLERANCE;
        let mut low = x1 + eps;
        let mut high = x2 - eps;
        for _ in 0..Self::L1_MAX_ITERATIONS {
            let x = (low + high) / 2.0;
            let a = -self.m1 / (x - x1).powi(2) + self.m2 / (x - x2).powi(2) + omega * omega * x;
            if a.abs() <= eps || high - low <= f64::EPSILON {
                return Ok(x);
            }
            if a > 0.0 {
                high = x;
            } else {
                low = x;
            }
        }
        Err(OrbitError::validation("L1 search did not converge"))
    }
}

/// Where a frame is centered.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// A fixed point in base coordinates.
    Fixed(Position),
    /// An entity of a (possibly different) dataset, followed step by step.
    Entity {
        /// Dataset holding the reference entity.
        dataset: String,
        /// Entity index inside that dataset.
        index: usize,
    },
    /// One of the configured primaries.
    Primary(Primary),
}

impl Default for Origin {
    fn default() -> Self {
        Self::Fixed(Position::ZERO)
    }
}

/// Angular rate of a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    /// Non-rotating.
    #[default]
    None,
    /// Explicit rate in radians per unit of physical time.
    Rate(f64),
    /// Corotating with the configured primaries.
    Synodic,
}

/// Reference frame a dataset is expressed in.
///
/// Coordinates `q` in this frame relate to base coordinates `p` by
/// `q = scale * R(-w t, pivot) (p - origin(t))`. Base coordinates are the native, untransformed
/// coordinates every reference dataset is stored in.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameSpec {
    /// Frame center.
    #[serde(default)]
    pub origin: Origin,
    /// Angular rate.
    #[serde(default)]
    pub rotation: Rotation,
    /// Rotation center, relative to the origin.
    #[serde(default)]
    pub pivot: Position,
    /// Display scale, > 0.
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_scale() -> f64 {
    1.0
}

impl Default for FrameSpec {
    fn default() -> Self {
        Self::base()
    }
}

impl FrameSpec {
    /// Base coordinates: origin at zero, no rotation, unit scale.
    pub fn base() -> Self {
        Self {
            origin: Origin::default(),
            rotation: Rotation::None,
            pivot: Position::ZERO,
            scale: 1.0,
        }
    }

    /// Base orientation centered on an entity.
    pub fn centered_on(dataset: impl Into<String>, index: usize) -> Self {
        Self {
            origin: Origin::Entity {
                dataset: dataset.into(),
                index,
            },
            ..Self::base()
        }
    }

    /// Base orientation centered on a fixed point.
    pub fn fixed(at: Position) -> Self {
        Self {
            origin: Origin::Fixed(at),
            ..Self::base()
        }
    }

    /// Barycentric frame corotating with the primaries.
    pub fn synodic() -> Self {
        Self {
            rotation: Rotation::Synodic,
            ..Self::base()
        }
    }

    /// Replace the origin.
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Set an explicit angular rate.
    pub fn with_rotation_rate(mut self, rate: f64) -> Self {
        self.rotation = Rotation::Rate(rate);
        self
    }

    /// Set the rotation pivot.
    pub fn with_pivot(mut self, pivot: Position) -> Self {
        self.pivot = pivot;
        self
    }

    /// Set the display scale.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Check numeric fields.
    pub fn validate(&self) -> OrbitResult<()> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(OrbitError::frame_spec(format!(
                "scale must be finite and > 0, got {}",
                self.scale
            )));
        }
        if let Rotation::Rate(w) = self.rotation
            && !w.is_finite()
        {
            return Err(OrbitError::frame_spec("rotation rate must be finite"));
        }
        if !self.pivot.is_finite() {
            return Err(OrbitError::frame_spec("pivot must be finite"));
        }
        if let Origin::Fixed(p) = self.origin
            && !p.is_finite()
        {
            return Err(OrbitError::frame_spec("fixed origin must be finite"));
        }
        Ok(())
    }

    /// True when the origin follows a dataset entity.
    pub fn is_moving(&self) -> bool {
        matches!(self.origin, Origin::Entity { .. })
    }

    /// Angular rate, resolving [`Rotation::Synodic`] against `system`.
    pub fn angular_rate(&self, system: Option<PrimaryPair>) -> OrbitResult<f64> {
        match self.rotation {
            Rotation::None => Ok(0.0),
            Rotation::Rate(w) => Ok(w),
            Rotation::Synodic => system.map(PrimaryPair::omega).ok_or_else(|| {
                OrbitError::frame_spec("synodic rotation requires a primary pair config")
            }),
        }
    }

    /// Planar map from this frame into base orientation, relative to the origin.
    ///
    /// `base - origin = R(w t, pivot) (q / scale)`.
    pub(crate) fn unwind_affine(&self, w: f64, t: f64) -> Affine {
        Affine::rotate_about(w * t, self.pivot.xy()) * Affine::scale(1.0 / self.scale)
    }

    /// Inverse of [`FrameSpec::unwind_affine`].
    pub(crate) fn wind_affine(&self, w: f64, t: f64) -> Affine {
        Affine::scale(self.scale) * Affine::rotate_about(-w * t, self.pivot.xy())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/spec.rs"]
mod tests;
