/// Maps normalized elapsed time in `[0, 1]` onto playback progress in `[0, 1]`.
///
/// Implementations should send 0 to 0 and 1 to 1. The driver clamps whatever comes back.
pub trait RateFunction {
    /// Progress at normalized elapsed time `t`.
    fn progress(&self, t: f64) -> f64;
}

impl<F> RateFunction for F
where
    F: Fn(f64) -> f64,
{
    fn progress(&self, t: f64) -> f64 {
        self(t)
    }
}

/// Built-in rate functions.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    /// Identity.
    #[default]
    Linear,
    /// Logistic S-curve, flat at both ends.
    Smooth,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
}

impl Ease {
    /// Every built-in, for tests and `--help` listings.
    pub const ALL: [Self; 8] = [
        Self::Linear,
        Self::Smooth,
        Self::InQuad,
        Self::OutQuad,
        Self::InOutQuad,
        Self::InCubic,
        Self::OutCubic,
        Self::InOutCubic,
    ];

    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Smooth => smooth(t, 10.0),
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
        }
    }
}

impl RateFunction for Ease {
    fn progress(&self, t: f64) -> f64 {
        self.apply(t)
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Logistic curve rescaled so that it passes exactly through (0, 0) and (1, 1).
fn smooth(t: f64, inflection: f64) -> f64 {
    let error = sigmoid(-inflection / 2.0);
    ((sigmoid(inflection * (t - 0.5)) - error) / (1.0 - 2.0 * error)).clamp(0.0, 1.0)
}

#[cfg(test)]
#[path = "../../tests/unit/playback/ease.rs"]
mod tests;
