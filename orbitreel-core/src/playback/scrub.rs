use crate::foundation::error::{OrbitError, OrbitResult};

/// Map a normalized scrub value onto a time index of a dataset with `length` samples.
///
/// `floor(scrub * (length - 1))`, clamped to `[0, length - 1]`. Every dataset is indexed with this
/// rule, so scrub 0 is always the first sample and scrub 1 always the last one, whatever each
/// dataset's length. Datasets stay aligned in progress, not in physical time.
pub fn index_for(scrub: f64, length: usize) -> usize {
    if length <= 1 || !scrub.is_finite() {
        return 0;
    }
    let last = length - 1;
    let raw = (scrub.clamp(0.0, 1.0) * last as f64).floor();
    (raw as usize).min(last)
}

/// Index into a dataset of `to_len` samples matching step `step` of a dataset of `from_len`.
///
/// Integer form of `index_for(step / (from_len - 1), to_len)`, free of rounding drift at the
/// endpoints. Used to align reference datasets of a different length.
pub fn align_index(step: usize, from_len: usize, to_len: usize) -> usize {
    if from_len <= 1 || to_len <= 1 {
        return 0;
    }
    let step = step.min(from_len - 1);
    step * (to_len - 1) / (from_len - 1)
}

/// Normalized playback position in `[0, 1]`.
///
/// Single writer: only the playback driver (or an interactive control standing in for it)
/// calls [`ScrubState::set`]. Writes are clamped; the last value survives cancellation.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScrubState {
    value: f64,
}

impl ScrubState {
    /// Start at `value`, clamped into `[0, 1]`.
    pub fn new(value: f64) -> Self {
        let mut s = Self::default();
        s.set(value);
        s
    }

    /// Current value.
    pub fn get(self) -> f64 {
        self.value
    }

    /// Overwrite the value; non-finite input is ignored.
    pub fn set(&mut self, value: f64) {
        if value.is_finite() {
            self.value = value.clamp(0.0, 1.0);
        }
    }

    /// Time index for a dataset of `length` samples.
    pub fn index_for(self, length: usize) -> usize {
        index_for(self.value, length)
    }
}

/// Inclusive scrub interval used for segments and loops.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScrubBounds {
    /// Start value.
    pub from: f64,
    /// End value; may be below `from` to play backwards.
    pub to: f64,
}

impl ScrubBounds {
    /// Validated constructor; both ends must lie in `[0, 1]`.
    pub fn new(from: f64, to: f64) -> OrbitResult<Self> {
        let b = Self { from, to };
        b.validate()?;
        Ok(b)
    }

    /// Full range `0 -> 1`.
    pub fn full() -> Self {
        Self { from: 0.0, to: 1.0 }
    }

    /// Reject values outside `[0, 1]`.
    pub fn validate(self) -> OrbitResult<()> {
        for v in [self.from, self.to] {
            if !(0.0..=1.0).contains(&v) {
                return Err(OrbitError::validation(format!(
                    "scrub bound {v} is outside [0, 1]"
                )));
            }
        }
        Ok(())
    }

    /// Scrub value at `progress` in `[0, 1]`.
    pub fn at(self, progress: f64) -> f64 {
        self.from + (self.to - self.from) * progress
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/scrub.rs"]
mod tests;
