use std::collections::BTreeMap;

use crate::{
    foundation::core::{Color, Position},
    foundation::error::{OrbitError, OrbitResult},
    render::state::EntityId,
};

/// How an entity leaves a trail.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum TraceStyle {
    /// No trail.
    #[default]
    Off,
    /// Polyline growing with playback; samples every `stride` steps plus the current one.
    Accumulate {
        /// Step spacing of the kept samples.
        #[serde(default = "default_stride")]
        stride: usize,
    },
    /// Whole path drawn up front as a static curve.
    Full {
        /// Step spacing of the drawn samples.
        #[serde(default = "default_stride")]
        stride: usize,
    },
}

fn default_stride() -> usize {
    1
}

impl TraceStyle {
    /// Accumulating trail sampling every step.
    pub fn accumulate() -> Self {
        Self::Accumulate { stride: 1 }
    }

    /// Reject a zero stride.
    pub fn validate(self) -> OrbitResult<()> {
        match self {
            Self::Accumulate { stride: 0 } | Self::Full { stride: 0 } => {
                Err(OrbitError::validation("trace stride must be >= 1"))
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn accumulating_stride(self) -> Option<usize> {
        match self {
            Self::Accumulate { stride } => Some(stride.max(1)),
            _ => None,
        }
    }

    pub(crate) fn full_stride(self) -> Option<usize> {
        match self {
            Self::Full { stride } => Some(stride.max(1)),
            _ => None,
        }
    }
}

/// Step indices making up an accumulating trace at `step`: `0, s, 2s, .. <= step`, then `step`.
pub fn trace_indices(step: usize, stride: usize) -> impl Iterator<Item = usize> {
    let stride = stride.max(1);
    let tail = (step % stride != 0).then_some(step);
    (0..=step).step_by(stride).chain(tail)
}

/// Number of leading samples shared by the traces at `prev` and `next`.
pub(crate) fn shared_prefix(prev: usize, next: usize, stride: usize) -> usize {
    let stride = stride.max(1);
    if prev == next {
        return trace_indices(prev, stride).count();
    }
    prev.min(next) / stride + 1
}

/// Incremental update of one trace polyline.
///
/// Receivers truncate their polyline to `keep` points, then append `appended`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TraceDelta {
    /// Traced entity.
    pub id: EntityId,
    /// Points of the previous polyline that survive.
    pub keep: usize,
    /// New points, in time order.
    pub appended: Vec<Position>,
    /// Stroke color for the whole polyline, taken from the entity's current step.
    ///
    /// Status-colored entities restroke their entire trace when their status changes.
    pub color: Color,
}

impl TraceDelta {
    /// Apply to a polyline held by a frontend.
    pub fn apply_to(&self, polyline: &mut Vec<Position>) {
        polyline.truncate(self.keep);
        polyline.extend_from_slice(&self.appended);
    }

    /// True when the delta leaves the polyline untouched.
    pub fn is_noop(&self, current_len: usize) -> bool {
        self.appended.is_empty() && self.keep == current_len
    }
}

/// Last step each accumulating trace was sent at.
///
/// Lives next to the scrub state so the render itself stays pure.
#[derive(Clone, Debug, Default)]
pub struct TraceBook {
    sent: BTreeMap<EntityId, usize>,
}

impl TraceBook {
    /// Empty book; the next delta for every entity starts from scratch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every trace.
    pub fn clear(&mut self) {
        self.sent.clear();
    }

    /// Step last sent for `id`.
    pub fn last_step(&self, id: &EntityId) -> Option<usize> {
        self.sent.get(id).copied()
    }

    /// Record that `id` now shows step `step`; returns how many existing points survive and the
    /// step indices to append.
    pub(crate) fn advance(
        &mut self,
        id: &EntityId,
        step: usize,
        stride: usize,
    ) -> (usize, Vec<usize>) {
        let keep = match self.sent.get(id) {
            Some(&prev) => shared_prefix(prev, step, stride),
            None => 0,
        };
        self.sent.insert(id.clone(), step);
        let appended = trace_indices(step, stride).skip(keep).collect();
        (keep, appended)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/trace.rs"]
mod tests;
