use crate::{
    dataset::trajectory::TrajectoryDataset,
    foundation::error::{OrbitError, OrbitResult},
};

/// Outcome class of a spacecraft, used only to pick its color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    /// Still in flight.
    Nominal,
    /// Fell back to the departure body.
    Returned,
    /// Reached the target region.
    Arrived,
    /// Ballistically captured by the target body.
    Captured,
}

impl EntityStatus {
    /// Every status, in code order.
    pub const ALL: [Self; 4] = [Self::Nominal, Self::Returned, Self::Arrived, Self::Captured];

    /// Integer code used in status tracks.
    pub fn code(self) -> i64 {
        self as i64
    }

    /// Inverse of [`EntityStatus::code`].
    pub fn from_code(code: i64) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }
}

/// Integer status codes for a point cloud, either constant or one row per time step.
///
/// Layout is `[steps][entities]`, `steps` being 1 (constant) or the companion dataset's `T`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusTrack {
    steps: usize,
    entities: usize,
    codes: Vec<i64>,
}

impl StatusTrack {
    /// Build from a dense `[steps, entities]` array.
    pub fn new(steps: usize, entities: usize, codes: Vec<i64>) -> OrbitResult<Self> {
        if steps == 0 || entities == 0 {
            return Err(OrbitError::shape("status track must not have an empty axis"));
        }
        let expected = steps.checked_mul(entities).ok_or_else(|| {
            OrbitError::shape(format!("status track [{steps}, {entities}] is too large"))
        })?;
        if codes.len() != expected {
            return Err(OrbitError::shape(format!(
                "status track [{steps}, {entities}] needs {expected} codes, got {}",
                codes.len()
            )));
        }
        Ok(Self {
            steps,
            entities,
            codes,
        })
    }

    /// One fixed code per entity.
    pub fn constant(codes: Vec<i64>) -> OrbitResult<Self> {
        Self::new(1, codes.len(), codes)
    }

    /// Number of rows (1 when constant).
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// True when the same row applies at every step.
    pub fn is_constant(&self) -> bool {
        self.steps == 1
    }

    /// Check that this track can color `dataset`.
    pub fn check_against(&self, dataset: &TrajectoryDataset) -> OrbitResult<()> {
        if self.entities != dataset.entity_count() {
            return Err(OrbitError::shape(format!(
                "status track has {} entities, dataset '{}' has {}",
                self.entities,
                dataset.name(),
                dataset.entity_count()
            )));
        }
        if self.steps != 1 && self.steps != dataset.len() {
            return Err(OrbitError::shape(format!(
                "status track has {} steps, dataset '{}' has {}",
                self.steps,
                dataset.name(),
                dataset.len()
            )));
        }
        Ok(())
    }

    /// Status code of `entity` at dataset step `step`.
    pub fn code_at(&self, step: usize, entity: usize) -> OrbitResult<i64> {
        let row = if self.is_constant() { 0 } else { step };
        if row >= self.steps {
            return Err(OrbitError::index("time step", step, self.steps));
        }
        if entity >= self.entities {
            return Err(OrbitError::index("entity", entity, self.entities));
        }
        Ok(self.codes[row * self.entities + entity])
    }

    /// Distinct codes in ascending order.
    pub fn distinct_codes(&self) -> Vec<i64> {
        let mut v = self.codes.clone();
        v.sort_unstable();
        v.dedup();
        v
    }
}

/// An entity index into a dataset, either fixed or chosen per time step.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum IndexTrack {
    /// Same entity at every step.
    Constant(usize),
    /// One entity per step; length must equal the dataset's `T`.
    PerStep(Vec<usize>),
}

impl IndexTrack {
    /// Check length and every index against `dataset`.
    pub fn check_against(&self, dataset: &TrajectoryDataset) -> OrbitResult<()> {
        let n = dataset.entity_count();
        match self {
            Self::Constant(i) => {
                if *i >= n {
                    return Err(OrbitError::index("entity", *i, n));
                }
            }
            Self::PerStep(v) => {
                // A length-1 array is the usual "single fixed index" export.
                if v.len() != 1 && v.len() != dataset.len() {
                    return Err(OrbitError::shape(format!(
                        "index track has {} steps, dataset '{}' has {}",
                        v.len(),
                        dataset.name(),
                        dataset.len()
                    )));
                }
                if let Some(&i) = v.iter().find(|&&i| i >= n) {
                    return Err(OrbitError::index("entity", i, n));
                }
            }
        }
        Ok(())
    }

    /// Entity selected at dataset step `step`.
    pub fn at(&self, step: usize) -> OrbitResult<usize> {
        match self {
            Self::Constant(i) => Ok(*i),
            Self::PerStep(v) if v.len() == 1 => Ok(v[0]),
            Self::PerStep(v) => v
                .get(step)
                .copied()
                .ok_or_else(|| OrbitError::index("time step", step, v.len())),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dataset/tracks.rs"]
mod tests;
