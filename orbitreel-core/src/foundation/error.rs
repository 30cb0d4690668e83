/// Convenience result type used across orbitreel.
pub type OrbitResult<T> = Result<T, OrbitError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum OrbitError {
    /// Entity or time-step counts of trajectory data do not line up.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A time step or entity index resolved outside its array.
    #[error("index out of range: {what} index {index} (len {len})")]
    IndexOutOfRange {
        /// Which axis was indexed (`"time step"`, `"entity"`, ...).
        what: &'static str,
        /// Offending index.
        index: usize,
        /// Length of the indexed axis.
        len: usize,
    },

    /// A status code has no entry in the configured palette.
    #[error("unknown status code: {code} (palette has {palette_len} entries)")]
    UnknownStatusCode {
        /// Offending status code.
        code: i64,
        /// Number of palette entries.
        palette_len: usize,
    },

    /// A transform was requested between incompatible frame specs.
    #[error("frame spec error: {0}")]
    FrameSpec(String),

    /// Invalid user-provided configuration values.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OrbitError {
    /// Build a [`OrbitError::ShapeMismatch`] value.
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    /// Build a [`OrbitError::IndexOutOfRange`] value.
    pub fn index(what: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { what, index, len }
    }

    /// Build a [`OrbitError::FrameSpec`] value.
    pub fn frame_spec(msg: impl Into<String>) -> Self {
        Self::FrameSpec(msg.into())
    }

    /// Build a [`OrbitError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`OrbitError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// True for errors that only affect cosmetics and are recovered locally.
    pub fn is_cosmetic(&self) -> bool {
        matches!(self, Self::UnknownStatusCode { .. })
    }
}

impl From<serde_json::Error> for OrbitError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
