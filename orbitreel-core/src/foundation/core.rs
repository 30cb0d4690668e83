use std::fmt;

use crate::foundation::error::{OrbitError, OrbitResult};

pub use kurbo::{Affine, Point, Vec2};

/// Dimensionality of trajectory samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Dims {
    /// Planar `(x, y)` samples.
    Two,
    /// Spatial `(x, y, z)` samples.
    Three,
}

impl Dims {
    /// Map a raw component count onto [`Dims`].
    pub fn from_len(len: usize) -> OrbitResult<Self> {
        match len {
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            n => Err(OrbitError::shape(format!(
                "positions must have 2 or 3 components, got {n}"
            ))),
        }
    }

    /// Number of components per sample.
    pub fn len(self) -> usize {
        match self {
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

impl TryFrom<u8> for Dims {
    type Error = OrbitError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Self::from_len(usize::from(v))
    }
}

impl From<Dims> for u8 {
    fn from(d: Dims) -> Self {
        d.len() as u8
    }
}

/// A single trajectory sample. Planar data keeps `z == 0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Position {
    /// x coordinate.
    pub x: f64,
    /// y coordinate.
    pub y: f64,
    /// z coordinate (0 for planar data).
    #[serde(default)]
    pub z: f64,
}

impl Position {
    /// Origin.
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Planar position.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Spatial position.
    pub const fn new3(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Build a position from a raw component row of length 2 or 3.
    pub fn from_components(row: &[f64]) -> OrbitResult<Self> {
        match *row {
            [x, y] => Ok(Self::new(x, y)),
            [x, y, z] => Ok(Self::new3(x, y, z)),
            _ => Err(OrbitError::shape(format!(
                "positions must have 2 or 3 components, got {}",
                row.len()
            ))),
        }
    }

    /// Projection onto the xy plane.
    pub fn xy(self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Replace the planar part, keeping `z`.
    pub fn with_xy(self, p: Point) -> Self {
        Self {
            x: p.x,
            y: p.y,
            z: self.z,
        }
    }

    /// Apply a planar affine map to the xy part; `z` passes through.
    pub fn map_xy(self, affine: Affine) -> Self {
        self.with_xy(affine * self.xy())
    }

    /// Component-wise sum.
    pub fn add(self, o: Self) -> Self {
        Self::new3(self.x + o.x, self.y + o.y, self.z + o.z)
    }

    /// Component-wise difference.
    pub fn sub(self, o: Self) -> Self {
        Self::new3(self.x - o.x, self.y - o.y, self.z - o.z)
    }

    /// Uniform scale.
    pub fn scale(self, k: f64) -> Self {
        Self::new3(self.x * k, self.y * k, self.z * k)
    }

    /// Linear interpolation between `self` and `o`.
    pub fn lerp(self, o: Self, t: f64) -> Self {
        self.add(o.sub(self).scale(t))
    }

    /// Euclidean distance.
    pub fn distance(self, o: Self) -> f64 {
        let d = self.sub(o);
        (d.x * d.x + d.y * d.y + d.z * d.z).sqrt()
    }

    /// True when every coordinate is finite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Coordinate on `axis`.
    pub fn get(self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Copy with coordinate on `axis` replaced.
    pub fn with(mut self, axis: Axis, v: f64) -> Self {
        match axis {
            Axis::X => self.x = v,
            Axis::Y => self.y = v,
            Axis::Z => self.z = v,
        }
        self
    }
}

/// Coordinate axis selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// x axis.
    X,
    /// y axis.
    Y,
    /// z axis.
    Z,
}

/// Tick rate of the playback loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator.
    pub num: u32,
    /// Denominator, must be > 0.
    pub den: u32,
}

impl Fps {
    /// Validated constructor.
    pub fn new(num: u32, den: u32) -> OrbitResult<Self> {
        if den == 0 {
            return Err(OrbitError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(OrbitError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Ticks per second.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Seconds per tick.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Seconds covered by `frames` ticks.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }

    /// Ticks needed to cover `secs`, rounding up.
    pub fn secs_to_frames_ceil(self, secs: f64) -> u64 {
        // Absorb float noise so that e.g. 1.0s at 30fps is 30 ticks, not 31.
        let frames = secs * self.as_f64();
        (frames - 1e-9).ceil().max(0.0) as u64
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self { num: 30, den: 1 }
    }
}

/// Straight (non-premultiplied) RGBA8 color.
///
/// Serialized as `#rrggbb` / `#rrggbbaa`; deserialization also accepts the named colors listed on
/// [`Color::named`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Color {
    /// `#ffffff`
    pub const WHITE: Self = Self::rgb(0xff, 0xff, 0xff);
    /// `#888888`
    pub const GRAY: Self = Self::rgb(0x88, 0x88, 0x88);
    /// `#58c4dd`
    pub const BLUE: Self = Self::rgb(0x58, 0xc4, 0xdd);
    /// `#fc6255`
    pub const RED: Self = Self::rgb(0xfc, 0x62, 0x55);
    /// `#ffff00`
    pub const YELLOW: Self = Self::rgb(0xff, 0xff, 0x00);
    /// `#83c167`
    pub const GREEN: Self = Self::rgb(0x83, 0xc1, 0x67);
    /// `#89fe05`
    pub const LIME_GREEN: Self = Self::rgb(0x89, 0xfe, 0x05);
    /// `#9a72ac`
    pub const PURPLE: Self = Self::rgb(0x9a, 0x72, 0xac);

    /// Opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    /// Copy with alpha replaced by `opacity` in `[0, 1]`.
    pub fn with_opacity(self, opacity: f64) -> Self {
        Self {
            a: (opacity.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }

    /// Look up one of the built-in color names.
    pub fn named(name: &str) -> Option<Self> {
        let c = match name.to_ascii_lowercase().as_str() {
            "white" => Self::WHITE,
            "gray" | "grey" => Self::GRAY,
            "blue" => Self::BLUE,
            "red" => Self::RED,
            "yellow" => Self::YELLOW,
            "green" => Self::GREEN,
            "lime_green" | "limegreen" => Self::LIME_GREEN,
            "purple" => Self::PURPLE,
            _ => return None,
        };
        Some(c)
    }

    /// Parse `#rrggbb`, `#rrggbbaa` or a built-in name.
    pub fn parse(s: &str) -> OrbitResult<Self> {
        let s = s.trim();
        if let Some(c) = Self::named(s) {
            return Ok(c);
        }
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| OrbitError::validation(format!("unknown color '{s}'")))?;
        let byte = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| OrbitError::validation(format!("malformed hex color '{s}'")))
        };
        match hex.len() {
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: byte(6)?,
            }),
            _ => Err(OrbitError::validation(format!(
                "malformed hex color '{s}'"
            ))),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 0xff {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Color {
    type Error = OrbitError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
