use std::collections::BTreeMap;
use std::io::Write;

use anyhow::Context as _;

use crate::{
    foundation::core::{Color, Fps, Position},
    foundation::error::OrbitResult,
    render::state::{EntityId, RenderFrame},
    render::trace::TraceDelta,
};

/// Scene element that never moves, given in display coordinates.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum StaticPrimitive {
    /// Dot, optionally labelled (L1, Earth, ...).
    Marker {
        at: Position,
        color: Color,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    /// Circle outline.
    Circle {
        center: Position,
        radius: f64,
        color: Color,
    },
    /// Straight segment.
    Line {
        from: Position,
        to: Position,
        color: Color,
    },
    /// Free-standing text.
    Label {
        text: String,
        at: Position,
        color: Color,
    },
    /// Complete trajectory of an entity drawn up front.
    Path {
        id: EntityId,
        points: Vec<Position>,
        color: Color,
    },
}

/// Configuration handed to a [`Frontend`] before the first tick.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FrontendConfig {
    /// Tick rate of the driver.
    pub fps: Fps,
    /// Entities per frame.
    pub entity_count: usize,
    /// Everything drawn once.
    pub statics: Vec<StaticPrimitive>,
}

/// One presented tick.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Tick {
    /// Zero-based tick counter over the driver's lifetime; gaps mark elided frames.
    pub index: u64,
    /// Playback clock at this tick, in seconds.
    pub clock_secs: f64,
    /// Entity state.
    pub frame: RenderFrame,
    /// Trace updates since the previous presented tick.
    pub traces: Vec<TraceDelta>,
}

/// Consumer of rendered ticks; the engine never draws itself.
///
/// Ordering contract: `begin` once, then `present` with strictly increasing tick indices, then
/// `end` once.
pub trait Frontend {
    /// Called once before any tick.
    fn begin(&mut self, cfg: &FrontendConfig) -> OrbitResult<()>;
    /// Present one tick.
    fn present(&mut self, tick: &Tick) -> OrbitResult<()>;
    /// Called once after the last tick.
    fn end(&mut self) -> OrbitResult<()>;
}

impl<F: Frontend + ?Sized> Frontend for &mut F {
    fn begin(&mut self, cfg: &FrontendConfig) -> OrbitResult<()> {
        (**self).begin(cfg)
    }

    fn present(&mut self, tick: &Tick) -> OrbitResult<()> {
        (**self).present(tick)
    }

    fn end(&mut self) -> OrbitResult<()> {
        (**self).end()
    }
}

/// In-memory frontend for tests and debugging; also rebuilds trace polylines from deltas.
#[derive(Debug, Default)]
pub struct InMemoryFrontend {
    cfg: Option<FrontendConfig>,
    ticks: Vec<Tick>,
    polylines: BTreeMap<EntityId, Vec<Position>>,
    ended: bool,
}

impl InMemoryFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<&FrontendConfig> {
        self.cfg.as_ref()
    }

    /// Presented ticks, in order.
    pub fn ticks(&self) -> &[Tick] {
        &self.ticks
    }

    /// Last presented tick.
    pub fn last(&self) -> Option<&Tick> {
        self.ticks.last()
    }

    /// Current polyline of a traced entity.
    pub fn polyline(&self, id: &EntityId) -> Option<&[Position]> {
        self.polylines.get(id).map(Vec::as_slice)
    }

    /// Whether `end` was called.
    pub fn ended(&self) -> bool {
        self.ended
    }
}

impl Frontend for InMemoryFrontend {
    fn begin(&mut self, cfg: &FrontendConfig) -> OrbitResult<()> {
        self.cfg = Some(cfg.clone());
        self.ticks.clear();
        self.polylines.clear();
        self.ended = false;
        Ok(())
    }

    fn present(&mut self, tick: &Tick) -> OrbitResult<()> {
        for delta in &tick.traces {
            delta.apply_to(self.polylines.entry(delta.id.clone()).or_default());
        }
        self.ticks.push(tick.clone());
        Ok(())
    }

    fn end(&mut self) -> OrbitResult<()> {
        self.ended = true;
        Ok(())
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
enum Event<'a> {
    Begin(&'a FrontendConfig),
    Tick(&'a Tick),
    End,
}

/// Writes one JSON object per line: a `begin` event, one `tick` per presented tick, then `end`.
pub struct JsonLinesFrontend<W: Write> {
    out: W,
    lines: u64,
}

impl<W: Write> JsonLinesFrontend<W> {
    pub fn new(out: W) -> Self {
        Self { out, lines: 0 }
    }

    /// Lines written so far.
    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_event(&mut self, event: &Event<'_>) -> OrbitResult<()> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n").context("write frame line")?;
        self.lines += 1;
        Ok(())
    }
}

impl<W: Write> Frontend for JsonLinesFrontend<W> {
    fn begin(&mut self, cfg: &FrontendConfig) -> OrbitResult<()> {
        self.write_event(&Event::Begin(cfg))
    }

    fn present(&mut self, tick: &Tick) -> OrbitResult<()> {
        self.write_event(&Event::Tick(tick))
    }

    fn end(&mut self) -> OrbitResult<()> {
        self.write_event(&Event::End)?;
        self.out.flush().context("flush frame output")?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frontend.rs"]
mod tests;
