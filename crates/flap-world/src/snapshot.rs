//! Per-tick frame state handed to renderers and recorders.

use crate::generation::GenerationOutcome;
use flap_core::{ActorId, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirdFrame {
    pub id: ActorId,
    pub x: f64,
    pub y: f64,
    pub tilt: f64,
    pub fitness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipeFrame {
    pub x: f64,
    /// Sprite position of the top obstacle
    pub top_y: f64,
    pub gap_top: f64,
    pub gap_bottom: f64,
    pub passed: bool,
}

/// What a renderer needs to draw one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub generation: u64,
    pub tick: u64,
    /// Obstacle pairs cleared so far
    pub score: u32,
    pub birds: Vec<BirdFrame>,
    pub pipes: Vec<PipeFrame>,
    pub ground_y: f64,
    pub ground_tiles: [f64; 2],
}

/// Receives frames from the evaluator.
///
/// Both methods default to no-ops; the simulation never depends on whether
/// or how frames are displayed.
pub trait FrameSink {
    /// Called once per tick after all removals are committed.
    fn on_frame(&mut self, _frame: &FrameSnapshot) -> Result<()> {
        Ok(())
    }

    /// Called once when a generation terminates.
    fn on_generation_end(&mut self, _outcome: &GenerationOutcome) -> Result<()> {
        Ok(())
    }
}

/// Discards everything.
pub struct NoopSink;

impl FrameSink for NoopSink {}

/// Keeps every frame in memory.
#[derive(Debug, Default)]
pub struct FrameRecorder {
    pub frames: Vec<FrameSnapshot>,
    pub outcomes: Vec<GenerationOutcome>,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameSink for FrameRecorder {
    fn on_frame(&mut self, frame: &FrameSnapshot) -> Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn on_generation_end(&mut self, outcome: &GenerationOutcome) -> Result<()> {
        self.outcomes.push(outcome.clone());
        Ok(())
    }
}

/// Writes one JSON object per line.
///
/// Every `every`-th frame is written; generation summaries are always written.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    every: u64,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Line<'a> {
    Frame(&'a FrameSnapshot),
    Generation(&'a GenerationOutcome),
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, every: 1 }
    }

    /// Only write frames whose tick is a multiple of `every`.
    pub fn every(mut self, every: u64) -> Self {
        self.every = every.max(1);
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, line: &Line<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.writer, line)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

impl<W: Write> FrameSink for JsonLinesSink<W> {
    fn on_frame(&mut self, frame: &FrameSnapshot) -> Result<()> {
        if frame.tick % self.every == 0 {
            self.write_line(&Line::Frame(frame))?;
        }
        Ok(())
    }

    fn on_generation_end(&mut self, outcome: &GenerationOutcome) -> Result<()> {
        self.write_line(&Line::Generation(outcome))?;
        self.writer.flush()?;
        Ok(())
    }
}
