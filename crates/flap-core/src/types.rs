//! Core type definitions shared by the simulation and its collaborators.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an actor within one generation.
///
/// Ids are assigned from the population order, so `ActorId(i)` is always the
/// `i`-th policy handed to the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u32);

impl ActorId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor-{}", self.0)
    }
}

/// Screen-space position in playfield units. `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Nearest integer pixel.
    pub fn to_pixel(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }
}

/// Axis-aligned rectangle in integer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// True when the rectangles share at least one pixel. Touching edges do
    /// not count.
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Shrink every side by `inset` pixels.
    pub fn inset(&self, inset: i32) -> Self {
        Self {
            x: self.x + inset,
            y: self.y + inset,
            width: (self.width - 2 * inset).max(0),
            height: (self.height - 2 * inset).max(0),
        }
    }
}

/// What a policy sees each tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Observation {
    /// Actor's vertical position
    pub actor_y: f64,
    /// Vertical distance to the active gap's upper edge
    pub to_gap_top: f64,
    /// Vertical distance to the active gap's lower edge
    pub to_gap_bottom: f64,
}

impl Observation {
    pub fn new(actor_y: f64, gap_top: f64, gap_bottom: f64) -> Self {
        Self {
            actor_y,
            to_gap_top: (actor_y - gap_top).abs(),
            to_gap_bottom: (actor_y - gap_bottom).abs(),
        }
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.actor_y, self.to_gap_top, self.to_gap_bottom]
    }
}

/// The single binary control an actor has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Idle,
    Flap,
}

impl Action {
    /// A signal strictly above `threshold` means flap.
    pub fn from_signal(signal: f64, threshold: f64) -> Self {
        if signal > threshold {
            Action::Flap
        } else {
            Action::Idle
        }
    }
}

/// Why an actor left the live set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalCause {
    /// Overlapped an obstacle
    Collision,
    /// Struck the ground or left through the top of the playfield
    OutOfBounds,
}

impl fmt::Display for RemovalCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemovalCause::Collision => write!(f, "collision"),
            RemovalCause::OutOfBounds => write!(f, "out_of_bounds"),
        }
    }
}
