//! Configuration types for the simulation.
//!
//! Every balance constant of the game lives here as a named value. Defaults
//! reproduce the classic 550x800 playfield tuned for 30 ticks per second.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Playfield geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayfieldConfig {
    /// Width of the visible playfield
    pub width: f64,
    /// Height of the visible playfield
    pub height: f64,
    /// Vertical position of the ground surface
    pub ground_y: f64,
}

impl Default for PlayfieldConfig {
    fn default() -> Self {
        Self {
            width: 550.0,
            height: 800.0,
            ground_y: 730.0,
        }
    }
}

/// Actor spawn point and silhouette size
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BirdConfig {
    /// Fixed horizontal position of every actor
    pub spawn_x: f64,
    /// Starting vertical position
    pub spawn_y: f64,
    /// Silhouette width in pixels
    pub width: u32,
    /// Silhouette height in pixels
    pub height: u32,
    /// Slack between the silhouette's bottom and the ground before it counts as a strike
    pub ground_margin: f64,
}

impl Default for BirdConfig {
    fn default() -> Self {
        Self {
            spawn_x: 230.0,
            spawn_y: 350.0,
            width: 68,
            height: 48,
            ground_margin: 10.0,
        }
    }
}

/// Vertical motion model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Base velocity set by an impulse (negative is up)
    pub impulse_velocity: f64,
    /// Downward acceleration `a` in `d = v0*t + 0.5*a*t^2`
    pub gravity: f64,
    /// Extra upward displacement applied while ascending
    pub ascent_bias: f64,
    /// Maximum downward displacement per tick
    pub terminal_displacement: f64,
    /// Tilt while climbing, in degrees
    pub max_climb_tilt: f64,
    /// Tilt lost per tick while diving
    pub tilt_decay: f64,
    /// Steepest dive tilt
    pub max_dive_tilt: f64,
    /// Tilt stays at climb until the actor sinks this far below its last impulse height
    pub climb_hold_band: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            impulse_velocity: -10.5,
            gravity: 3.0,
            ascent_bias: 3.0,
            terminal_displacement: 12.0,
            max_climb_tilt: 25.0,
            tilt_decay: 20.0,
            max_dive_tilt: -90.0,
            climb_hold_band: 50.0,
        }
    }
}

/// Obstacle pair geometry and motion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipeConfig {
    /// Leftward movement per tick
    pub velocity: f64,
    /// Vertical size of the pass-through gap
    pub gap: f64,
    /// Lowest gap-top height (inclusive)
    pub min_gap_top: i32,
    /// Highest gap-top height (exclusive)
    pub max_gap_top: i32,
    /// Obstacle sprite width
    pub width: u32,
    /// Obstacle sprite height
    pub height: u32,
    /// Where the first pair of a generation appears
    pub initial_x: f64,
    /// Where each replacement pair appears
    pub spawn_x: f64,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            velocity: 5.0,
            gap: 250.0,
            min_gap_top: 40,
            max_gap_top: 450,
            width: 104,
            height: 640,
            initial_x: 700.0,
            spawn_x: 700.0,
        }
    }
}

/// Scrolling ground loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    /// Width of one ground tile
    pub tile_width: f64,
    /// Leftward movement per tick; matches the obstacle velocity by default
    pub velocity: f64,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            tile_width: 672.0,
            velocity: 5.0,
        }
    }
}

/// Fitness shaping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Added to every living actor each tick
    pub survival: f64,
    /// Added to every living actor when a pair is passed
    pub pass: f64,
    /// Subtracted from an actor that hits an obstacle
    pub collision_penalty: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            survival: 0.1,
            pass: 5.0,
            collision_penalty: 1.0,
        }
    }
}

/// How actor/obstacle overlap is decided
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CollisionMode {
    /// Per-pixel silhouette masks
    #[default]
    PixelMask,
    /// Axis-aligned boxes; the actor's box is shrunk by `inset` pixels on
    /// every side to approximate the transparent corners of the sprite
    BoundingBox { inset: i32 },
}

/// Which pair feeds each actor's observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairSelection {
    /// One active pair per tick, chosen with the population's leading actor
    #[default]
    LeadActor,
    /// Each actor looks at the first pair it has not yet cleared
    PerActor,
}

/// Configuration for evaluating one generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Seed for gap heights; generation `n` draws from `seed + n`
    pub seed: u64,
    /// Policy outputs above this flap
    pub decision_threshold: f64,
    pub pair_selection: PairSelection,
    pub collision: CollisionMode,
    /// Stop a generation after this many ticks even if actors remain
    pub max_ticks: Option<u64>,
    /// Real-time pacing; `None` runs as fast as possible
    pub tick_rate_hz: Option<u32>,
    pub playfield: PlayfieldConfig,
    pub bird: BirdConfig,
    pub physics: PhysicsConfig,
    pub pipe: PipeConfig,
    pub ground: GroundConfig,
    pub rewards: RewardConfig,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            decision_threshold: 0.5,
            pair_selection: PairSelection::default(),
            collision: CollisionMode::default(),
            max_ticks: None,
            tick_rate_hz: None,
            playfield: PlayfieldConfig::default(),
            bird: BirdConfig::default(),
            physics: PhysicsConfig::default(),
            pipe: PipeConfig::default(),
            ground: GroundConfig::default(),
            rewards: RewardConfig::default(),
        }
    }
}

impl EvaluatorConfig {
    /// Reject values the tick loop cannot work with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(Error::InvalidConfig(msg.to_string()));

        if self.playfield.ground_y <= 0.0 || self.playfield.ground_y > self.playfield.height {
            return invalid("ground_y must lie inside the playfield");
        }
        if self.bird.width == 0 || self.bird.height == 0 {
            return invalid("bird silhouette must be non-empty");
        }
        if self.bird.spawn_y < 0.0 || self.bird.spawn_y >= self.playfield.ground_y {
            return invalid("bird must spawn above the ground");
        }
        if self.pipe.min_gap_top >= self.pipe.max_gap_top {
            return invalid("min_gap_top must be below max_gap_top");
        }
        if self.pipe.gap <= 0.0 {
            return invalid("pipe gap must be positive");
        }
        if self.pipe.width == 0 || self.pipe.height == 0 {
            return invalid("pipe sprite must be non-empty");
        }
        if self.pipe.initial_x < 0.0 || self.pipe.spawn_x < 0.0 {
            return invalid("pipes must spawn at or right of the left boundary");
        }
        if self.bird.spawn_x < 0.0 || self.bird.spawn_x >= self.playfield.width {
            return invalid("bird must spawn inside the playfield");
        }
        if self.pipe.velocity <= 0.0 {
            return invalid("pipe velocity must be positive");
        }
        if self.ground.tile_width <= 0.0 {
            return invalid("ground tile width must be positive");
        }
        if self.physics.terminal_displacement <= 0.0 {
            return invalid("terminal displacement must be positive");
        }
        if !(self.physics.gravity > 0.0) {
            return invalid("gravity must be positive (downward)");
        }
        // First tick after an impulse is v0 + a/2; it has to point upwards
        if !(self.physics.impulse_velocity + 0.5 * self.physics.gravity < 0.0) {
            return invalid("impulse velocity must outweigh one tick of gravity");
        }
        if !(self.physics.ascent_bias >= 0.0) {
            return invalid("ascent bias must not be negative");
        }
        if self.tick_rate_hz == Some(0) {
            return invalid("tick_rate_hz must be positive when set");
        }
        if self.max_ticks == Some(0) {
            return invalid("max_ticks must be positive when set");
        }
        if let CollisionMode::BoundingBox { inset } = self.collision {
            let min_side = i64::from(self.bird.width.min(self.bird.height));
            if inset < 0 || 2 * i64::from(inset) >= min_side {
                return invalid("bounding box inset leaves no silhouette");
            }
        }

        Ok(())
    }
}

/// Configuration for the multi-generation driver
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Number of generations to evaluate
    pub generations: u32,
    /// Actors per generation
    pub population_size: usize,
    /// Seed for policy sampling
    pub seed: u64,
    /// Policy weights are drawn uniformly from `[-weight_range, weight_range]`
    pub weight_range: f64,
    pub evaluator: EvaluatorConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            generations: 100,
            population_size: 50,
            seed: 0,
            weight_range: 1.0,
            evaluator: EvaluatorConfig::default(),
        }
    }
}

impl DriverConfig {
    /// Load from a JSON file. Missing fields fall back to defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: DriverConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(Error::InvalidConfig("population_size must be positive".to_string()));
        }
        if !(self.weight_range > 0.0) {
            return Err(Error::InvalidConfig("weight_range must be positive".to_string()));
        }
        self.evaluator.validate()
    }
}
