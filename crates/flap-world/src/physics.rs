//! Vertical motion model.
//!
//! Displacement is a pure function of the ticks elapsed since the last
//! impulse: `d = v0*t + 0.5*a*t^2`, biased upwards while ascending and
//! clamped to a terminal value while descending.

use flap_core::PhysicsConfig;
use serde::{Deserialize, Serialize};

/// Displacement for the `t`-th tick after an impulse with base velocity `v0`.
pub fn displacement(physics: &PhysicsConfig, v0: f64, t: u32) -> f64 {
    let t = t as f64;
    let mut d = v0 * t + 0.5 * physics.gravity * t * t;

    if d < 0.0 {
        d -= physics.ascent_bias;
    }

    d.min(physics.terminal_displacement)
}

/// Integrator state of one actor
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VerticalMotion {
    /// `v0`, set by the last impulse
    pub base_velocity: f64,
    /// `t`, ticks since the last impulse
    pub ticks_since_impulse: u32,
}

impl VerticalMotion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the clock and launch upwards. Repeating it within a tick
    /// changes nothing.
    pub fn impulse(&mut self, physics: &PhysicsConfig) {
        self.base_velocity = physics.impulse_velocity;
        self.ticks_since_impulse = 0;
    }

    /// Advance one tick and return this tick's displacement.
    pub fn step(&mut self, physics: &PhysicsConfig) -> f64 {
        self.ticks_since_impulse = self.ticks_since_impulse.saturating_add(1);
        displacement(physics, self.base_velocity, self.ticks_since_impulse)
    }
}

/// Cosmetic pitch for the next frame, in degrees.
///
/// Snaps to the climb angle while rising or still near the height of the last
/// impulse, otherwise decays towards the dive angle.
pub fn next_tilt(physics: &PhysicsConfig, tilt: f64, displacement: f64, y: f64, impulse_y: f64) -> f64 {
    if displacement < 0.0 || y < impulse_y + physics.climb_hold_band {
        physics.max_climb_tilt
    } else {
        (tilt - physics.tilt_decay).max(physics.max_dive_tilt)
    }
}
