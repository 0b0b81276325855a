//! Actor state and per-tick motion.

use crate::physics::{self, VerticalMotion};
use flap_core::{ActorId, BirdConfig, PhysicsConfig, PlayfieldConfig, Position, Rect};
use serde::{Deserialize, Serialize};

/// One simulated actor. `x` never changes after spawn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bird {
    pub id: ActorId,
    x: f64,
    pub y: f64,
    pub motion: VerticalMotion,
    /// Cosmetic pitch in degrees
    pub tilt: f64,
    /// Height at which the last impulse was issued
    pub impulse_y: f64,
    width: u32,
    height: u32,
}

impl Bird {
    pub fn new(id: ActorId, config: &BirdConfig) -> Self {
        Self {
            id,
            x: config.spawn_x,
            y: config.spawn_y,
            motion: VerticalMotion::new(),
            tilt: 0.0,
            impulse_y: config.spawn_y,
            width: config.width,
            height: config.height,
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Occupied box in integer pixels
    pub fn bounds(&self) -> Rect {
        let (x, y) = self.position().to_pixel();
        Rect::new(x, y, self.width as i32, self.height as i32)
    }

    /// Integrate one tick of vertical motion. Returns the displacement applied.
    pub fn advance(&mut self, physics: &PhysicsConfig) -> f64 {
        let d = self.motion.step(physics);
        self.y += d;
        self.tilt = physics::next_tilt(physics, self.tilt, d, self.y, self.impulse_y);
        d
    }

    /// The only control input.
    pub fn flap(&mut self, physics: &PhysicsConfig) {
        self.motion.impulse(physics);
        self.impulse_y = self.y;
    }

    /// Struck the ground or left through the top.
    pub fn is_out_of_bounds(&self, config: &BirdConfig, playfield: &PlayfieldConfig) -> bool {
        self.y + self.height as f64 - config.ground_margin >= playfield.ground_y || self.y < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bird_creation() {
        let bird = Bird::new(ActorId(3), &BirdConfig::default());
        assert_eq!(bird.id, ActorId(3));
        assert_eq!(bird.position(), Position::new(230.0, 350.0));
        assert_eq!(bird.bounds(), Rect::new(230, 350, 68, 48));
    }

    #[test]
    fn test_x_is_fixed() {
        let physics = PhysicsConfig::default();
        let mut bird = Bird::new(ActorId(0), &BirdConfig::default());
        for i in 0..20 {
            if i % 4 == 0 {
                bird.flap(&physics);
            }
            bird.advance(&physics);
            assert_eq!(bird.x(), 230.0);
        }
    }

    #[test]
    fn test_flap_lifts() {
        let physics = PhysicsConfig::default();
        let mut bird = Bird::new(ActorId(0), &BirdConfig::default());
        bird.flap(&physics);
        bird.advance(&physics);
        assert_eq!(bird.y, 338.0);
        assert_eq!(bird.tilt, physics.max_climb_tilt);
    }

    #[test]
    fn test_out_of_bounds() {
        let config = BirdConfig::default();
        let playfield = PlayfieldConfig::default();
        let mut bird = Bird::new(ActorId(0), &config);

        bird.y = 691.9;
        assert!(!bird.is_out_of_bounds(&config, &playfield));
        bird.y = 692.0;
        assert!(bird.is_out_of_bounds(&config, &playfield));
        bird.y = -0.1;
        assert!(bird.is_out_of_bounds(&config, &playfield));
        bird.y = 0.0;
        assert!(!bird.is_out_of_bounds(&config, &playfield));
    }
}
