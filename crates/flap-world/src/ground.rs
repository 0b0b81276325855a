//! Two-tile scrolling ground loop.

use flap_core::GroundConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ground {
    pub y: f64,
    tiles: [f64; 2],
}

impl Ground {
    pub fn new(y: f64, config: &GroundConfig) -> Self {
        Self {
            y,
            tiles: [0.0, config.tile_width],
        }
    }

    /// Left edges of both tiles
    pub fn tiles(&self) -> [f64; 2] {
        self.tiles
    }

    pub fn advance(&mut self, config: &GroundConfig) {
        let w = config.tile_width;
        self.tiles[0] -= config.velocity;
        self.tiles[1] -= config.velocity;

        if self.tiles[0] + w < 0.0 {
            self.tiles[0] = self.tiles[1] + w;
        }
        if self.tiles[1] + w < 0.0 {
            self.tiles[1] = self.tiles[0] + w;
        }
    }
}
