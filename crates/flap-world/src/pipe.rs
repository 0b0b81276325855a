//! Obstacle pairs: a top and a bottom obstacle sharing one gap.

use flap_core::{PipeConfig, Rect};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipePair {
    pub x: f64,
    /// Lower edge of the top obstacle
    gap_top: f64,
    gap: f64,
    passed: bool,
}

impl PipePair {
    /// New pair at `x` with a gap height drawn from the configured range.
    pub fn spawn<R: Rng + ?Sized>(x: f64, config: &PipeConfig, rng: &mut R) -> Self {
        let gap_top = rng.gen_range(config.min_gap_top..config.max_gap_top) as f64;
        Self::with_gap_top(x, gap_top, config)
    }

    /// New pair with an explicit gap height
    pub fn with_gap_top(x: f64, gap_top: f64, config: &PipeConfig) -> Self {
        Self {
            x,
            gap_top,
            gap: config.gap,
            passed: false,
        }
    }

    pub fn gap_top(&self) -> f64 {
        self.gap_top
    }

    /// Upper edge of the bottom obstacle
    pub fn gap_bottom(&self) -> f64 {
        self.gap_top + self.gap
    }

    /// Vertical position of the top obstacle's sprite
    pub fn top_y(&self, config: &PipeConfig) -> f64 {
        self.gap_top - config.height as f64
    }

    pub fn trailing_edge(&self, config: &PipeConfig) -> f64 {
        self.x + config.width as f64
    }

    pub fn advance(&mut self, config: &PipeConfig) {
        self.x -= config.velocity;
    }

    /// Trailing edge has scrolled past the left boundary
    pub fn is_offscreen(&self, config: &PipeConfig) -> bool {
        self.trailing_edge(config) < 0.0
    }

    pub fn is_passed(&self) -> bool {
        self.passed
    }

    /// Set the passed flag. Returns true only the first time.
    pub fn mark_passed(&mut self) -> bool {
        !std::mem::replace(&mut self.passed, true)
    }

    /// Screen boxes of the top and bottom obstacle
    pub fn rects(&self, config: &PipeConfig) -> (Rect, Rect) {
        let x = self.x.round() as i32;
        let (w, h) = (config.width as i32, config.height as i32);
        (
            Rect::new(x, self.top_y(config).round() as i32, w, h),
            Rect::new(x, self.gap_bottom().round() as i32, w, h),
        )
    }
}
