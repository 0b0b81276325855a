//! Actor/obstacle overlap test.
//!
//! The reference behaviour compares silhouette masks pixel by pixel. The
//! bounding-box mode is an approximation: it shrinks the actor's box by a
//! configurable inset to stand in for the transparent sprite corners.

use crate::bird::Bird;
use crate::mask::Mask;
use crate::pipe::PipePair;
use flap_core::{BirdConfig, CollisionMode, Error, PipeConfig, Result};

/// Silhouettes used by the pixel-mask mode
#[derive(Debug, Clone)]
pub struct Silhouettes {
    pub bird: Mask,
    pub top_pipe: Mask,
    pub bottom_pipe: Mask,
}

impl Silhouettes {
    /// Built-in shapes: an elliptical actor and solid obstacles.
    pub fn builtin(bird: &BirdConfig, pipe: &PipeConfig) -> Self {
        let bottom_pipe = Mask::filled(pipe.width, pipe.height);
        Self {
            bird: Mask::ellipse(bird.width, bird.height),
            top_pipe: bottom_pipe.flip_vertical(),
            bottom_pipe,
        }
    }

    /// Shapes taken from sprite alpha channels. The top obstacle is the
    /// bottom one mirrored.
    pub fn from_sprites(bird: Mask, pipe: Mask) -> Self {
        Self {
            bird,
            top_pipe: pipe.flip_vertical(),
            bottom_pipe: pipe,
        }
    }

    fn check_dimensions(&self, bird: &BirdConfig, pipe: &PipeConfig) -> Result<()> {
        if (self.bird.width(), self.bird.height()) != (bird.width, bird.height) {
            return Err(Error::InvalidConfig(format!(
                "bird mask is {}x{}, configured silhouette is {}x{}",
                self.bird.width(),
                self.bird.height(),
                bird.width,
                bird.height
            )));
        }
        if (self.bottom_pipe.width(), self.bottom_pipe.height()) != (pipe.width, pipe.height) {
            return Err(Error::InvalidConfig(format!(
                "pipe mask is {}x{}, configured sprite is {}x{}",
                self.bottom_pipe.width(),
                self.bottom_pipe.height(),
                pipe.width,
                pipe.height
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CollisionDetector {
    mode: CollisionMode,
    silhouettes: Silhouettes,
    pipe: PipeConfig,
}

impl CollisionDetector {
    pub fn new(mode: CollisionMode, bird: &BirdConfig, pipe: &PipeConfig) -> Self {
        Self {
            mode,
            silhouettes: Silhouettes::builtin(bird, pipe),
            pipe: pipe.clone(),
        }
    }

    /// Replace the built-in silhouettes. Mask sizes must match the
    /// configured sprite sizes.
    pub fn with_silhouettes(
        mut self,
        silhouettes: Silhouettes,
        bird: &BirdConfig,
    ) -> Result<Self> {
        silhouettes.check_dimensions(bird, &self.pipe)?;
        self.silhouettes = silhouettes;
        Ok(self)
    }

    pub fn mode(&self) -> CollisionMode {
        self.mode
    }

    /// True if the actor overlaps either obstacle of the pair.
    pub fn collides(&self, bird: &Bird, pipe: &PipePair) -> bool {
        match self.mode {
            CollisionMode::PixelMask => self.mask_overlap(bird, pipe),
            CollisionMode::BoundingBox { inset } => {
                let actor = bird.bounds().inset(inset);
                let (top, bottom) = pipe.rects(&self.pipe);
                actor.intersects(&top) || actor.intersects(&bottom)
            }
        }
    }

    fn mask_overlap(&self, bird: &Bird, pipe: &PipePair) -> bool {
        let origin = bird.bounds();
        let (top, bottom) = pipe.rects(&self.pipe);

        let top_offset = (top.x - origin.x, top.y - origin.y);
        let bottom_offset = (bottom.x - origin.x, bottom.y - origin.y);

        self.silhouettes.bird.overlaps(&self.silhouettes.top_pipe, top_offset)
            || self.silhouettes.bird.overlaps(&self.silhouettes.bottom_pipe, bottom_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flap_core::ActorId;

    fn setup(mode: CollisionMode) -> (CollisionDetector, Bird, PipeConfig) {
        let bird_config = BirdConfig::default();
        let pipe_config = PipeConfig::default();
        let detector = CollisionDetector::new(mode, &bird_config, &pipe_config);
        (detector, Bird::new(ActorId(0), &bird_config), pipe_config)
    }

    #[test]
    fn test_inside_gap_is_clear() {
        let (detector, mut bird, config) = setup(CollisionMode::PixelMask);
        bird.y = 300.0;
        // Gap spans 250..500, bird spans 300..348, pipe overlaps bird columns
        let pipe = PipePair::with_gap_top(200.0, 250.0, &config);
        assert!(!detector.collides(&bird, &pipe));
    }

    #[test]
    fn test_hits_top_and_bottom() {
        let (detector, mut bird, config) = setup(CollisionMode::PixelMask);
        let pipe = PipePair::with_gap_top(200.0, 250.0, &config);

        bird.y = 230.0;
        assert!(detector.collides(&bird, &pipe));

        bird.y = 480.0;
        assert!(detector.collides(&bird, &pipe));
    }

    #[test]
    fn test_far_pipe_is_clear() {
        let (detector, mut bird, config) = setup(CollisionMode::PixelMask);
        bird.y = 100.0;
        let pipe = PipePair::with_gap_top(700.0, 250.0, &config);
        assert!(!detector.collides(&bird, &pipe));
    }

    #[test]
    fn test_bounding_box_edges() {
        let bird_config = BirdConfig {
            width: 10,
            height: 10,
            ..Default::default()
        };
        let pipe_config = PipeConfig::default();
        let detector = CollisionDetector::new(
            CollisionMode::BoundingBox { inset: 0 },
            &bird_config,
            &pipe_config,
        );
        let mut bird = Bird::new(ActorId(0), &bird_config);
        bird.y = 300.0;

        // Bottom obstacle starts one pixel above the bird's last row
        let pipe = PipePair::with_gap_top(220.0, 309.0 - pipe_config.gap, &pipe_config);
        assert!(detector.collides(&bird, &pipe));

        // Bottom obstacle starts exactly at the bird's bottom edge
        let pipe = PipePair::with_gap_top(220.0, 310.0 - pipe_config.gap, &pipe_config);
        assert!(!detector.collides(&bird, &pipe));

        // Obstacle's right edge touches the bird's left edge
        let pipe = PipePair::with_gap_top(126.0, 0.0, &pipe_config);
        assert!(!detector.collides(&bird, &pipe));
    }

    #[test]
    fn test_pixel_mask_corner_clearance() {
        let (pixel, mut bird, config) = setup(CollisionMode::PixelMask);
        let (boxed, _, _) = setup(CollisionMode::BoundingBox { inset: 0 });

        // Bottom obstacle's top-left corner clips the bird's bottom-right box corner only
        bird.y = 300.0;
        let pipe = PipePair::with_gap_top(296.0, 346.0 - config.gap, &config);
        assert!(boxed.collides(&bird, &pipe));
        assert!(!pixel.collides(&bird, &pipe));
    }

    #[test]
    fn test_custom_silhouettes_must_match() {
        let bird_config = BirdConfig::default();
        let pipe_config = PipeConfig::default();
        let detector = CollisionDetector::new(CollisionMode::PixelMask, &bird_config, &pipe_config);

        let wrong = Silhouettes::from_sprites(Mask::filled(10, 10), Mask::filled(104, 640));
        assert!(detector.clone().with_silhouettes(wrong, &bird_config).is_err());

        let right = Silhouettes::from_sprites(Mask::filled(68, 48), Mask::filled(104, 640));
        assert!(detector.with_silhouettes(right, &bird_config).is_ok());
    }
}
