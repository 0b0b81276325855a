//! Packed bit masks for pixel-accurate overlap tests.

use flap_core::{Error, Result};

const WORD_BITS: usize = 64;

/// A rectangular grid of solid/transparent pixels.
///
/// Rows are packed into 64-bit words, least significant bit first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    words_per_row: usize,
    bits: Vec<u64>,
}

impl Mask {
    /// All-transparent mask
    pub fn new(width: u32, height: u32) -> Self {
        let words_per_row = (width as usize).div_ceil(WORD_BITS);
        Self {
            width,
            height,
            words_per_row,
            bits: vec![0; words_per_row * height as usize],
        }
    }

    /// All-solid mask
    pub fn filled(width: u32, height: u32) -> Self {
        let mut mask = Self::new(width, height);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                mask.set(x, y, true);
            }
        }
        mask
    }

    /// Build from a row-major alpha channel; pixels with alpha above
    /// `threshold` are solid.
    pub fn from_alpha(width: u32, height: u32, alpha: &[u8], threshold: u8) -> Result<Self> {
        let expected = width as usize * height as usize;
        if alpha.len() != expected {
            return Err(Error::InvalidConfig(format!(
                "alpha channel has {} pixels, expected {}x{} = {}",
                alpha.len(),
                width,
                height,
                expected
            )));
        }

        let mut mask = Self::new(width, height);
        for (i, &a) in alpha.iter().enumerate() {
            if a > threshold {
                let x = (i % width as usize) as i32;
                let y = (i / width as usize) as i32;
                mask.set(x, y, true);
            }
        }
        Ok(mask)
    }

    /// Ellipse inscribed in the mask's bounds. Used as the actor silhouette
    /// when no sprite is supplied.
    pub fn ellipse(width: u32, height: u32) -> Self {
        let mut mask = Self::new(width, height);
        let rx = width as f64 / 2.0;
        let ry = height as f64 / 2.0;

        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let nx = (x as f64 + 0.5 - rx) / rx;
                let ny = (y as f64 + 0.5 - ry) / ry;
                if nx * nx + ny * ny <= 1.0 {
                    mask.set(x, y, true);
                }
            }
        }
        mask
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    fn locate(&self, x: i32, y: i32) -> (usize, u64) {
        let x = x as usize;
        let index = y as usize * self.words_per_row + x / WORD_BITS;
        (index, 1u64 << (x % WORD_BITS))
    }

    /// Pixel state; anything outside the mask is transparent.
    pub fn get(&self, x: i32, y: i32) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let (index, bit) = self.locate(x, y);
        self.bits[index] & bit != 0
    }

    /// Set a pixel. Out-of-range coordinates are ignored.
    pub fn set(&mut self, x: i32, y: i32, solid: bool) {
        if !self.in_bounds(x, y) {
            return;
        }
        let (index, bit) = self.locate(x, y);
        if solid {
            self.bits[index] |= bit;
        } else {
            self.bits[index] &= !bit;
        }
    }

    /// Number of solid pixels
    pub fn count(&self) -> u32 {
        self.bits.iter().map(|w| w.count_ones()).sum()
    }

    /// Mirror top to bottom
    pub fn flip_vertical(&self) -> Self {
        let mut flipped = Self::new(self.width, self.height);
        let row = self.words_per_row;
        for y in 0..self.height as usize {
            let src = (self.height as usize - 1 - y) * row;
            flipped.bits[y * row..(y + 1) * row].copy_from_slice(&self.bits[src..src + row]);
        }
        flipped
    }

    /// First solid pixel shared with `other` when `other`'s top-left corner
    /// sits at `offset` in this mask's coordinates. The point is reported in
    /// this mask's coordinates.
    pub fn overlap(&self, other: &Mask, offset: (i32, i32)) -> Option<(i32, i32)> {
        let (dx, dy) = offset;
        let x_start = dx.max(0);
        let x_end = (dx + other.width as i32).min(self.width as i32);
        let y_start = dy.max(0);
        let y_end = (dy + other.height as i32).min(self.height as i32);

        if x_start >= x_end || y_start >= y_end {
            return None;
        }

        for y in y_start..y_end {
            for x in x_start..x_end {
                if self.get(x, y) && other.get(x - dx, y - dy) {
                    return Some((x, y));
                }
            }
        }
        None
    }

    pub fn overlaps(&self, other: &Mask, offset: (i32, i32)) -> bool {
        self.overlap(other, offset).is_some()
    }
}
