//! Test-pattern checks.
//!
//! The reference pattern is four opaque blocks: red, green, blue and white.
//! A dump "looks like the test pattern" when all four colors are present.
//! This module also builds synthetic dumps so the inspector can be checked
//! against a known input.

use serde::Serialize;

use crate::frame::{Dimensions, PixelBuffer, Rgba};
use crate::histogram::ColorHistogram;

pub const RED: Rgba = Rgba::opaque(255, 0, 0);
pub const GREEN: Rgba = Rgba::opaque(0, 255, 0);
pub const BLUE: Rgba = Rgba::opaque(0, 0, 255);
pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);

/// Background color the emulator clears to.
pub const NEAR_BLACK: Rgba = Rgba::opaque(5, 5, 5);

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TestPattern {
    expected: Vec<Rgba>,
}

impl TestPattern {
    pub fn new(expected: Vec<Rgba>) -> Self {
        Self { expected }
    }

    /// Red, green, blue, white.
    pub fn rgbw() -> Self {
        Self::new(vec![RED, GREEN, BLUE, WHITE])
    }

    pub fn check(&self, histogram: &ColorHistogram) -> PatternMatch {
        let (found, missing): (Vec<Rgba>, Vec<Rgba>) = self
            .expected
            .iter()
            .copied()
            .partition(|color| histogram.contains(color));
        PatternMatch {
            expected: self.expected.len(),
            found,
            missing,
        }
    }
}

impl Default for TestPattern {
    fn default() -> Self {
        Self::rgbw()
    }
}

/// Result of intersecting observed colors with a `TestPattern`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PatternMatch {
    pub expected: usize,
    pub found: Vec<Rgba>,
    /// Missing colors in pattern order.
    pub missing: Vec<Rgba>,
}

impl PatternMatch {
    pub fn matches(&self) -> usize {
        self.found.len()
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

// ----------------------------------------------------------------------------
// Synthetic dumps
// ----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyntheticLayout {
    /// Four equal vertical bands: near-black, blue, green, red.
    Bars,
    /// Quadrants: red top-left, green top-right, blue bottom-left, white bottom-right.
    Quadrants,
}

impl std::str::FromStr for SyntheticLayout {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bars" => Ok(SyntheticLayout::Bars),
            "quadrants" => Ok(SyntheticLayout::Quadrants),
            other => Err(anyhow::anyhow!(
                "unknown layout {other:?} (expected bars|quadrants)"
            )),
        }
    }
}

pub fn synthesize(dims: Dimensions, layout: SyntheticLayout) -> PixelBuffer {
    let width = u64::from(dims.width.max(1));
    let height = u64::from(dims.height.max(1));
    let pixels: Vec<Rgba> = (0..dims.height)
        .flat_map(|y| (0..dims.width).map(move |x| (x, y)))
        .map(|(x, y)| (u64::from(x), u64::from(y)))
        .map(|(x, y)| match layout {
            SyntheticLayout::Bars => match (x * 4) / width {
                0 => NEAR_BLACK,
                1 => BLUE,
                2 => GREEN,
                _ => RED,
            },
            SyntheticLayout::Quadrants => {
                let right = x * 2 >= width;
                let bottom = y * 2 >= height;
                match (bottom, right) {
                    (false, false) => RED,
                    (false, true) => GREEN,
                    (true, false) => BLUE,
                    (true, true) => WHITE,
                }
            }
        })
        .collect();
    PixelBuffer::from_pixels(&pixels)
}
