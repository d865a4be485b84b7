//! Color frequency counting.
//!
//! Counts run over the raw buffer's whole pixels, not the resolved grid, so
//! the numbers stay meaningful even when the dimensions are a guess.

use serde::Serialize;
use std::collections::HashMap;

use crate::frame::{PixelBuffer, Rgba};

/// Default number of samples for `SampleMode::Uniform`.
pub const DEFAULT_SAMPLE_TARGET: usize = 1000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SampleMode {
    /// Every pixel.
    #[default]
    Full,
    /// Every `stride`-th pixel, where `stride = max(1, total / target)`.
    Uniform { target: usize },
}

impl SampleMode {
    pub fn uniform() -> Self {
        SampleMode::Uniform {
            target: DEFAULT_SAMPLE_TARGET,
        }
    }

    pub fn stride(&self, total_pixels: usize) -> usize {
        match *self {
            SampleMode::Full => 1,
            SampleMode::Uniform { target } => (total_pixels / target.max(1)).max(1),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ColorCount {
    pub color: Rgba,
    pub count: u64,
}

/// Occurrence counts keyed by color. Entries keep first-seen order so that
/// ranking ties resolve deterministically.
#[derive(Clone, Debug, Default)]
pub struct ColorHistogram {
    entries: Vec<ColorCount>,
    index: HashMap<Rgba, usize>,
    samples: u64,
    stride: usize,
}

impl ColorHistogram {
    pub fn build(buffer: &PixelBuffer, mode: SampleMode) -> Self {
        let stride = mode.stride(buffer.pixel_count());
        let mut histogram = Self {
            stride,
            ..Self::default()
        };
        for color in buffer.pixels().step_by(stride) {
            histogram.record(color);
        }
        log::debug!(
            "histogram: {} samples (stride {}), {} unique colors",
            histogram.samples,
            stride,
            histogram.entries.len()
        );
        histogram
    }

    fn record(&mut self, color: Rgba) {
        self.samples += 1;
        match self.index.get(&color) {
            Some(&slot) => self.entries[slot].count += 1,
            None => {
                self.index.insert(color, self.entries.len());
                self.entries.push(ColorCount { color, count: 1 });
            }
        }
    }

    /// Number of pixels examined.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn unique_colors(&self) -> usize {
        self.entries.len()
    }

    pub fn count(&self, color: &Rgba) -> u64 {
        self.index
            .get(color)
            .map(|&slot| self.entries[slot].count)
            .unwrap_or(0)
    }

    pub fn contains(&self, color: &Rgba) -> bool {
        self.index.contains_key(color)
    }

    /// The `n` most frequent colors, count descending, ties in first-seen order.
    pub fn top(&self, n: usize) -> Vec<ColorCount> {
        let mut ranked = self.entries.clone();
        // sort_by is stable, so equal counts keep insertion order.
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(n);
        ranked
    }
}
