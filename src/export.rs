//! PNG re-encode of a dump.
//!
//! Alpha is dropped and the grid is written next to the input with the
//! extension swapped to `.png`. Requires the `png-export` feature.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};

use crate::frame::{Dimensions, PixelBuffer, BYTES_PER_PIXEL};

/// `frame.raw` -> `frame.png`, `frame` -> `frame.png`.
pub fn sibling_png_path(path: &Path) -> Result<PathBuf> {
    let is_png = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("png"))
        .unwrap_or(false);
    if is_png {
        return Err(anyhow!(
            "refusing to overwrite input {} with its own PNG export",
            path.display()
        ));
    }
    Ok(path.with_extension("png"))
}

/// RGB bytes for the first `width * height` pixels, or `None` if the buffer
/// is too short to fill the grid.
pub fn rgb_grid(buffer: &PixelBuffer, dims: Dimensions) -> Option<Vec<u8>> {
    let pixels = dims.pixel_count()?;
    let bytes = buffer.as_bytes().get(..pixels.checked_mul(BYTES_PER_PIXEL)?)?;
    Some(
        bytes
            .chunks_exact(BYTES_PER_PIXEL)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect(),
    )
}

/// Writes the grid as PNG. Returns `Ok(None)` when the buffer cannot fill
/// the grid; that case is logged and skipped.
#[cfg(feature = "png-export")]
pub fn export_png(buffer: &PixelBuffer, dims: Dimensions, source: &Path) -> Result<Option<PathBuf>> {
    let out = sibling_png_path(source)?;
    let Some(rgb) = rgb_grid(buffer, dims) else {
        log::warn!(
            "{}: {} pixels cannot fill a {} grid; PNG export skipped",
            source.display(),
            buffer.pixel_count(),
            dims
        );
        return Ok(None);
    };
    let image = image::RgbImage::from_raw(dims.width, dims.height, rgb)
        .ok_or_else(|| anyhow!("RGB buffer does not match {}", dims))?;
    image
        .save_with_format(&out, image::ImageFormat::Png)
        .map_err(|e| anyhow!("failed to write {}: {}", out.display(), e))?;
    log::info!("wrote {} ({})", out.display(), dims);
    Ok(Some(out))
}

#[cfg(not(feature = "png-export"))]
pub fn export_png(
    _buffer: &PixelBuffer,
    _dims: Dimensions,
    _source: &Path,
) -> Result<Option<PathBuf>> {
    Err(anyhow!("PNG export requires the png-export feature"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Rgba;

    #[test]
    fn swaps_raw_extension() -> Result<()> {
        assert_eq!(
            sibling_png_path(Path::new("dumps/frame_600.raw"))?,
            PathBuf::from("dumps/frame_600.png")
        );
        assert_eq!(
            sibling_png_path(Path::new("frame"))?,
            PathBuf::from("frame.png")
        );
        Ok(())
    }

    #[test]
    fn refuses_png_input() {
        assert!(sibling_png_path(Path::new("shot.PNG")).is_err());
    }

    #[test]
    fn grid_drops_alpha_and_truncates() {
        let buf = PixelBuffer::from_pixels(&[
            Rgba::new(1, 2, 3, 4),
            Rgba::new(5, 6, 7, 8),
            Rgba::new(9, 9, 9, 9),
        ]);
        assert_eq!(rgb_grid(&buf, Dimensions::new(2, 1)), Some(vec![1, 2, 3, 5, 6, 7]));
        assert_eq!(rgb_grid(&buf, Dimensions::new(2, 2)), None);
    }
}
