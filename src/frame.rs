//! Pixel buffer layer.
//!
//! A dump is a headerless byte stream read positionally as row-major RGBA
//! pixels. Nothing in the file says how wide the frame is, so dimensions are
//! either taken from the caller or matched against an ordered table of known
//! pixel totals.
//!
//! - `PixelBuffer`: immutable RGBA bytes, length always a multiple of 4.
//! - `ResolutionTable`: ordered `(total_pixels, width, height)` entries.
//! - `resolve_dimensions`: requested dims first, then the table, then give up softly.

use anyhow::Result;
use serde::Serialize;

use crate::InspectError;

pub const BYTES_PER_PIXEL: usize = 4;

/// Native emulator output.
pub const DEFAULT_WIDTH: u32 = 256;
pub const DEFAULT_HEIGHT: u32 = 240;

// ----------------------------------------------------------------------------
// Rgba
// ----------------------------------------------------------------------------

/// One 8-bit-per-channel sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn from_bytes(px: [u8; 4]) -> Self {
        Self::new(px[0], px[1], px[2], px[3])
    }

    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// `#RRGGBB`, alpha dropped.
    pub fn hex_rgb(&self) -> String {
        format!("#{}", hex::encode_upper([self.r, self.g, self.b]))
    }

    pub fn is_zero(&self) -> bool {
        self.to_bytes() == [0; 4]
    }
}

impl std::fmt::Display for Rgba {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "R={:3} G={:3} B={:3} A={:3}",
            self.r, self.g, self.b, self.a
        )
    }
}

// ----------------------------------------------------------------------------
// Dimensions
// ----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `None` if the product does not fit in `usize`.
    pub fn pixel_count(&self) -> Option<usize> {
        (self.width as usize).checked_mul(self.height as usize)
    }

    pub fn byte_len(&self) -> Option<usize> {
        self.pixel_count()
            .and_then(|pixels| pixels.checked_mul(BYTES_PER_PIXEL))
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// ----------------------------------------------------------------------------
// Known resolutions
// ----------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KnownResolution {
    pub total_pixels: usize,
    pub dimensions: Dimensions,
    pub label: String,
}

impl KnownResolution {
    /// Returns `None` when `width * height` overflows.
    pub fn new(width: u32, height: u32, label: impl Into<String>) -> Option<Self> {
        let dimensions = Dimensions::new(width, height);
        Some(Self {
            total_pixels: dimensions.pixel_count()?,
            dimensions,
            label: label.into(),
        })
    }
}

/// Ordered dimension-inference policy. Earlier entries win.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolutionTable {
    entries: Vec<KnownResolution>,
}

impl ResolutionTable {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Native 256x240 first, then the 3x-scaled 768x720 window capture.
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                KnownResolution {
                    total_pixels: 256 * 240,
                    dimensions: Dimensions::new(256, 240),
                    label: "original".to_string(),
                },
                KnownResolution {
                    total_pixels: 768 * 720,
                    dimensions: Dimensions::new(768, 720),
                    label: "scaled".to_string(),
                },
            ],
        }
    }

    pub fn push(&mut self, entry: KnownResolution) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[KnownResolution] {
        &self.entries
    }

    pub fn lookup(&self, total_pixels: usize) -> Option<&KnownResolution> {
        self.entries
            .iter()
            .find(|entry| entry.total_pixels == total_pixels)
    }
}

impl Default for ResolutionTable {
    fn default() -> Self {
        Self::builtin()
    }
}

// ----------------------------------------------------------------------------
// Dimension resolution
// ----------------------------------------------------------------------------

/// Where the dimensions used for an inspection came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DimensionSource {
    /// Byte length matched the requested dimensions exactly.
    Requested,
    /// Byte length matched an entry of the resolution table.
    Detected { label: String },
    /// Nothing matched; the requested dimensions are kept and may be wrong.
    Unresolved,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedDimensions {
    pub dimensions: Dimensions,
    pub source: DimensionSource,
}

impl ResolvedDimensions {
    pub fn is_mismatch(&self) -> bool {
        self.source != DimensionSource::Requested
    }
}

pub fn resolve_dimensions(
    byte_len: usize,
    requested: Dimensions,
    table: &ResolutionTable,
) -> ResolvedDimensions {
    if requested.byte_len() == Some(byte_len) {
        return ResolvedDimensions {
            dimensions: requested,
            source: DimensionSource::Requested,
        };
    }

    let total_pixels = byte_len / BYTES_PER_PIXEL;
    match table.lookup(total_pixels) {
        Some(entry) => ResolvedDimensions {
            dimensions: entry.dimensions,
            source: DimensionSource::Detected {
                label: entry.label.clone(),
            },
        },
        None => {
            log::warn!(
                "no known resolution has {} pixels; keeping {} (grid may be wrong)",
                total_pixels,
                requested
            );
            ResolvedDimensions {
                dimensions: requested,
                source: DimensionSource::Unresolved,
            }
        }
    }
}

// ----------------------------------------------------------------------------
// PixelBuffer
// ----------------------------------------------------------------------------

/// Immutable RGBA bytes. Construction rejects any length that is not a whole
/// number of pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if data.len() % BYTES_PER_PIXEL != 0 {
            return Err(InspectError::format(format!(
                "invalid RGBA data length: {} bytes is not a multiple of {}",
                data.len(),
                BYTES_PER_PIXEL
            ))
            .into());
        }
        Ok(Self { data })
    }

    pub fn from_pixels(pixels: &[Rgba]) -> Self {
        Self {
            data: pixels.iter().flat_map(|px| px.to_bytes()).collect(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    pub fn pixel_count(&self) -> usize {
        self.data.len() / BYTES_PER_PIXEL
    }

    pub fn pixel(&self, index: usize) -> Option<Rgba> {
        let start = index.checked_mul(BYTES_PER_PIXEL)?;
        let end = start.checked_add(BYTES_PER_PIXEL)?;
        let px: [u8; 4] = self.data.get(start..end)?.try_into().ok()?;
        Some(Rgba::from_bytes(px))
    }

    pub fn pixels(&self) -> impl Iterator<Item = Rgba> + '_ {
        self.data
            .chunks_exact(BYTES_PER_PIXEL)
            .map(|px| Rgba::new(px[0], px[1], px[2], px[3]))
    }

    /// Leading pixels of the first row under `dims`, capped at `limit`.
    pub fn first_row(&self, dims: Dimensions, limit: usize) -> Vec<Rgba> {
        let take = limit.min(dims.width as usize).min(self.pixel_count());
        self.pixels().take(take).collect()
    }

    /// Pixels with any non-zero channel.
    pub fn non_zero_pixels(&self) -> usize {
        self.pixels().filter(|px| !px.is_zero()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_kind;
    use crate::InspectErrorKind;

    #[test]
    fn rejects_partial_pixels() {
        let err = PixelBuffer::from_bytes(vec![0u8; 7]).unwrap_err();
        assert_eq!(error_kind(&err), Some(InspectErrorKind::Format));
    }

    #[test]
    fn accepts_whole_pixels_of_any_count() -> Result<()> {
        for len in [0usize, 4, 64, 1000 * 4] {
            let buf = PixelBuffer::from_bytes(vec![0u8; len])?;
            assert_eq!(buf.pixel_count(), len / 4);
        }
        Ok(())
    }

    #[test]
    fn exact_match_keeps_requested() {
        let resolved = resolve_dimensions(
            256 * 240 * 4,
            Dimensions::new(256, 240),
            &ResolutionTable::builtin(),
        );
        assert_eq!(resolved.dimensions, Dimensions::new(256, 240));
        assert_eq!(resolved.source, DimensionSource::Requested);
        assert!(!resolved.is_mismatch());
    }

    #[test]
    fn scaled_capture_is_detected() {
        let resolved = resolve_dimensions(
            768 * 720 * 4,
            Dimensions::default(),
            &ResolutionTable::builtin(),
        );
        assert_eq!(resolved.dimensions, Dimensions::new(768, 720));
        assert_eq!(
            resolved.source,
            DimensionSource::Detected {
                label: "scaled".to_string()
            }
        );
    }

    #[test]
    fn native_detected_when_other_size_requested() {
        let resolved = resolve_dimensions(
            256 * 240 * 4,
            Dimensions::new(320, 200),
            &ResolutionTable::builtin(),
        );
        assert_eq!(resolved.dimensions, Dimensions::new(256, 240));
    }

    #[test]
    fn unknown_total_keeps_requested_dims() {
        let resolved = resolve_dimensions(
            16 * 4,
            Dimensions::default(),
            &ResolutionTable::builtin(),
        );
        assert_eq!(resolved.dimensions, Dimensions::default());
        assert_eq!(resolved.source, DimensionSource::Unresolved);
    }

    #[test]
    fn earlier_table_entries_win() {
        let mut table = ResolutionTable::empty();
        table.push(KnownResolution::new(4, 4, "square").unwrap());
        table.push(KnownResolution::new(8, 2, "wide").unwrap());
        let resolved = resolve_dimensions(16 * 4, Dimensions::default(), &table);
        assert_eq!(resolved.dimensions, Dimensions::new(4, 4));
    }

    #[test]
    fn first_row_is_bounded_by_width_and_length() -> Result<()> {
        let buf = PixelBuffer::from_bytes((0u8..24).collect())?;
        assert_eq!(buf.first_row(Dimensions::new(4, 1), 8).len(), 4);
        assert_eq!(buf.first_row(Dimensions::new(256, 240), 8).len(), 6);
        assert_eq!(buf.first_row(Dimensions::new(256, 240), 2)[1], Rgba::new(4, 5, 6, 7));
        Ok(())
    }

    #[test]
    fn hex_drops_alpha() {
        assert_eq!(Rgba::new(0xAB, 0x01, 0xFF, 0x10).hex_rgb(), "#AB01FF");
    }

    #[test]
    fn counts_non_zero_pixels() {
        let buf = PixelBuffer::from_pixels(&[
            Rgba::new(0, 0, 0, 0),
            Rgba::new(0, 0, 0, 1),
            Rgba::opaque(5, 5, 5),
        ]);
        assert_eq!(buf.non_zero_pixels(), 2);
    }
}
