//! Frame inspector.
//!
//! One pass over one dump:
//! 1. Resolve dimensions (requested, then known totals, then keep requested).
//! 2. Reject byte lengths that are not a whole number of pixels.
//! 3. Preview the leading pixels of the first row.
//! 4. Histogram over all pixels or a uniform sample; rank the top colors.
//! 5. Check the observed colors against the test pattern.
//! 6. Optionally re-encode the grid as a PNG next to the input.
//!
//! Nothing here mutates the input. `inspect_all` isolates failures per file.

use anyhow::{anyhow, Result};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::InspectorConfig;
use crate::export;
use crate::frame::{
    resolve_dimensions, DimensionSource, Dimensions, PixelBuffer, ResolutionTable,
    ResolvedDimensions, Rgba,
};
use crate::histogram::{ColorCount, ColorHistogram, SampleMode};
use crate::pattern::{PatternMatch, TestPattern};
use crate::InspectError;

const SEPARATOR_WIDTH: usize = 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    /// One JSON object per file, newline separated.
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(anyhow!("unknown report format {other:?} (expected text|json)")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct InspectOptions {
    pub requested: Dimensions,
    pub resolutions: ResolutionTable,
    pub sample_mode: SampleMode,
    pub top_n: usize,
    pub preview_pixels: usize,
    pub pattern: TestPattern,
    /// Write the grid as a PNG next to the input after a successful inspection.
    pub with_image_export: bool,
}

impl InspectOptions {
    pub fn from_config(cfg: &InspectorConfig) -> Self {
        Self {
            requested: cfg.dimensions,
            resolutions: cfg.resolutions.clone(),
            sample_mode: SampleMode::Full,
            top_n: cfg.top_n,
            preview_pixels: cfg.preview_pixels,
            pattern: TestPattern::rgbw(),
            with_image_export: false,
        }
    }

    /// Switch to uniform sampling of about `target` pixels.
    pub fn sampled(mut self, target: usize) -> Self {
        self.sample_mode = SampleMode::Uniform { target };
        self
    }

    pub fn with_image_export(mut self, enabled: bool) -> Self {
        self.with_image_export = enabled;
        self
    }
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self::from_config(&InspectorConfig::default())
    }
}

/// Everything one inspection found.
#[derive(Clone, Debug, Serialize)]
pub struct Inspection {
    pub source: String,
    pub byte_len: usize,
    pub requested: Dimensions,
    pub resolved: ResolvedDimensions,
    pub total_pixels: usize,
    pub preview: Vec<Rgba>,
    pub sample_mode: SampleMode,
    pub samples: u64,
    pub stride: usize,
    pub unique_colors: usize,
    pub top_colors: Vec<ColorCount>,
    pub non_zero_pixels: usize,
    pub pattern: PatternMatch,
    /// PNG written next to the input, lossy-rendered like `source`.
    pub exported: Option<String>,
    /// Why the PNG export did not happen. The analysis above stays valid.
    pub export_error: Option<String>,
}

/// Outcome of a multi-file run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub inspected: usize,
    pub failed: usize,
}

pub struct Inspector {
    options: InspectOptions,
}

impl Inspector {
    pub fn new(options: InspectOptions) -> Self {
        Self { options }
    }

    /// Inspect an in-memory dump. Never exports.
    pub fn inspect_bytes(&self, source: &str, data: Vec<u8>) -> Result<Inspection> {
        self.analyze(source, data).map(|(inspection, _)| inspection)
    }

    pub fn inspect_file(&self, path: &Path) -> Result<Inspection> {
        let source = path.display().to_string();
        let data = std::fs::read(path).map_err(|e| InspectError::io(format!("{}: {}", source, e)))?;
        let (mut inspection, buffer) = self.analyze(&source, data)?;
        if self.options.with_image_export {
            match export::export_png(&buffer, inspection.resolved.dimensions, path) {
                Ok(exported) => {
                    inspection.exported = exported.map(|out| out.display().to_string());
                }
                Err(err) => {
                    log::warn!("{}: PNG export failed: {:#}", source, err);
                    inspection.export_error = Some(format!("{:#}", err));
                }
            }
        }
        Ok(inspection)
    }

    fn analyze(&self, source: &str, data: Vec<u8>) -> Result<(Inspection, PixelBuffer)> {
        let byte_len = data.len();
        let resolved = resolve_dimensions(byte_len, self.options.requested, &self.options.resolutions);
        if let DimensionSource::Detected { label } = &resolved.source {
            log::info!("{}: detected {} ({})", source, resolved.dimensions, label);
        }

        let buffer = PixelBuffer::from_bytes(data)?;
        let histogram = ColorHistogram::build(&buffer, self.options.sample_mode);
        let pattern = self.options.pattern.check(&histogram);

        let inspection = Inspection {
            source: source.to_string(),
            byte_len,
            requested: self.options.requested,
            total_pixels: buffer.pixel_count(),
            preview: buffer.first_row(resolved.dimensions, self.options.preview_pixels),
            resolved,
            sample_mode: self.options.sample_mode,
            samples: histogram.samples(),
            stride: histogram.stride(),
            unique_colors: histogram.unique_colors(),
            top_colors: histogram.top(self.options.top_n),
            non_zero_pixels: buffer.non_zero_pixels(),
            pattern,
            exported: None,
            export_error: None,
        };
        Ok((inspection, buffer))
    }

    /// Inspects each path in order. A failing file is reported and skipped.
    ///
    /// Each record is rendered in full before anything is written, so a file
    /// that fails to render becomes its own error record instead of a
    /// half-written line.
    pub fn inspect_all<W: Write>(
        &self,
        paths: &[PathBuf],
        format: ReportFormat,
        out: &mut W,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        for path in paths {
            let record = self
                .inspect_file(path)
                .and_then(|inspection| render_record(&inspection, format));
            let bytes = match record {
                Ok(bytes) => {
                    summary.inspected += 1;
                    bytes
                }
                Err(err) => {
                    summary.failed += 1;
                    log::warn!("{}: {:#}", path.display(), err);
                    render_failure(path, &err, format)?
                }
            };
            if format == ReportFormat::Text {
                writeln!(out, "{}", "=".repeat(SEPARATOR_WIDTH))?;
            }
            out.write_all(&bytes)?;
            if format == ReportFormat::Text {
                writeln!(out)?;
            }
        }
        Ok(summary)
    }
}

fn render_record(inspection: &Inspection, format: ReportFormat) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    match format {
        ReportFormat::Text => render_text(inspection, &mut buf)?,
        ReportFormat::Json => {
            serde_json::to_writer(&mut buf, inspection)?;
            buf.push(b'\n');
        }
    }
    Ok(buf)
}

fn render_failure(path: &Path, err: &anyhow::Error, format: ReportFormat) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    match format {
        ReportFormat::Text => {
            writeln!(buf, "❌ Error analyzing {}: {:#}", path.display(), err)?
        }
        ReportFormat::Json => {
            let record = serde_json::json!({
                "source": path.display().to_string(),
                "error": format!("{:#}", err),
            });
            serde_json::to_writer(&mut buf, &record)?;
            buf.push(b'\n');
        }
    }
    Ok(buf)
}

// ----------------------------------------------------------------------------
// Text rendering
// ----------------------------------------------------------------------------

pub fn render_text<W: Write>(report: &Inspection, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "File: {}", report.source)?;
    writeln!(out, "Size: {} bytes", report.byte_len)?;

    let dims = report.resolved.dimensions;
    match &report.resolved.source {
        DimensionSource::Requested => writeln!(out, "✓ Size matches {} RGBA", dims)?,
        source => {
            let expected = report
                .requested
                .byte_len()
                .map(|len| len.to_string())
                .unwrap_or_else(|| "overflow".to_string());
            writeln!(
                out,
                "⚠ Size mismatch. Expected {}, got {}",
                expected, report.byte_len
            )?;
            writeln!(out, "Total pixels: {}", report.total_pixels)?;
            match source {
                DimensionSource::Detected { label } => {
                    writeln!(out, "Detected resolution: {} ({})", dims, label)?
                }
                _ => writeln!(out, "No known resolution matches; assuming {}", dims)?,
            }
        }
    }

    writeln!(out)?;
    writeln!(out, "First {} pixels (RGBA):", report.preview.len())?;
    for (i, px) in report.preview.iter().enumerate() {
        writeln!(out, "  Pixel {}: {} ({})", i, px, px.hex_rgb())?;
    }

    writeln!(out)?;
    let unit = match report.sample_mode {
        SampleMode::Full => {
            writeln!(out, "Color distribution (full scan, {} pixels):", report.samples)?;
            "pixels"
        }
        SampleMode::Uniform { .. } => {
            writeln!(
                out,
                "Color distribution (sampled, {} samples, stride {}):",
                report.samples, report.stride
            )?;
            "samples"
        }
    };
    writeln!(out, "  Unique colors: {}", report.unique_colors)?;
    for (i, entry) in report.top_colors.iter().enumerate() {
        writeln!(
            out,
            "  Color {}: {} ({}) - {} {}",
            i + 1,
            entry.color,
            entry.color.hex_rgb(),
            entry.count,
            unit
        )?;
    }
    writeln!(
        out,
        "Non-zero pixels: {} / {}",
        report.non_zero_pixels, report.total_pixels
    )?;

    writeln!(out)?;
    let pattern = &report.pattern;
    if pattern.is_complete() {
        writeln!(
            out,
            "✓ Test pattern detected! Found all {} expected colors",
            pattern.expected
        )?;
    } else {
        writeln!(
            out,
            "⚠ Test pattern check: Found {}/{} expected colors",
            pattern.matches(),
            pattern.expected
        )?;
        writeln!(out, "  Missing colors:")?;
        for color in &pattern.missing {
            writeln!(out, "    {}", color)?;
        }
    }

    if let Some(path) = &report.exported {
        writeln!(out)?;
        writeln!(out, "✓ Converted to PNG: {}", path)?;
    }
    if let Some(reason) = &report.export_error {
        writeln!(out)?;
        writeln!(out, "⚠ PNG export skipped: {}", reason)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{BLUE, GREEN, RED, WHITE};
    use crate::{error_kind, InspectErrorKind};

    fn inspector() -> Inspector {
        Inspector::new(InspectOptions::default())
    }

    #[test]
    fn zero_frame_report() -> Result<()> {
        let report = inspector().inspect_bytes("zero.raw", vec![0u8; 256 * 240 * 4])?;
        assert_eq!(report.resolved.source, DimensionSource::Requested);
        assert_eq!(report.preview.len(), 8);
        assert!(report.preview.iter().all(|px| px.is_zero()));
        assert_eq!(report.unique_colors, 1);
        assert_eq!(report.top_colors.len(), 1);
        assert_eq!(report.top_colors[0].count, 61440);
        assert_eq!(report.pattern.matches(), 0);
        assert_eq!(report.pattern.missing, vec![RED, GREEN, BLUE, WHITE]);
        assert_eq!(report.non_zero_pixels, 0);
        Ok(())
    }

    #[test]
    fn cyclic_pattern_matches_all_four() -> Result<()> {
        let colors = [RED, GREEN, BLUE, WHITE];
        let data: Vec<u8> = (0..16).flat_map(|i| colors[i % 4].to_bytes()).collect();
        assert_eq!(data.len(), 64);
        let report = inspector().inspect_bytes("cycle.raw", data)?;
        assert_eq!(report.pattern.matches(), 4);
        assert!(report.pattern.missing.is_empty());
        assert_eq!(report.resolved.source, DimensionSource::Unresolved);
        assert_eq!(report.resolved.dimensions, Dimensions::new(256, 240));
        // preview capped by the 16 pixels actually present
        assert_eq!(report.preview.len(), 8);
        Ok(())
    }

    #[test]
    fn partial_pixel_is_format_error() {
        let err = inspector().inspect_bytes("odd.raw", vec![0u8; 10]).unwrap_err();
        assert_eq!(error_kind(&err), Some(InspectErrorKind::Format));
    }

    #[test]
    fn scaled_capture_uses_table() -> Result<()> {
        let report = inspector().inspect_bytes("big.raw", vec![7u8; 768 * 720 * 4])?;
        assert_eq!(report.resolved.dimensions, Dimensions::new(768, 720));
        assert!(report.resolved.is_mismatch());
        Ok(())
    }

    #[test]
    fn sampled_histogram_sums_to_samples() -> Result<()> {
        let options = InspectOptions::default().sampled(1000);
        let data: Vec<u8> = (0..256 * 240)
            .flat_map(|i: u32| [(i % 7) as u8, 0, 0, 255])
            .collect();
        let report = Inspector::new(options).inspect_bytes("s.raw", data)?;
        assert_eq!(report.stride, 61);
        let total: u64 = report.top_colors.iter().map(|c| c.count).sum();
        assert_eq!(report.unique_colors, 7);
        assert_eq!(total, report.samples);
        assert!(report
            .top_colors
            .windows(2)
            .all(|w| w[0].count >= w[1].count));
        Ok(())
    }

    #[test]
    fn text_report_mentions_missing_colors() -> Result<()> {
        let data: Vec<u8> = [GREEN, WHITE].iter().flat_map(|c| c.to_bytes()).collect();
        let report = inspector().inspect_bytes("gw.raw", data)?;
        let mut out = Vec::new();
        render_text(&report, &mut out)?;
        let text = String::from_utf8(out)?;
        assert!(text.contains("Found 2/4 expected colors"));
        assert!(text.contains("R=255 G=  0 B=  0 A=255"));
        assert!(text.contains("R=  0 G=  0 B=255 A=255"));
        assert!(text.contains("No known resolution matches; assuming 256x240"));
        Ok(())
    }

    #[test]
    fn missing_file_does_not_stop_the_run() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let good = dir.path().join("good.raw");
        std::fs::write(&good, vec![0u8; 64])?;
        let paths = vec![dir.path().join("absent.raw"), good];

        let mut out = Vec::new();
        let summary = inspector().inspect_all(&paths, ReportFormat::Text, &mut out)?;
        assert_eq!(summary, RunSummary { inspected: 1, failed: 1 });
        let text = String::from_utf8(out)?;
        assert!(text.contains("Error analyzing"));
        assert!(text.contains("IO_ERROR"));
        assert!(text.contains("Size: 64 bytes"));
        Ok(())
    }

    #[test]
    fn export_failure_keeps_the_report() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("dump.png");
        std::fs::write(&path, vec![0u8; 256 * 240 * 4])?;

        let options = InspectOptions::default().with_image_export(true);
        let report = Inspector::new(options).inspect_file(&path)?;
        assert_eq!(report.top_colors[0].count, 61440);
        assert!(report.exported.is_none());
        assert!(report.export_error.is_some());

        let mut out = Vec::new();
        render_text(&report, &mut out)?;
        assert!(String::from_utf8(out)?.contains("⚠ PNG export skipped"));
        Ok(())
    }

    #[test]
    fn format_parses() {
        assert_eq!("json".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert!("yaml".parse::<ReportFormat>().is_err());
    }
}
