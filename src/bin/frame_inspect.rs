//! frame_inspect - inspect raw RGBA framebuffer dumps
//!
//! For each file: size check with resolution detection, first-row preview,
//! color histogram, test-pattern check and (with `--png`) a PNG next to the
//! input. Files are processed in order; a failing file is reported and the
//! run continues.

use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

use frame_probe::{InspectOptions, Inspector, InspectorConfig, ReportFormat};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(
    name = "frame_inspect",
    about = "Inspect raw RGBA framebuffer dumps (size, colors, test pattern)"
)]
struct Args {
    /// Raw RGBA dumps to inspect
    files: Vec<PathBuf>,

    /// Requested frame width (default 256 or from config)
    #[arg(long)]
    width: Option<u32>,

    /// Requested frame height (default 240 or from config)
    #[arg(long)]
    height: Option<u32>,

    /// Also write each frame as <file>.png (alpha dropped)
    #[arg(long)]
    png: bool,

    /// Histogram over a uniform sample instead of every pixel
    #[arg(long)]
    sample: bool,

    /// Report format (text|json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    format: ReportFormat,

    /// JSON config file
    #[arg(long, value_name = "PATH", env = "FRAME_PROBE_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// UI mode for stderr progress (auto|plain|pretty|quiet)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn write_usage<W: Write>(out: &mut W) -> std::io::Result<()> {
    writeln!(out, "Usage: frame_inspect <raw_file1> [raw_file2] ...")?;
    writeln!(out, "Example: frame_inspect test_pattern.raw nes_frame.raw")
}

fn main() -> Result<()> {
    let args = Args::parse();
    let filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    if args.files.is_empty() {
        write_usage(&mut std::io::stdout().lock())?;
        return Ok(());
    }

    let ui = ui::Ui::from_flag(&args.ui);
    let cfg = {
        let _stage = ui.stage("Load config");
        InspectorConfig::load(args.config.as_deref())?.with_dimensions(args.width, args.height)?
    };

    let mut options = InspectOptions::from_config(&cfg).with_image_export(args.png);
    if args.sample {
        options = options.sampled(cfg.sample_target);
    }
    let inspector = Inspector::new(options);

    let summary = {
        let _stage = ui.stage(&format!("Inspect {} file(s)", args.files.len()));
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        inspector.inspect_all(&args.files, args.format, &mut out)?
    };
    log::info!(
        "inspected {} file(s), {} failed",
        summary.inspected,
        summary.failed
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_files_parses_and_prints_usage() -> Result<()> {
        let args = Args::try_parse_from(["frame_inspect"])?;
        assert!(args.files.is_empty());

        let mut out = Vec::new();
        write_usage(&mut out)?;
        let text = String::from_utf8(out)?;
        assert!(text.starts_with("Usage: frame_inspect <raw_file1>"));
        assert!(text.contains("Example: frame_inspect test_pattern.raw nes_frame.raw"));
        Ok(())
    }
}
