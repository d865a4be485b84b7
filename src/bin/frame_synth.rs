//! frame_synth - write a synthetic raw RGBA dump for checking the inspector.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;

use frame_probe::pattern::synthesize;
use frame_probe::{Dimensions, SyntheticLayout};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(name = "frame_synth", about = "Write a synthetic raw RGBA test-pattern dump")]
struct Args {
    /// Output path (e.g. test_pattern.raw)
    output: PathBuf,

    #[arg(long, default_value_t = 256)]
    width: u32,

    #[arg(long, default_value_t = 240)]
    height: u32,

    /// Pattern layout (bars|quadrants)
    #[arg(long, default_value = "bars", value_name = "LAYOUT")]
    layout: SyntheticLayout,

    /// UI mode for stderr progress (auto|plain|pretty|quiet)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let dims = Dimensions::new(args.width, args.height);
    if dims.pixel_count().unwrap_or(0) == 0 {
        return Err(anyhow!("frame must have at least one pixel (got {})", dims));
    }

    let ui = ui::Ui::from_flag(&args.ui);
    let buffer = {
        let _stage = ui.stage("Render pattern");
        synthesize(dims, args.layout)
    };
    {
        let _stage = ui.stage("Write dump");
        std::fs::write(&args.output, buffer.as_bytes())
            .map_err(|e| anyhow!("failed to write {}: {}", args.output.display(), e))?;
    }
    log::info!(
        "framebuffer saved to {} ({} bytes, {})",
        args.output.display(),
        buffer.byte_len(),
        dims
    );
    Ok(())
}
