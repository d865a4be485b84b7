use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;

use crate::frame::{Dimensions, KnownResolution, ResolutionTable, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::histogram::DEFAULT_SAMPLE_TARGET;

const DEFAULT_TOP_N: usize = 10;
const DEFAULT_PREVIEW_PIXELS: usize = 8;

pub const CONFIG_ENV: &str = "FRAME_PROBE_CONFIG";
pub const WIDTH_ENV: &str = "FRAME_PROBE_WIDTH";
pub const HEIGHT_ENV: &str = "FRAME_PROBE_HEIGHT";
pub const SAMPLE_TARGET_ENV: &str = "FRAME_PROBE_SAMPLE_TARGET";

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct InspectorConfigFile {
    width: Option<u32>,
    height: Option<u32>,
    sample_target: Option<usize>,
    top_n: Option<usize>,
    preview_pixels: Option<usize>,
    known_resolutions: Option<Vec<ResolutionConfigFile>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResolutionConfigFile {
    width: u32,
    height: u32,
    label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectorConfig {
    /// Requested dimensions before any detection.
    pub dimensions: Dimensions,
    pub sample_target: usize,
    pub top_n: usize,
    pub preview_pixels: usize,
    pub resolutions: ResolutionTable,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            dimensions: Dimensions::new(DEFAULT_WIDTH, DEFAULT_HEIGHT),
            sample_target: DEFAULT_SAMPLE_TARGET,
            top_n: DEFAULT_TOP_N,
            preview_pixels: DEFAULT_PREVIEW_PIXELS,
            resolutions: ResolutionTable::builtin(),
        }
    }
}

impl InspectorConfig {
    /// Loads `path`, or the file named by `FRAME_PROBE_CONFIG`, then applies
    /// environment overrides. No file means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var(CONFIG_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty());
        let file_cfg = match (path, env_path.as_deref()) {
            (Some(path), _) => Some(read_config_file(path)?),
            (None, Some(path)) => Some(read_config_file(Path::new(path))?),
            (None, None) => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: InspectorConfigFile) -> Result<Self> {
        let defaults = Self::default();
        let mut resolutions = defaults.resolutions;
        for entry in file.known_resolutions.unwrap_or_default() {
            let label = entry
                .label
                .unwrap_or_else(|| format!("{}x{}", entry.width, entry.height));
            let known = KnownResolution::new(entry.width, entry.height, label).ok_or_else(|| {
                anyhow!(
                    "known resolution {}x{} overflows",
                    entry.width,
                    entry.height
                )
            })?;
            resolutions.push(known);
        }
        Ok(Self {
            dimensions: Dimensions::new(
                file.width.unwrap_or(defaults.dimensions.width),
                file.height.unwrap_or(defaults.dimensions.height),
            ),
            sample_target: file.sample_target.unwrap_or(defaults.sample_target),
            top_n: file.top_n.unwrap_or(defaults.top_n),
            preview_pixels: file.preview_pixels.unwrap_or(defaults.preview_pixels),
            resolutions,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(width) = env_number::<u32>(WIDTH_ENV)? {
            self.dimensions.width = width;
        }
        if let Some(height) = env_number::<u32>(HEIGHT_ENV)? {
            self.dimensions.height = height;
        }
        if let Some(target) = env_number::<usize>(SAMPLE_TARGET_ENV)? {
            self.sample_target = target;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.dimensions.width == 0 || self.dimensions.height == 0 {
            return Err(anyhow!(
                "width and height must be greater than zero (got {})",
                self.dimensions
            ));
        }
        if self.dimensions.byte_len().is_none() {
            return Err(anyhow!("dimensions {} overflow", self.dimensions));
        }
        if self.sample_target == 0 {
            return Err(anyhow!("sample_target must be greater than zero"));
        }
        if self.top_n == 0 {
            return Err(anyhow!("top_n must be greater than zero"));
        }
        for entry in self.resolutions.entries() {
            if entry.total_pixels == 0 {
                return Err(anyhow!(
                    "known resolution {:?} has a zero side",
                    entry.label
                ));
            }
        }
        Ok(())
    }

    /// Replaces the requested dimensions, e.g. from command-line flags.
    pub fn with_dimensions(mut self, width: Option<u32>, height: Option<u32>) -> Result<Self> {
        if let Some(width) = width {
            self.dimensions.width = width;
        }
        if let Some(height) = height {
            self.dimensions.height = height;
        }
        self.validate()?;
        Ok(self)
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("{} must be a non-negative integer (got {:?})", key, value)),
        _ => Ok(None),
    }
}

fn read_config_file(path: &Path) -> Result<InspectorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
