//! Frame Probe
//!
//! Diagnostics for raw RGBA framebuffer dumps taken from an emulator's video
//! output, plus a small GF(2^8) checker for byte patterns seen in test-ROM logs.
//!
//! # Module Structure
//!
//! - `frame`: Pixel buffers, dimensions and the known-resolution table
//! - `histogram`: Color frequency counting (full scan or uniform sample)
//! - `pattern`: Test-pattern membership check and synthetic pattern generation
//! - `inspect`: The frame inspector (one pass over one dump, text/JSON report)
//! - `export`: RGB re-encode of a dump as a PNG next to the input
//! - `gf`: Rijndael field multiplication and generator sequences
//! - `config`: File + environment configuration for the tools
//!
//! Every tool processes its inputs strictly one after another. A failure on one
//! file is reported and the run moves on to the next.

pub mod config;
pub mod export;
pub mod frame;
pub mod gf;
pub mod histogram;
pub mod inspect;
pub mod pattern;

pub use config::InspectorConfig;
pub use frame::{
    DimensionSource, Dimensions, KnownResolution, PixelBuffer, ResolutionTable, ResolvedDimensions,
    Rgba,
};
pub use histogram::{ColorHistogram, SampleMode};
pub use inspect::{Inspection, InspectOptions, Inspector, ReportFormat};
pub use pattern::{PatternMatch, SyntheticLayout, TestPattern};

// -------------------- Error taxonomy --------------------

/// Classification of a per-file failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InspectErrorKind {
    /// File missing or unreadable.
    Io,
    /// Byte length is not a whole number of RGBA pixels.
    Format,
}

impl InspectErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            InspectErrorKind::Io => "IO_ERROR",
            InspectErrorKind::Format => "FORMAT_ERROR",
        }
    }
}

/// A per-file failure. Raised into `anyhow::Error`; recover the kind with
/// `err.downcast_ref::<InspectError>()`.
#[derive(Clone, Debug)]
pub struct InspectError {
    pub kind: InspectErrorKind,
    pub message: String,
}

impl InspectError {
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            kind: InspectErrorKind::Io,
            message: message.into(),
        }
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self {
            kind: InspectErrorKind::Format,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for InspectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.code(), self.message)
    }
}
impl std::error::Error for InspectError {}

/// Returns the kind of an error if it originated as an `InspectError`.
pub fn error_kind(err: &anyhow::Error) -> Option<InspectErrorKind> {
    err.downcast_ref::<InspectError>().map(|e| e.kind)
}
