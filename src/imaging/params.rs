//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between [`operations`](super::operations) (which decides where an
//! image goes and cleans up after failures) and the [`backend`](super::backend)
//! (which does the actual pixel work). Keeping them separate lets the sync
//! tests swap in a mock backend without touching operation logic.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 80). Clamped on construction.
//! - [`TranscodeParams`]: full specification for one transcode: source, output
//!   path, longer-edge limit, quality.

use std::path::PathBuf;

/// Longer-edge limit applied when no configuration overrides it.
pub const DEFAULT_MAX_PIXELS: u32 = 1920;

/// Quality setting for JPEG encoding (1-100).
///
/// The value is private so every instance has gone through the clamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// The quality byte handed to the JPEG encoder.
    pub fn as_jpeg(self) -> u8 {
        u8::try_from(self.0).unwrap_or(100)
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Parameters for a single decode → fit → encode operation.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Maximum size of the longer edge, in pixels.
    pub max_pixels: u32,
    pub quality: Quality,
}
