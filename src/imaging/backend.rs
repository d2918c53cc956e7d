//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the synchronizer
//! needs: a cheap header-only identify and a full transcode (decode, fit,
//! encode, write).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording `MockBackend` in this module to inject
//! failures without real files.

use super::params::TranscodeParams;
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },
    #[error("Failed to encode {path}: {message}")]
    Encode { path: String, message: String },
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// What a transcode did: the decoded size and the size that was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscodeOutcome {
    pub original: Dimensions,
    pub output: Dimensions,
}

impl TranscodeOutcome {
    pub fn resized(&self) -> bool {
        self.original != self.output
    }
}

/// Trait for image processing backends.
pub trait ImageBackend {
    /// Read image dimensions without decoding pixel data.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode `params.source`, downscale to fit `params.max_pixels`, and write
    /// a JPEG to `params.output`, replacing any existing file.
    ///
    /// On error the output may be missing, truncated, or stale; callers go
    /// through [`transcode_image`](super::operations::transcode_image), which
    /// removes it.
    fn transcode(&self, params: &TranscodeParams) -> Result<TranscodeOutcome, BackendError>;
}
