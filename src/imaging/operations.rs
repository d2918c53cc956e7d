//! High-level image operations.
//!
//! These functions combine configuration with backend execution and own the
//! cleanup contract: a failed transcode never leaves a destination file behind.

use super::backend::{BackendError, Dimensions, ImageBackend, TranscodeOutcome};
use super::calculations::calculate_fit_dimensions;
use super::params::{DEFAULT_MAX_PIXELS, Quality, TranscodeParams};
use std::io;
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Configuration shared by every transcode in a sync pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscodeConfig {
    pub max_pixels: u32,
    pub quality: Quality,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            max_pixels: DEFAULT_MAX_PIXELS,
            quality: Quality::default(),
        }
    }
}

/// Plan a transcode operation without executing it.
pub fn plan_transcode(source: &Path, output: &Path, config: &TranscodeConfig) -> TranscodeParams {
    TranscodeParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        max_pixels: config.max_pixels,
        quality: config.quality,
    }
}

/// Convert `source` to a JPEG at `output`, downscaling if oversized.
///
/// On failure the output file is removed, whether it was partially written
/// by this call or left over from an earlier run, and the error is returned.
pub fn transcode_image(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    config: &TranscodeConfig,
) -> Result<TranscodeOutcome> {
    let params = plan_transcode(source, output, config);
    backend.transcode(&params).inspect_err(|_| {
        remove_failed_output(output);
    })
}

/// Identify `source` and report the dimensions a transcode would produce.
pub fn plan_output_dimensions(
    backend: &impl ImageBackend,
    source: &Path,
    config: &TranscodeConfig,
) -> Result<TranscodeOutcome> {
    let original = backend.identify(source)?;
    let output = calculate_fit_dimensions(original.as_tuple(), config.max_pixels);
    Ok(TranscodeOutcome {
        original,
        output: Dimensions::from(output),
    })
}

fn remove_failed_output(output: &Path) {
    match std::fs::remove_file(output) {
        Ok(()) => tracing::debug!(path = %output.display(), "Removed failed output"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            path = %output.display(),
            error = %e,
            "Could not remove failed output"
        ),
    }
}
