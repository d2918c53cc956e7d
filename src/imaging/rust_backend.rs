//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, BMP) | `image` crate decoders, format sniffed from content |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the requested quality |

use super::backend::{BackendError, Dimensions, ImageBackend, TranscodeOutcome};
use super::calculations::calculate_fit_dimensions;
use super::params::{Quality, TranscodeParams};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageEncoder, ImageFormat, ImageReader, Limits};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::LazyLock;

/// Input extensions paired with the decoder they need.
const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("bmp", ImageFormat::Bmp),
];

static DECODABLE_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn decodable_extensions() -> &'static [&'static str] {
    &DECODABLE_EXTENSIONS
}

/// Backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(path: &Path, err: impl std::fmt::Display) -> BackendError {
    BackendError::Decode {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

/// Decoder limits for source images.
///
/// Large scans and 16-bit PNGs can exceed the `image` crate's default 512 MiB
/// allocation cap; every readable input should still be mirrored.
fn decode_limits() -> Limits {
    Limits::no_limits()
}

/// Load and decode an image from disk.
///
/// The format is sniffed from the file content first, so a PNG saved with a
/// `.jpg` extension still decodes.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    let mut reader = ImageReader::open(path)?.with_guessed_format()?;
    reader.limits(decode_limits());
    reader.decode().map_err(|e| decode_error(path, e))
}

/// Encode as baseline JPEG and write to `path`, replacing any existing file.
///
/// JPEG has no alpha channel; transparent pixels keep their color values.
fn save_jpeg(img: &DynamicImage, path: &Path, quality: Quality) -> Result<(), BackendError> {
    let rgb = img.to_rgb8();
    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    JpegEncoder::new_with_quality(&mut writer, quality.as_jpeg())
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| BackendError::Encode {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    writer.flush()?;
    Ok(())
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = ImageReader::open(path)?
            .with_guessed_format()?
            .into_dimensions()
            .map_err(|e| decode_error(path, e))?;
        Ok(Dimensions { width, height })
    }

    fn transcode(&self, params: &TranscodeParams) -> Result<TranscodeOutcome, BackendError> {
        let img = load_image(&params.source)?;
        let original = Dimensions::new(img.width(), img.height());
        let (width, height) = calculate_fit_dimensions(original.as_tuple(), params.max_pixels);

        let output = if (width, height) == original.as_tuple() {
            img
        } else {
            img.resize_exact(width, height, FilterType::Lanczos3)
        };

        save_jpeg(&output, &params.output, params.quality)?;
        Ok(TranscodeOutcome {
            original,
            output: Dimensions::new(width, height),
        })
    }
}
