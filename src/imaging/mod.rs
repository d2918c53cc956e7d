//! Image processing: decode, fit and encode to JPEG.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Fit** | [`calculate_fit_dimensions`] (longer-edge rule, integer truncation) |
//! | **Resize** | Lanczos3 via `DynamicImage::resize_exact` |
//! | **Encode** | `JpegEncoder` at a fixed [`Quality`] |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining parameters + backend,
//!   including cleanup of failed outputs

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, TranscodeOutcome};
pub use calculations::calculate_fit_dimensions;
pub use operations::{TranscodeConfig, plan_output_dimensions, plan_transcode, transcode_image};
pub use params::{DEFAULT_MAX_PIXELS, Quality, TranscodeParams};
pub use rust_backend::{RustBackend, decodable_extensions};
