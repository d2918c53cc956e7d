//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate output dimensions that fit within `max_pixels` on the longer edge.
///
/// Only the axis that exceeds the limit is scaled down to exactly `max_pixels`;
/// the other axis follows proportionally with integer truncation. A square
/// image goes through the width branch. Images already within the limit are
/// returned unchanged. This never upscales.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `max_pixels` - Maximum size of the longer edge
///
/// # Returns
/// * `(width, height)` - Output dimensions
///
/// # Examples
/// ```
/// # use image_mirror::imaging::calculate_fit_dimensions;
/// assert_eq!(calculate_fit_dimensions((3000, 2000), 1920), (1920, 1280));
/// assert_eq!(calculate_fit_dimensions((2000, 3000), 1920), (1280, 1920));
/// assert_eq!(calculate_fit_dimensions((1000, 800), 1920), (1000, 800));
/// ```
pub fn calculate_fit_dimensions(source: (u32, u32), max_pixels: u32) -> (u32, u32) {
    let (src_w, src_h) = source;

    if src_w > max_pixels && src_w >= src_h {
        (max_pixels, scale_axis(src_h, max_pixels, src_w))
    } else if src_h > max_pixels && src_h > src_w {
        (scale_axis(src_w, max_pixels, src_h), max_pixels)
    } else {
        (src_w, src_h)
    }
}

/// `floor(value * numerator / denominator)`, never below 1.
///
/// A zero-pixel axis cannot be encoded, so extreme panoramas keep a single row.
fn scale_axis(value: u32, numerator: u32, denominator: u32) -> u32 {
    let scaled = u64::from(value) * u64::from(numerator) / u64::from(denominator);
    (scaled as u32).max(1)
}
