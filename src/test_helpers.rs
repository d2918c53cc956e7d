//! Shared test utilities: fixture image writers, timestamp control, and
//! tree listings for asserting on a mirrored destination.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! write_test_png(&source.join("a.png"), 300, 200);
//! set_modified(&dest.join("a.jpg"), SystemTime::now());
//! assert_eq!(relative_files(&dest), vec!["a.jpg"]);
//! ```

use image::{ImageEncoder, RgbImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::SystemTime;
use walkdir::WalkDir;

// =========================================================================
// Fixture images
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Write a small valid JPEG with the given dimensions.
pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = gradient(width, height);
    let writer = BufWriter::new(File::create(path).unwrap());
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write a small valid PNG with the given dimensions.
pub fn write_test_png(path: &Path, width: u32, height: u32) {
    gradient(width, height)
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}

/// Write a small valid BMP with the given dimensions.
pub fn write_test_bmp(path: &Path, width: u32, height: u32) {
    gradient(width, height)
        .save_with_format(path, image::ImageFormat::Bmp)
        .unwrap();
}

// =========================================================================
// Filesystem state
// =========================================================================

/// Set a file's modification time.
pub fn set_modified(path: &Path, time: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

pub fn file_bytes(path: &Path) -> Vec<u8> {
    std::fs::read(path).unwrap()
}

/// All files under `root`, as sorted `/`-separated relative paths.
pub fn relative_files(root: &Path) -> Vec<String> {
    relative_entries(root, |e| e.file_type().is_file())
}

/// All directories under `root` (excluding `root`), sorted.
pub fn relative_dirs(root: &Path) -> Vec<String> {
    relative_entries(root, |e| e.file_type().is_dir())
}

fn relative_entries(root: &Path, keep: impl Fn(&walkdir::DirEntry) -> bool) -> Vec<String> {
    let mut entries: Vec<String> = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| keep(e))
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect();
    entries.sort();
    entries
}
