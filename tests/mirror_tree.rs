//! End-to-end tests: a realistic source tree mirrored through the public
//! library API, plus a few runs of the compiled binary.
//!
//! Run with: cargo test --test mirror_tree

use image::{ImageEncoder, RgbImage, RgbaImage};
use image_mirror::cancel::CancelToken;
use image_mirror::config::{self, MirrorConfig};
use image_mirror::sync::{self, SyncEvent, SyncOptions};
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::TempDir;
use walkdir::WalkDir;

fn write_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 90])
    });
    let file = fs::File::create(path).unwrap();
    image::codecs::jpeg::JpegEncoder::new(std::io::BufWriter::new(file))
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

fn write_png_with_alpha(path: &Path, width: u32, height: u32) {
    RgbaImage::from_fn(width, height, |x, _| image::Rgba([200, 10, 10, (x % 256) as u8]))
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}

fn files_under(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}

/// A small photo library with nested folders, mixed formats, junk, and one
/// corrupt file.
fn photo_library() -> (TempDir, TempDir) {
    let source = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    let root = source.path();

    fs::create_dir_all(root.join("2022/winter")).unwrap();
    fs::create_dir_all(root.join("2023")).unwrap();
    fs::create_dir_all(root.join("scratch/empty")).unwrap();

    write_jpeg(&root.join("cover.JPG"), 320, 180);
    write_jpeg(&root.join("2022/panorama.jpeg"), 600, 150);
    write_png_with_alpha(&root.join("2022/winter/logo.png"), 120, 360);
    image::RgbImage::new(64, 48)
        .save_with_format(root.join("2023/scan.bmp"), image::ImageFormat::Bmp)
        .unwrap();
    fs::write(root.join("2023/corrupt.png"), b"\x89PNG but not really").unwrap();
    fs::write(root.join("2023/notes.txt"), b"shot on film").unwrap();
    fs::write(root.join("scratch/animation.gif"), b"GIF89a").unwrap();

    (source, dest)
}

fn options(max_pixels: u32) -> SyncOptions {
    let mut config = MirrorConfig::default();
    config.images.max_pixels = max_pixels;
    SyncOptions::from_config(&config)
}

#[test]
fn library_is_mirrored_downscaled_and_idempotent() {
    let (source, dest) = photo_library();
    let cancel = CancelToken::new();
    let options = options(300);

    let first = sync::sync(source.path(), dest.path(), &options, &cancel, None).unwrap();

    assert_eq!(first.converted, 4);
    assert_eq!(first.resized, 3);
    assert_eq!(first.failed, 1);
    assert_eq!(
        files_under(dest.path()),
        vec![
            "2022/panorama.jpg",
            "2022/winter/logo.jpg",
            "2023/scan.jpg",
            "cover.jpg",
        ]
    );
    assert!(!dest.path().join("scratch").exists());

    let dims = |rel: &str| image::image_dimensions(dest.path().join(rel)).unwrap();
    assert_eq!(dims("cover.jpg"), (300, 168)); // 180 * 300 / 320 = 168.75
    assert_eq!(dims("2022/panorama.jpg"), (300, 75));
    assert_eq!(dims("2022/winter/logo.jpg"), (100, 300));
    assert_eq!(dims("2023/scan.jpg"), (64, 48));

    let second = sync::sync(source.path(), dest.path(), &options, &cancel, None).unwrap();
    assert_eq!(second.converted, 0);
    assert_eq!(second.up_to_date, 4);
    // The corrupt file has no destination, so it is retried and fails again.
    assert_eq!(second.failed, 1);
}

#[test]
fn failure_event_names_the_corrupt_file() {
    let (source, dest) = photo_library();
    let (tx, rx) = std::sync::mpsc::channel();

    sync::sync(
        source.path(),
        dest.path(),
        &SyncOptions::default(),
        &CancelToken::new(),
        Some(tx),
    )
    .unwrap();

    let failed: Vec<_> = rx
        .iter()
        .filter_map(|e| match e {
            SyncEvent::FileFailed { source, .. } => Some(source),
            _ => None,
        })
        .collect();
    assert_eq!(failed, vec![source.path().join("2023/corrupt.png")]);
}

#[test]
fn config_file_drives_the_pass() {
    let (source, dest) = photo_library();
    let config_dir = TempDir::new().unwrap();
    let config_path = config_dir.path().join("mirror.toml");
    fs::write(
        &config_path,
        "[images]\nmax_pixels = 32\n\n[scan]\nextensions = [\"bmp\"]\n",
    )
    .unwrap();

    let config = config::load_config(Some(&config_path)).unwrap();
    let stats = sync::sync(
        source.path(),
        dest.path(),
        &SyncOptions::from_config(&config),
        &CancelToken::new(),
        None,
    )
    .unwrap();

    assert_eq!(stats.converted, 1);
    assert_eq!(files_under(dest.path()), vec!["2023/scan.jpg"]);
    assert_eq!(
        image::image_dimensions(dest.path().join("2023/scan.jpg")).unwrap(),
        (32, 24)
    );
}

// =========================================================================
// Binary
// =========================================================================

fn binary() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_image-mirror"));
    cmd.stdin(Stdio::null()).env_remove("RUST_LOG");
    cmd
}

#[test]
fn binary_rejects_missing_directories() {
    let dest = TempDir::new().unwrap();
    let output = binary()
        .arg(dest.path().join("does-not-exist"))
        .arg(dest.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage: image-mirror <SOURCE> <DEST>"));
    assert!(fs::read_dir(dest.path()).unwrap().next().is_none());
}

#[test]
fn binary_mirrors_and_prints_summary() {
    let source = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    write_jpeg(&source.path().join("a.jpg"), 40, 20);

    let output = binary()
        .arg(source.path())
        .arg(dest.path())
        .args(["--max-pixels", "20"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Searching for new and changed files"));
    assert!(stdout.contains("1 converted (1 resized), 0 up to date"));
    assert_eq!(
        image::image_dimensions(dest.path().join("a.jpg")).unwrap(),
        (20, 10)
    );
}

#[test]
fn binary_dry_run_writes_nothing() {
    let source = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    fs::create_dir(source.path().join("sub")).unwrap();
    write_jpeg(&source.path().join("sub/a.jpg"), 40, 20);

    let output = binary()
        .arg(source.path())
        .arg(dest.path())
        .arg("--dry-run")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("1 to convert"));
    assert!(files_under(dest.path()).is_empty());
    assert!(!dest.path().join("sub").exists());
}

#[test]
fn binary_gen_config_is_loadable() {
    let output = binary().arg("--gen-config").output().unwrap();
    assert!(output.status.success());

    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("mirror.toml");
    fs::write(&path, &output.stdout).unwrap();
    assert_eq!(
        config::load_config(Some(&path)).unwrap(),
        MirrorConfig::default()
    );
}
