//! Directory tree synchronization.
//!
//! Walks a source tree and makes sure every supported image has a current
//! JPEG counterpart at the same relative position under the destination root:
//!
//! ```text
//! photos/                          mirror/
//! ├── 2023/                        ├── 2023/
//! │   ├── beach.png          →     │   ├── beach.jpg     (downscaled if > max_pixels)
//! │   ├── notes.txt                │   └── scan.jpg
//! │   └── scan.BMP           →     └── cover.jpg
//! ├── empty/
//! └── cover.jpeg             →
//! ```
//!
//! ## Per-directory algorithm
//!
//! 1. Files first, in enumeration order. A file is considered when its
//!    extension is in the configured set (case-insensitive). It is *up to date*
//!    when the destination exists and its modification time is not earlier than
//!    the source's; equal timestamps count as up to date. Anything else is
//!    transcoded. The destination directory is created lazily, at most once,
//!    right before the first file that needs writing, so empty or
//!    unsupported-only source directories never appear in the mirror.
//! 2. Then subdirectories, each recursing into `dest/<same name>`.
//!
//! There is no index: timestamps on disk are the only state, which makes a
//! second pass over an unchanged tree a no-op. Nothing under the destination
//! is ever deleted except the output of a transcode that just failed.
//!
//! ## Failure isolation
//!
//! - A file that fails to decode/encode is reported as
//!   [`SyncEvent::FileFailed`]; its destination is removed and the pass moves on.
//! - A directory that cannot be listed or created is reported as
//!   [`SyncEvent::DirectoryFailed`]; its siblings still run. When the
//!   destination directory cannot be created, the remaining files of that
//!   directory are skipped but its subdirectories are still visited.
//! - Only an invalid invocation (a root that is not a directory) fails the
//!   whole call with [`SyncError`].
//!
//! ## Cancellation
//!
//! The [`CancelToken`] is checked before each directory and after each file
//! and subdirectory. A transcode in flight always completes.

use crate::cancel::CancelToken;
use crate::config::MirrorConfig;
use crate::imaging::{
    ImageBackend, RustBackend, TranscodeConfig, TranscodeOutcome, plan_output_dimensions,
    transcode_image,
};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::SystemTime;
use thiserror::Error;

/// Extension given to every mirrored file.
pub const OUTPUT_EXTENSION: &str = "jpg";

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("Destination directory not found: {0}")]
    DestinationNotFound(PathBuf),
}

/// Settings for one sync pass.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub transcode: TranscodeConfig,
    /// Lowercase extensions without a leading dot.
    pub extensions: Vec<String>,
    /// Report what would be converted without writing anything.
    pub dry_run: bool,
}

impl SyncOptions {
    pub fn from_config(config: &MirrorConfig) -> Self {
        Self {
            transcode: config.transcode(),
            extensions: config.scan.normalized_extensions(),
            dry_run: false,
        }
    }

    /// Whether `path` has one of the configured extensions.
    pub fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|s| s.eq_ignore_ascii_case(ext)))
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from_config(&MirrorConfig::default())
    }
}

/// Progress events emitted during a pass, in traversal order.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// A source directory is about to be scanned.
    DirectoryStarted { source: PathBuf },
    /// A file needs converting; the transcode starts now.
    FileStarted {
        source: PathBuf,
        destination: PathBuf,
    },
    FileConverted {
        source: PathBuf,
        destination: PathBuf,
        outcome: TranscodeOutcome,
    },
    /// Dry run only: the file would be converted to these dimensions.
    FilePlanned {
        source: PathBuf,
        destination: PathBuf,
        outcome: TranscodeOutcome,
    },
    FileFailed { source: PathBuf, error: String },
    DirectoryFailed { source: PathBuf, error: String },
    /// The pass stopped early because the token was cancelled.
    Cancelled,
}

/// Counters for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub converted: u32,
    /// Subset of `converted` that were downscaled.
    pub resized: u32,
    /// Dry run: files that would have been converted.
    pub planned: u32,
    pub up_to_date: u32,
    pub failed: u32,
    pub directories_failed: u32,
    pub cancelled: bool,
}

impl SyncStats {
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.directories_failed > 0
    }
}

impl fmt::Display for SyncStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.planned > 0 {
            write!(f, "{} to convert", self.planned)?;
        } else {
            write!(f, "{} converted", self.converted)?;
            if self.resized > 0 {
                write!(f, " ({} resized)", self.resized)?;
            }
        }
        write!(f, ", {} up to date", self.up_to_date)?;
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        if self.directories_failed > 0 {
            write!(f, ", {} directories failed", self.directories_failed)?;
        }
        if self.cancelled {
            write!(f, " (aborted)")?;
        }
        Ok(())
    }
}

/// A source file paired with its mirrored destination and both timestamps.
///
/// Built for each supported file as it is encountered and dropped once the
/// file has been handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTask {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub source_modified: SystemTime,
    /// `None` when the destination does not exist yet.
    pub destination_modified: Option<SystemTime>,
}

impl SyncTask {
    /// Read the timestamps for `source` and its counterpart in `dest_dir`.
    pub fn inspect(source: &Path, dest_dir: &Path) -> io::Result<Self> {
        let destination = destination_path(source, dest_dir);
        let source_modified = fs::metadata(source)?.modified()?;
        let destination_modified = match fs::metadata(&destination) {
            Ok(meta) => Some(meta.modified()?),
            // A file sitting where the destination directory belongs also
            // means the copy is absent; creating the directory reports it.
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                ) =>
            {
                None
            }
            Err(e) => return Err(e),
        };
        Ok(Self {
            source: source.to_path_buf(),
            destination,
            source_modified,
            destination_modified,
        })
    }

    /// Destination exists and is not older than the source.
    pub fn is_up_to_date(&self) -> bool {
        self.destination_modified
            .is_some_and(|dest| dest >= self.source_modified)
    }
}

/// Destination for `source`: same stem, `.jpg` extension, inside `dest_dir`.
///
/// ```
/// # use std::path::Path;
/// # use image_mirror::sync::destination_path;
/// let dest = destination_path(Path::new("photos/IMG_01.PNG"), Path::new("mirror"));
/// assert_eq!(dest, Path::new("mirror/IMG_01.jpg"));
/// ```
pub fn destination_path(source: &Path, dest_dir: &Path) -> PathBuf {
    let mut name = source.file_stem().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(OUTPUT_EXTENSION);
    dest_dir.join(name)
}

/// Run one sync pass from `source_root` into `dest_root` with the image-crate backend.
pub fn sync(
    source_root: &Path,
    dest_root: &Path,
    options: &SyncOptions,
    cancel: &CancelToken,
    events: Option<Sender<SyncEvent>>,
) -> Result<SyncStats, SyncError> {
    let backend = RustBackend::new();
    sync_with_backend(&backend, source_root, dest_root, options, cancel, events)
}

/// Run one sync pass using a specific backend (allows testing with mock).
pub fn sync_with_backend(
    backend: &impl ImageBackend,
    source_root: &Path,
    dest_root: &Path,
    options: &SyncOptions,
    cancel: &CancelToken,
    events: Option<Sender<SyncEvent>>,
) -> Result<SyncStats, SyncError> {
    if !source_root.is_dir() {
        return Err(SyncError::SourceNotFound(source_root.to_path_buf()));
    }
    if !dest_root.is_dir() {
        return Err(SyncError::DestinationNotFound(dest_root.to_path_buf()));
    }

    let mut walker = TreeWalker {
        backend,
        options,
        cancel,
        events,
        // Lets the walk skip the mirror when it is nested inside the source.
        dest_root: fs::canonicalize(dest_root).ok(),
        stats: SyncStats::default(),
    };
    walker.sync_dir(source_root, dest_root);

    if cancel.is_cancelled() {
        walker.stats.cancelled = true;
        walker.emit(SyncEvent::Cancelled);
    }
    tracing::info!(
        source = %source_root.display(),
        destination = %dest_root.display(),
        stats = %walker.stats,
        "Sync pass finished"
    );
    Ok(walker.stats)
}

/// State threaded through one recursive pass.
struct TreeWalker<'a, B> {
    backend: &'a B,
    options: &'a SyncOptions,
    cancel: &'a CancelToken,
    events: Option<Sender<SyncEvent>>,
    dest_root: Option<PathBuf>,
    stats: SyncStats,
}

/// Immediate children of a directory, split by kind, in enumeration order.
#[derive(Default)]
struct DirListing {
    files: Vec<PathBuf>,
    dirs: Vec<PathBuf>,
}

impl<B: ImageBackend> TreeWalker<'_, B> {
    fn emit(&self, event: SyncEvent) {
        if let Some(tx) = &self.events {
            // A closed receiver only means nobody is watching progress.
            let _ = tx.send(event);
        }
    }

    fn directory_failed(&mut self, source: &Path, error: impl fmt::Display) {
        tracing::warn!(directory = %source.display(), error = %error, "Directory skipped");
        self.stats.directories_failed += 1;
        self.emit(SyncEvent::DirectoryFailed {
            source: source.to_path_buf(),
            error: error.to_string(),
        });
    }

    fn sync_dir(&mut self, source_dir: &Path, dest_dir: &Path) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.emit(SyncEvent::DirectoryStarted {
            source: source_dir.to_path_buf(),
        });

        let listing = match list_dir(source_dir) {
            Ok(listing) => listing,
            Err(e) => {
                self.directory_failed(source_dir, e);
                return;
            }
        };

        let mut dest_dir_ready = false;
        for file in &listing.files {
            if self.options.is_supported(file)
                && let Err(e) = self.sync_file(file, dest_dir, &mut dest_dir_ready)
            {
                self.directory_failed(source_dir, format!("{}: {e}", dest_dir.display()));
                break;
            }
            if self.cancel.is_cancelled() {
                return;
            }
        }

        for subdir in &listing.dirs {
            if self.is_dest_root(subdir) {
                tracing::debug!(directory = %subdir.display(), "Skipping destination inside source");
                continue;
            }
            let name = subdir.file_name().unwrap_or_default();
            self.sync_dir(subdir, &dest_dir.join(name));
            if self.cancel.is_cancelled() {
                return;
            }
        }
    }

    /// Handle one supported file.
    ///
    /// Per-file problems are reported and swallowed; the returned error means
    /// the destination directory could not be created.
    fn sync_file(
        &mut self,
        source: &Path,
        dest_dir: &Path,
        dest_dir_ready: &mut bool,
    ) -> io::Result<()> {
        let task = match SyncTask::inspect(source, dest_dir) {
            Ok(task) => task,
            Err(e) => {
                self.file_failed(source, e);
                return Ok(());
            }
        };

        if task.is_up_to_date() {
            tracing::debug!(file = %source.display(), "Up to date");
            self.stats.up_to_date += 1;
            return Ok(());
        }

        if self.options.dry_run {
            self.plan_file(task);
            return Ok(());
        }

        if !*dest_dir_ready {
            if !dest_dir.is_dir() {
                fs::create_dir_all(dest_dir)?;
                tracing::debug!(directory = %dest_dir.display(), "Created destination directory");
            }
            *dest_dir_ready = true;
        }

        self.emit(SyncEvent::FileStarted {
            source: task.source.clone(),
            destination: task.destination.clone(),
        });
        match transcode_image(
            self.backend,
            &task.source,
            &task.destination,
            &self.options.transcode,
        ) {
            Ok(outcome) => {
                tracing::debug!(
                    file = %task.source.display(),
                    original = %outcome.original,
                    output = %outcome.output,
                    "Converted"
                );
                self.stats.converted += 1;
                if outcome.resized() {
                    self.stats.resized += 1;
                }
                self.emit(SyncEvent::FileConverted {
                    source: task.source,
                    destination: task.destination,
                    outcome,
                });
            }
            Err(e) => self.file_failed(&task.source, e),
        }
        Ok(())
    }

    fn plan_file(&mut self, task: SyncTask) {
        match plan_output_dimensions(self.backend, &task.source, &self.options.transcode) {
            Ok(outcome) => {
                self.stats.planned += 1;
                self.emit(SyncEvent::FilePlanned {
                    source: task.source,
                    destination: task.destination,
                    outcome,
                });
            }
            Err(e) => self.file_failed(&task.source, e),
        }
    }

    fn file_failed(&mut self, source: &Path, error: impl fmt::Display) {
        tracing::warn!(file = %source.display(), error = %error, "Conversion failed");
        self.stats.failed += 1;
        self.emit(SyncEvent::FileFailed {
            source: source.to_path_buf(),
            error: error.to_string(),
        });
    }

    fn is_dest_root(&self, dir: &Path) -> bool {
        match (&self.dest_root, fs::canonicalize(dir)) {
            (Some(dest_root), Ok(dir)) => *dest_root == dir,
            _ => false,
        }
    }
}

/// List a directory once, splitting files from subdirectories.
///
/// Symlinks to files are treated as files. Symlinks to directories are not
/// followed, so a link cycle cannot recurse forever.
fn list_dir(dir: &Path) -> io::Result<DirListing> {
    let mut listing = DirListing::default();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            listing.dirs.push(path);
        } else if file_type.is_file() || (file_type.is_symlink() && path.is_file()) {
            listing.files.push(path);
        } else {
            tracing::debug!(path = %path.display(), "Skipping non-regular entry");
        }
    }
    Ok(listing)
}
