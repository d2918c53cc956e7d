//! # Image Mirror
//!
//! Keeps a JPEG mirror of an image directory tree. Every supported image under
//! the source root gets a counterpart under the destination root at the same
//! relative path, with the extension replaced by `.jpg` and the longer edge
//! capped at a configurable size (1920 px by default).
//!
//! ```text
//! image-mirror ~/Pictures /media/frame
//! ```
//!
//! # Pass Structure
//!
//! One *sync pass* is a single recursive walk:
//!
//! ```text
//! for each directory (source order):
//!     for each supported file:   up to date?  → skip
//!                                otherwise    → decode → fit → encode JPEG
//!     for each subdirectory:     recurse into dest/<name>
//! ```
//!
//! "Up to date" means the destination exists and is not older than the source.
//! Nothing else is remembered between passes, so running again over an
//! unchanged tree converts nothing. Passes can repeat on an interval and are
//! cancelled cooperatively between files.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`sync`] | Tree walk, up-to-date decision, lazy directory creation, failure isolation |
//! | [`imaging`] | Decode, longer-edge fit, Lanczos3 resize, JPEG encode, cleanup of failed outputs |
//! | [`config`] | Stock defaults, optional TOML file, validation |
//! | [`cancel`] | Shared cancellation flag and stdin watcher |
//! | [`output`] | Console rendering of pass progress and summaries |
//!
//! # Design Decisions
//!
//! ## Timestamps Are the Only State
//!
//! There is no manifest or cache file. A destination whose modification time
//! is greater than or equal to its source's is skipped. Touching a source
//! re-converts it; deleting a destination re-creates it. Orphaned destinations
//! (source deleted) are left alone; the mirror only ever grows.
//!
//! ## Failures Stay Local
//!
//! A corrupt image fails alone: its destination is removed so no truncated or
//! stale JPEG survives, and the pass continues. An unreadable directory is
//! reported and skipped with the rest of the tree still processed.
//!
//! ## Integer Fit
//!
//! The scaled axis is `floor(other * max / longer)`, never rounded, so output
//! sizes are predictable from the input size alone. See
//! [`imaging::calculate_fit_dimensions`].

pub mod cancel;
pub mod config;
pub mod imaging;
pub mod output;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_helpers;
