//! Console output for sync passes.
//!
//! # Output Format
//!
//! A pass over a tree where two files need converting looks like:
//!
//! ```text
//! Searching for new and changed files (press Enter to abort)...
//! photos/2023/beach.png
//!     → mirror/2023/beach.jpg (4000x3000 → 1920x1440)
//! photos/2023/broken.jpg
//!     Error: Failed to decode photos/2023/broken.jpg: ...
//!
//! Searching for new and changed files (press Enter to abort)......
//! 2 converted (1 resized), 41 up to date, 1 failed
//! ```
//!
//! While nothing needs converting, each scanned directory adds a `.` to the
//! current "Searching" line. After any file line, the next directory opens a
//! fresh "Searching" line so progress dots never trail a file name.
//!
//! # Architecture
//!
//! [`ProgressPrinter::render`] is pure: it turns one [`SyncEvent`] into the
//! text to write (possibly empty) and tracks the line state. [`ProgressPrinter::print`]
//! is the stdout wrapper.

use crate::imaging::TranscodeOutcome;
use crate::sync::{SyncEvent, SyncStats};
use std::io::Write;
use std::path::Path;

pub const SEARCHING_LINE: &str = "Searching for new and changed files (press Enter to abort)...";

/// Renders sync events as console text, one pass at a time.
#[derive(Debug)]
pub struct ProgressPrinter {
    /// A file line was printed since the last "Searching" line.
    printed_files: bool,
    /// The last thing written was a "Searching" line or dot (no newline yet).
    line_open: bool,
    /// Whether to mention Enter-to-abort.
    interactive: bool,
}

impl Default for ProgressPrinter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ProgressPrinter {
    pub fn new(interactive: bool) -> Self {
        Self {
            printed_files: true,
            line_open: false,
            interactive,
        }
    }

    fn searching_line(&self) -> &'static str {
        if self.interactive {
            SEARCHING_LINE
        } else {
            "Searching for new and changed files..."
        }
    }

    /// Text that ends an open progress line, if any.
    fn close_line(&mut self) -> &'static str {
        if std::mem::take(&mut self.line_open) {
            "\n"
        } else {
            ""
        }
    }

    /// Text for one event. May be empty.
    pub fn render(&mut self, event: &SyncEvent) -> String {
        match event {
            SyncEvent::DirectoryStarted { .. } => {
                let text = if self.printed_files {
                    self.printed_files = false;
                    format!("{}\n{}", self.close_line(), self.searching_line())
                } else {
                    ".".to_string()
                };
                self.line_open = true;
                text
            }
            SyncEvent::FileStarted { source, .. } => {
                self.printed_files = true;
                format!("{}{}\n", self.close_line(), source.display())
            }
            SyncEvent::FileConverted {
                destination,
                outcome,
                ..
            } => format!("    \u{2192} {}\n", format_outcome(destination, outcome)),
            SyncEvent::FilePlanned {
                source,
                destination,
                outcome,
            } => {
                self.printed_files = true;
                format!(
                    "{}{}\n    would write {}\n",
                    self.close_line(),
                    source.display(),
                    format_outcome(destination, outcome)
                )
            }
            SyncEvent::FileFailed { error, .. } => {
                self.printed_files = true;
                format!("{}    Error: {}\n", self.close_line(), error)
            }
            SyncEvent::DirectoryFailed { source, error } => {
                self.printed_files = true;
                format!(
                    "{}Error: cannot process {}: {}\n",
                    self.close_line(),
                    source.display(),
                    error
                )
            }
            SyncEvent::Cancelled => format!("{}Aborted.\n", self.close_line()),
        }
    }

    /// Close any open progress line at the end of a pass.
    pub fn finish(&mut self) -> String {
        self.close_line().to_string()
    }

    /// Render and write one event to stdout.
    pub fn print(&mut self, event: &SyncEvent) {
        write_stdout(&self.render(event));
    }

    /// Print the end-of-pass summary.
    pub fn print_summary(&mut self, stats: &SyncStats) {
        let tail = self.finish();
        write_stdout(&format!("{tail}{}\n", format_summary(stats)));
    }
}

/// `dest (WxH → wxh)` for resized images, `dest (WxH)` otherwise.
fn format_outcome(destination: &Path, outcome: &TranscodeOutcome) -> String {
    if outcome.resized() {
        format!(
            "{} ({} \u{2192} {})",
            destination.display(),
            outcome.original,
            outcome.output
        )
    } else {
        format!("{} ({})", destination.display(), outcome.output)
    }
}

/// One-line pass summary.
pub fn format_summary(stats: &SyncStats) -> String {
    stats.to_string()
}

fn write_stdout(text: &str) {
    if text.is_empty() {
        return;
    }
    let mut stdout = std::io::stdout().lock();
    // Progress output is best effort; a closed stdout must not stop the pass.
    let _ = stdout.write_all(text.as_bytes());
    let _ = stdout.flush();
}

// ============================================================================
// Tests
// ============================================================================
