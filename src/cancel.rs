//! Cooperative cancellation for sync passes.
//!
//! A [`CancelToken`] is a shared flag. The synchronizer polls it before each
//! directory and between files and subdirectories; a transcode already in
//! flight always runs to completion, so cancelling never leaves a half-written
//! JPEG behind.
//!
//! ```text
//! stdin watcher ──cancel()──→ CancelToken ←──is_cancelled()── sync pass
//!                                  ↑
//!                       wait_timeout() between passes
//! ```

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Granularity of [`CancelToken::wait_timeout`].
const WAIT_SLICE: Duration = Duration::from_millis(100);

/// Shared cancellation flag. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Sleep for up to `timeout`, waking early if cancelled.
    ///
    /// Returns `true` if the token was cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_cancelled() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            std::thread::sleep(WAIT_SLICE.min(deadline - now));
        }
    }
}

/// Spawn a detached thread that cancels `token` when a line arrives on stdin.
///
/// End of input does not cancel, so piping `/dev/null` into the program lets
/// it run to completion.
pub fn cancel_on_enter(token: &CancelToken) -> std::io::Result<JoinHandle<()>> {
    let token = token.clone();
    std::thread::Builder::new()
        .name("stdin-cancel".into())
        .spawn(move || watch_lines(std::io::stdin().lock(), &token))
}

fn watch_lines(mut input: impl BufRead, token: &CancelToken) {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) => tracing::debug!("stdin closed; cancellation by keypress disabled"),
        Ok(_) => {
            tracing::info!("Cancellation requested");
            token.cancel();
        }
        Err(e) => tracing::debug!(error = %e, "stdin read failed; cancellation by keypress disabled"),
    }
}
