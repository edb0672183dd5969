//! Per-run cancellation token.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Cooperative cancellation signal shared by every invocation of one run.
///
/// Clones share state. A token is never reused: each submission constructs
/// a fresh one and aborts the previous one.
#[derive(Debug, Clone)]
pub struct RunToken {
    run_id: Uuid,
    cancel: CancellationToken,
    stop_requested: Arc<AtomicBool>,
}

impl RunToken {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            cancel: CancellationToken::new(),
            stop_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The run this token belongs to.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Idempotent. Wakes every pending [`RunToken::cancelled`] future.
    pub fn abort(&self) {
        self.cancel.cancel();
    }

    /// Record an explicit user stop and abort in-flight work.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
        self.abort();
    }

    pub fn is_aborted(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    /// Checked at every stage boundary.
    pub fn should_halt(&self) -> bool {
        self.is_aborted() || self.stop_requested()
    }

    /// Resolves once the token is aborted.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }
}

impl Default for RunToken {
    fn default() -> Self {
        Self::new()
    }
}
