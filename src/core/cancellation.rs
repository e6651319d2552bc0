use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// A shared cancellation flag for a tree of cooperative tasks.
///
/// Every task spawned as a continuation of a cancellable operation receives a clone
/// of its parent's token. Cancelling any clone cancels the whole tree: tasks that are
/// already queued in the `TaskManager` are dropped the next time they would be
/// promoted or stepped, so no orphaned work from a stale operation keeps running.
///
/// # Examples
///
/// ```
/// use voxel_streaming::core::CancellationToken;
///
/// let token = CancellationToken::new();
/// let continuation = token.clone();
/// assert!(!continuation.is_cancelled());
///
/// token.cancel();
/// assert!(continuation.is_cancelled());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a new token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels every task holding a clone of this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns `true` once any clone of this token has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
