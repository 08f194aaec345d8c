use std::sync::Arc;
use std::time::Duration;

/// Receives [`BatchEvent`]s as a batch progresses.
pub type Observer = Arc<dyn Fn(&BatchEvent) + Send + Sync>;

/// Progress notifications. The outcome of a batch is still only delivered
/// as a whole, by the [`BatchResult`](super::BatchResult).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchEvent {
    ResolveAttempt { attempt: u32, of: u32 },
    Resolved { items: usize },
    Annotated { matched: usize, total: usize },
    /// Emitted in playlist order once the acquisition stage has drained.
    ItemFinished { title: String, ok: bool },
    Complete { succeeded: usize, failed: usize, elapsed: Duration },
}
