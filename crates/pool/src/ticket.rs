use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

const RUNNING: u8 = 0;
const COMMITTED: u8 = 1;
const ABANDONED: u8 = 2;

/// Per-item completion guard shared between a pool and one running item.
///
/// Exactly one side wins: either the item [commits](Self::commit) (and the
/// pool will wait for it, however long it takes), or the pool
/// [abandons](Self::abandon) it (and the item must not publish anything).
#[derive(Clone, Debug, Default)]
pub struct Ticket(Arc<AtomicU8>);

impl Ticket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the right to publish results. Returns `false` if the item has
    /// already been abandoned. Committing twice is fine.
    pub fn commit(&self) -> bool {
        match self.0.compare_exchange(RUNNING, COMMITTED, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => true,
            Err(state) => state == COMMITTED,
        }
    }

    /// Gives up on the item. Returns `false` if it had already committed.
    pub fn abandon(&self) -> bool {
        match self.0.compare_exchange(RUNNING, ABANDONED, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => true,
            Err(state) => state == ABANDONED,
        }
    }

    pub fn is_abandoned(&self) -> bool {
        self.0.load(Ordering::Acquire) == ABANDONED
    }
}
