//! Bounded fan-out/fan-in.
//!
//! [`WorkerPool::map`] applies one operation to every entry of a keyed
//! collection and hands back exactly one [`Outcome`] per input key, in input
//! order, no matter in which order the work actually finished:
//!
//! - At most [`WorkerPool::workers`] items run at once. The rest queue up and
//!   are admitted FIFO as slots free up.
//! - Every item runs as its own Tokio task. An error *or a panic* in one item
//!   is captured as that item's [`Failure`] and never touches its siblings.
//! - An optional soft timeout abandons an item that takes too long. The task
//!   itself is not killed, so the operation receives a [`Ticket`] it must
//!   [`commit`](Ticket::commit) before publishing anything outside its own
//!   private scratch space.

mod failure;
mod ticket;

pub use crate::failure::Failure;
pub use crate::ticket::Ticket;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::task::JoinHandle;

/// The result of a single item.
pub type Outcome<R, E> = Result<R, Failure<E>>;
/// Per-key outcomes, in the same order as the input collection.
pub type Outcomes<K, R, E> = Vec<(K, Outcome<R, E>)>;

/// A fixed-size pool of workers, scoped to whoever constructed it.
///
/// There is no global pool: each batch stage builds (or borrows) its own, so
/// nothing leaks between batches.
#[derive(Clone, Debug)]
pub struct WorkerPool {
    workers: NonZeroUsize,
    timeout: Option<Duration>,
}

impl WorkerPool {
    /// A worker count of zero is treated as one; a pool that can never run
    /// anything would just hang.
    pub fn new(workers: usize) -> Self {
        Self { workers: NonZeroUsize::new(workers).unwrap_or(NonZeroUsize::MIN), timeout: None }
    }

    /// Sets (or clears) the per-item soft timeout.
    pub fn with_timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.timeout = timeout.into();
        self
    }

    pub fn workers(&self) -> usize {
        self.workers.get()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Runs `operation` over every value and collects the results against
    /// their keys.
    ///
    /// The operation gets its value by move, plus a fresh [`Ticket`]. Anything
    /// else it needs has to be captured explicitly by the closure (and be
    /// `Send + 'static`, because every item runs on its own task).
    pub async fn map<K, V, R, E, F, Fut>(
        &self,
        items: impl IntoIterator<Item = (K, V)>,
        operation: F,
    ) -> Outcomes<K, R, E>
    where
        V: Send + 'static,
        R: Send + 'static,
        E: Send + 'static,
        F: Fn(V, Ticket) -> Fut,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        let (keys, values): (Vec<K>, Vec<V>) = items.into_iter().unzip();
        let timeout = self.timeout;
        let launch = |index: usize, value: V| {
            let ticket = Ticket::new();
            let handle = tokio::spawn(operation(value, ticket.clone()));
            async move { (index, supervise(handle, ticket, timeout).await) }
        };

        let mut queue = values.into_iter().enumerate();
        let mut running = FuturesUnordered::new();
        running.extend(queue.by_ref().take(self.workers.get()).map(|(index, value)| launch(index, value)));

        let mut finished = Vec::with_capacity(keys.len());
        while let Some(done) = running.next().await {
            finished.push(done);
            if let Some((index, value)) = queue.next() {
                running.push(launch(index, value));
            }
        }
        tracing::debug!(items = finished.len(), workers = self.workers.get(), "Worker pool drained");

        // Completion order is meaningless to the caller; put everything back
        // where it came from.
        finished.sort_unstable_by_key(|(index, _)| *index);
        keys.into_iter().zip(finished.into_iter().map(|(_, outcome)| outcome)).collect()
    }
}

async fn supervise<R, E>(
    mut handle: JoinHandle<Result<R, E>>,
    ticket: Ticket,
    timeout: Option<Duration>,
) -> Outcome<R, E> {
    let joined = match timeout {
        None => handle.await,
        Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
            Ok(joined) => joined,
            Err(_) if ticket.abandon() => {
                // Dropping the handle detaches the task; it keeps running but
                // can no longer commit.
                tracing::warn!(timeout = ?limit, "Item exceeded its timeout; abandoning");
                return Err(Failure::Timeout);
            },
            // Lost the race: the item already committed and is publishing its
            // output. Let it finish.
            Err(_) => handle.await,
        },
    };
    match joined {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(Failure::Failed(error)),
        Err(error) if error.is_panic() => {
            let message = failure::panic_message(error.into_panic());
            tracing::error!(panic = %message, "Item panicked");
            Err(Failure::Panicked(message))
        },
        Err(error) => Err(Failure::Panicked(error.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_outcomes_follow_input_order() {
        let pool = WorkerPool::new(4);
        // Later items finish first.
        let items = (0..8u64).map(|i| (format!("item-{i}"), i));
        let outcomes = pool
            .map(items, |i, _| async move {
                tokio::time::sleep(Duration::from_millis(80 - i * 10)).await;
                Ok::<_, ()>(i * 2)
            })
            .await;
        let keys: Vec<_> = outcomes.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, (0..8).map(|i| format!("item-{i}")).collect::<Vec<_>>());
        for (i, (_, outcome)) in outcomes.iter().enumerate() {
            assert_eq!(outcome.as_ref().ok(), Some(&(i as u64 * 2)));
        }
    }

    #[tokio::test]
    async fn test_every_key_is_covered_despite_failures() {
        let pool = WorkerPool::new(2).with_timeout(Duration::from_millis(50));
        let items = [("ok", 0u8), ("err", 1), ("panic", 2), ("slow", 3), ("empty", 4)];
        let outcomes = pool
            .map(items, |kind, _| async move {
                match kind {
                    0 => Ok(Some("fine")),
                    1 => Err("nope"),
                    2 => panic!("boom"),
                    3 => {
                        tokio::time::sleep(Duration::from_secs(5)).await;
                        Ok(Some("late"))
                    },
                    _ => Ok(None),
                }
            })
            .await;
        assert_eq!(outcomes.len(), 5);
        assert_eq!(outcomes[0], ("ok", Ok(Some("fine"))));
        assert_eq!(outcomes[1], ("err", Err(Failure::Failed("nope"))));
        assert!(matches!(&outcomes[2], ("panic", Err(Failure::Panicked(m))) if m == "boom"));
        assert_eq!(outcomes[3], ("slow", Err(Failure::Timeout)));
        assert_eq!(outcomes[4], ("empty", Ok(None)));
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(16)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallelism_is_bounded(#[case] workers: usize) {
        let pool = WorkerPool::new(workers);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let items = (0..12).map(|i| (i, (active.clone(), peak.clone())));
        let outcomes = pool
            .map(items, |(active, peak), _| async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, ()>(())
            })
            .await;
        assert_eq!(outcomes.len(), 12);
        assert!(peak.load(Ordering::SeqCst) <= workers.min(12));
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_abandoned_item_cannot_commit() {
        let pool = WorkerPool::new(1).with_timeout(Duration::from_millis(20));
        let committed = Arc::new(AtomicUsize::new(0));
        let flag = committed.clone();
        let outcomes = pool
            .map([("stuck", ())], move |_, ticket| {
                let flag = flag.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    if ticket.commit() {
                        flag.fetch_add(1, Ordering::SeqCst);
                    }
                    Ok::<_, ()>(())
                }
            })
            .await;
        assert_eq!(outcomes[0].1, Err(Failure::Timeout));
        // Give the detached task time to wake up and try.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(committed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_committed_item_is_awaited_past_timeout() {
        let pool = WorkerPool::new(1).with_timeout(Duration::from_millis(20));
        let outcomes = pool
            .map([("publishing", ())], |_, ticket| async move {
                assert!(ticket.commit());
                tokio::time::sleep(Duration::from_millis(80)).await;
                Ok::<_, ()>("published")
            })
            .await;
        assert_eq!(outcomes[0].1, Ok("published"));
    }

    #[tokio::test]
    async fn test_empty_input() {
        let outcomes = WorkerPool::new(4).map(Vec::<(u8, u8)>::new(), |v, _| async move { Ok::<_, ()>(v) }).await;
        assert!(outcomes.is_empty());
    }

    #[test]
    fn test_zero_workers_means_one() {
        assert_eq!(WorkerPool::new(0).workers(), 1);
    }
}
