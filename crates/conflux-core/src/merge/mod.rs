//! Merging independent sequences under a concurrency bound.
//!
//! - Sources are admitted in submission order, at most `limit` active.
//! - Items flow downstream in arrival order through one bounded channel.
//! - The first source failure stops the run and surfaces exactly once.
mod budget;
mod slot;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use conflux_model::{ExecContext, Limit};

use crate::error::{Cause, MergeError};
use crate::scheduler::Scheduler;
use crate::sequence::{AsyncSequence, BoxSequence};

use budget::ConcurrencyBudget;
use slot::{MergeSlot, SlotOutcome};

/// Merge an ordered list of sequences into one arrival-ordered sequence.
///
/// At most `limit` sources are pulled from concurrently; the rest wait
/// their turn in submission order. With `limit == 1` each source is drained
/// to exhaustion before the next is admitted; with `limit >= sources.len()`
/// everything is pulled concurrently — both follow from the admission
/// policy rather than being special cases.
///
/// The merged sequence is itself an [`AsyncSequence`]: it terminates once
/// every source is exhausted, or yields the first source failure exactly
/// once and then terminates.
pub fn merge<T>(
    scheduler: &Scheduler,
    ctx: ExecContext,
    sources: Vec<BoxSequence<T>>,
    limit: Limit,
) -> Merged<T>
where
    T: Send + 'static,
{
    let total = sources.len();
    let lanes = limit.get().min(total);
    let (tx, rx) = mpsc::channel(limit.get());
    let token = CancellationToken::new();
    let budget = ConcurrencyBudget::new(limit.get());
    let queue = Arc::new(Mutex::new(
        sources
            .into_iter()
            .enumerate()
            .map(|(index, source)| MergeSlot { index, source })
            .collect::<VecDeque<_>>(),
    ));

    debug!(context = %ctx.name(), sources = total, limit = limit.get(), lanes, "merge started");

    // One lane per budget unit: each lane pops the next unstarted source
    // and drains it, which yields submission-order admission without any
    // extra coordination.
    for lane in 0..lanes {
        let queue = Arc::clone(&queue);
        let budget = Arc::clone(&budget);
        let tx = tx.clone();
        let token = token.clone();
        let metrics = scheduler.metrics().clone();
        let context = ctx.name().to_string();

        scheduler.spawn(async move {
            loop {
                if token.is_cancelled() {
                    break;
                }
                let next = queue
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .pop_front();
                let Some(slot) = next else { break };

                let unit = budget.acquire();
                trace!(context = %context, lane, active = budget.active(), "budget unit acquired");
                let outcome = slot.drain(&context, &tx, &token, &metrics).await;
                drop(unit);

                match outcome {
                    SlotOutcome::Exhausted => {}
                    SlotOutcome::Failed => {
                        // No further admission; unstarted sources are
                        // dropped unconsumed.
                        queue
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .clear();
                        break;
                    }
                    SlotOutcome::Stopped => break,
                }
            }
            trace!(context = %context, lane, "merge lane retired");
        });
    }

    Merged {
        rx,
        token,
        finished: false,
    }
}

/// Aggregate sequence produced by [`merge`].
///
/// Pull-based: nothing beyond the bounded in-flight window is produced
/// until the consumer asks. Dropping the sequence stops the run.
pub struct Merged<T> {
    rx: mpsc::Receiver<Result<T, MergeError>>,
    token: CancellationToken,
    finished: bool,
}

impl<T> Merged<T> {
    /// Ask the merge to stop.
    ///
    /// Halts admission of new sources and signals active slots to stop
    /// pulling, cooperatively. Items already delivered remain valid; items
    /// still in the in-flight window are yielded before the sequence
    /// terminates.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl<T> Drop for Merged<T> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[async_trait]
impl<T: Send> AsyncSequence for Merged<T> {
    type Item = T;

    async fn next(&mut self) -> Option<Result<T, Cause>> {
        if self.finished {
            return None;
        }
        match self.rx.recv().await {
            Some(Ok(item)) => Some(Ok(item)),
            Some(Err(failure)) => {
                self.finished = true;
                self.rx.close();
                Some(Err(Box::new(failure) as Cause))
            }
            None => {
                self.finished = true;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, VecDeque};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::time::{sleep, timeout};

    use super::{Merged, merge};
    use crate::error::{Cause, MergeError};
    use crate::scheduler::Scheduler;
    use crate::sequence::{AsyncSequence, BoxSequence, IterSequence};
    use conflux_model::{ExecContext, Limit};

    fn ctx() -> ExecContext {
        ExecContext::named("merge-test")
    }

    fn limit(n: usize) -> Limit {
        Limit::new(n).unwrap()
    }

    async fn collect_ok(merged: &mut Merged<&'static str>) -> Vec<&'static str> {
        let mut out = Vec::new();
        while let Some(item) = merged.next().await {
            out.push(item.expect("unexpected source failure"));
        }
        out
    }

    /// Yields its items, then errors instead of terminating.
    struct FailingSequence {
        items: VecDeque<&'static str>,
        message: &'static str,
    }

    #[async_trait]
    impl AsyncSequence for FailingSequence {
        type Item = &'static str;

        async fn next(&mut self) -> Option<Result<&'static str, Cause>> {
            match self.items.pop_front() {
                Some(item) => Some(Ok(item)),
                None => Some(Err(Box::new(std::io::Error::other(self.message)))),
            }
        }
    }

    /// Records how many pulls are in flight across all clones of the
    /// shared counters.
    struct InstrumentedSequence {
        items: VecDeque<&'static str>,
        active: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl AsyncSequence for InstrumentedSequence {
        type Item = &'static str;

        async fn next(&mut self) -> Option<Result<&'static str, Cause>> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            sleep(Duration::from_millis(2)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            self.items.pop_front().map(Ok)
        }
    }

    /// Infinite source used for cancellation tests.
    struct EndlessSequence {
        label: &'static str,
    }

    #[async_trait]
    impl AsyncSequence for EndlessSequence {
        type Item = &'static str;

        async fn next(&mut self) -> Option<Result<&'static str, Cause>> {
            sleep(Duration::from_millis(1)).await;
            Some(Ok(self.label))
        }
    }

    #[tokio::test]
    async fn single_source_yields_in_order_then_terminates() {
        let sources: Vec<BoxSequence<&'static str>> =
            vec![IterSequence::new(["red", "blue", "orange"]).boxed()];
        let mut merged = merge(&Scheduler::current(), ctx(), sources, limit(4));

        assert_eq!(collect_ok(&mut merged).await, vec!["red", "blue", "orange"]);
        assert!(merged.next().await.is_none());
    }

    #[tokio::test]
    async fn merge_of_no_sources_terminates_immediately() {
        let mut merged = merge::<&'static str>(&Scheduler::current(), ctx(), Vec::new(), limit(4));
        assert!(merged.next().await.is_none());
    }

    #[tokio::test]
    async fn limit_one_drains_sources_sequentially() {
        let sources: Vec<BoxSequence<&'static str>> = vec![
            IterSequence::new(["a1", "a2"]).boxed(),
            IterSequence::new(["b1"]).boxed(),
        ];
        let mut merged = merge(&Scheduler::current(), ctx(), sources, limit(1));

        assert_eq!(collect_ok(&mut merged).await, vec!["a1", "a2", "b1"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn multiset_of_items_is_preserved_for_any_limit() {
        let all = [
            "a1", "a2", "a3", "b1", "b2", "c1", "c2", "c3", "c4", "d1",
        ];
        for n in 1..=5 {
            let sources: Vec<BoxSequence<&'static str>> = vec![
                IterSequence::new(["a1", "a2", "a3"]).boxed(),
                IterSequence::new(["b1", "b2"]).boxed(),
                IterSequence::new(["c1", "c2", "c3", "c4"]).boxed(),
                IterSequence::new(["d1"]).boxed(),
            ];
            let mut merged = merge(&Scheduler::current(), ctx(), sources, limit(n));

            let mut collected = collect_ok(&mut merged).await;
            collected.sort_unstable();
            assert_eq!(collected, all, "limit {n} lost or duplicated items");
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn active_pulls_never_exceed_the_limit() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let sources: Vec<BoxSequence<&'static str>> = (0..6)
            .map(|_| {
                InstrumentedSequence {
                    items: VecDeque::from(["x", "y", "z"]),
                    active: Arc::clone(&active),
                    peak: Arc::clone(&peak),
                }
                .boxed()
            })
            .collect();

        let mut merged = merge(&Scheduler::current(), ctx(), sources, limit(2));
        let collected = collect_ok(&mut merged).await;

        assert_eq!(collected.len(), 18);
        assert!(
            peak.load(Ordering::SeqCst) <= 2,
            "observed {} concurrent pulls",
            peak.load(Ordering::SeqCst)
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn limit_at_or_above_source_count_pulls_from_everything() {
        // Every source parks on a shared barrier inside its first pull, so
        // the merge only finishes if all three are active at once.
        struct BarrierSequence {
            barrier: Arc<tokio::sync::Barrier>,
            items: VecDeque<&'static str>,
        }

        #[async_trait]
        impl AsyncSequence for BarrierSequence {
            type Item = &'static str;

            async fn next(&mut self) -> Option<Result<&'static str, Cause>> {
                match self.items.pop_front() {
                    Some(item) => {
                        self.barrier.wait().await;
                        Some(Ok(item))
                    }
                    None => None,
                }
            }
        }

        let barrier = Arc::new(tokio::sync::Barrier::new(3));
        let sources: Vec<BoxSequence<&'static str>> = ["p", "q", "r"]
            .into_iter()
            .map(|item| {
                BarrierSequence {
                    barrier: Arc::clone(&barrier),
                    items: VecDeque::from([item]),
                }
                .boxed()
            })
            .collect();

        let mut merged = merge(&Scheduler::current(), ctx(), sources, limit(8));
        let collected = timeout(Duration::from_secs(5), collect_ok(&mut merged))
            .await
            .expect("merge stalled: sources were not all admitted");

        let set: BTreeSet<_> = collected.into_iter().collect();
        assert_eq!(set, BTreeSet::from(["p", "q", "r"]));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn source_failure_surfaces_exactly_once() {
        let sources: Vec<BoxSequence<&'static str>> = vec![
            IterSequence::new(["a", "b"]).boxed(),
            Box::new(FailingSequence {
                items: VecDeque::from(["x"]),
                message: "exploded",
            }),
        ];
        let mut merged = merge(&Scheduler::current(), ctx(), sources, limit(2));

        let mut delivered = Vec::new();
        let mut failure = None;
        while let Some(item) = merged.next().await {
            match item {
                Ok(item) => delivered.push(item),
                Err(cause) => {
                    failure = Some(cause);
                    break;
                }
            }
        }

        let cause = failure.expect("merge should surface the source failure");
        let failure = cause
            .downcast::<MergeError>()
            .expect("cause should be a MergeError");
        assert_eq!(failure.slot(), 1);
        assert!(failure.to_string().contains("exploded"));

        // No duplicates before the failure, and nothing after it.
        let unique: BTreeSet<_> = delivered.iter().copied().collect();
        assert_eq!(unique.len(), delivered.len());
        assert!(merged.next().await.is_none());
        assert!(merged.next().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unstarted_sources_are_not_admitted_after_a_failure() {
        let touched = Arc::new(AtomicUsize::new(0));

        struct TouchSequence {
            touched: Arc<AtomicUsize>,
        }

        #[async_trait]
        impl AsyncSequence for TouchSequence {
            type Item = &'static str;

            async fn next(&mut self) -> Option<Result<&'static str, Cause>> {
                self.touched.fetch_add(1, Ordering::SeqCst);
                None
            }
        }

        let sources: Vec<BoxSequence<&'static str>> = vec![
            Box::new(FailingSequence {
                items: VecDeque::new(),
                message: "early",
            }),
            Box::new(TouchSequence {
                touched: Arc::clone(&touched),
            }),
        ];
        let mut merged = merge(&Scheduler::current(), ctx(), sources, limit(1));

        let first = merged.next().await.expect("failure should surface");
        assert!(first.is_err());
        assert!(merged.next().await.is_none());
        assert_eq!(touched.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cancel_terminates_an_infinite_merge() {
        let sources: Vec<BoxSequence<&'static str>> = vec![
            Box::new(EndlessSequence { label: "tick" }),
            Box::new(EndlessSequence { label: "tock" }),
        ];
        let mut merged = merge(&Scheduler::current(), ctx(), sources, limit(2));

        for _ in 0..5 {
            let item = merged.next().await.expect("sources are infinite");
            item.expect("sources never fail");
        }

        merged.cancel();
        let drained = timeout(Duration::from_secs(5), async {
            while let Some(item) = merged.next().await {
                item.expect("cancellation is not a failure");
            }
        })
        .await;
        assert!(drained.is_ok(), "merge did not terminate after cancel");
    }
}
