use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::MergeError;
use crate::metrics::{MetricsHandle, Outcome};
use crate::sequence::{AsyncSequence, BoxSequence};

/// Per-source bookkeeping inside one merge run.
///
/// Slots are owned by the merge for the duration of the run and dropped
/// when they retire.
pub(crate) struct MergeSlot<T> {
    pub(crate) index: usize,
    pub(crate) source: BoxSequence<T>,
}

/// How a slot left the active set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotOutcome {
    /// The source finished normally; the lane may admit the next one.
    Exhausted,
    /// The source raised an error; the merge fails as a whole.
    Failed,
    /// The stop signal fired, or the downstream consumer went away.
    Stopped,
}

impl From<SlotOutcome> for Outcome {
    fn from(outcome: SlotOutcome) -> Outcome {
        match outcome {
            SlotOutcome::Exhausted => Outcome::Success,
            SlotOutcome::Failed => Outcome::Failure,
            SlotOutcome::Stopped => Outcome::Cancelled,
        }
    }
}

impl<T: Send> MergeSlot<T> {
    /// Drain the source, forwarding items downstream in arrival order.
    ///
    /// Runs until the source is exhausted or fails, the stop token trips,
    /// or the downstream receiver is dropped. On failure the slot trips the
    /// token itself, then delivers the wrapped cause downstream without
    /// racing its own stop signal.
    pub(crate) async fn drain(
        mut self,
        context: &str,
        tx: &mpsc::Sender<Result<T, MergeError>>,
        token: &CancellationToken,
        metrics: &MetricsHandle,
    ) -> SlotOutcome {
        metrics.record_slot_started(context);
        trace!(context, slot = self.index, "slot admitted");

        let mut items: u64 = 0;
        let outcome = loop {
            let pulled = tokio::select! {
                _ = token.cancelled() => break SlotOutcome::Stopped,
                pulled = self.source.next() => pulled,
            };
            match pulled {
                Some(Ok(item)) => {
                    let forwarded = tokio::select! {
                        _ = token.cancelled() => false,
                        sent = tx.send(Ok(item)) => sent.is_ok(),
                    };
                    if !forwarded {
                        break SlotOutcome::Stopped;
                    }
                    items += 1;
                    metrics.record_item_merged(context);
                }
                Some(Err(cause)) => {
                    debug!(context, slot = self.index, %cause, "source failed");
                    token.cancel();
                    let failure = MergeError::SourceFailed {
                        slot: self.index,
                        cause,
                    };
                    let _ = tx.send(Err(failure)).await;
                    break SlotOutcome::Failed;
                }
                None => break SlotOutcome::Exhausted,
            }
        };

        trace!(context, slot = self.index, outcome = ?outcome, items, "slot retired");
        metrics.record_slot_finished(context, outcome.into(), items);
        outcome
    }
}
