//! Driving sequences onto item sinks through the bridge.
use async_trait::async_trait;
use tracing::trace;

use conflux_model::ExecContext;

use crate::bridge::{CompletionHandle, Started, bridge};
use crate::scheduler::Scheduler;
use crate::sequence::AsyncSequence;

/// Consumer of delivered items, e.g. a console printer.
///
/// Items arrive one at a time in delivery order. A sink that blocks stalls
/// the pump it is attached to.
#[async_trait]
pub trait ItemSink<T>: Send {
    /// Accept one item.
    async fn deliver(&mut self, item: T);
}

/// Pump a sequence into a sink, returning a waitable handle.
///
/// The pump runs on a task spawned via the scheduler: exhaustion settles
/// the handle succeeded, a sequence failure settles it failed, and
/// cancelling the handle stops the pump between items.
pub fn drive<Q, S>(
    scheduler: &Scheduler,
    ctx: ExecContext,
    sequence: Q,
    sink: S,
) -> CompletionHandle<()>
where
    Q: AsyncSequence + 'static,
    S: ItemSink<Q::Item> + 'static,
{
    let spawner = scheduler.clone();
    bridge(scheduler, ctx, move |resume| {
        let token = resume.cancellation();
        spawner.spawn(async move {
            let mut sequence = sequence;
            let mut sink = sink;
            loop {
                let pulled = tokio::select! {
                    _ = token.cancelled() => {
                        trace!("pump stopped by cancellation");
                        return;
                    }
                    pulled = sequence.next() => pulled,
                };
                match pulled {
                    Some(Ok(item)) => sink.deliver(item).await,
                    Some(Err(cause)) => {
                        resume.fail(cause);
                        return;
                    }
                    None => {
                        resume.succeed(());
                        return;
                    }
                }
            }
        });
        Ok(Started::Suspended)
    })
}
