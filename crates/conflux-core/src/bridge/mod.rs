//! Bridging single-shot suspensions into waitable handles.
//!
//! - [`bridge`] starts a suspension and returns a [`CompletionHandle`].
//! - [`Resume`] is the single-use settle capability handed to the start
//!   function.
//! - Two interchangeable [`BridgeStrategy`] backings exist: delegate to the
//!   runtime's oneshot primitive, or wire the waker protocol by hand. Both
//!   satisfy the same observable contract.
mod cell;
mod handle;
pub use handle::{CompletionHandle, HandleState};

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use conflux_model::ExecContext;

use crate::error::{Cause, HandleError};
use crate::metrics::{MetricsHandle, Outcome};
use crate::scheduler::Scheduler;

use cell::SettleCell;
use handle::{StateFlag, Waiter};

/// How a start function returned control.
#[derive(Debug)]
pub enum Started<T> {
    /// The computation completed without suspending.
    Immediate(T),
    /// A suspension is in flight; the [`Resume`] capability settles it
    /// later.
    Suspended,
}

/// Mechanism backing a handle's settle-and-wait plumbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BridgeStrategy {
    /// Delegate to the runtime's oneshot channel.
    #[default]
    Runtime,
    /// Hand-rolled settle cell with explicit waker wiring.
    Manual,
}

enum SettleTarget<T> {
    Runtime(Mutex<Option<oneshot::Sender<Result<T, HandleError>>>>),
    Manual(Arc<SettleCell<T>>),
}

struct ResumeInner<T> {
    context: String,
    state: Arc<StateFlag>,
    token: CancellationToken,
    target: SettleTarget<T>,
    metrics: MetricsHandle,
}

impl<T> ResumeInner<T> {
    /// Deliver an outcome exactly once; the state flag is the arbiter under
    /// concurrent attempts.
    fn settle(&self, outcome: Result<T, HandleError>, quiet: bool) {
        let next = match &outcome {
            Ok(_) => HandleState::Succeeded,
            Err(HandleError::Failed(_)) => HandleState::Failed,
            Err(HandleError::Cancelled) => HandleState::Cancelled,
        };

        if !self.state.try_settle(next) {
            if quiet {
                trace!(context = %self.context, state = ?self.state.get(), "cancel after settlement ignored");
            } else {
                warn!(context = %self.context, state = ?self.state.get(), "resume after settlement discarded");
            }
            return;
        }

        trace!(context = %self.context, state = ?next, "handle settled");
        let label = match next {
            HandleState::Succeeded => Outcome::Success,
            HandleState::Failed => Outcome::Failure,
            _ => Outcome::Cancelled,
        };
        self.metrics.record_handle_settled(&self.context, label);

        match &self.target {
            SettleTarget::Runtime(sender) => {
                let sender = sender.lock().unwrap_or_else(PoisonError::into_inner).take();
                if let Some(tx) = sender {
                    // The receiver may already be gone; the outcome is then
                    // dropped with the handle.
                    let _ = tx.send(outcome);
                }
            }
            SettleTarget::Manual(cell) => cell.settle(outcome),
        }
    }
}

/// Single-use settle capability bound to one [`CompletionHandle`].
///
/// Clonable so the start function can move copies into callbacks; only the
/// first settlement lands. Later attempts are discarded with a diagnostic
/// and never disturb the delivered outcome.
pub struct Resume<T> {
    inner: Arc<ResumeInner<T>>,
}

impl<T> Clone for Resume<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Resume<T> {
    /// Settle the suspension with a success value.
    pub fn succeed(&self, value: T) {
        self.inner.settle(Ok(value), false);
    }

    /// Settle the suspension with a failure cause.
    pub fn fail(&self, cause: Cause) {
        self.inner.settle(Err(HandleError::Failed(cause)), false);
    }

    /// Settle with a tagged outcome.
    pub fn settle(&self, outcome: Result<T, Cause>) {
        self.inner
            .settle(outcome.map_err(HandleError::Failed), false);
    }

    /// Cancellation token of the owning handle.
    ///
    /// Trips when the caller cancels; cooperative suspensions select on it
    /// to stop early.
    pub fn cancellation(&self) -> CancellationToken {
        self.inner.token.clone()
    }

    pub(crate) fn settle_cancelled(&self) {
        self.inner.settle(Err(HandleError::Cancelled), true);
    }
}

/// Bridge a single-shot suspension into a waitable [`CompletionHandle`]
/// using the default [`BridgeStrategy::Runtime`] backing.
pub fn bridge<T, F>(scheduler: &Scheduler, ctx: ExecContext, start: F) -> CompletionHandle<T>
where
    T: Send,
    F: FnOnce(Resume<T>) -> Result<Started<T>, Cause>,
{
    bridge_with(BridgeStrategy::default(), scheduler, ctx, start)
}

/// Bridge with an explicit backing strategy.
///
/// A fresh pending handle is created and `start` is invoked with its settle
/// capability. `Ok(Started::Immediate(_))` settles the handle before this
/// function returns; `Ok(Started::Suspended)` leaves it pending for a later
/// resume; `Err(_)` settles it failed — the cause never escapes to the
/// caller of `bridge_with`.
pub fn bridge_with<T, F>(
    strategy: BridgeStrategy,
    scheduler: &Scheduler,
    ctx: ExecContext,
    start: F,
) -> CompletionHandle<T>
where
    T: Send,
    F: FnOnce(Resume<T>) -> Result<Started<T>, Cause>,
{
    let state = Arc::new(StateFlag::new());
    let token = CancellationToken::new();

    let (target, waiter) = match strategy {
        BridgeStrategy::Runtime => {
            let (tx, rx) = oneshot::channel();
            (
                SettleTarget::Runtime(Mutex::new(Some(tx))),
                Waiter::Runtime(rx),
            )
        }
        BridgeStrategy::Manual => {
            let cell = Arc::new(SettleCell::new());
            (SettleTarget::Manual(Arc::clone(&cell)), Waiter::Manual(cell))
        }
    };

    let resume = Resume {
        inner: Arc::new(ResumeInner {
            context: ctx.name().to_string(),
            state: Arc::clone(&state),
            token: token.clone(),
            target,
            metrics: scheduler.metrics().clone(),
        }),
    };

    trace!(context = %ctx.name(), strategy = ?strategy, "starting suspension");
    match start(resume.clone()) {
        Ok(Started::Immediate(value)) => resume.succeed(value),
        Ok(Started::Suspended) => {}
        Err(cause) => resume.fail(cause),
    }

    CompletionHandle::new(ctx, state, token, resume, waiter)
}
