use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use conflux_model::ExecContext;

use super::Resume;
use super::cell::{SettleCell, SettleWait};
use crate::error::HandleError;

/// Externally observable lifecycle of a [`CompletionHandle`].
///
/// A handle moves from `Pending` to exactly one of the other states,
/// irreversibly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Pending,
    Succeeded,
    Failed,
    Cancelled,
}

impl HandleState {
    /// Returns `true` once the handle has left `Pending`.
    #[inline]
    pub fn is_settled(&self) -> bool {
        !matches!(self, HandleState::Pending)
    }
}

/// Atomic settle-once arbiter shared by a handle and its capabilities.
pub(crate) struct StateFlag(AtomicU8);

const PENDING: u8 = 0;
const SUCCEEDED: u8 = 1;
const FAILED: u8 = 2;
const CANCELLED: u8 = 3;

impl StateFlag {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(PENDING))
    }

    pub(crate) fn get(&self) -> HandleState {
        match self.0.load(Ordering::Acquire) {
            SUCCEEDED => HandleState::Succeeded,
            FAILED => HandleState::Failed,
            CANCELLED => HandleState::Cancelled,
            _ => HandleState::Pending,
        }
    }

    /// Claim the one pending-to-settled transition.
    ///
    /// Returns `false` if some other attempt already settled the handle; the
    /// loser must discard its outcome.
    pub(crate) fn try_settle(&self, next: HandleState) -> bool {
        let next = match next {
            HandleState::Succeeded => SUCCEEDED,
            HandleState::Failed => FAILED,
            HandleState::Cancelled => CANCELLED,
            HandleState::Pending => return false,
        };
        self.0
            .compare_exchange(PENDING, next, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Waiting side of a handle; mirrors the settle target in [`Resume`].
pub(crate) enum Waiter<T> {
    Runtime(oneshot::Receiver<Result<T, HandleError>>),
    Manual(Arc<SettleCell<T>>),
}

/// Waitable proxy for the eventual outcome of a suspension.
///
/// Created by [`bridge`](super::bridge) in *pending* state and settled
/// exactly once into succeeded, failed or cancelled. The handle is owned by
/// the caller that created it; the suspended code holds only the [`Resume`]
/// capability.
pub struct CompletionHandle<T> {
    ctx: ExecContext,
    state: Arc<StateFlag>,
    token: CancellationToken,
    settler: Resume<T>,
    waiter: Waiter<T>,
}

impl<T> CompletionHandle<T> {
    pub(crate) fn new(
        ctx: ExecContext,
        state: Arc<StateFlag>,
        token: CancellationToken,
        settler: Resume<T>,
        waiter: Waiter<T>,
    ) -> Self {
        Self {
            ctx,
            state,
            token,
            settler,
            waiter,
        }
    }

    /// Snapshot of the handle's lifecycle state.
    pub fn state(&self) -> HandleState {
        self.state.get()
    }

    /// The execution context this handle was created with, unchanged.
    pub fn context(&self) -> &ExecContext {
        &self.ctx
    }

    /// Token tripped by [`CompletionHandle::cancel`].
    ///
    /// This is the seam through which cooperative suspensions observe
    /// abandonment; the context itself stays opaque data.
    pub fn cancellation(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Cancel a pending handle.
    ///
    /// Settles the handle as cancelled when it is still pending and trips
    /// the cancellation token so the paused code can stop. A handle that
    /// already settled is left untouched.
    pub fn cancel(&self) {
        self.settler.settle_cancelled();
        self.token.cancel();
    }

    /// Wait for the outcome, consuming the handle.
    pub async fn join(self) -> Result<T, HandleError> {
        // Holding the settler across the await keeps the settle channel
        // open even if every capability clone has been dropped; an
        // abandoned suspension stays pending until cancelled.
        let Self {
            settler, waiter, ..
        } = self;
        match waiter {
            Waiter::Runtime(rx) => {
                let outcome = rx.await;
                drop(settler);
                match outcome {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        debug!("settle channel closed without an outcome");
                        Err(HandleError::Cancelled)
                    }
                }
            }
            Waiter::Manual(cell) => {
                let outcome = SettleWait(cell).await;
                drop(settler);
                outcome
            }
        }
    }
}

impl<T> fmt::Debug for CompletionHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionHandle")
            .field("context", &self.ctx.name())
            .field("state", &self.state())
            .finish()
    }
}
