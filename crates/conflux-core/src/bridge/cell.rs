use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll, Waker};

use crate::error::HandleError;

/// Hand-rolled settle slot: a one-shot outcome cell with waker wiring.
///
/// Manual counterpart of the runtime's oneshot channel. The waiter registers
/// its waker on every pending poll; the settling side stores the outcome and
/// wakes it. The caller guarantees single settlement, a repeat call is
/// ignored.
pub(crate) struct SettleCell<T> {
    slot: Mutex<CellSlot<T>>,
}

enum CellSlot<T> {
    Pending(Option<Waker>),
    Ready(Option<Result<T, HandleError>>),
}

impl<T> SettleCell<T> {
    pub(crate) fn new() -> Self {
        Self {
            slot: Mutex::new(CellSlot::Pending(None)),
        }
    }

    /// Store the outcome and wake the waiter, if one is registered.
    pub(crate) fn settle(&self, outcome: Result<T, HandleError>) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let CellSlot::Pending(waker) = &mut *slot {
            let waker = waker.take();
            *slot = CellSlot::Ready(Some(outcome));
            drop(slot);
            if let Some(waker) = waker {
                waker.wake();
            }
        }
    }
}

/// Future resolved when the cell settles.
pub(crate) struct SettleWait<T>(pub(crate) Arc<SettleCell<T>>);

impl<T> Future for SettleWait<T> {
    type Output = Result<T, HandleError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.0.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match &mut *slot {
            CellSlot::Pending(waker) => {
                *waker = Some(cx.waker().clone());
                Poll::Pending
            }
            CellSlot::Ready(outcome) => match outcome.take() {
                Some(outcome) => Poll::Ready(outcome),
                None => panic!("settle cell polled after completion"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::{SettleCell, SettleWait};
    use crate::error::HandleError;

    #[tokio::test]
    async fn settle_before_wait_resolves_immediately() {
        let cell = Arc::new(SettleCell::new());
        cell.settle(Ok(7));

        let value = SettleWait(cell).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn wait_is_woken_by_a_later_settle() {
        let cell = Arc::new(SettleCell::new());

        let settler = Arc::clone(&cell);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            settler.settle(Ok("done"));
        });

        let value = SettleWait(cell).await.unwrap();
        assert_eq!(value, "done");
    }

    #[tokio::test]
    async fn second_settle_is_ignored() {
        let cell = Arc::new(SettleCell::new());
        cell.settle(Ok(1));
        cell.settle(Ok(2));
        cell.settle(Err(HandleError::Cancelled));

        let value = SettleWait(cell).await.unwrap();
        assert_eq!(value, 1);
    }
}
