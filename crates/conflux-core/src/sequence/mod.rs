//! Pull-driven asynchronous sequences.
//!
//! A sequence yields one item per [`AsyncSequence::next`] call and suspends
//! between pulls. Termination is `None`; a failure is `Some(Err(cause))` and
//! ends the sequence. Instances are single-use.
mod iter;
pub use iter::IterSequence;

use async_trait::async_trait;

use crate::error::Cause;

/// Lazy, pull-driven, possibly infinite, ordered source of items.
///
/// The contract mirrors the producer side of a merge: one item per pull,
/// suspend until the consumer asks again. After returning `None` or an
/// error, implementations must keep returning `None`.
#[async_trait]
pub trait AsyncSequence: Send {
    type Item: Send;

    /// Pull the next item, suspending until the source produces one.
    async fn next(&mut self) -> Option<Result<Self::Item, Cause>>;

    /// Box the sequence for storage in heterogeneous source lists.
    fn boxed(self) -> BoxSequence<Self::Item>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

/// Owned, type-erased sequence.
pub type BoxSequence<T> = Box<dyn AsyncSequence<Item = T>>;

#[async_trait]
impl<S: AsyncSequence + ?Sized> AsyncSequence for Box<S> {
    type Item = S::Item;

    async fn next(&mut self) -> Option<Result<Self::Item, Cause>> {
        (**self).next().await
    }
}
