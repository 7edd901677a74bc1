use std::collections::VecDeque;

use async_trait::async_trait;

use super::AsyncSequence;
use crate::error::Cause;

/// Finite sequence over an in-memory collection.
///
/// Yields items in order without ever suspending, then terminates. Stands in
/// for adapter-backed producers in tests and demos.
pub struct IterSequence<T> {
    items: VecDeque<T>,
}

impl<T> IterSequence<T> {
    pub fn new<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Self {
            items: items.into_iter().collect(),
        }
    }
}

#[async_trait]
impl<T: Send> AsyncSequence for IterSequence<T> {
    type Item = T;

    async fn next(&mut self) -> Option<Result<T, Cause>> {
        self.items.pop_front().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::IterSequence;
    use crate::sequence::AsyncSequence;

    #[tokio::test]
    async fn yields_items_in_order_then_terminates() {
        let mut seq = IterSequence::new(["red", "blue", "orange"]);

        assert_eq!(seq.next().await.unwrap().unwrap(), "red");
        assert_eq!(seq.next().await.unwrap().unwrap(), "blue");
        assert_eq!(seq.next().await.unwrap().unwrap(), "orange");
        assert!(seq.next().await.is_none());
        assert!(seq.next().await.is_none());
    }

    #[tokio::test]
    async fn boxed_sequence_forwards_pulls() {
        let mut seq = IterSequence::new(vec![1, 2]).boxed();

        assert_eq!(seq.next().await.unwrap().unwrap(), 1);
        assert_eq!(seq.next().await.unwrap().unwrap(), 2);
        assert!(seq.next().await.is_none());
    }
}
