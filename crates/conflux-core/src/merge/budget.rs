use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counter bounding simultaneously active pulls.
///
/// Invariant: `0 <= active <= limit`. A slot claims one unit on admission
/// and the unit releases itself on drop, so a slot that unwinds cannot leak
/// budget.
#[derive(Debug)]
pub(crate) struct ConcurrencyBudget {
    limit: usize,
    active: AtomicUsize,
}

impl ConcurrencyBudget {
    pub(crate) fn new(limit: usize) -> Arc<Self> {
        Arc::new(Self {
            limit,
            active: AtomicUsize::new(0),
        })
    }

    /// Claim one budget unit.
    ///
    /// Admission is arranged so a unit is always available here; exceeding
    /// the limit would be a bug in the admission policy.
    pub(crate) fn acquire(self: &Arc<Self>) -> BudgetUnit {
        let previous = self.active.fetch_add(1, Ordering::AcqRel);
        debug_assert!(previous < self.limit, "active pulls exceeded the limit");
        BudgetUnit(Arc::clone(self))
    }

    pub(crate) fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }
}

/// RAII claim on one unit of merge concurrency.
pub(crate) struct BudgetUnit(Arc<ConcurrencyBudget>);

impl Drop for BudgetUnit {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::AcqRel);
    }
}
