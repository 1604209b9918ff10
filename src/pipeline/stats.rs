use std::sync::atomic::{AtomicUsize, Ordering};

/// Running counters shared by the collector and the workers.
#[derive(Debug, Default)]
pub struct PipelineStats {
    items_accepted: AtomicUsize,
    batches_flushed: AtomicUsize,
    batches_delivered: AtomicUsize,
    items_delivered: AtomicUsize,
    batches_failed: AtomicUsize,
    items_failed: AtomicUsize,
}

/// Point-in-time copy of [`PipelineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Items handed to the collector by `add`
    pub items_accepted: usize,
    /// Batches pushed onto the batch queue
    pub batches_flushed: usize,
    /// Batches the sink accepted
    pub batches_delivered: usize,
    pub items_delivered: usize,
    /// Batches the sink rejected; these are discarded
    pub batches_failed: usize,
    pub items_failed: usize,
}

impl PipelineStats {
    pub(crate) fn record_accepted(&self) {
        self.items_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_flushed(&self) {
        self.batches_flushed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivered(&self, items: usize) {
        self.batches_delivered.fetch_add(1, Ordering::Relaxed);
        self.items_delivered.fetch_add(items, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self, items: usize) {
        self.batches_failed.fetch_add(1, Ordering::Relaxed);
        self.items_failed.fetch_add(items, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            items_accepted: self.items_accepted.load(Ordering::Relaxed),
            batches_flushed: self.batches_flushed.load(Ordering::Relaxed),
            batches_delivered: self.batches_delivered.load(Ordering::Relaxed),
            items_delivered: self.items_delivered.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
            items_failed: self.items_failed.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    /// Items that reached the sink, whether it accepted them or not.
    pub fn items_settled(&self) -> usize {
        self.items_delivered + self.items_failed
    }
}
