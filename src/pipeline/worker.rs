use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use super::sink::BatchSink;
use super::stats::PipelineStats;
use crate::status::StatusReporter;

/// Occupancy ratio above which the load report is raised to a warning.
pub const WATERMARK: f64 = 0.8;

/// Queue depths observed just before a batch goes to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Load {
    pub item_queue_depth: usize,
    pub batch_queue_depth: usize,
}

impl Load {
    /// True when either queue is fuller than [`WATERMARK`] relative to its
    /// reference size.
    pub fn exceeds_watermark(&self, batch_max_size: usize, max_batches_in_queue: usize) -> bool {
        over_watermark(self.item_queue_depth, batch_max_size)
            || over_watermark(self.batch_queue_depth, max_batches_in_queue)
    }
}

fn over_watermark(depth: usize, capacity: usize) -> bool {
    capacity > 0 && depth as f64 / capacity as f64 > WATERMARK
}

fn depth<M>(weak: &mpsc::WeakSender<M>) -> usize {
    weak.upgrade()
        .map(|tx| tx.max_capacity() - tx.capacity())
        .unwrap_or(0)
}

/// Samples both queues without keeping them open.
pub(crate) struct LoadMonitor<T> {
    items: mpsc::WeakSender<T>,
    batches: mpsc::WeakSender<Vec<T>>,
    batch_max_size: usize,
    max_batches_in_queue: usize,
}

impl<T> Clone for LoadMonitor<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            batches: self.batches.clone(),
            batch_max_size: self.batch_max_size,
            max_batches_in_queue: self.max_batches_in_queue,
        }
    }
}

impl<T> LoadMonitor<T> {
    pub(crate) fn new(
        items: &mpsc::Sender<T>,
        batches: &mpsc::Sender<Vec<T>>,
        batch_max_size: usize,
        max_batches_in_queue: usize,
    ) -> Self {
        Self {
            items: items.downgrade(),
            batches: batches.downgrade(),
            batch_max_size,
            max_batches_in_queue,
        }
    }

    pub(crate) fn sample(&self) -> Load {
        Load {
            item_queue_depth: depth(&self.items),
            batch_queue_depth: depth(&self.batches),
        }
    }

    /// Reports the current load at warn level above the watermark, info otherwise.
    pub(crate) fn report(&self, status: &dyn StatusReporter) -> Load {
        let load = self.sample();
        let fields = [
            ("item_queue_depth", load.item_queue_depth.to_string()),
            ("batch_queue_depth", load.batch_queue_depth.to_string()),
        ];

        if load.exceeds_watermark(self.batch_max_size, self.max_batches_in_queue) {
            status.warn("batch queues almost full", &fields);
        } else {
            status.info("current queue sizes", &fields);
        }
        load
    }
}

/// One member of the worker pool.
///
/// Pulls batches until the batch queue is closed and empty, so batches
/// still queued at shutdown are delivered before the worker exits.
pub(crate) struct Worker<T, S> {
    id: usize,
    batches: Arc<Mutex<mpsc::Receiver<Vec<T>>>>,
    sink: Arc<S>,
    monitor: LoadMonitor<T>,
    stats: Arc<PipelineStats>,
    status: Option<Arc<dyn StatusReporter>>,
}

impl<T, S> Worker<T, S>
where
    T: Send + 'static,
    S: BatchSink<T> + 'static,
{
    pub(crate) fn new(
        id: usize,
        batches: Arc<Mutex<mpsc::Receiver<Vec<T>>>>,
        sink: Arc<S>,
        monitor: LoadMonitor<T>,
        stats: Arc<PipelineStats>,
        status: Option<Arc<dyn StatusReporter>>,
    ) -> Self {
        Self {
            id,
            batches,
            sink,
            monitor,
            stats,
            status,
        }
    }

    pub(crate) async fn run(self) {
        loop {
            let batch = {
                let mut rx = self.batches.lock().await;
                rx.recv().await
            };

            let Some(batch) = batch else {
                break;
            };
            self.deliver(batch).await;
        }

        if let Some(status) = &self.status {
            status.info("batch worker complete", &[("worker", self.id.to_string())]);
        }
        tracing::debug!(worker = self.id, "worker stopped");
    }

    async fn deliver(&self, batch: Vec<T>) {
        let size = batch.len();

        if let Some(status) = &self.status {
            self.monitor.report(status.as_ref());
            status.info(
                "batch delivered to put_multi",
                &[
                    ("worker", self.id.to_string()),
                    ("batch_size", size.to_string()),
                ],
            );
        }

        match self.sink.put_multi(batch).await {
            Ok(()) => self.stats.record_delivered(size),
            Err(err) => {
                self.stats.record_failed(size);
                if let Some(status) = &self.status {
                    status.error(
                        "failed to consume batch",
                        &[
                            ("worker", self.id.to_string()),
                            ("batch_size", size.to_string()),
                            ("error", err.to_string()),
                        ],
                    );
                }
            }
        }
    }
}
