use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::stats::PipelineStats;
use super::types::PipelineError;
use crate::status::StatusReporter;

/// Upper bound on the slots reserved for a fresh batch; larger batches grow on demand.
const MAX_PREALLOCATED: usize = 1024;

enum Event<T> {
    Item(T),
    Tick,
    Shutdown,
}

#[derive(Debug, Clone, Copy)]
enum FlushReason {
    Size,
    Timer,
    Shutdown,
}

/// Drains the item queue into batches and pushes them onto the batch queue.
///
/// A batch leaves when it reaches `batch_max_size` or when the timer fires
/// with a non-empty batch. Pushing blocks while the batch queue is full,
/// which in turn stops the collector from taking items and stalls `add`.
pub(crate) struct Collector<T> {
    items: mpsc::Receiver<T>,
    batches: mpsc::Sender<Vec<T>>,
    shutdown: CancellationToken,
    batch_max_size: usize,
    batch_time: Duration,
    stats: Arc<PipelineStats>,
    status: Option<Arc<dyn StatusReporter>>,
}

impl<T> Collector<T>
where
    T: Send + 'static,
{
    pub(crate) fn new(
        items: mpsc::Receiver<T>,
        batches: mpsc::Sender<Vec<T>>,
        shutdown: CancellationToken,
        batch_max_size: usize,
        batch_time: Duration,
        stats: Arc<PipelineStats>,
        status: Option<Arc<dyn StatusReporter>>,
    ) -> Self {
        Self {
            items,
            batches,
            shutdown,
            batch_max_size,
            batch_time,
            stats,
            status,
        }
    }

    pub(crate) async fn run(mut self) -> Result<(), PipelineError> {
        let mut batch: Vec<T> = self.fresh_batch();
        let mut ticker = interval_at(Instant::now() + self.batch_time, self.batch_time);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::debug!(batch_max_size = self.batch_max_size, "collector started");

        loop {
            // a burst may have filled the batch since the last flush
            if batch.len() >= self.batch_max_size {
                self.flush(&mut batch, FlushReason::Size).await?;
            }

            let event = tokio::select! {
                _ = self.shutdown.cancelled() => Event::Shutdown,
                item = self.items.recv() => match item {
                    Some(item) => Event::Item(item),
                    None => Event::Shutdown,
                },
                _ = ticker.tick() => Event::Tick,
            };

            match event {
                Event::Item(item) => {
                    batch.push(item);
                    if batch.len() >= self.batch_max_size {
                        self.flush(&mut batch, FlushReason::Size).await?;
                    }
                }
                Event::Tick => {
                    if !batch.is_empty() {
                        self.flush(&mut batch, FlushReason::Timer).await?;
                    }
                }
                Event::Shutdown => return self.drain(batch).await,
            }
        }
    }

    /// Stops intake, batches whatever is still in the hand-off, then flushes
    /// the remainder. Dropping `self` afterwards closes the batch queue.
    async fn drain(mut self, mut batch: Vec<T>) -> Result<(), PipelineError> {
        self.items.close();
        while let Some(item) = self.items.recv().await {
            batch.push(item);
            if batch.len() >= self.batch_max_size {
                self.flush(&mut batch, FlushReason::Size).await?;
            }
        }

        if !batch.is_empty() {
            if let Some(status) = &self.status {
                status.info(
                    "dispatching last batch before shutdown",
                    &[("batch_size", batch.len().to_string())],
                );
            }
            self.flush(&mut batch, FlushReason::Shutdown).await?;
        }

        tracing::debug!("collector stopped");
        Ok(())
    }

    fn fresh_batch(&self) -> Vec<T> {
        Vec::with_capacity(self.batch_max_size.min(MAX_PREALLOCATED))
    }

    async fn flush(&self, batch: &mut Vec<T>, reason: FlushReason) -> Result<(), PipelineError> {
        let full = std::mem::replace(batch, self.fresh_batch());
        let size = full.len();
        tracing::trace!(size, ?reason, "flushing batch");

        if let Err(mpsc::error::SendError(lost)) = self.batches.send(full).await {
            if let Some(status) = &self.status {
                status.error(
                    "batch queue closed, no worker left to take batch",
                    &[("batch_size", lost.len().to_string())],
                );
            }
            return Err(PipelineError::ChannelClosed(lost.len()));
        }

        self.stats.record_flushed();
        Ok(())
    }
}
