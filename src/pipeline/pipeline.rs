use futures::future::join_all;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use super::collector::Collector;
use super::config::Config;
use super::sink::BatchSink;
use super::stats::{PipelineStats, StatsSnapshot};
use super::types::PipelineError;
use super::worker::{LoadMonitor, Worker};
use crate::status::StatusReporter;

/// Slots in the item hand-off. Tokio channels need at least one.
const ITEM_QUEUE_CAPACITY: usize = 1;

/// Cloneable handle producers use to submit items.
///
/// A default handle is detached: `add` fails with
/// [`PipelineError::NotInitialized`].
pub struct Producer<T> {
    inner: Option<ProducerInner<T>>,
}

struct ProducerInner<T> {
    sender: mpsc::Sender<T>,
    stats: Arc<PipelineStats>,
}

impl<T> Clone for Producer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.as_ref().map(|inner| ProducerInner {
                sender: inner.sender.clone(),
                stats: inner.stats.clone(),
            }),
        }
    }
}

impl<T> Default for Producer<T> {
    fn default() -> Self {
        Self { inner: None }
    }
}

impl<T> Producer<T> {
    /// Hands `item` to the collector, waiting while the hand-off is occupied.
    pub async fn add(&self, item: T) -> Result<(), PipelineError> {
        let Some(inner) = &self.inner else {
            return Err(PipelineError::NotInitialized);
        };

        inner
            .sender
            .send(item)
            .await
            .map_err(|_| PipelineError::Closed)?;
        inner.stats.record_accepted();
        Ok(())
    }

    /// True once shutdown has stopped intake, or for a detached handle.
    pub fn is_closed(&self) -> bool {
        self.inner
            .as_ref()
            .map_or(true, |inner| inner.sender.is_closed())
    }
}

/// Owns the item queue, the collector, the batch queue and the worker pool.
///
/// Must be created inside a Tokio runtime, otherwise construction fails with
/// [`PipelineError::Configuration`]. Call [`Pipeline::close`] to drain
/// and stop; dropping the pipeline instead signals shutdown and lets the
/// tasks drain in the background.
pub struct Pipeline<T> {
    producer: Producer<T>,
    config: Arc<Config>,
    stats: Arc<PipelineStats>,
    shutdown: CancellationToken,
    collector: JoinHandle<Result<(), PipelineError>>,
    workers: Vec<JoinHandle<()>>,
    _guard: DropGuard,
}

impl<T> Pipeline<T>
where
    T: Send + 'static,
{
    /// Starts a pipeline that reports nothing.
    pub fn new<S>(sink: S, config: Config) -> Result<Self, PipelineError>
    where
        S: BatchSink<T> + 'static,
    {
        Self::start(sink, config, None)
    }

    /// Starts a pipeline that sends status reports to `status`.
    pub fn with_status<S>(
        sink: S,
        config: Config,
        status: Arc<dyn StatusReporter>,
    ) -> Result<Self, PipelineError>
    where
        S: BatchSink<T> + 'static,
    {
        Self::start(sink, config, Some(status))
    }

    fn start<S>(
        sink: S,
        config: Config,
        status: Option<Arc<dyn StatusReporter>>,
    ) -> Result<Self, PipelineError>
    where
        S: BatchSink<T> + 'static,
    {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|e| {
            PipelineError::Configuration(format!(
                "pipeline must be started inside a Tokio runtime: {e}"
            ))
        })?;
        let config = Arc::new(config);

        let (item_tx, item_rx) = mpsc::channel(ITEM_QUEUE_CAPACITY);
        let (batch_tx, batch_rx) = mpsc::channel(config.max_batches_in_queue);
        let shutdown = CancellationToken::new();
        let stats = Arc::new(PipelineStats::default());

        if let Some(status) = &status {
            status.info(
                "running backpressure context",
                &[
                    ("workers", config.worker_count.to_string()),
                    ("batch_time_ms", config.batch_time_ms.to_string()),
                    ("batch_max_size", config.batch_max_size.to_string()),
                    ("max_batches_in_queue", config.max_batches_in_queue.to_string()),
                ],
            );
        }

        let monitor = LoadMonitor::new(
            &item_tx,
            &batch_tx,
            config.batch_max_size,
            config.max_batches_in_queue,
        );

        let collector = Collector::new(
            item_rx,
            batch_tx,
            shutdown.clone(),
            config.batch_max_size,
            config.batch_time(),
            stats.clone(),
            status.clone(),
        );
        let collector = runtime.spawn(collector.run());

        let sink = Arc::new(sink);
        let batch_rx = Arc::new(Mutex::new(batch_rx));
        let workers = (0..config.worker_count)
            .map(|id| {
                let worker = Worker::new(
                    id,
                    batch_rx.clone(),
                    sink.clone(),
                    monitor.clone(),
                    stats.clone(),
                    status.clone(),
                );
                runtime.spawn(worker.run())
            })
            .collect();

        tracing::debug!(workers = config.worker_count, "pipeline started");

        Ok(Self {
            producer: Producer {
                inner: Some(ProducerInner {
                    sender: item_tx,
                    stats: stats.clone(),
                }),
            },
            config,
            stats,
            _guard: shutdown.clone().drop_guard(),
            shutdown,
            collector,
            workers,
        })
    }

    /// Submits one item. See [`Producer::add`].
    pub async fn add(&self, item: T) -> Result<(), PipelineError> {
        self.producer.add(item).await
    }

    /// Returns a handle for submitting items from other tasks.
    pub fn producer(&self) -> Producer<T> {
        self.producer.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Stops intake, flushes the partial batch, delivers every queued batch
    /// and waits for all tasks to finish.
    ///
    /// Handles obtained from [`Pipeline::producer`] fail with
    /// [`PipelineError::Closed`] from this point on.
    pub async fn close(self) -> Result<(), PipelineError> {
        self.shutdown.cancel();

        let mut errors = Vec::new();
        match self.collector.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => errors.push(e),
            Err(e) => errors.push(PipelineError::TaskFailed(format!("collector: {e}"))),
        }

        for (id, result) in join_all(self.workers).await.into_iter().enumerate() {
            if let Err(e) = result {
                errors.push(PipelineError::TaskFailed(format!("worker {id}: {e}")));
            }
        }

        tracing::debug!(failed_tasks = errors.len(), "pipeline closed");

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(PipelineError::MultipleErrors(errors)),
        }
    }
}
