// src/pipeline/config.rs

use derive_builder::Builder;
use std::time::Duration;
use tokio::sync::Semaphore;

use super::types::PipelineError;

pub const DEFAULT_BATCH_MAX_SIZE: usize = 50;
pub const DEFAULT_BATCH_TIME_MS: f64 = 100.0;
pub const DEFAULT_WORKER_COUNT: usize = 100;
pub const DEFAULT_MAX_BATCHES_IN_QUEUE: usize = 100;

/// Longest accepted batch time: 365 days, in milliseconds.
pub const MAX_BATCH_TIME_MS: f64 = 365.0 * 24.0 * 60.0 * 60.0 * 1000.0;

/// Largest batch queue a Tokio bounded channel can hold.
pub const MAX_BATCHES_IN_QUEUE_LIMIT: usize = Semaphore::MAX_PERMITS;

/// Pipeline configuration. Immutable once handed to [`Pipeline::new`].
///
/// [`Pipeline::new`]: super::Pipeline::new
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct Config {
    /// Number of items that forces a batch out immediately
    #[builder(default = "DEFAULT_BATCH_MAX_SIZE")]
    pub(crate) batch_max_size: usize,

    /// Longest a partial batch waits before it is flushed, in milliseconds
    #[builder(default = "DEFAULT_BATCH_TIME_MS")]
    pub(crate) batch_time_ms: f64,

    /// Number of concurrent sink workers
    #[builder(default = "DEFAULT_WORKER_COUNT")]
    pub(crate) worker_count: usize,

    /// Capacity of the batch queue between the collector and the workers
    #[builder(default = "DEFAULT_MAX_BATCHES_IN_QUEUE")]
    pub(crate) max_batches_in_queue: usize,
}

impl ConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        check(
            self.batch_max_size.unwrap_or(DEFAULT_BATCH_MAX_SIZE),
            self.batch_time_ms.unwrap_or(DEFAULT_BATCH_TIME_MS),
            self.worker_count.unwrap_or(DEFAULT_WORKER_COUNT),
            self.max_batches_in_queue
                .unwrap_or(DEFAULT_MAX_BATCHES_IN_QUEUE),
        )
    }
}

fn check(
    batch_max_size: usize,
    batch_time_ms: f64,
    worker_count: usize,
    max_batches_in_queue: usize,
) -> Result<(), String> {
    if batch_max_size == 0 {
        return Err("batch_max_size must be greater than 0".to_string());
    }
    match Duration::try_from_secs_f64(batch_time_ms / 1000.0) {
        Ok(period) if !period.is_zero() => {}
        _ => {
            return Err(format!(
                "batch_time_ms must be a finite value greater than 0, got {batch_time_ms}"
            ))
        }
    }
    if batch_time_ms > MAX_BATCH_TIME_MS {
        return Err(format!(
            "batch_time_ms must be at most {MAX_BATCH_TIME_MS}, got {batch_time_ms}"
        ));
    }
    if worker_count == 0 {
        return Err("worker_count must be greater than 0".to_string());
    }
    if max_batches_in_queue == 0 {
        return Err("max_batches_in_queue must be greater than 0".to_string());
    }
    if max_batches_in_queue > MAX_BATCHES_IN_QUEUE_LIMIT {
        return Err(format!(
            "max_batches_in_queue must be at most {MAX_BATCHES_IN_QUEUE_LIMIT}, got {max_batches_in_queue}"
        ));
    }
    Ok(())
}

impl Default for Config {
    fn default() -> Self {
        Config {
            batch_max_size: DEFAULT_BATCH_MAX_SIZE,
            batch_time_ms: DEFAULT_BATCH_TIME_MS,
            worker_count: DEFAULT_WORKER_COUNT,
            max_batches_in_queue: DEFAULT_MAX_BATCHES_IN_QUEUE,
        }
    }
}

impl Config {
    /// Re-checks the thresholds; `Pipeline::new` refuses to start on failure.
    pub fn validate(&self) -> Result<(), PipelineError> {
        check(
            self.batch_max_size,
            self.batch_time_ms,
            self.worker_count,
            self.max_batches_in_queue,
        )
        .map_err(PipelineError::Configuration)
    }

    #[inline]
    pub fn batch_max_size(&self) -> usize {
        self.batch_max_size
    }

    #[inline]
    pub fn batch_time_ms(&self) -> f64 {
        self.batch_time_ms
    }

    /// The time threshold as a `Duration`
    #[inline]
    pub fn batch_time(&self) -> Duration {
        Duration::from_secs_f64(self.batch_time_ms / 1000.0)
    }

    #[inline]
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    #[inline]
    pub fn max_batches_in_queue(&self) -> usize {
        self.max_batches_in_queue
    }
}
