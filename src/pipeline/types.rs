use thiserror::Error;

use super::config::ConfigBuilderError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by the pipeline to its owner and producers.
///
/// Sink failures are not in here: they stay inside the worker that saw them
/// and only reach the status reporter.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid construction parameters. The pipeline never starts.
    #[error("invalid pipeline configuration: {0}")]
    Configuration(String),

    /// `add` was called on a producer handle that is not attached to a pipeline.
    #[error("backpressure run context failed to initialize")]
    NotInitialized,

    /// `add` was called after shutdown began. The item was not accepted.
    #[error("pipeline is closed")]
    Closed,

    /// Every worker is gone, so the collector could not hand off a batch.
    #[error("batch queue closed with {0} item(s) undelivered")]
    ChannelClosed(usize),

    /// A collector or worker task panicked or was aborted.
    #[error("pipeline task failed: {0}")]
    TaskFailed(String),

    /// More than one task failed during shutdown.
    #[error("{} pipeline task(s) failed", .0.len())]
    MultipleErrors(Vec<PipelineError>),
}

impl From<ConfigBuilderError> for PipelineError {
    fn from(err: ConfigBuilderError) -> Self {
        PipelineError::Configuration(err.to_string())
    }
}

/// Failure reported by a sink for one batch.
#[derive(Debug, Error)]
#[error("put_multi failed: {0}")]
pub struct SinkError(#[source] BoxError);

impl SinkError {
    pub fn new<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        SinkError(err.into())
    }

    /// Builds a sink error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        SinkError(message.into().into())
    }
}
