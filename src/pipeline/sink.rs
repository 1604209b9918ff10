// src/pipeline/sink.rs

use async_trait::async_trait;

use super::types::SinkError;

/// Bulk destination for completed batches.
///
/// Workers call `put_multi` concurrently with different batches, so
/// implementations must tolerate parallel calls. The pipeline imposes no
/// timeout on a call.
#[async_trait]
pub trait BatchSink<T>: Send + Sync {
    async fn put_multi(&self, batch: Vec<T>) -> Result<(), SinkError>;
}

#[async_trait]
impl<T, F, Fut> BatchSink<T> for F
where
    F: Fn(Vec<T>) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<(), SinkError>> + Send,
    T: Send + 'static,
{
    async fn put_multi(&self, batch: Vec<T>) -> Result<(), SinkError> {
        self(batch).await
    }
}
