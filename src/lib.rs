//! # backpressure-rs
//!
//! A batching backpressure pipeline built on Tokio.
//!
//! Producers submit items one at a time. A single collector task groups them
//! into batches, flushing on size or on a timer, and pushes the batches onto a
//! bounded queue drained by a fixed pool of workers that hand each batch to a
//! [`BatchSink`](pipeline::BatchSink).
//!
//! ## Features
//!
//! - **Size and time bounded batches**
//! - **Backpressure** via a one-slot item hand-off and a bounded batch queue:
//!   a slow sink stalls producers instead of growing memory
//! - **Orderly shutdown** that flushes the partial batch and drains every
//!   queued batch before returning
//! - **Load reports** through an injected [`StatusReporter`](status::StatusReporter)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use backpressure_rs::pipeline::{ConfigBuilder, Pipeline, SinkError};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigBuilder::default()
//!     .batch_max_size(300usize)
//!     .batch_time_ms(100.0)
//!     .worker_count(8usize)
//!     .build()?;
//!
//! let pipeline = Pipeline::new(
//!     |batch: Vec<String>| async move {
//!         println!("storing {} events", batch.len());
//!         Ok::<(), SinkError>(())
//!     },
//!     config,
//! )?;
//!
//! pipeline.add("event".to_string()).await?;
//! pipeline.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`pipeline`] - Pipeline context, configuration, sink capability
//! - [`status`] - Status reporting capability

pub mod pipeline;
pub mod status;
