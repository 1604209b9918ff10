mod collector;
pub mod config;
pub mod pipeline;
pub mod sink;
mod stats;
pub mod types;
mod worker;


pub use config::{Config, ConfigBuilder, ConfigBuilderError};
pub use pipeline::{Pipeline, Producer};
pub use sink::BatchSink;
pub use stats::StatsSnapshot;
pub use types::{BoxError, PipelineError, SinkError};
pub use worker::{Load, WATERMARK};
