use async_trait::async_trait;
use backpressure_rs::pipeline::{BatchSink, ConfigBuilder, Pipeline, SinkError};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct CountingSink {
    processed: Arc<AtomicUsize>,
}

#[async_trait]
impl BatchSink<u64> for CountingSink {
    async fn put_multi(&self, batch: Vec<u64>) -> Result<(), SinkError> {
        self.processed.fetch_add(batch.len(), Ordering::Relaxed);
        tokio::task::yield_now().await;
        Ok(())
    }
}

async fn run_pipeline(
    producers: u64,
    per_producer: u64,
    batch_max_size: usize,
    worker_count: usize,
) -> usize {
    let processed = Arc::new(AtomicUsize::new(0));
    let config = ConfigBuilder::default()
        .batch_max_size(batch_max_size)
        .batch_time_ms(100.0)
        .worker_count(worker_count)
        .build()
        .unwrap();
    let pipeline = Pipeline::new(
        CountingSink {
            processed: processed.clone(),
        },
        config,
    )
    .unwrap();

    let handles: Vec<_> = (0..producers)
        .map(|p| {
            let producer = pipeline.producer();
            tokio::spawn(async move {
                for i in 0..per_producer {
                    producer.add(p * per_producer + i).await.unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    pipeline.close().await.unwrap();
    processed.load(Ordering::Relaxed)
}

fn bench_batch_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_batch_sizes");
    let runtime = tokio::runtime::Runtime::new().unwrap();

    let producers = 100u64;
    let per_producer = 100u64;

    for batch_max_size in [10usize, 50, 300, 1000] {
        group.throughput(Throughput::Elements(producers * per_producer));
        group.bench_with_input(
            BenchmarkId::new("batch_max_size", batch_max_size),
            &batch_max_size,
            |b, &batch_max_size| {
                b.to_async(&runtime).iter(|| async move {
                    run_pipeline(producers, per_producer, batch_max_size, 16).await
                });
            },
        );
    }
    group.finish();
}

fn bench_worker_counts(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_worker_counts");
    let runtime = tokio::runtime::Runtime::new().unwrap();

    for worker_count in [1usize, 4, 16, 100] {
        group.throughput(Throughput::Elements(10_000));
        group.bench_with_input(
            BenchmarkId::new("workers", worker_count),
            &worker_count,
            |b, &worker_count| {
                b.to_async(&runtime)
                    .iter(|| async move { run_pipeline(100, 100, 300, worker_count).await });
            },
        );
    }
    group.finish();
}

// 15,000 producers submitting two events each
fn bench_many_producers(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_many_producers");
    group.sample_size(10);
    let runtime = tokio::runtime::Runtime::new().unwrap();

    group.throughput(Throughput::Elements(30_000));
    group.bench_function("15000x2", |b| {
        b.to_async(&runtime).iter(|| async {
            let processed = run_pipeline(15_000, 2, 300, 100).await;
            assert_eq!(processed, 30_000);
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_batch_sizes,
    bench_worker_counts,
    bench_many_producers
);
criterion_main!(benches);
