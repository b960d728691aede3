// src/pipeline/mod.rs
//! Parallel fan-out/fan-in aggregation
//!
//! Splits N independent records across a fixed pool of W worker threads and
//! folds their partial results into one total:
//!
//! - **Work Queue**: bounded MPMC channel of records
//! - **Distributor**: the single writer; closes the queue when done
//! - **Worker**: pops records, emits `a + b`
//! - **Aggregator**: relay channel or lock-guarded shared total
//! - **Completion Gate**: releases the total only after N contributions
//!
//! # Architecture
//!
//! ```text
//! records ──→ Distributor ──→ Work Queue ──┬─→ Worker 0 ─┐
//!                                          ├─→ Worker 1 ─┼─→ Aggregator ──→ Gate ──→ Total
//!                                          └─→ Worker W ─┘
//! ```
//!
//! Termination: N enqueues, then close ⇒ workers drain N records and exit ⇒
//! N contributions land ⇒ the gate opens.

pub mod aggregator;
pub mod distributor;
pub mod gate;
pub mod work_queue;
pub mod worker;

// Re-export commonly used types
pub use aggregator::{Aggregate, RelayAggregator, RelaySink, SharedTotal};
pub use distributor::distribute;
pub use gate::{CompletionGate, Total, WorkerBarrier};
pub use work_queue::{QueueMonitor, QueueStats, WorkQueue, WorkReceiver, WorkSender};
pub use worker::{ResultSink, Worker, WorkerStats};

use crate::dataset::Record;
use crate::utils::errors::{EngineError, Result};
use serde::Deserialize;
use std::fmt;
use std::thread::{self, Scope, ScopedJoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn};

/// How partial results are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationStrategy {
    /// Workers send results to a single aggregator over a channel
    #[default]
    Relay,

    /// Workers add into one mutex-guarded total
    SharedCounter,
}

impl fmt::Display for AggregationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relay => f.write_str("relay"),
            Self::SharedCounter => f.write_str("shared_counter"),
        }
    }
}

/// Run configuration, fixed for the lifetime of a [`Pipeline`]
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Exact number of records every run must receive
    pub dataset_size: usize,

    /// Worker pool size
    pub workers: usize,

    pub strategy: AggregationStrategy,

    /// Work queue capacity (default: `dataset_size`)
    pub queue_capacity: Option<usize>,
}

impl PipelineConfig {
    pub fn new(dataset_size: usize, workers: usize) -> Self {
        Self {
            dataset_size,
            workers,
            strategy: AggregationStrategy::default(),
            queue_capacity: None,
        }
    }

    pub fn with_strategy(mut self, strategy: AggregationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.dataset_size == 0 {
            return Err(EngineError::NonPositiveDatasetSize(0));
        }
        if self.workers == 0 {
            return Err(EngineError::InvalidConfig(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.queue_capacity == Some(0) {
            return Err(EngineError::InvalidConfig(
                "queue capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub total: Total,

    /// Records handled by each worker, indexed by worker id
    pub records_per_worker: Vec<u64>,

    /// Records the distributor enqueued
    pub enqueued: usize,

    /// Work queue counters once every worker has exited
    pub queue: QueueStats,

    pub strategy: AggregationStrategy,

    /// Worker pool size
    pub workers: usize,

    /// Wall-clock time from queue creation to gate opening
    pub elapsed: Duration,
}

/// The aggregation pipeline
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Aggregate `records` on the worker pool, blocking until done
    pub fn run(&self, records: &[Record]) -> Result<PipelineReport> {
        if records.len() != self.config.dataset_size {
            return Err(EngineError::DatasetSizeMismatch {
                expected: self.config.dataset_size,
                actual: records.len(),
            });
        }

        let span = info_span!(
            "pipeline",
            strategy = %self.config.strategy,
            workers = self.config.workers,
            records = records.len()
        );
        let _enter = span.enter();

        let start = Instant::now();
        let capacity = self.config.queue_capacity.unwrap_or(self.config.dataset_size);
        let (sender, receiver) = WorkQueue::bounded(capacity);
        let monitor = receiver.monitor();
        let gate = CompletionGate::new(self.config.dataset_size);

        let outcome = match self.config.strategy {
            AggregationStrategy::Relay => self.run_relay(records, sender, receiver, &gate)?,
            AggregationStrategy::SharedCounter => {
                self.run_shared_counter(records, sender, receiver, &gate)?
            }
        };

        let elapsed = start.elapsed();
        let queue = monitor.stats();
        debug!("Work queue stats: {:?}", queue);

        info!(
            "Aggregated {} records into {} in {:?}",
            outcome.total.contributions(),
            outcome.total.value(),
            elapsed
        );

        Ok(PipelineReport {
            total: outcome.total,
            records_per_worker: outcome.records_per_worker,
            enqueued: outcome.enqueued,
            queue,
            strategy: self.config.strategy,
            workers: self.config.workers,
            elapsed,
        })
    }

    /// Run on tokio's blocking pool
    pub async fn run_async(&self, records: Vec<Record>) -> Result<PipelineReport> {
        let pipeline = self.clone();
        tokio::task::spawn_blocking(move || pipeline.run(&records)).await?
    }

    fn run_relay(
        &self,
        records: &[Record],
        sender: WorkSender,
        receiver: WorkReceiver,
        gate: &CompletionGate,
    ) -> Result<Outcome> {
        thread::scope(|scope| {
            let (sink, relay) = aggregator::relay_channel(gate.expected());

            let workers = self.spawn_workers(scope, receiver, |_| sink.clone())?;
            // Only worker-held sinks may keep the relay channel open.
            drop(sink);

            let distributor = spawn_distributor(scope, records, sender)?;

            let aggregate = relay.drain();

            let records_per_worker = join_workers(workers)?;
            let enqueued = join_distributor(distributor)?;
            let total = gate.seal(aggregate)?;

            Ok(Outcome {
                total,
                records_per_worker,
                enqueued,
            })
        })
    }

    fn run_shared_counter(
        &self,
        records: &[Record],
        sender: WorkSender,
        receiver: WorkReceiver,
        gate: &CompletionGate,
    ) -> Result<Outcome> {
        let shared = SharedTotal::new();
        let barrier = WorkerBarrier::new();

        thread::scope(|scope| {
            let workers =
                self.spawn_workers(scope, receiver, |_| shared.sink(barrier.token()))?;
            let distributor = spawn_distributor(scope, records, sender)?;

            barrier.wait();
            let aggregate = shared.snapshot();

            let records_per_worker = join_workers(workers)?;
            let enqueued = join_distributor(distributor)?;
            let total = gate.seal(aggregate)?;

            Ok(Outcome {
                total,
                records_per_worker,
                enqueued,
            })
        })
    }

    fn spawn_workers<'scope, S, F>(
        &self,
        scope: &'scope Scope<'scope, '_>,
        receiver: WorkReceiver,
        mut make_sink: F,
    ) -> Result<Vec<ScopedJoinHandle<'scope, WorkerStats>>>
    where
        S: ResultSink + Send + 'scope,
        F: FnMut(usize) -> S,
    {
        let mut handles = Vec::with_capacity(self.config.workers);

        for id in 0..self.config.workers {
            let worker = Worker::new(id, receiver.clone(), make_sink(id));
            let handle = thread::Builder::new()
                .name(format!("pairsum-worker-{}", id))
                .spawn_scoped(scope, move || worker.run())
                .map_err(EngineError::Spawn)?;
            handles.push(handle);
        }

        debug!("Spawned {} workers", handles.len());
        Ok(handles)
    }
}

struct Outcome {
    total: Total,
    records_per_worker: Vec<u64>,
    enqueued: usize,
}

fn spawn_distributor<'scope, 'env>(
    scope: &'scope Scope<'scope, 'env>,
    records: &'env [Record],
    sender: WorkSender,
) -> Result<ScopedJoinHandle<'scope, usize>> {
    thread::Builder::new()
        .name("pairsum-distributor".to_string())
        .spawn_scoped(scope, move || distribute(records, sender))
        .map_err(EngineError::Spawn)
}

/// Join every worker, reporting the lowest panicked id. All handles are
/// joined first; an unjoined panicked thread would make the scope panic.
fn join_workers(handles: Vec<ScopedJoinHandle<'_, WorkerStats>>) -> Result<Vec<u64>> {
    let mut records_per_worker = vec![0; handles.len()];
    let mut panicked = None;

    for (id, handle) in handles.into_iter().enumerate() {
        match handle.join() {
            Ok(stats) => records_per_worker[stats.id] = stats.processed,
            Err(_) => {
                warn!("Worker {} panicked", id);
                panicked.get_or_insert(id);
            }
        }
    }

    match panicked {
        Some(id) => Err(EngineError::WorkerPanicked(id)),
        None => Ok(records_per_worker),
    }
}

fn join_distributor(handle: ScopedJoinHandle<'_, usize>) -> Result<usize> {
    handle.join().map_err(|_| EngineError::DistributorPanicked)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRATEGIES: [AggregationStrategy; 2] =
        [AggregationStrategy::Relay, AggregationStrategy::SharedCounter];

    fn scenario() -> Vec<Record> {
        vec![Record::new(3, -1), Record::new(-10, 10), Record::new(5, 5)]
    }

    fn sample(n: i32) -> Vec<Record> {
        (0..n).map(|i| Record::new(i % 21 - 10, (i * 7) % 21 - 10)).collect()
    }

    fn expected_sum(records: &[Record]) -> i64 {
        records.iter().map(Record::partial).sum()
    }

    #[test]
    fn test_scenario_total() {
        let records = scenario();
        for strategy in STRATEGIES {
            for workers in [1, 2, 3, 8] {
                let config = PipelineConfig::new(3, workers).with_strategy(strategy);
                let report = Pipeline::new(config).unwrap().run(&records).unwrap();

                assert_eq!(report.total.value(), 12, "{} / {}", strategy, workers);
                assert_eq!(report.total.contributions(), 3);
            }
        }
    }

    #[test]
    fn test_total_independent_of_worker_count() {
        let records = sample(10_000);
        let expected = expected_sum(&records);

        for strategy in STRATEGIES {
            for workers in [1, 2, 3, 8] {
                for _ in 0..3 {
                    let config =
                        PipelineConfig::new(records.len(), workers).with_strategy(strategy);
                    let report = Pipeline::new(config).unwrap().run(&records).unwrap();
                    assert_eq!(report.total.value(), expected);
                }
            }
        }
    }

    #[test]
    fn test_no_loss_no_duplication() {
        let records = sample(5_000);

        for strategy in STRATEGIES {
            let config = PipelineConfig::new(records.len(), 4).with_strategy(strategy);
            let report = Pipeline::new(config).unwrap().run(&records).unwrap();

            assert_eq!(report.total.contributions(), 5_000);
            assert_eq!(report.enqueued, 5_000);
            assert_eq!(report.workers, 4);
            assert_eq!(report.queue.enqueued, 5_000);
            assert_eq!(report.queue.dequeued, 5_000);
            assert_eq!(report.queue.current_size, 0);
            assert_eq!(report.records_per_worker.len(), 4);
            assert_eq!(report.records_per_worker.iter().sum::<u64>(), 5_000);
        }
    }

    #[test]
    fn test_small_queue_does_not_deadlock() {
        let records = sample(2_000);
        let expected = expected_sum(&records);

        for strategy in STRATEGIES {
            let config = PipelineConfig::new(records.len(), 3)
                .with_strategy(strategy)
                .with_queue_capacity(1);
            let report = Pipeline::new(config).unwrap().run(&records).unwrap();
            assert_eq!(report.total.value(), expected);
        }
    }

    #[test]
    fn test_more_workers_than_records() {
        let records = vec![Record::new(4, 4)];
        for strategy in STRATEGIES {
            let config = PipelineConfig::new(1, 8).with_strategy(strategy);
            let report = Pipeline::new(config).unwrap().run(&records).unwrap();
            assert_eq!(report.total.value(), 8);
            assert_eq!(report.records_per_worker.iter().sum::<u64>(), 1);
        }
    }

    #[test]
    fn test_join_workers_survives_several_panics() {
        let result = thread::scope(|scope| {
            let handles: Vec<ScopedJoinHandle<'_, WorkerStats>> = (0..3)
                .map(|id| {
                    scope.spawn(move || {
                        if id < 2 {
                            panic!("worker {} failed", id);
                        }
                        WorkerStats { id, processed: 1 }
                    })
                })
                .collect();

            join_workers(handles)
        });

        assert!(matches!(result, Err(EngineError::WorkerPanicked(0))));
    }

    #[test]
    fn test_join_workers_collects_counts() {
        let result = thread::scope(|scope| {
            let handles: Vec<ScopedJoinHandle<'_, WorkerStats>> = (0..3)
                .map(|id| scope.spawn(move || WorkerStats { id, processed: id as u64 * 2 }))
                .collect();

            join_workers(handles)
        });

        assert_eq!(result.unwrap(), vec![0, 2, 4]);
    }

    #[test]
    fn test_size_mismatch_rejected_before_run() {
        let pipeline = Pipeline::new(PipelineConfig::new(4, 2)).unwrap();
        let err = pipeline.run(&scenario()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::DatasetSizeMismatch { expected: 4, actual: 3 }
        ));
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            Pipeline::new(PipelineConfig::new(0, 2)),
            Err(EngineError::NonPositiveDatasetSize(0))
        ));
        assert!(matches!(
            Pipeline::new(PipelineConfig::new(3, 0)),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(matches!(
            Pipeline::new(PipelineConfig::new(3, 1).with_queue_capacity(0)),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(AggregationStrategy::Relay.to_string(), "relay");
        assert_eq!(AggregationStrategy::SharedCounter.to_string(), "shared_counter");
        assert_eq!(AggregationStrategy::default(), AggregationStrategy::Relay);
    }

    #[tokio::test]
    async fn test_run_async() {
        let pipeline = Pipeline::new(PipelineConfig::new(3, 2)).unwrap();
        let report = pipeline.run_async(scenario()).await.unwrap();
        assert_eq!(report.total.value(), 12);
        assert_eq!(report.strategy, AggregationStrategy::Relay);
    }
}
