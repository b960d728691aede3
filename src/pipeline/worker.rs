// src/pipeline/worker.rs
//! Pool worker
//!
//! A worker pops records until the work queue is closed and drained,
//! computes `a + b` for each, and hands the partial result to its
//! [`ResultSink`]. Workers share nothing but the queue and the sink.

use crate::dataset::PartialResult;
use crate::pipeline::work_queue::WorkReceiver;
use tracing::{debug, trace, warn};

/// Destination for partial results
///
/// Implemented once per aggregation strategy. An `Err` means the sink can no
/// longer accept results and the worker should stop.
pub trait ResultSink {
    fn emit(&self, partial: PartialResult) -> Result<(), SinkClosed>;
}

/// The aggregation side went away before the worker finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkClosed;

/// What one worker did during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub id: usize,
    pub processed: u64,
}

/// A single pool worker
pub struct Worker<S> {
    id: usize,
    queue: WorkReceiver,
    sink: S,
}

impl<S: ResultSink> Worker<S> {
    pub fn new(id: usize, queue: WorkReceiver, sink: S) -> Self {
        Self { id, queue, sink }
    }

    /// Run until the queue is closed and empty
    pub fn run(self) -> WorkerStats {
        debug!("Worker {} started", self.id);
        let mut processed = 0u64;

        while let Some(record) = self.queue.pop() {
            let partial = record.partial();
            trace!("Worker {} computed {:?} -> {}", self.id, record, partial);

            if self.sink.emit(partial).is_err() {
                warn!("Worker {} stopping: result sink closed", self.id);
                break;
            }
            processed += 1;
        }

        debug!("Worker {} finished after {} records", self.id, processed);

        WorkerStats {
            id: self.id,
            processed,
        }
    }
}
