// src/pipeline/gate.rs
//! Completion gate
//!
//! The only way to obtain a [`Total`]. The relay strategy reaches the gate
//! after draining N results; the shared-counter strategy reaches it after
//! the [`WorkerBarrier`] opens. Either way the gate checks that exactly N
//! contributions landed, so a partial sum is never exposed.

use crate::pipeline::aggregator::Aggregate;
use crate::utils::errors::{EngineError, Result};
use crossbeam::sync::WaitGroup;
use tracing::debug;

/// Final, immutable aggregation result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Total {
    value: i64,
    contributions: u64,
}

impl Total {
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Number of partial results folded in; always the dataset size
    pub fn contributions(&self) -> u64 {
        self.contributions
    }
}

/// Validates an aggregate against the expected contribution count
#[derive(Debug, Clone, Copy)]
pub struct CompletionGate {
    expected: usize,
}

impl CompletionGate {
    pub fn new(expected: usize) -> Self {
        Self { expected }
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Open the gate, turning a complete aggregate into a [`Total`]
    pub fn seal(&self, aggregate: Aggregate) -> Result<Total> {
        if aggregate.contributions != self.expected as u64 {
            return Err(EngineError::PipelineIncomplete {
                expected: self.expected,
                received: aggregate.contributions,
            });
        }

        debug!("Completion gate opened with {} contributions", aggregate.contributions);

        Ok(Total {
            value: aggregate.value,
            contributions: aggregate.contributions,
        })
    }
}

/// Wait-group barrier over the worker pool
pub struct WorkerBarrier {
    wg: WaitGroup,
}

/// Held by one worker for its whole run
pub struct BarrierToken {
    _wg: WaitGroup,
}

impl WorkerBarrier {
    pub fn new() -> Self {
        Self { wg: WaitGroup::new() }
    }

    pub fn token(&self) -> BarrierToken {
        BarrierToken {
            _wg: self.wg.clone(),
        }
    }

    /// Block until every token has been dropped
    pub fn wait(self) {
        self.wg.wait();
    }
}

impl Default for WorkerBarrier {
    fn default() -> Self {
        Self::new()
    }
}
