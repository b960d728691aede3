// src/pipeline/aggregator.rs
//! Aggregation strategies
//!
//! Two interchangeable ways of folding partial results into one total:
//!
//! ```text
//! Relay (default)                      SharedCounter
//! Worker ─┐                            Worker ─┐
//! Worker ─┼─→ result channel (N) ──┐   Worker ─┼─→ lock → total += p → unlock
//! Worker ─┘                        ↓   Worker ─┘
//!                 aggregator drains exactly N  barrier waits for all workers
//! ```
//!
//! The strategies are never mixed: relay sends take no lock, and shared
//! counter updates go through no channel.

use crate::dataset::PartialResult;
use crate::pipeline::gate::BarrierToken;
use crate::pipeline::worker::{ResultSink, SinkClosed};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, warn};

/// Running accumulation, not yet vetted by the completion gate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Aggregate {
    pub value: i64,
    pub contributions: u64,
}

impl Aggregate {
    fn fold(&mut self, partial: PartialResult) {
        self.value += partial;
        self.contributions += 1;
    }
}

/// Create the relay channel, sized so that workers never block on send
pub fn relay_channel(expected: usize) -> (RelaySink, RelayAggregator) {
    let (tx, rx) = bounded(expected.max(1));
    (RelaySink { tx }, RelayAggregator { rx, expected })
}

/// Worker-side end of the relay channel
#[derive(Clone)]
pub struct RelaySink {
    tx: Sender<PartialResult>,
}

impl ResultSink for RelaySink {
    fn emit(&self, partial: PartialResult) -> Result<(), SinkClosed> {
        self.tx.send(partial).map_err(|_| SinkClosed)
    }
}

/// Single consumer of the relay channel; the only writer of its total
pub struct RelayAggregator {
    rx: Receiver<PartialResult>,
    expected: usize,
}

impl RelayAggregator {
    /// Receive exactly `expected` results, suspending between each.
    ///
    /// Stops early only if every sink is dropped first, which leaves the
    /// aggregate short for the gate to reject.
    pub fn drain(self) -> Aggregate {
        let mut aggregate = Aggregate::default();

        while aggregate.contributions < self.expected as u64 {
            match self.rx.recv() {
                Ok(partial) => aggregate.fold(partial),
                Err(_) => {
                    warn!(
                        "Relay channel closed after {} of {} results",
                        aggregate.contributions, self.expected
                    );
                    break;
                }
            }
        }

        debug!("Relay aggregator drained {} results", aggregate.contributions);
        aggregate
    }
}

/// Total shared by all workers behind one lock
#[derive(Debug, Default)]
pub struct SharedTotal {
    state: Mutex<Aggregate>,
}

impl SharedTotal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock, read-modify-write, unlock. The guard releases on every path.
    pub fn add(&self, partial: PartialResult) {
        self.state.lock().fold(partial);
    }

    /// Current accumulation; only meaningful once the barrier has opened
    pub fn snapshot(&self) -> Aggregate {
        *self.state.lock()
    }

    /// Sink for one worker, holding that worker's barrier token
    pub fn sink(&self, token: BarrierToken) -> SharedSink<'_> {
        SharedSink {
            total: self,
            _token: token,
        }
    }
}

/// Worker-side handle to a [`SharedTotal`]
///
/// Dropping it, which happens when the worker finishes, releases the
/// worker's barrier token.
pub struct SharedSink<'a> {
    total: &'a SharedTotal,
    _token: BarrierToken,
}

impl ResultSink for SharedSink<'_> {
    fn emit(&self, partial: PartialResult) -> Result<(), SinkClosed> {
        self.total.add(partial);
        Ok(())
    }
}
