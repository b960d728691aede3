// src/pipeline/work_queue.rs
//! Bounded MPMC work queue
//!
//! A single [`WorkSender`] (not `Clone`) feeds any number of
//! [`WorkReceiver`]s. Dropping or closing the sender is the only termination
//! signal: receivers drain what is left, then observe closed-and-empty.

use crate::dataset::Record;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct Counters {
    enqueued: AtomicU64,
    dequeued: AtomicU64,
    capacity: usize,
}

/// Constructor for a sender/receiver pair sharing one channel
pub struct WorkQueue;

impl WorkQueue {
    /// Create a queue holding at most `capacity` records
    pub fn bounded(capacity: usize) -> (WorkSender, WorkReceiver) {
        let (tx, rx) = bounded(capacity);
        let counters = Arc::new(Counters {
            enqueued: AtomicU64::new(0),
            dequeued: AtomicU64::new(0),
            capacity,
        });

        (
            WorkSender {
                tx,
                counters: Arc::clone(&counters),
            },
            WorkReceiver { rx, counters },
        )
    }
}

/// The single writing end of the work queue
pub struct WorkSender {
    tx: Sender<Record>,
    counters: Arc<Counters>,
}

impl WorkSender {
    /// Enqueue one record, blocking while the queue is full.
    ///
    /// Returns `false` when every receiver is gone.
    pub fn push(&self, record: Record) -> bool {
        match self.tx.send(record) {
            Ok(()) => {
                self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(_) => false,
        }
    }

    /// Close the queue. No record can be enqueued afterwards.
    pub fn close(self) {
        drop(self);
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats::from_counters(&self.counters)
    }
}

/// A reading end of the work queue, one per worker
#[derive(Clone)]
pub struct WorkReceiver {
    rx: Receiver<Record>,
    counters: Arc<Counters>,
}

impl WorkReceiver {
    /// Dequeue one record, suspending while the queue is empty but open.
    /// `None` means closed and drained.
    pub fn pop(&self) -> Option<Record> {
        let record = self.rx.recv().ok()?;
        self.counters.dequeued.fetch_add(1, Ordering::Relaxed);
        Some(record)
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats::from_counters(&self.counters)
    }

    /// Counter view that outlives every sender and receiver without keeping
    /// the channel open
    pub fn monitor(&self) -> QueueMonitor {
        QueueMonitor {
            counters: Arc::clone(&self.counters),
        }
    }
}

/// Read-only handle on the queue counters
#[derive(Clone)]
pub struct QueueMonitor {
    counters: Arc<Counters>,
}

impl QueueMonitor {
    pub fn stats(&self) -> QueueStats {
        QueueStats::from_counters(&self.counters)
    }
}

/// Queue statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStats {
    /// Total records enqueued
    pub enqueued: u64,

    /// Total records dequeued
    pub dequeued: u64,

    /// Records currently buffered
    pub current_size: u64,

    /// Queue capacity
    pub capacity: usize,
}

impl QueueStats {
    fn from_counters(counters: &Counters) -> Self {
        let dequeued = counters.dequeued.load(Ordering::Relaxed);
        let enqueued = counters.enqueued.load(Ordering::Relaxed);

        Self {
            enqueued,
            dequeued,
            current_size: enqueued.saturating_sub(dequeued),
            capacity: counters.capacity,
        }
    }
}
