// src/pipeline/distributor.rs
//! Work distributor
//!
//! Pushes every record into the work queue exactly once and then closes it.
//! Taking the sender by value makes the close unconditional: once
//! [`distribute`] returns, nothing can be enqueued again.

use crate::dataset::Record;
use crate::pipeline::work_queue::WorkSender;
use tracing::{debug, warn};

/// Enqueue all records and close the queue. Returns the number enqueued.
pub fn distribute(records: &[Record], sender: WorkSender) -> usize {
    let mut enqueued = 0;

    for record in records {
        if !sender.push(*record) {
            // All workers are gone; the gate reports the shortfall.
            warn!(
                "Work queue closed by consumers after {} of {} records",
                enqueued,
                records.len()
            );
            break;
        }
        enqueued += 1;
    }

    sender.close();
    debug!("Distributed {} records, work queue closed", enqueued);

    enqueued
}
