// src/dataset/record.rs
//! Input record and its per-record partial result

use serde::{Deserialize, Serialize};

/// Per-record computed value, `a + b`
pub type PartialResult = i64;

/// One input unit. Identity is its position in the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub a: i32,
    pub b: i32,
}

impl Record {
    pub fn new(a: i32, b: i32) -> Self {
        Self { a, b }
    }

    /// Sum of both fields, widened so it cannot overflow
    pub fn partial(&self) -> PartialResult {
        i64::from(self.a) + i64::from(self.b)
    }
}
