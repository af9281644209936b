//! Counter snapshot captured from the monitored server.
//!
//! A snapshot is immutable once captured. The same structure is persisted to the
//! sample file and read back as the prior sample of the next run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Counter values captured at a single point in time.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Unix timestamp (seconds) when the counters were read.
    pub epoch: i64,
    /// Counter name -> value. Ordered so that reports are stable.
    pub counters: BTreeMap<String, u64>,
}

impl Snapshot {
    /// Creates a snapshot stamped with the current time.
    pub fn now(counters: BTreeMap<String, u64>) -> Self {
        Self {
            epoch: chrono::Utc::now().timestamp(),
            counters,
        }
    }

    pub fn new(epoch: i64, counters: BTreeMap<String, u64>) -> Self {
        Self { epoch, counters }
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.counters.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Returns a copy of this snapshot taken `secs` seconds earlier.
    pub fn shifted(&self, secs: i64) -> Self {
        Self {
            epoch: self.epoch - secs,
            counters: self.counters.clone(),
        }
    }
}
