//! In-memory statistics source.

use std::collections::BTreeMap;

use crate::collector::control::parse_show_output;
use crate::collector::traits::{CollectError, StatsSource};
use crate::storage::model::{Snapshot, Watchlist};

/// Source returning fixed counters.
///
/// Counters are given either as raw `show *` output, which goes through the same
/// parser as the control socket source, or as a ready map.
#[derive(Debug, Clone)]
pub struct MockSource {
    output: String,
    epoch: Option<i64>,
}

impl MockSource {
    /// Creates a source replaying raw `show *` output.
    pub fn from_output(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            epoch: None,
        }
    }

    /// Creates a source returning the given counters.
    pub fn from_counters<'a>(counters: impl IntoIterator<Item = (&'a str, u64)>) -> Self {
        let output = counters
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(",");
        Self::from_output(output)
    }

    /// Stamps collected snapshots with a fixed epoch instead of the current time.
    pub fn at_epoch(mut self, epoch: i64) -> Self {
        self.epoch = Some(epoch);
        self
    }

    pub fn counters(&self, watchlist: &Watchlist) -> BTreeMap<String, u64> {
        parse_show_output(&self.output, watchlist)
    }
}

impl StatsSource for MockSource {
    fn name(&self) -> &str {
        "test data"
    }

    fn collect(&mut self, watchlist: &Watchlist) -> Result<Snapshot, CollectError> {
        let counters = self.counters(watchlist);
        if counters.is_empty() {
            return Err(CollectError::Empty(self.name().to_string()));
        }
        Ok(match self.epoch {
            Some(epoch) => Snapshot::new(epoch, counters),
            None => Snapshot::now(counters),
        })
    }
}
