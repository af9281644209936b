//! Per-second rate computation between two counter snapshots.
//!
//! Counters are monotonic within the lifetime of the server process. A counter
//! that goes backwards means the server restarted between samples; in that case
//! nothing is reported rather than a partial or negative result.

use std::collections::BTreeMap;

use tracing::debug;

use crate::storage::model::{Snapshot, Watchlist};

/// Rates derived from two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateReport {
    /// Averaged counter -> rounded per-second delta.
    pub rates: BTreeMap<String, u64>,
    /// Sum of query counter deltas per second, rounded.
    pub queries_per_sec: u64,
}

impl RateReport {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Compute delta, returning `None` on counter regression (server restart).
pub fn delta(curr: u64, prev: u64) -> Option<u64> {
    curr.checked_sub(prev)
}

fn per_sec(delta: u64, elapsed: i64) -> u64 {
    (delta as f64 / elapsed as f64).round() as u64
}

/// Computes rates for every averaged counter present in both snapshots.
///
/// Returns an empty report when no time elapsed between the samples, when the
/// prior sample is newer than the current one, or when any averaged counter
/// decreased.
pub fn compute_rates(old: &Snapshot, new: &Snapshot, watchlist: &Watchlist) -> RateReport {
    let elapsed = new.epoch - old.epoch;
    if elapsed <= 0 {
        debug!("no usable interval between samples (elapsed={}s)", elapsed);
        return RateReport::empty();
    }

    let mut rates = BTreeMap::new();
    let mut queries: u64 = 0;

    for (name, &prev) in &old.counters {
        if !watchlist.is_averaged(name) {
            continue;
        }
        let Some(curr) = new.get(name) else {
            continue;
        };
        let Some(d) = delta(curr, prev) else {
            debug!("counter {} went backwards ({} -> {}), skipping rates", name, prev, curr);
            return RateReport::empty();
        };
        rates.insert(name.clone(), per_sec(d, elapsed));
        if watchlist.is_query(name) {
            queries = queries.saturating_add(d);
        }
    }

    RateReport {
        rates,
        queries_per_sec: per_sec(queries, elapsed),
    }
}
