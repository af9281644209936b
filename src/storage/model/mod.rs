//! Data models for counter sampling.
//!
//! - [`snapshot`]: one timestamped set of counter values
//! - [`watchlist`]: which counters are kept, averaged and summed into queries/sec

mod snapshot;
mod watchlist;

pub use snapshot::Snapshot;
pub use watchlist::Watchlist;
