//! Counter snapshots and the single-slot sample file.

pub mod model;
pub mod sample;

pub use model::{Snapshot, Watchlist};
pub use sample::SampleStore;
