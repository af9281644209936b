//! Statistics collection from a PowerDNS authoritative server.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────────┐
//!                 │   StatsSource    │ (trait)
//!                 └────────┬─────────┘
//!          ┌───────────────┼───────────────┐
//!   ┌──────▼──────┐ ┌──────▼──────┐ ┌──────▼──────┐
//!   │ControlSource│ │  ApiSource  │ │ MockSource  │
//!   │pdns_control │ │ HTTP + JSON │ │  (Testing)  │
//!   └─────────────┘ └─────────────┘ └─────────────┘
//! ```
//!
//! Exactly one source is chosen per run. Each returns a `Snapshot` filtered to the
//! watchlist, stamped with the time of collection.
//!
//! # Usage
//!
//! ```
//! use pdnscheck::collector::{MockSource, StatsSource};
//! use pdnscheck::storage::Watchlist;
//!
//! let mut source = MockSource::idle_server();
//! let snapshot = source.collect(&Watchlist::default()).unwrap();
//! assert_eq!(snapshot.get("security-status"), Some(1));
//! ```

pub mod api;
pub mod control;
pub mod mock;
pub mod traits;

pub use api::ApiSource;
pub use control::{ControlSource, parse_show_output};
pub use mock::MockSource;
pub use traits::{CollectError, StatsSource};
