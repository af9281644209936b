//! pdnscheck - PowerDNS authoritative server monitoring plugin library.
//!
//! This library provides the pieces behind the `check_pdns_auth` binary:
//! - `collector` - statistics sources (control socket, HTTP API, canned data)
//! - `storage` - counter snapshots, the watchlist and the persisted prior sample
//! - `rates` - per-second rates between two snapshots
//! - `status` - severity levels, threshold evaluation and report rendering
//! - `check` - one complete check run
//! - `config` - command line configuration

pub mod check;
pub mod collector;
pub mod config;
pub mod rates;
pub mod status;
pub mod storage;
