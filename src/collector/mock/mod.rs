//! Canned statistics for testing.
//!
//! This module provides `MockSource` and pre-built scenarios for exercising the
//! rate calculator and status evaluation without a running server.

mod scenarios;
mod source;

pub use source::MockSource;
