//! Counters of interest and how each one is used.

use std::collections::BTreeMap;

const QUERY_COUNTERS: &[&str] = &["udp4-queries", "udp6-queries", "tcp-queries"];

const ANSWER_COUNTERS: &[&str] = &[
    "udp4-answers",
    "udp6-answers",
    "tcp-answers",
    "recursing-questions",
    "recursing-answers",
    "query-cache-hit",
    "query-cache-miss",
    "packetcache-hit",
    "packetcache-miss",
];

const SECURITY_STATUS: &str = "security-status";

/// Set of counters a check cares about.
///
/// `query` counters are summed into the aggregate queries/sec figure, `averaged`
/// counters (a superset of `query`) get an individual rate. `security` names the
/// discrete status code, which is kept but never turned into a rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watchlist {
    pub query: Vec<String>,
    pub averaged: Vec<String>,
    pub security: String,
}

impl Watchlist {
    /// Counters exported by the PowerDNS authoritative server.
    pub fn powerdns_auth() -> Self {
        let query: Vec<String> = QUERY_COUNTERS.iter().map(|s| s.to_string()).collect();
        let averaged = query
            .iter()
            .cloned()
            .chain(ANSWER_COUNTERS.iter().map(|s| s.to_string()))
            .collect();
        Self {
            query,
            averaged,
            security: SECURITY_STATUS.to_string(),
        }
    }

    pub fn is_query(&self, name: &str) -> bool {
        self.query.iter().any(|q| q == name)
    }

    pub fn is_averaged(&self, name: &str) -> bool {
        self.averaged.iter().any(|a| a == name)
    }

    pub fn is_watched(&self, name: &str) -> bool {
        self.is_averaged(name) || self.security == name
    }

    /// Drops every counter that is not watched.
    pub fn retain_watched(&self, counters: &mut BTreeMap<String, u64>) {
        counters.retain(|name, _| self.is_watched(name));
    }
}

impl Default for Watchlist {
    fn default() -> Self {
        Self::powerdns_auth()
    }
}
