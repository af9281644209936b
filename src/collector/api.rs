//! Statistics from the built-in HTTP API.
//!
//! `GET /api/v1/servers/localhost/statistics` returns a JSON array of items:
//!
//! ```text
//! [{"name": "udp4-queries", "type": "StatisticItem", "value": "1234"},
//!  {"name": "response-by-qtype", "type": "MapStatisticItem", "value": [...]}]
//! ```
//!
//! Only `StatisticItem` entries carry a single counter; everything else is ignored.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};

use super::traits::{CollectError, StatsSource};
use crate::storage::model::{Snapshot, Watchlist};

pub const DEFAULT_API_HOST: &str = "127.0.0.1";
pub const DEFAULT_API_PORT: u16 = 8081;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const STATISTICS_PATH: &str = "/api/v1/servers/localhost/statistics";
const API_KEY_HEADER: &str = "X-API-Key";
const STATISTIC_ITEM: &str = "StatisticItem";

#[derive(Debug, Deserialize)]
struct StatisticEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    value: Value,
}

/// Extracts watched counters from the statistics payload.
///
/// Values are accepted as JSON strings or non-negative integers.
pub fn parse_statistics(body: &str, watchlist: &Watchlist) -> Result<BTreeMap<String, u64>, CollectError> {
    let entries: Vec<StatisticEntry> =
        serde_json::from_str(body).map_err(|e| CollectError::Malformed(e.to_string()))?;

    let mut counters = BTreeMap::new();
    for entry in entries {
        if entry.kind != STATISTIC_ITEM || !watchlist.is_watched(&entry.name) {
            continue;
        }
        let value = match &entry.value {
            Value::String(s) => s.parse::<u64>().ok(),
            Value::Number(n) => n.as_u64(),
            _ => None,
        };
        match value {
            Some(v) => {
                counters.insert(entry.name, v);
            }
            None => trace!("skipping {} with value {}", entry.name, entry.value),
        }
    }
    Ok(counters)
}

/// Source backed by the HTTP statistics endpoint.
pub struct ApiSource {
    client: Client,
    url: String,
    api_key: String,
}

impl ApiSource {
    pub fn new(host: &str, port: u16, api_key: impl Into<String>, timeout: Duration) -> Result<Self, CollectError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CollectError::Connection(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: format!("http://{}:{}{}", host, port, STATISTICS_PATH),
            api_key: api_key.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl StatsSource for ApiSource {
    fn name(&self) -> &str {
        "HTTP API"
    }

    fn collect(&mut self, watchlist: &Watchlist) -> Result<Snapshot, CollectError> {
        debug!("GET {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .map_err(|e| CollectError::Connection(format!("{}: {}", self.url, e)))?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::UNAUTHORIZED => return Err(CollectError::Auth(self.url.clone())),
            other => return Err(CollectError::UnexpectedStatus(other.as_u16())),
        }

        let body = response
            .text()
            .map_err(|e| CollectError::Connection(format!("{}: {}", self.url, e)))?;
        let counters = parse_statistics(&body, watchlist)?;
        if counters.is_empty() {
            return Err(CollectError::Empty(self.url.clone()));
        }
        debug!("collected {} counters", counters.len());
        Ok(Snapshot::now(counters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    const PAYLOAD: &str = r#"[
        {"name": "corrupt-packets", "type": "StatisticItem", "value": "0"},
        {"name": "udp4-queries", "type": "StatisticItem", "value": "160"},
        {"name": "tcp-queries", "type": "StatisticItem", "value": 4},
        {"name": "security-status", "type": "StatisticItem", "value": "1"},
        {"name": "response-by-qtype", "type": "MapStatisticItem", "value": [{"name": "A", "value": "3"}]},
        {"name": "udp6-queries", "type": "RingStatisticItem", "value": []}
    ]"#;

    /// Serves one canned HTTP response on an ephemeral port. The request head is
    /// sent back through the returned channel.
    fn serve_once(status: &str, body: &str) -> (u16, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
                head.push_str(&line);
            }
            stream.write_all(response.as_bytes()).unwrap();
            let _ = tx.send(head);
        });
        (port, rx)
    }

    fn source(port: u16) -> ApiSource {
        ApiSource::new("127.0.0.1", port, "secret", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn parse_keeps_statistic_items() {
        let counters = parse_statistics(PAYLOAD, &Watchlist::default()).unwrap();
        assert_eq!(
            counters,
            BTreeMap::from([
                ("security-status".to_string(), 1),
                ("tcp-queries".to_string(), 4),
                ("udp4-queries".to_string(), 160),
            ])
        );
    }

    #[test]
    fn parse_rejects_non_array() {
        let err = parse_statistics(r#"{"error": "nope"}"#, &Watchlist::default()).unwrap_err();
        assert!(matches!(err, CollectError::Malformed(_)));
    }

    #[test]
    fn url_layout() {
        let src = ApiSource::new("ns1.example", 8081, "k", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(
            src.url(),
            "http://ns1.example:8081/api/v1/servers/localhost/statistics"
        );
    }

    #[test]
    fn collects_with_api_key() {
        let (port, rx) = serve_once("200 OK", PAYLOAD);
        let snap = source(port).collect(&Watchlist::default()).unwrap();
        assert_eq!(snap.get("udp4-queries"), Some(160));
        assert_eq!(snap.len(), 3);

        let head = rx.recv().unwrap().to_ascii_lowercase();
        assert!(head.starts_with("get /api/v1/servers/localhost/statistics "));
        assert!(head.contains("x-api-key: secret"));
    }

    #[test]
    fn unauthorized_is_auth_error() {
        let (port, _rx) = serve_once("401 Unauthorized", "Unauthorized");
        let err = source(port).collect(&Watchlist::default()).unwrap_err();
        assert!(matches!(err, CollectError::Auth(_)));
    }

    #[test]
    fn unauthorized_run_reports_unknown() {
        use crate::check::{Baseline, run_check};
        use crate::status::EvalOptions;

        let (port, _rx) = serve_once("401 Unauthorized", "Unauthorized");
        let mut src = source(port);
        let url = src.url().to_string();
        let r = run_check(
            &mut src,
            &Baseline::Shifted(1),
            &Watchlist::default(),
            &EvalOptions::default(),
        );
        assert_eq!(r.exit_code(), 3);
        assert_eq!(r.message, CollectError::Auth(url).to_string());
    }

    #[test]
    fn other_status_is_unexpected() {
        let (port, _rx) = serve_once("500 Internal Server Error", "oops");
        let err = source(port).collect(&Watchlist::default()).unwrap_err();
        assert_eq!(err, CollectError::UnexpectedStatus(500));
    }

    #[test]
    fn invalid_json_is_malformed() {
        let (port, _rx) = serve_once("200 OK", "<html></html>");
        let err = source(port).collect(&Watchlist::default()).unwrap_err();
        assert!(matches!(err, CollectError::Malformed(_)));
    }

    #[test]
    fn no_watched_counters_is_empty() {
        let (port, _rx) = serve_once("200 OK", "[]");
        let err = source(port).collect(&Watchlist::default()).unwrap_err();
        assert!(matches!(err, CollectError::Empty(_)));
    }

    #[test]
    fn refused_connection_is_connection_error() {
        // Bind and drop to get a port nobody listens on.
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let err = source(port).collect(&Watchlist::default()).unwrap_err();
        assert!(matches!(err, CollectError::Connection(_)));
    }
}
