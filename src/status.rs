//! Severity levels, threshold evaluation and the plugin report line.
//!
//! The report follows the monitoring-plugin convention: a single line
//! `LEVEL - message`, optionally followed by `|` and performance data, and an exit
//! code of 0 (OK), 1 (WARNING), 2 (CRITICAL) or 3 (UNKNOWN).

use std::fmt;

use tracing::debug;

use crate::rates::RateReport;
use crate::storage::model::{Snapshot, Watchlist};

/// Monitoring severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Severity {
    pub fn exit_code(self) -> i32 {
        match self {
            Severity::Ok => 0,
            Severity::Warning => 1,
            Severity::Critical => 2,
            Severity::Unknown => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
            Severity::Unknown => "UNKNOWN",
        }
    }

    /// Escalation rank among concrete levels. `Unknown` is "not yet determined".
    fn rank(self) -> Option<u8> {
        match self {
            Severity::Ok => Some(0),
            Severity::Warning => Some(1),
            Severity::Critical => Some(2),
            Severity::Unknown => None,
        }
    }

    /// Combines the current level with a newly determined one.
    ///
    /// `Unknown` never overrides anything and is replaced by any concrete level.
    /// Between concrete levels the more severe one wins, so the result never
    /// de-escalates.
    pub fn escalate(self, next: Severity) -> Severity {
        match (self.rank(), next.rank()) {
            (_, None) => self,
            (None, Some(_)) => next,
            (Some(cur), Some(new)) if new > cur => next,
            _ => self,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One performance data tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerfData {
    pub label: String,
    pub value: u64,
    pub warning: u64,
    pub critical: u64,
}

impl fmt::Display for PerfData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}'={};{};{};0;",
            self.label, self.value, self.warning, self.critical
        )
    }
}

/// Outcome of a check run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub status: Severity,
    pub message: String,
    pub perfdata: Vec<PerfData>,
}

impl Default for CheckResult {
    fn default() -> Self {
        Self {
            status: Severity::Unknown,
            message: "Unknown Status".to_string(),
            perfdata: Vec::new(),
        }
    }
}

impl CheckResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report for a run that failed before any status was determined.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn set_status(&mut self, status: Severity) {
        self.status = self.status.escalate(status);
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub fn add_perfdata(&mut self, label: impl Into<String>, value: u64, warning: u64, critical: u64) {
        self.perfdata.push(PerfData {
            label: label.into(),
            value,
            warning,
            critical,
        });
    }

    pub fn exit_code(&self) -> i32 {
        self.status.exit_code()
    }

    /// Renders the single report line.
    pub fn render(&self) -> String {
        let mut out = format!("{} - {}", self.status, self.message);
        if !self.perfdata.is_empty() {
            out.push('|');
            for p in &self.perfdata {
                out.push(' ');
                out.push_str(&p.to_string());
            }
        }
        out
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Queries/sec thresholds. Zero disables a threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Thresholds {
    pub warning: u64,
    pub critical: u64,
}

impl Thresholds {
    pub fn new(warning: u64, critical: u64) -> Self {
        Self { warning, critical }
    }

    pub fn severity(&self, queries_per_sec: u64) -> Severity {
        if self.critical > 0 && queries_per_sec >= self.critical {
            Severity::Critical
        } else if self.warning > 0 && queries_per_sec >= self.warning {
            Severity::Warning
        } else {
            Severity::Unknown
        }
    }
}

/// Options that shape evaluation of a sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalOptions {
    pub thresholds: Thresholds,
    pub skip_security: bool,
    pub perfdata: bool,
}

/// Maps the server's security-status code to a severity and message.
pub fn security_status(code: u64) -> (Severity, String) {
    match code {
        0 => (Severity::Critical, "NXDOMAIN or resolution failure.".to_string()),
        1 => (Severity::Ok, "PowerDNS running.".to_string()),
        2 => (Severity::Warning, "PowerDNS upgrade recommended.".to_string()),
        3 => (Severity::Critical, "PowerDNS upgrade mandatory.".to_string()),
        other => (
            Severity::Critical,
            format!("PowerDNS unexpected security-status {}.", other),
        ),
    }
}

/// Evaluates a fresh sample and its rates into a report.
pub fn evaluate(
    snapshot: &Snapshot,
    report: &RateReport,
    watchlist: &Watchlist,
    options: &EvalOptions,
) -> CheckResult {
    let mut result = CheckResult::new();

    let security = match snapshot.get(&watchlist.security) {
        Some(code) if !options.skip_security => {
            let (severity, message) = security_status(code);
            debug!("security-status {} -> {}", code, severity);
            result.set_status(severity);
            Some(message)
        }
        _ => None,
    };

    let t = options.thresholds;
    result.set_status(t.severity(report.queries_per_sec));

    // Nothing fired: the server is up and below thresholds.
    result.set_status(Severity::Ok);

    let queries = format!("Queries: {}/s.", report.queries_per_sec);
    match security {
        Some(s) => result.set_message(format!("{} {}", s, queries)),
        None => result.set_message(queries),
    }

    if options.perfdata {
        for (label, &value) in &report.rates {
            result.add_perfdata(label.as_str(), value, t.warning, t.critical);
        }
    }

    result
}
