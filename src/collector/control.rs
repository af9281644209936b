//! Statistics from the local control socket via `pdns_control`.
//!
//! Runs `pdns_control [--socket-dir=DIR] [--config-name=NAME] show *`, which
//! prints every counter as comma-separated `name=value` pairs.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use super::traits::{CollectError, StatsSource};
use crate::storage::model::{Snapshot, Watchlist};

/// Default control utility shipped with the authoritative server.
pub const DEFAULT_CONTROL_TOOL: &str = "pdns_control";

static COUNTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z0-9-]+)=(\d+)$").expect("counter pattern is valid")
});

/// Parses `show *` output into watched counters.
///
/// Entries that do not look like `name=value`, or whose value does not fit a
/// u64, are skipped.
pub fn parse_show_output(output: &str, watchlist: &Watchlist) -> BTreeMap<String, u64> {
    let mut counters = BTreeMap::new();
    for entry in output.split(',') {
        let entry = entry.trim();
        let Some(caps) = COUNTER_RE.captures(entry) else {
            if !entry.is_empty() {
                trace!("skipping entry {:?}", entry);
            }
            continue;
        };
        let name = &caps[1];
        if !watchlist.is_watched(name) {
            continue;
        }
        if let Ok(value) = caps[2].parse::<u64>() {
            counters.insert(name.to_string(), value);
        }
    }
    counters
}

/// Source backed by the control utility.
pub struct ControlSource {
    tool: PathBuf,
    socket_dir: Option<PathBuf>,
    config_name: Option<String>,
}

impl ControlSource {
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        Self {
            tool: tool.into(),
            socket_dir: None,
            config_name: None,
        }
    }

    /// Directory where the control socket lives.
    pub fn with_socket_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.socket_dir = Some(dir.into());
        self
    }

    /// Name of the virtual configuration to query.
    pub fn with_config_name(mut self, name: impl Into<String>) -> Self {
        self.config_name = Some(name.into());
        self
    }

    /// Arguments passed to the control tool.
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(dir) = &self.socket_dir {
            args.push(format!("--socket-dir={}", dir.display()));
        }
        if let Some(name) = &self.config_name {
            args.push(format!("--config-name={}", name));
        }
        args.push("show".to_string());
        args.push("*".to_string());
        args
    }

    fn tool_name(&self) -> String {
        self.tool.display().to_string()
    }
}

impl Default for ControlSource {
    fn default() -> Self {
        Self::new(DEFAULT_CONTROL_TOOL)
    }
}

impl StatsSource for ControlSource {
    fn name(&self) -> &str {
        "control socket"
    }

    fn collect(&mut self, watchlist: &Watchlist) -> Result<Snapshot, CollectError> {
        let args = self.args();
        debug!("running {} {}", self.tool.display(), args.join(" "));

        let output = Command::new(&self.tool)
            .args(&args)
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => CollectError::NotFound(self.tool_name()),
                _ => CollectError::Io(format!("{}: {}", self.tool_name(), e)),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let text = format!("{}{}", stdout, stderr).trim().to_string();
            let text = if text.is_empty() {
                format!("{} failed with {}", self.tool_name(), output.status)
            } else {
                text
            };
            return Err(CollectError::CommandFailed(text));
        }

        let counters = parse_show_output(&stdout, watchlist);
        if counters.is_empty() {
            return Err(CollectError::Empty(self.tool_name()));
        }
        debug!("collected {} counters", counters.len());
        Ok(Snapshot::now(counters))
    }
}
