//! check_pdns_auth - Monitoring plugin for the PowerDNS authoritative server.
//!
//! Prints a single status line and exits with the monitoring-plugin code
//! (0 OK, 1 WARNING, 2 CRITICAL, 3 UNKNOWN).
//!
//! Usage:
//!   check_pdns_auth -w 500 -c 1000 -p           # via pdns_control
//!   check_pdns_auth -n ns2 -S /run/pdns-ns2     # virtual configuration
//!   check_pdns_auth -A -k SECRET -w 500         # via HTTP API
//!   check_pdns_auth -T                          # canned data

use std::io::IsTerminal;

use clap::Parser;
use clap::error::ErrorKind;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use pdnscheck::check::run_check;
use pdnscheck::config::Args;
use pdnscheck::status::CheckResult;
use pdnscheck::storage::Watchlist;

/// Initializes the tracing subscriber on stderr; stdout carries only the report.
/// Silent unless `-v` is given or `RUST_LOG` is set. `RUST_LOG` takes precedence.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_directives()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn report(result: CheckResult) -> ! {
    println!("{}", result.render());
    std::process::exit(result.exit_code());
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let text = e.to_string();
            let first = text.lines().next().unwrap_or("invalid arguments");
            report(CheckResult::unknown(first.trim_start_matches("error: ")));
        }
    };

    init_logging(&args);
    info!("check_pdns_auth {} starting", env!("CARGO_PKG_VERSION"));

    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => report(CheckResult::unknown(format!("Configuration error: {}", e))),
    };
    debug!("mode: {:?}", config.mode);

    let mut source = match config.source() {
        Ok(source) => source,
        Err(e) => report(CheckResult::unknown(e.to_string())),
    };

    let result = run_check(
        source.as_mut(),
        &config.baseline(),
        &Watchlist::default(),
        &config.options,
    );
    report(result);
}
