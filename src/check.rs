//! One complete check run.
//!
//! ```text
//! StatsSource ─► Snapshot ─┬─► compute_rates(prior, new) ─► evaluate ─► CheckResult
//!                          │          ▲
//!                          └─► Baseline (sample file or shifted copy)
//! ```
//!
//! Collection failures and sample write failures end the run early with an
//! UNKNOWN result carrying the error text. A missing or unreadable prior sample
//! is not an error: the new sample is used as its own prior, which yields zero
//! rates.

use tracing::{debug, error, info};

use crate::collector::StatsSource;
use crate::rates::compute_rates;
use crate::status::{CheckResult, EvalOptions, evaluate};
use crate::storage::model::{Snapshot, Watchlist};
use crate::storage::SampleStore;

/// Where the prior sample of a run comes from.
#[derive(Debug, Clone)]
pub enum Baseline {
    /// Load the prior sample from the store and replace it with the new one.
    Persisted(SampleStore),
    /// Use the new sample shifted back by the given seconds. Nothing is stored.
    Shifted(i64),
}

/// Runs a check and returns the report to print.
pub fn run_check(
    source: &mut dyn StatsSource,
    baseline: &Baseline,
    watchlist: &Watchlist,
    options: &EvalOptions,
) -> CheckResult {
    let current = match source.collect(watchlist) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!("collection from {} failed: {}", source.name(), e);
            return CheckResult::unknown(e.to_string());
        }
    };
    debug!(
        "collected {} counters from {} at epoch {}",
        current.len(),
        source.name(),
        current.epoch
    );

    let prior = match prior_sample(&current, baseline) {
        Ok(prior) => prior,
        Err(result) => return result,
    };

    let report = compute_rates(&prior, &current, watchlist);
    if report.is_empty() {
        debug!("no rates between epoch {} and {}", prior.epoch, current.epoch);
    }
    info!(
        "interval {}s, {} rates, {} queries/s",
        current.epoch - prior.epoch,
        report.rates.len(),
        report.queries_per_sec
    );

    evaluate(&current, &report, watchlist, options)
}

fn prior_sample(current: &Snapshot, baseline: &Baseline) -> Result<Snapshot, CheckResult> {
    match baseline {
        Baseline::Shifted(secs) => Ok(current.shifted(*secs)),
        Baseline::Persisted(store) => {
            let prior = store.load().filter(|s| !s.is_empty()).unwrap_or_else(|| {
                info!("no prior sample, rates start on the next run");
                current.clone()
            });
            if let Err(e) = store.save(current) {
                error!("failed to save sample: {}", e);
                return Err(CheckResult::unknown(format!(
                    "Unable to save sample to {}: {}",
                    store.path().display(),
                    e
                )));
            }
            Ok(prior)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{CollectError, MockSource};
    use crate::status::{Severity, Thresholds};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    struct FailingSource(CollectError);

    impl StatsSource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        fn collect(&mut self, _watchlist: &Watchlist) -> Result<Snapshot, CollectError> {
            Err(self.0.clone())
        }
    }

    fn warning_at(qps: u64) -> EvalOptions {
        EvalOptions {
            thresholds: Thresholds::new(qps, 0),
            ..EvalOptions::default()
        }
    }

    #[test]
    fn idle_test_mode_reports_ok() {
        let mut src = MockSource::idle_server();
        let r = run_check(
            &mut src,
            &Baseline::Shifted(1),
            &Watchlist::default(),
            &EvalOptions::default(),
        );
        assert_eq!(r.render(), "OK - PowerDNS running. Queries: 0/s.");
        assert_eq!(r.exit_code(), 0);
    }

    #[test]
    fn idle_test_mode_perfdata_lists_every_averaged_counter() {
        let wl = Watchlist::default();
        let mut src = MockSource::idle_server();
        let opts = EvalOptions {
            perfdata: true,
            ..EvalOptions::default()
        };
        let r = run_check(&mut src, &Baseline::Shifted(1), &wl, &opts);
        assert_eq!(r.perfdata.len(), wl.averaged.len());
        assert!(r.render().contains(" 'packetcache-hit'=0;0;0;0;"));
    }

    #[test]
    fn query_rate_over_warning_threshold() {
        let dir = tempdir().unwrap();
        let store = SampleStore::new(dir.path(), "");
        store
            .save(&Snapshot::new(
                1000,
                BTreeMap::from([
                    ("udp4-queries".to_string(), 100),
                    ("security-status".to_string(), 1),
                ]),
            ))
            .unwrap();

        let mut src = MockSource::from_counters([("udp4-queries", 160), ("security-status", 1)])
            .at_epoch(1001);
        let r = run_check(
            &mut src,
            &Baseline::Persisted(store.clone()),
            &Watchlist::default(),
            &warning_at(50),
        );
        assert_eq!(r.message, "PowerDNS running. Queries: 60/s.");
        assert_eq!(r.status, Severity::Warning);
        assert_eq!(r.exit_code(), 1);

        // The new sample replaced the old one.
        assert_eq!(store.load().map(|s| s.epoch), Some(1001));
    }

    #[test]
    fn mandatory_upgrade_is_critical_regardless_of_rate() {
        let mut src = MockSource::server_with(3, 0, 0, 0);
        let opts = EvalOptions {
            thresholds: Thresholds::new(1000, 2000),
            ..EvalOptions::default()
        };
        let r = run_check(&mut src, &Baseline::Shifted(1), &Watchlist::default(), &opts);
        assert!(r.message.contains("upgrade mandatory"));
        assert_eq!(r.exit_code(), 2);
    }

    #[test]
    fn first_run_writes_sample_and_reports_zero() {
        let dir = tempdir().unwrap();
        let store = SampleStore::new(dir.path(), "ns1");
        assert!(!store.path().exists());

        let mut src = MockSource::server_with(2, 5000, 0, 0).at_epoch(2000);
        let r = run_check(
            &mut src,
            &Baseline::Persisted(store.clone()),
            &Watchlist::default(),
            &warning_at(1),
        );
        assert_eq!(r.message, "PowerDNS upgrade recommended. Queries: 0/s.");
        assert_eq!(r.exit_code(), 1);
        assert_eq!(
            store.load().and_then(|s| s.get("udp4-queries")),
            Some(5000)
        );
    }

    #[test]
    fn counter_reset_reports_zero() {
        let dir = tempdir().unwrap();
        let store = SampleStore::new(dir.path(), "");
        store
            .save(&Snapshot::new(
                100,
                BTreeMap::from([("udp4-queries".to_string(), 9000)]),
            ))
            .unwrap();

        let mut src = MockSource::server_with(1, 10, 0, 0).at_epoch(110);
        let r = run_check(
            &mut src,
            &Baseline::Persisted(store),
            &Watchlist::default(),
            &warning_at(1),
        );
        assert_eq!(r.render(), "OK - PowerDNS running. Queries: 0/s.");
    }

    #[test]
    fn collection_failure_is_unknown() {
        let mut src = FailingSource(CollectError::Auth(
            "http://127.0.0.1:8081/api/v1/servers/localhost/statistics".to_string(),
        ));
        let r = run_check(
            &mut src,
            &Baseline::Shifted(1),
            &Watchlist::default(),
            &EvalOptions::default(),
        );
        assert_eq!(r.status, Severity::Unknown);
        assert_eq!(r.exit_code(), 3);
        assert!(r.message.starts_with("Authentication failed"));
        assert!(r.perfdata.is_empty());
    }

    #[test]
    fn collection_failure_leaves_sample_untouched() {
        let dir = tempdir().unwrap();
        let store = SampleStore::new(dir.path(), "");
        let mut src = FailingSource(CollectError::NotFound("pdns_control".to_string()));
        let r = run_check(
            &mut src,
            &Baseline::Persisted(store.clone()),
            &Watchlist::default(),
            &EvalOptions::default(),
        );
        assert_eq!(r.render(), "UNKNOWN - Control command 'pdns_control' not found.");
        assert!(!store.path().exists());
    }

    #[test]
    fn unwritable_store_is_unknown() {
        let dir = tempdir().unwrap();
        let store = SampleStore::new(dir.path().join("missing"), "");
        let mut src = MockSource::idle_server();
        let r = run_check(
            &mut src,
            &Baseline::Persisted(store),
            &Watchlist::default(),
            &EvalOptions::default(),
        );
        assert_eq!(r.status, Severity::Unknown);
        assert!(r.message.starts_with("Unable to save sample to"));
    }

    #[test]
    fn empty_prior_sample_counts_as_first_run() {
        let dir = tempdir().unwrap();
        let store = SampleStore::new(dir.path(), "");
        store.save(&Snapshot::new(100, BTreeMap::new())).unwrap();

        let mut src = MockSource::server_with(1, 500, 0, 0).at_epoch(101);
        let r = run_check(
            &mut src,
            &Baseline::Persisted(store.clone()),
            &Watchlist::default(),
            &warning_at(1),
        );
        assert_eq!(r.render(), "OK - PowerDNS running. Queries: 0/s.");
        assert_eq!(store.load().and_then(|s| s.get("udp4-queries")), Some(500));
    }
}
