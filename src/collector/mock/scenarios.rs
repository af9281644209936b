//! Pre-built server states.

use super::source::MockSource;

/// `show *` output of an authoritative server that has not answered anything yet.
const IDLE_SERVER: &str = "\
corrupt-packets=0,deferred-cache-inserts=0,deferred-cache-lookup=0,dnsupdate-answers=0,\
dnsupdate-changes=0,dnsupdate-queries=0,dnsupdate-refused=0,latency=0,packetcache-hit=0,\
packetcache-miss=0,packetcache-size=0,qsize-q=0,query-cache-hit=0,query-cache-miss=0,rd-queries=0,\
recursing-answers=0,recursing-questions=0,recursion-unanswered=0,security-status=1,\
servfail-packets=0,tcp-answers=0,tcp-queries=0,timedout-packets=0,udp-answers=0,udp-answers-bytes=0,\
udp-do-queries=0,udp-queries=0,udp4-answers=0,udp4-queries=0,udp6-answers=0,udp6-queries=0,";

impl MockSource {
    /// Idle server with a healthy security status.
    pub fn idle_server() -> Self {
        Self::from_output(IDLE_SERVER)
    }

    /// Server reporting the given security-status code and query counters.
    pub fn server_with(security_status: u64, udp4: u64, udp6: u64, tcp: u64) -> Self {
        Self::from_counters([
            ("security-status", security_status),
            ("udp4-queries", udp4),
            ("udp6-queries", udp6),
            ("tcp-queries", tcp),
        ])
    }
}
