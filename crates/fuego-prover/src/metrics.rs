//! Prometheus metrics for the gateway, cache and assembler
//!
//! Labels are limited to method names and outcomes; transaction hashes never
//! become label values.

use metrics::{counter, histogram};
use std::time::Duration;

use fuego_core::ProofError;

pub const CACHE_TRANSACTIONS: &str = "transactions";
pub const CACHE_BLOCKS: &str = "blocks";

pub const RESULT_HIT: &str = "hit";
pub const RESULT_MISS: &str = "miss";

pub const OUTCOME_OK: &str = "ok";

fn outcome<T>(result: &Result<T, ProofError>) -> &'static str {
    match result {
        Ok(_) => OUTCOME_OK,
        Err(e) => e.kind(),
    }
}

pub fn record_rpc<T>(method: &str, result: &Result<T, ProofError>, duration: Duration) {
    let outcome = outcome(result);
    counter!("rpc_requests_total", "method" => method.to_string(), "outcome" => outcome).increment(1);
    histogram!("rpc_request_duration_seconds", "method" => method.to_string())
        .record(duration.as_secs_f64());
}

pub fn record_cache_lookup(cache: &'static str, hit: bool) {
    let result = if hit { RESULT_HIT } else { RESULT_MISS };
    counter!("cache_lookups_total", "cache" => cache, "result" => result).increment(1);
}

pub fn record_cache_evictions(cache: &'static str, evicted: usize) {
    counter!("cache_evictions_total", "cache" => cache).increment(evicted as u64);
}

pub fn record_merkle_retry() {
    counter!("merkle_retries_total").increment(1);
}
