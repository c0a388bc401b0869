//! Confirmation depth and finality

use serde::{Deserialize, Serialize};

/// Default confirmation depth treated as final
pub const DEFAULT_FINALITY_THRESHOLD: u64 = 10;

/// Blocks mined on top of `tx_block_height`, never negative
pub fn confirmations(tx_block_height: u64, chain_height: u64) -> u64 {
    chain_height.saturating_sub(tx_block_height)
}

pub fn is_final(confirmations: u64, threshold: u64) -> bool {
    confirmations >= threshold
}

/// Finality threshold carried through the pipeline.
///
/// Packages always carry the raw count; the threshold is only advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationPolicy {
    threshold: u64,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_FINALITY_THRESHOLD)
    }
}

impl ConfirmationPolicy {
    pub fn new(threshold: u64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn confirmations(&self, tx_block_height: u64, chain_height: u64) -> u64 {
        confirmations(tx_block_height, chain_height)
    }

    pub fn is_final(&self, confirmations: u64) -> bool {
        is_final(confirmations, self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_height_100_block_90() {
        let policy = ConfirmationPolicy::new(10);
        let c = policy.confirmations(90, 100);
        assert_eq!(c, 10);
        assert!(policy.is_final(c));
        assert!(!policy.is_final(9));
    }

    #[test]
    fn test_stale_chain_height_clamps_to_zero() {
        assert_eq!(confirmations(120, 100), 0);
        assert_eq!(confirmations(100, 100), 0);
    }

    #[test]
    fn test_monotonic_in_chain_height() {
        for block in [0u64, 5, 90, 1_000] {
            let mut last = 0;
            for height in 0..1_200u64 {
                let c = confirmations(block, height);
                assert!(c >= last);
                last = c;
            }
        }
    }

    #[test]
    fn test_zero_threshold_is_always_final() {
        assert!(is_final(0, 0));
    }
}
