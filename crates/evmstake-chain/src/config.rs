//! Endpoint helpers and timeouts for chain and indexer access.

use std::time::Duration;

/// Timeout for a single indexer API request.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Upper bound on waiting for a transaction receipt.
pub const RECEIPT_TIMEOUT: Duration = Duration::from_secs(180);

/// Pending unbonding entries of `address` on the indexer at `api_base`.
pub fn unbonding_url(api_base: &str, address: &str) -> String {
    format!(
        "{}/delegators/{}/unbonding_delegations",
        api_base.trim_end_matches('/'),
        address
    )
}
