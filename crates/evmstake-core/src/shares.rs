//! Conversion between pool shares and the tokens backing them.
//!
//! All quantities are integer sub-units of the native asset. Products are
//! taken in 512-bit width so that `a * b / c` is exact for any 256-bit
//! operands; results always round down.

use alloy_primitives::{U256, U512};

/// Tokens backing `user_shares` in a pool holding `total_tokens` for
/// `total_shares`.
///
/// Returns zero for an empty share pool.
pub fn tokens_for_shares(total_tokens: U256, total_shares: U256, user_shares: U256) -> U256 {
    if total_shares.is_zero() {
        return U256::ZERO;
    }
    mul_div_floor(total_tokens, user_shares, total_shares)
}

/// Shares to burn in order to withdraw `desired_tokens`.
///
/// Returns zero when the pool holds no tokens.
pub fn shares_for_tokens(total_tokens: U256, total_shares: U256, desired_tokens: U256) -> U256 {
    if total_tokens.is_zero() {
        return U256::ZERO;
    }
    mul_div_floor(desired_tokens, total_shares, total_tokens)
}

/// `floor(a * b / denominator)`, saturating at `U256::MAX`.
///
/// `denominator` must be non-zero.
fn mul_div_floor(a: U256, b: U256, denominator: U256) -> U256 {
    let product = U512::from(a) * U512::from(b);
    let quotient = product / U512::from(denominator);
    U256::saturating_from(quotient)
}
