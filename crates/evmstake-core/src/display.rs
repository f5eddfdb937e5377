//! Display types for UI frontends.
//!
//! These types turn raw on-chain values into the strings the staking view
//! shows, so a frontend only has to lay them out.

use serde::{Deserialize, Serialize};

use crate::amount::format_amount_fixed;
use crate::form::FormKind;
use crate::types::{Balance, StakingSnapshot, UnbondingEntry};

/// Fractional digits shown on balance cards.
pub const CARD_PLACES: u8 = 4;

/// The two balance cards above the staking form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StakingOverview {
    /// Estimated tokens delegated by the user ("Your Delegation").
    pub delegated: String,
    /// Spendable wallet balance ("Available Balance").
    pub available: String,
    /// Withdrawal fee attached to undelegation, in gwei.
    pub withdrawal_fee_gwei: String,
    pub has_delegation: bool,
}

impl StakingOverview {
    pub fn from_snapshot(snapshot: &StakingSnapshot, decimals: u8, symbol: &str) -> Self {
        Self {
            delegated: format_balance(snapshot.estimated_tokens(), decimals, symbol),
            available: format_balance(snapshot.wallet_balance, decimals, symbol),
            withdrawal_fee_gwei: snapshot.withdrawal_fee.gwei.to_string(),
            has_delegation: snapshot.has_delegation(),
        }
    }
}

/// `"12.3456 ETH"`, truncated to [`CARD_PLACES`].
pub fn format_balance(value: Balance, decimals: u8, symbol: &str) -> String {
    format!("{} {}", format_amount_fixed(value, decimals, CARD_PLACES), symbol)
}

/// Reference balance the form for `kind` is measured against.
pub fn reference_balance(snapshot: &StakingSnapshot, kind: FormKind) -> Balance {
    match kind {
        FormKind::Stake => snapshot.wallet_balance,
        FormKind::Undelegate => snapshot.estimated_tokens(),
    }
}

/// Label of the submit control.
pub fn confirm_label(kind: FormKind, processing: bool) -> &'static str {
    if processing {
        return "Processing...";
    }
    match kind {
        FormKind::Stake => "Confirm Stake",
        FormKind::Undelegate => "Confirm Undelegate",
    }
}

/// One line in the pending unbonding panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingRow {
    pub amount: String,
    pub completes: String,
    pub completion_block: u64,
    pub transaction_hash: String,
}

impl UnbondingRow {
    pub fn from_entry(entry: &UnbondingEntry, symbol: &str, now: i64) -> Self {
        Self {
            amount: format!("{:.4} {}", entry.amount, symbol),
            completes: format_time_remaining(entry.seconds_remaining(now)),
            completion_block: entry.completion_block,
            transaction_hash: entry.transaction_hash.clone(),
        }
    }
}

/// Relative completion time, e.g. `"in 2d 3h"`, or `"ready"` once due.
pub fn format_time_remaining(seconds: u64) -> String {
    if seconds == 0 {
        return "ready".to_string();
    }
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;

    if days > 0 {
        format!("in {}d {}h", days, hours)
    } else if hours > 0 {
        format!("in {}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("in {}m", minutes)
    } else {
        "in <1m".to_string()
    }
}

/// Shorten a hex string to `0x1234…abcd`.
pub fn short_hex(value: &str) -> String {
    if value.chars().count() <= 14 {
        return value.to_string();
    }
    let head: String = value.chars().take(6).collect();
    let tail = value
        .char_indices()
        .rev()
        .nth(3)
        .map_or(value, |(start, _)| &value[start..]);
    format!("{}…{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Delegation, ValidatorPool, WithdrawalFee};
    use alloy_primitives::{Address, U256};

    const ONE: u128 = 1_000_000_000_000_000_000;

    fn snapshot() -> StakingSnapshot {
        StakingSnapshot {
            pool: ValidatorPool::new(U256::from(10 * ONE), U256::from(8 * ONE)),
            delegation: Delegation {
                owner: Address::ZERO,
                shares: U256::from(4 * ONE),
            },
            withdrawal_fee: WithdrawalFee::from_gwei(U256::from(250u32)),
            wallet_balance: U256::from(1_234_567_890_000_000_000u128),
        }
    }

    #[test]
    fn test_overview_from_snapshot() {
        let overview = StakingOverview::from_snapshot(&snapshot(), 18, "MON");
        assert_eq!(overview.delegated, "5.0000 MON");
        assert_eq!(overview.available, "1.2345 MON");
        assert_eq!(overview.withdrawal_fee_gwei, "250");
        assert!(overview.has_delegation);
    }

    #[test]
    fn test_overview_empty_snapshot() {
        let overview = StakingOverview::from_snapshot(&StakingSnapshot::default(), 18, "ETH");
        assert_eq!(overview.delegated, "0.0000 ETH");
        assert!(!overview.has_delegation);
    }

    #[test]
    fn test_reference_balance_per_tab() {
        let s = snapshot();
        assert_eq!(reference_balance(&s, FormKind::Stake), s.wallet_balance);
        assert_eq!(reference_balance(&s, FormKind::Undelegate), U256::from(5 * ONE));
    }

    #[test]
    fn test_confirm_label() {
        assert_eq!(confirm_label(FormKind::Stake, false), "Confirm Stake");
        assert_eq!(confirm_label(FormKind::Undelegate, false), "Confirm Undelegate");
        assert_eq!(confirm_label(FormKind::Stake, true), "Processing...");
    }

    #[test]
    fn test_format_time_remaining() {
        assert_eq!(format_time_remaining(0), "ready");
        assert_eq!(format_time_remaining(30), "in <1m");
        assert_eq!(format_time_remaining(90), "in 1m");
        assert_eq!(format_time_remaining(3 * 3_600 + 5 * 60), "in 3h 5m");
        assert_eq!(format_time_remaining(2 * 86_400 + 7_200), "in 2d 2h");
    }

    #[test]
    fn test_unbonding_row() {
        let entry = UnbondingEntry {
            transaction_hash: "0xabc".to_string(),
            amount: 1.5,
            completion_block: 99,
            completion_timestamp: 1_000 + 3_600,
        };
        let row = UnbondingRow::from_entry(&entry, "MON", 1_000);
        assert_eq!(row.amount, "1.5000 MON");
        assert_eq!(row.completes, "in 1h 0m");
        assert_eq!(row.completion_block, 99);
    }

    #[test]
    fn test_short_hex() {
        assert_eq!(short_hex("0x1234"), "0x1234");
        assert_eq!(
            short_hex("0x1234567890abcdef1234567890abcdef12345678"),
            "0x1234…5678"
        );
    }

    #[test]
    fn test_short_hex_non_ascii() {
        assert_eq!(short_hex("0x123é56789abcdef0123"), "0x123é…0123");
        assert_eq!(short_hex("0x1234567890abcdéf"), "0x1234…cdéf");
        assert_eq!(short_hex("ééééééééééééééé"), "éééééé…éééé");
    }

    #[test]
    fn test_unbonding_row_with_non_ascii_hash() {
        let json = r#"{"transactionHash":"0x123é56789abcdef0123","amount":"1","unbondingCompletionBlock":5,"unbondingCompletionTimestamp":0}"#;
        let entry: UnbondingEntry = serde_json::from_str(json).unwrap();
        assert_eq!(short_hex(&entry.transaction_hash), "0x123é…0123");
    }
}
