//! Core domain types for validator delegation.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Deserializer, Serialize};

use crate::shares::tokens_for_shares;

/// Amount in the smallest sub-unit of the native asset (wei).
pub type Balance = U256;

/// Native asset decimals used by EVM chains.
pub const NATIVE_DECIMALS: u8 = 18;

/// Wei per gwei.
pub const WEI_PER_GWEI: u64 = 1_000_000_000;

/// A delegator's position in a validator pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Delegation {
    pub owner: Address,
    /// Opaque accounting shares, not a token amount.
    pub shares: U256,
}

/// Pool totals of a validator.
///
/// An empty pool (`total_shares == 0`) converts to zero in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidatorPool {
    pub total_tokens: U256,
    pub total_shares: U256,
}

impl ValidatorPool {
    pub fn new(total_tokens: U256, total_shares: U256) -> Self {
        Self {
            total_tokens,
            total_shares,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_shares.is_zero()
    }

    /// Tokens backing `shares` in this pool.
    pub fn tokens_for_shares(&self, shares: U256) -> U256 {
        tokens_for_shares(self.total_tokens, self.total_shares, shares)
    }

    /// Shares to burn in order to withdraw `tokens` from this pool.
    pub fn shares_for_tokens(&self, tokens: U256) -> U256 {
        crate::shares::shares_for_tokens(self.total_tokens, self.total_shares, tokens)
    }
}

/// Withdrawal fee charged on undelegation, denominated in gwei.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WithdrawalFee {
    pub gwei: U256,
}

impl WithdrawalFee {
    pub fn from_gwei(gwei: U256) -> Self {
        Self { gwei }
    }

    /// Fee converted to the native value sub-unit.
    pub fn to_wei(&self) -> U256 {
        self.gwei.saturating_mul(U256::from(WEI_PER_GWEI))
    }
}

/// Everything read from chain for one (validator, delegator) pair.
///
/// Reads that failed are left at their zero default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StakingSnapshot {
    pub pool: ValidatorPool,
    pub delegation: Delegation,
    pub withdrawal_fee: WithdrawalFee,
    /// Spendable wallet balance of the delegator.
    pub wallet_balance: Balance,
}

impl StakingSnapshot {
    /// Estimated tokens currently delegated by the user.
    pub fn estimated_tokens(&self) -> Balance {
        self.pool.tokens_for_shares(self.delegation.shares)
    }

    pub fn has_delegation(&self) -> bool {
        !self.delegation.shares.is_zero()
    }
}

/// A validator the user can delegate to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// Staking contract address of the validator.
    pub address: String,
    /// Human-readable name.
    #[serde(default)]
    pub moniker: Option<String>,
    /// Registered operator address, allowed to withdraw commission.
    #[serde(default)]
    pub owner_address: Option<String>,
}

impl Validator {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            moniker: None,
            owner_address: None,
        }
    }

    /// Parsed contract address, if well formed.
    pub fn contract_address(&self) -> Option<Address> {
        self.address.parse().ok()
    }

    /// Returns the moniker or a truncated address if no moniker is set.
    pub fn display_name(&self) -> &str {
        self.moniker.as_deref().unwrap_or_else(|| {
            match self.address.char_indices().nth(12) {
                Some((end, _)) => &self.address[..end],
                None => &self.address,
            }
        })
    }
}

/// A chain deployment the UI can talk to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub chain_id: Option<u64>,
    pub rpc_url: String,
    /// Base URL of the indexer API serving unbonding entries.
    #[serde(default)]
    pub api_url: Option<String>,
    /// Base URL of the block explorer.
    #[serde(default)]
    pub explorer_url: Option<String>,
    pub native_symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    #[serde(default)]
    pub validators: Vec<Validator>,
}

fn default_decimals() -> u8 {
    NATIVE_DECIMALS
}

impl Project {
    /// Explorer page for a transaction, if an explorer is configured.
    pub fn explorer_tx_url(&self, tx_hash: &str) -> Option<String> {
        self.explorer_url
            .as_deref()
            .map(|base| explorer_tx_url(base, tx_hash))
    }
}

/// Build `{explorer}/tx/{hash}`, tolerating a trailing slash on the base.
pub fn explorer_tx_url(explorer_base: &str, tx_hash: &str) -> String {
    format!("{}/tx/{}", explorer_base.trim_end_matches('/'), tx_hash)
}

/// An in-progress unbonding returned by the indexer API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnbondingEntry {
    pub transaction_hash: String,
    /// Decimal amount in whole native units.
    #[serde(deserialize_with = "number_or_string")]
    pub amount: f64,
    #[serde(rename = "unbondingCompletionBlock")]
    pub completion_block: u64,
    /// Unix seconds.
    #[serde(rename = "unbondingCompletionTimestamp")]
    pub completion_timestamp: i64,
}

impl UnbondingEntry {
    /// Seconds until completion relative to `now` (unix seconds), zero when done.
    pub fn seconds_remaining(&self, now: i64) -> u64 {
        self.completion_timestamp.saturating_sub(now).max(0) as u64
    }

    pub fn is_complete(&self, now: i64) -> bool {
        self.completion_timestamp <= now
    }
}

fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// RPC connection state reported to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected { chain_id: u64, block: u64 },
    Error(String),
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected { .. })
    }
}

/// Which staking call a transaction performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StakingAction {
    Delegate,
    Undelegate,
    WithdrawCommission,
}

impl StakingAction {
    pub fn label(&self) -> &'static str {
        match self {
            StakingAction::Delegate => "Delegate",
            StakingAction::Undelegate => "Undelegate",
            StakingAction::WithdrawCommission => "Withdraw Commission",
        }
    }

    /// Status text shown while the signer is asked for approval.
    pub fn signature_prompt(&self) -> &'static str {
        match self {
            StakingAction::Delegate => "Please confirm in your wallet...",
            StakingAction::Undelegate => "Confirming undelegation...",
            StakingAction::WithdrawCommission => "Confirming commission withdrawal...",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wei(n: u128) -> U256 {
        U256::from(n)
    }

    #[test]
    fn test_snapshot_estimated_tokens() {
        let snapshot = StakingSnapshot {
            pool: ValidatorPool::new(wei(1000), wei(500)),
            delegation: Delegation {
                owner: Address::ZERO,
                shares: wei(250),
            },
            ..Default::default()
        };
        assert_eq!(snapshot.estimated_tokens(), wei(500));
        assert!(snapshot.has_delegation());
    }

    #[test]
    fn test_snapshot_default_is_empty() {
        let snapshot = StakingSnapshot::default();
        assert_eq!(snapshot.estimated_tokens(), U256::ZERO);
        assert!(!snapshot.has_delegation());
        assert!(snapshot.pool.is_empty());
    }

    #[test]
    fn test_withdrawal_fee_to_wei() {
        let fee = WithdrawalFee::from_gwei(wei(7));
        assert_eq!(fee.to_wei(), wei(7_000_000_000));
        assert_eq!(WithdrawalFee::default().to_wei(), U256::ZERO);
    }

    #[test]
    fn test_validator_display_name() {
        let mut v = Validator::new("0x1234567890abcdef1234567890abcdef12345678");
        assert_eq!(v.display_name(), "0x1234567890");
        v.moniker = Some("Nebula".to_string());
        assert_eq!(v.display_name(), "Nebula");
    }

    #[test]
    fn test_validator_display_name_non_ascii() {
        let v = Validator::new("0x123456789\u{e9}0abcdef");
        assert_eq!(v.display_name(), "0x123456789\u{e9}");
        let short = Validator::new("0xé");
        assert_eq!(short.display_name(), "0xé");
    }

    #[test]
    fn test_validator_contract_address() {
        let v = Validator::new("0x1234567890abcdef1234567890abcdef12345678");
        assert!(v.contract_address().is_some());
        assert!(Validator::new("not-an-address").contract_address().is_none());
    }

    #[test]
    fn test_explorer_tx_url() {
        assert_eq!(
            explorer_tx_url("https://scan.example.org", "0xabc"),
            "https://scan.example.org/tx/0xabc"
        );
        assert_eq!(
            explorer_tx_url("https://scan.example.org/", "0xabc"),
            "https://scan.example.org/tx/0xabc"
        );
    }

    #[test]
    fn test_project_explorer_tx_url_missing() {
        let project = Project {
            name: "local".to_string(),
            chain_id: None,
            rpc_url: "http://localhost:8545".to_string(),
            api_url: None,
            explorer_url: None,
            native_symbol: "ETH".to_string(),
            decimals: 18,
            validators: Vec::new(),
        };
        assert!(project.explorer_tx_url("0xabc").is_none());
    }

    #[test]
    fn test_unbonding_entry_deserialize_number_amount() {
        let json = r#"{
            "transactionHash": "0xdead",
            "amount": 1.25,
            "unbondingCompletionBlock": 1200,
            "unbondingCompletionTimestamp": 1700000000
        }"#;
        let entry: UnbondingEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.transaction_hash, "0xdead");
        assert_eq!(entry.amount, 1.25);
        assert_eq!(entry.completion_block, 1200);
        assert_eq!(entry.completion_timestamp, 1_700_000_000);
    }

    #[test]
    fn test_unbonding_entry_deserialize_string_amount() {
        let json = r#"{
            "transactionHash": "0xbeef",
            "amount": "0.5",
            "unbondingCompletionBlock": 1,
            "unbondingCompletionTimestamp": 2
        }"#;
        let entry: UnbondingEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.amount, 0.5);
    }

    #[test]
    fn test_unbonding_entry_remaining() {
        let entry = UnbondingEntry {
            transaction_hash: "0x1".to_string(),
            amount: 1.0,
            completion_block: 10,
            completion_timestamp: 1_000,
        };
        assert_eq!(entry.seconds_remaining(400), 600);
        assert_eq!(entry.seconds_remaining(2_000), 0);
        assert!(!entry.is_complete(999));
        assert!(entry.is_complete(1_000));
    }

    #[test]
    fn test_staking_action_prompts_differ() {
        assert_ne!(
            StakingAction::Delegate.signature_prompt(),
            StakingAction::Undelegate.signature_prompt()
        );
        assert_eq!(StakingAction::WithdrawCommission.label(), "Withdraw Commission");
    }
}
