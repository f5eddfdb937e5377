//! Chain reads behind a small trait so views can be fed from fakes.

pub mod account;
pub mod validator;

use crate::EvmClient;
use crate::error::ChainError;
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use evmstake_core::{Delegation, StakingSnapshot, ValidatorPool, WalletSession, WithdrawalFee};

/// Everything the staking view reads from chain.
#[async_trait]
pub trait ValidatorReader: Send + Sync {
    async fn delegation(&self, validator: Address, delegator: Address)
    -> Result<Delegation, ChainError>;
    async fn total_tokens(&self, validator: Address) -> Result<U256, ChainError>;
    async fn total_shares(&self, validator: Address) -> Result<U256, ChainError>;
    async fn withdrawal_fee_gwei(&self, validator: Address) -> Result<U256, ChainError>;
    async fn balance(&self, account: Address) -> Result<U256, ChainError>;
}

#[async_trait]
impl ValidatorReader for EvmClient {
    async fn delegation(
        &self,
        validator: Address,
        delegator: Address,
    ) -> Result<Delegation, ChainError> {
        self.get_delegation(validator, delegator).await
    }

    async fn total_tokens(&self, validator: Address) -> Result<U256, ChainError> {
        self.get_total_tokens(validator).await
    }

    async fn total_shares(&self, validator: Address) -> Result<U256, ChainError> {
        self.get_total_shares(validator).await
    }

    async fn withdrawal_fee_gwei(&self, validator: Address) -> Result<U256, ChainError> {
        self.get_withdrawal_fee_gwei(validator).await
    }

    async fn balance(&self, account: Address) -> Result<U256, ChainError> {
        self.get_balance(account).await
    }
}

/// Read the full snapshot for `validator` and the session's account.
///
/// Reads run concurrently. A failed read is logged and left at zero; the
/// account-specific reads are skipped when no wallet is connected.
pub async fn fetch_snapshot<R>(
    reader: &R,
    validator: Address,
    session: &WalletSession,
) -> StakingSnapshot
where
    R: ValidatorReader + ?Sized,
{
    let account = session.address;

    let delegation = async {
        match account {
            Some(delegator) => or_default(
                "delegation",
                validator,
                reader.delegation(validator, delegator).await,
            ),
            None => Delegation::default(),
        }
    };
    let balance = async {
        match account {
            Some(account) => or_default("balance", validator, reader.balance(account).await),
            None => U256::ZERO,
        }
    };
    let tokens = async {
        or_default("tokens", validator, reader.total_tokens(validator).await)
    };
    let shares = async {
        or_default(
            "delegatorShares",
            validator,
            reader.total_shares(validator).await,
        )
    };
    let fee = async {
        or_default(
            "withdrawalFeeInGwei",
            validator,
            reader.withdrawal_fee_gwei(validator).await,
        )
    };

    let (delegation, wallet_balance, total_tokens, total_shares, fee_gwei) =
        futures::join!(delegation, balance, tokens, shares, fee);

    tracing::debug!(
        "Snapshot for {}: tokens={}, shares={}, user_shares={}, balance={}",
        validator,
        total_tokens,
        total_shares,
        delegation.shares,
        wallet_balance
    );

    StakingSnapshot {
        pool: ValidatorPool::new(total_tokens, total_shares),
        delegation,
        withdrawal_fee: WithdrawalFee::from_gwei(fee_gwei),
        wallet_balance,
    }
}

fn or_default<T: Default>(what: &str, validator: Address, result: Result<T, ChainError>) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!("Failed to read {} for {}: {}", what, validator, e);
        T::default()
    })
}


#[cfg(test)]
mod tests {
    use super::fake::FakeReader;
    use super::*;

    fn validator() -> Address {
        Address::repeat_byte(0xAA)
    }

    fn user() -> Address {
        Address::repeat_byte(0x01)
    }

    #[tokio::test]
    async fn test_fetch_snapshot_all_reads() {
        let reader = FakeReader {
            delegation: Some(Delegation {
                owner: user(),
                shares: U256::from(250u32),
            }),
            total_tokens: Some(U256::from(1000u32)),
            total_shares: Some(U256::from(500u32)),
            fee_gwei: Some(U256::from(3u32)),
            balance: Some(U256::from(42u32)),
            ..Default::default()
        };
        let snapshot = fetch_snapshot(&reader, validator(), &WalletSession::new(user())).await;
        assert_eq!(snapshot.estimated_tokens(), U256::from(500u32));
        assert_eq!(snapshot.wallet_balance, U256::from(42u32));
        assert_eq!(snapshot.withdrawal_fee.to_wei(), U256::from(3_000_000_000u64));
    }

    #[tokio::test]
    async fn test_failed_reads_default_to_zero() {
        let reader = FakeReader {
            total_tokens: Some(U256::from(1000u32)),
            ..Default::default()
        };
        let snapshot = fetch_snapshot(&reader, validator(), &WalletSession::new(user())).await;
        assert_eq!(snapshot.pool.total_tokens, U256::from(1000u32));
        assert_eq!(snapshot.pool.total_shares, U256::ZERO);
        assert_eq!(snapshot.delegation, Delegation::default());
        assert_eq!(snapshot.estimated_tokens(), U256::ZERO);
    }

    #[tokio::test]
    async fn test_disconnected_skips_account_reads() {
        let reader = FakeReader::default();
        let snapshot = fetch_snapshot(&reader, validator(), &WalletSession::disconnected()).await;
        assert_eq!(snapshot, StakingSnapshot::default());

        let calls = reader.calls.lock().unwrap();
        assert!(!calls.contains(&"delegation"));
        assert!(!calls.contains(&"balance"));
        assert_eq!(calls.len(), 3);
    }
}
