//! Validator contract view calls.

use crate::EvmClient;
use crate::error::ChainError;
use alloy::primitives::{Address, U256};
use evmstake_core::Delegation;

impl EvmClient {
    /// Delegation of `delegator` in the validator pool.
    pub async fn get_delegation(
        &self,
        validator: Address,
        delegator: Address,
    ) -> Result<Delegation, ChainError> {
        let result = self
            .validator_contract(validator)
            .getDelegation(delegator)
            .call()
            .await?;
        Ok(Delegation {
            owner: result._0,
            shares: result._1,
        })
    }

    /// Total tokens held by the validator pool.
    pub async fn get_total_tokens(&self, validator: Address) -> Result<U256, ChainError> {
        Ok(self.validator_contract(validator).tokens().call().await?)
    }

    /// Total shares issued by the validator pool.
    pub async fn get_total_shares(&self, validator: Address) -> Result<U256, ChainError> {
        Ok(self
            .validator_contract(validator)
            .delegatorShares()
            .call()
            .await?)
    }

    /// Fee attached to undelegation, in gwei.
    pub async fn get_withdrawal_fee_gwei(&self, validator: Address) -> Result<U256, ChainError> {
        let fee = self
            .validator_contract(validator)
            .withdrawalFeeInGwei()
            .call()
            .await?;
        Ok(U256::saturating_from(fee))
    }
}
