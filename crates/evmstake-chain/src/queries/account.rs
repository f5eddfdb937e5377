//! Account-related chain queries.

use crate::EvmClient;
use crate::error::ChainError;
use alloy::primitives::{Address, U256};
use alloy::providers::Provider;

impl EvmClient {
    /// Spendable native balance of `account`.
    pub async fn get_balance(&self, account: Address) -> Result<U256, ChainError> {
        Ok(self.provider().get_balance(account).await?)
    }
}
