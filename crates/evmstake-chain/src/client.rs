//! Chain client built on an alloy HTTP provider.
//!
//! With a local signer the client can submit staking transactions; without
//! one it is read-only and every send fails with [`ChainError::NoSigner`].

use crate::contract::ValidatorStaking::{self, ValidatorStakingInstance};
use crate::error::ChainError;
use evmstake_core::{ConnectionStatus, WalletSession};

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use tokio::sync::mpsc;

/// Chain metadata reported right after connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainInfo {
    pub chain_id: u64,
    pub block_number: u64,
}

/// Chain client for a single EVM RPC endpoint.
#[derive(Clone)]
pub struct EvmClient {
    provider: DynProvider,
    signer_address: Option<Address>,
    info: ChainInfo,
}

impl EvmClient {
    /// Connect to `rpc_url`, optionally with a signer for transactions.
    ///
    /// Progress is reported on `status_tx`; a failed connection is reported
    /// there as well as returned.
    pub async fn connect(
        rpc_url: &str,
        signer: Option<PrivateKeySigner>,
        status_tx: mpsc::Sender<ConnectionStatus>,
    ) -> Result<Self, ChainError> {
        let _ = status_tx.send(ConnectionStatus::Connecting).await;
        tracing::info!("Connecting to {}", rpc_url);

        match Self::connect_inner(rpc_url, signer).await {
            Ok(client) => {
                let _ = status_tx
                    .send(ConnectionStatus::Connected {
                        chain_id: client.info.chain_id,
                        block: client.info.block_number,
                    })
                    .await;
                Ok(client)
            }
            Err(e) => {
                tracing::warn!("Failed to connect to {}: {}", rpc_url, e);
                let _ = status_tx.send(ConnectionStatus::Error(e.to_string())).await;
                Err(e)
            }
        }
    }

    async fn connect_inner(
        rpc_url: &str,
        signer: Option<PrivateKeySigner>,
    ) -> Result<Self, ChainError> {
        let signer_address = signer.as_ref().map(|s| s.address());
        let provider = match signer {
            Some(signer) => ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer))
                .connect(rpc_url)
                .await?
                .erased(),
            None => ProviderBuilder::new().connect(rpc_url).await?.erased(),
        };

        let chain_id = provider.get_chain_id().await?;
        let block_number = provider.get_block_number().await?;
        tracing::info!(
            "Connected to chain {} at block {} ({})",
            chain_id,
            block_number,
            if signer_address.is_some() {
                "signing"
            } else {
                "read-only"
            }
        );

        Ok(Self {
            provider,
            signer_address,
            info: ChainInfo {
                chain_id,
                block_number,
            },
        })
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    pub fn can_sign(&self) -> bool {
        self.signer_address.is_some()
    }

    /// Session for the signer, or for `watch` when running read-only.
    pub fn session(&self, watch: Option<Address>) -> WalletSession {
        WalletSession {
            address: self.signer_address.or(watch),
            chain_id: Some(self.info.chain_id),
        }
    }

    /// Contract instance for the validator at `validator`.
    pub(crate) fn validator_contract(
        &self,
        validator: Address,
    ) -> ValidatorStakingInstance<DynProvider> {
        ValidatorStaking::new(validator, self.provider.clone())
    }
}

/// Parse a hex private key into a signer.
pub fn parse_private_key(key: &str) -> Result<PrivateKeySigner, ChainError> {
    key.trim()
        .parse::<PrivateKeySigner>()
        .map_err(|e| ChainError::InvalidData(format!("Invalid private key: {}", e)))
}
