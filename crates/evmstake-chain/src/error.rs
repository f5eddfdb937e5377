//! Error types for chain operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Failed to connect to chain: {0}")]
    Connection(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Contract call failed: {0}")]
    Contract(#[from] alloy::contract::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] alloy::transports::TransportError),

    #[error("Receipt wait failed: {0}")]
    Receipt(#[from] alloy::providers::PendingTransactionError),

    #[error("Transaction reverted: {0}")]
    Reverted(String),

    #[error("No signer configured; running read-only")]
    NoSigner,

    #[error("Not the validator owner")]
    NotOwner,

    #[error("No wallet connected")]
    NotConnected,

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },
}
