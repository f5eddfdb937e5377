//! Connected wallet state.

use alloy_primitives::Address;

use crate::types::Validator;

/// The connected account, if any, and the chain it is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WalletSession {
    pub address: Option<Address>,
    pub chain_id: Option<u64>,
}

impl WalletSession {
    pub fn new(address: Address) -> Self {
        Self {
            address: Some(address),
            chain_id: None,
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    /// Lower-case hex of the connected address, as used in API paths.
    pub fn address_hex(&self) -> Option<String> {
        self.address.map(|a| a.to_string().to_lowercase())
    }

    /// Whether the connected account is the validator's registered owner.
    ///
    /// Compared case-insensitively on the textual address so that checksummed
    /// and lower-case spellings match.
    pub fn is_owner_of(&self, validator: &Validator) -> bool {
        match (self.address_hex(), validator.owner_address.as_deref()) {
            (Some(ours), Some(owner)) => ours.eq_ignore_ascii_case(owner.trim()),
            _ => false,
        }
    }
}
