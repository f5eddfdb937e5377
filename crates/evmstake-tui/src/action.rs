//! Actions for state updates.

use alloy::primitives::Address;
use evmstake_chain::{StakingCall, UnbondingUpdate};
use evmstake_core::{ConnectionStatus, StakingSnapshot, TxEvent, WalletSession};

/// Messages into the UI loop, from key handling and background tasks.
///
/// `Refresh`, `Submit` and `Quit` are also routed to the chain task by the
/// main loop before the app sees them.
#[derive(Debug)]
pub enum Action {
    /// Update RPC connection status.
    UpdateConnectionStatus(ConnectionStatus),
    /// Account the staking view acts for.
    SetSession(WalletSession),
    /// Fresh on-chain reads for `validator`.
    SetSnapshot {
        validator: Address,
        snapshot: Box<StakingSnapshot>,
    },
    /// Refetch the snapshot of the open validator.
    Refresh,
    /// The user approved the signature prompt for this call.
    Submit(StakingCall),
    /// Progress of the submitted transaction.
    Tx(TxEvent),
    /// Result of an unbonding fetch.
    Unbonding(UnbondingUpdate),
    Quit,
}
