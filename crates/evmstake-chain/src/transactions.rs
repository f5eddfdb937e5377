//! Planning and submitting staking transactions.
//!
//! A [`StakingCall`] is planned from the form amount, the wallet session and
//! the latest snapshot, then handed to a [`TransactionSender`].
//! [`drive_transaction`] reports progress as [`TxEvent`]s that the owning view
//! feeds into its `TxLifecycle`.

use crate::EvmClient;
use crate::config::RECEIPT_TIMEOUT;
use crate::error::ChainError;
use alloy::network::ReceiptResponse;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{PendingTransactionBuilder, Provider};
use async_trait::async_trait;
use evmstake_core::{
    FailureReason, NATIVE_DECIMALS, StakingAction, StakingSnapshot, TxEvent, Validator,
    WalletSession, format_amount,
};
use tokio::sync::mpsc;

/// A fully-specified call against a validator contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StakingCall {
    Delegate {
        validator: Address,
        delegator: Address,
        value: U256,
    },
    Undelegate {
        validator: Address,
        withdrawal_address: Address,
        shares: U256,
        /// Withdrawal fee, in wei.
        value: U256,
    },
    WithdrawCommission {
        validator: Address,
        withdrawal_address: Address,
    },
}

impl StakingCall {
    pub fn action(&self) -> StakingAction {
        match self {
            StakingCall::Delegate { .. } => StakingAction::Delegate,
            StakingCall::Undelegate { .. } => StakingAction::Undelegate,
            StakingCall::WithdrawCommission { .. } => StakingAction::WithdrawCommission,
        }
    }

    pub fn validator(&self) -> Address {
        match self {
            StakingCall::Delegate { validator, .. }
            | StakingCall::Undelegate { validator, .. }
            | StakingCall::WithdrawCommission { validator, .. } => *validator,
        }
    }

    /// Native value attached to the transaction.
    pub fn value(&self) -> U256 {
        match self {
            StakingCall::Delegate { value, .. } | StakingCall::Undelegate { value, .. } => *value,
            StakingCall::WithdrawCommission { .. } => U256::ZERO,
        }
    }

    /// One-line summary for the confirmation prompt.
    pub fn describe(&self, symbol: &str) -> String {
        match self {
            StakingCall::Delegate { validator, value, .. } => format!(
                "Delegate {} {} to {}",
                format_amount(*value, NATIVE_DECIMALS),
                symbol,
                validator
            ),
            StakingCall::Undelegate {
                validator,
                shares,
                value,
                ..
            } => format!(
                "Undelegate {} shares from {} (fee {} {})",
                shares,
                validator,
                format_amount(*value, NATIVE_DECIMALS),
                symbol
            ),
            StakingCall::WithdrawCommission { validator, .. } => {
                format!("Withdraw commission from {}", validator)
            }
        }
    }
}

/// Delegate `amount` wei to `validator` on behalf of the connected account.
pub fn plan_delegate(
    session: &WalletSession,
    validator: Address,
    amount: U256,
) -> Result<StakingCall, ChainError> {
    let delegator = session.address.ok_or(ChainError::NotConnected)?;
    if amount.is_zero() {
        return Err(ChainError::InvalidData("Amount must be positive".to_string()));
    }
    Ok(StakingCall::Delegate {
        validator,
        delegator,
        value: amount,
    })
}

/// Undelegate tokens worth `amount` wei, converted to shares at the
/// snapshot's pool ratio. The withdrawal fee is attached as value.
pub fn plan_undelegate(
    session: &WalletSession,
    validator: Address,
    snapshot: &StakingSnapshot,
    amount: U256,
) -> Result<StakingCall, ChainError> {
    let withdrawal_address = session.address.ok_or(ChainError::NotConnected)?;
    if amount.is_zero() {
        return Err(ChainError::InvalidData("Amount must be positive".to_string()));
    }
    let shares = snapshot.pool.shares_for_tokens(amount);
    Ok(StakingCall::Undelegate {
        validator,
        withdrawal_address,
        shares,
        value: snapshot.withdrawal_fee.to_wei(),
    })
}

/// Withdraw accrued commission; only the validator owner may do this.
pub fn plan_withdraw_commission(
    session: &WalletSession,
    validator: &Validator,
) -> Result<StakingCall, ChainError> {
    let withdrawal_address = session.address.ok_or(ChainError::NotConnected)?;
    if !session.is_owner_of(validator) {
        return Err(ChainError::NotOwner);
    }
    let contract = validator.contract_address().ok_or_else(|| {
        ChainError::InvalidData(format!("Invalid validator address: {}", validator.address))
    })?;
    Ok(StakingCall::WithdrawCommission {
        validator: contract,
        withdrawal_address,
    })
}

/// Broadcasts planned calls and waits for their receipts.
#[async_trait]
pub trait TransactionSender: Send + Sync {
    /// Sign and broadcast `call`.
    async fn send(&self, call: &StakingCall) -> Result<TxHash, ChainError>;

    /// Wait until `hash` is mined; reverted transactions are errors.
    async fn wait_for_confirmation(&self, hash: TxHash) -> Result<(), ChainError>;
}

#[async_trait]
impl TransactionSender for EvmClient {
    async fn send(&self, call: &StakingCall) -> Result<TxHash, ChainError> {
        if !self.can_sign() {
            return Err(ChainError::NoSigner);
        }
        let contract = self.validator_contract(call.validator());
        let pending = match call {
            StakingCall::Delegate {
                delegator, value, ..
            } => contract.delegate(*delegator).value(*value).send().await?,
            StakingCall::Undelegate {
                withdrawal_address,
                shares,
                value,
                ..
            } => {
                contract
                    .undelegate(*withdrawal_address, *shares)
                    .value(*value)
                    .send()
                    .await?
            }
            StakingCall::WithdrawCommission {
                withdrawal_address, ..
            } => contract.withdrawCommission(*withdrawal_address).send().await?,
        };
        let hash = *pending.tx_hash();
        tracing::info!("Broadcast {} as {}", call.action().label(), hash);
        Ok(hash)
    }

    async fn wait_for_confirmation(&self, hash: TxHash) -> Result<(), ChainError> {
        let receipt = PendingTransactionBuilder::new(self.provider().root().clone(), hash)
            .with_timeout(Some(RECEIPT_TIMEOUT))
            .get_receipt()
            .await?;
        if !receipt.status() {
            return Err(ChainError::Reverted(format!(
                "{} reverted in block {:?}",
                hash,
                receipt.block_number()
            )));
        }
        tracing::info!("Confirmed {} in block {:?}", hash, receipt.block_number());
        Ok(())
    }
}

/// Submit `call` and report its progress on `events`.
///
/// Emits `Broadcast` then `Confirmed`, or `Failed` at whichever step fails.
/// Returns the transaction hash once broadcast.
pub async fn drive_transaction<S>(
    sender: &S,
    call: &StakingCall,
    events: &mpsc::Sender<TxEvent>,
) -> Option<TxHash>
where
    S: TransactionSender + ?Sized,
{
    let hash = match sender.send(call).await {
        Ok(hash) => hash,
        Err(e) => {
            tracing::warn!("{} failed before broadcast: {}", call.action().label(), e);
            let _ = events
                .send(TxEvent::Failed(FailureReason::from_message(&e.to_string())))
                .await;
            return None;
        }
    };
    let _ = events.send(TxEvent::Broadcast(hash)).await;

    match sender.wait_for_confirmation(hash).await {
        Ok(()) => {
            let _ = events.send(TxEvent::Confirmed).await;
        }
        Err(e) => {
            tracing::warn!("Transaction {} failed: {}", hash, e);
            let _ = events
                .send(TxEvent::Failed(FailureReason::from_message(&e.to_string())))
                .await;
        }
    }
    Some(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use evmstake_core::{Delegation, TxLifecycle, TxPhase, ValidatorPool, WithdrawalFee};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    const ONE: u128 = 1_000_000_000_000_000_000;

    fn user() -> Address {
        Address::repeat_byte(0x01)
    }

    fn validator_addr() -> Address {
        Address::repeat_byte(0xAA)
    }

    fn snapshot() -> StakingSnapshot {
        StakingSnapshot {
            pool: ValidatorPool::new(U256::from(1000u32), U256::from(500u32)),
            delegation: Delegation {
                owner: user(),
                shares: U256::from(250u32),
            },
            withdrawal_fee: WithdrawalFee::from_gwei(U256::from(5u32)),
            wallet_balance: U256::from(ONE),
        }
    }

    #[test]
    fn test_plan_delegate() {
        let call = plan_delegate(&WalletSession::new(user()), validator_addr(), U256::from(ONE))
            .unwrap();
        assert_eq!(
            call,
            StakingCall::Delegate {
                validator: validator_addr(),
                delegator: user(),
                value: U256::from(ONE),
            }
        );
        assert_eq!(call.action(), StakingAction::Delegate);
        assert_eq!(call.value(), U256::from(ONE));
    }

    #[test]
    fn test_plan_requires_connection_and_amount() {
        let disconnected = WalletSession::disconnected();
        assert!(matches!(
            plan_delegate(&disconnected, validator_addr(), U256::from(1u8)),
            Err(ChainError::NotConnected)
        ));
        assert!(matches!(
            plan_delegate(&WalletSession::new(user()), validator_addr(), U256::ZERO),
            Err(ChainError::InvalidData(_))
        ));
    }

    #[test]
    fn test_plan_undelegate_converts_to_shares_and_attaches_fee() {
        let call = plan_undelegate(
            &WalletSession::new(user()),
            validator_addr(),
            &snapshot(),
            U256::from(500u32),
        )
        .unwrap();
        assert_eq!(
            call,
            StakingCall::Undelegate {
                validator: validator_addr(),
                withdrawal_address: user(),
                shares: U256::from(250u32),
                value: U256::from(5_000_000_000u64),
            }
        );
    }

    #[test]
    fn test_plan_undelegate_empty_pool_gives_zero_shares() {
        let call = plan_undelegate(
            &WalletSession::new(user()),
            validator_addr(),
            &StakingSnapshot::default(),
            U256::from(10u32),
        )
        .unwrap();
        let StakingCall::Undelegate { shares, value, .. } = call else {
            panic!("expected undelegate");
        };
        assert_eq!(shares, U256::ZERO);
        assert_eq!(value, U256::ZERO);
    }

    #[test]
    fn test_plan_withdraw_commission_owner_only() {
        let owner = "0x52908400098527886E0F7030069857D2E4169EE7";
        let validator = Validator {
            address: format!("{}", validator_addr()),
            moniker: Some("Nebula".to_string()),
            owner_address: Some(owner.to_lowercase()),
        };

        let session = WalletSession::new(owner.parse().unwrap());
        let call = plan_withdraw_commission(&session, &validator).unwrap();
        assert_eq!(call.value(), U256::ZERO);
        assert_eq!(call.validator(), validator_addr());

        assert!(matches!(
            plan_withdraw_commission(&WalletSession::new(user()), &validator),
            Err(ChainError::NotOwner)
        ));
    }

    #[test]
    fn test_describe() {
        let call = plan_delegate(
            &WalletSession::new(user()),
            validator_addr(),
            U256::from(ONE * 3 / 2),
        )
        .unwrap();
        assert!(call.describe("MON").starts_with("Delegate 1.5 MON to 0x"));
    }

    enum Outcome {
        Ok,
        SendFails(&'static str),
        ConfirmFails(&'static str),
    }

    struct FakeSender {
        outcome: Outcome,
        sent: Mutex<Vec<StakingCall>>,
    }

    impl FakeSender {
        fn new(outcome: Outcome) -> Self {
            Self {
                outcome,
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TransactionSender for FakeSender {
        async fn send(&self, call: &StakingCall) -> Result<TxHash, ChainError> {
            if let Outcome::SendFails(msg) = self.outcome {
                return Err(ChainError::Rpc(msg.to_string()));
            }
            self.sent.lock().unwrap().push(call.clone());
            Ok(TxHash::repeat_byte(0x42))
        }

        async fn wait_for_confirmation(&self, _hash: TxHash) -> Result<(), ChainError> {
            match self.outcome {
                Outcome::ConfirmFails(msg) => Err(ChainError::Reverted(msg.to_string())),
                _ => Ok(()),
            }
        }
    }

    async fn collect(outcome: Outcome) -> (Option<TxHash>, Vec<TxEvent>) {
        let sender = FakeSender::new(outcome);
        let call = plan_delegate(&WalletSession::new(user()), validator_addr(), U256::from(1u8))
            .unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        let hash = drive_transaction(&sender, &call, &tx).await;
        drop(tx);
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        (hash, events)
    }

    #[tokio::test]
    async fn test_drive_transaction_success() {
        let (hash, events) = collect(Outcome::Ok).await;
        let hash = hash.unwrap();
        assert_eq!(events, vec![TxEvent::Broadcast(hash), TxEvent::Confirmed]);

        let mut lifecycle = TxLifecycle::new();
        lifecycle.begin(StakingAction::Delegate).unwrap();
        for event in events {
            lifecycle.apply(event).unwrap();
        }
        assert_eq!(lifecycle.phase(), &TxPhase::Confirmed(hash));
    }

    #[tokio::test]
    async fn test_drive_transaction_user_rejection() {
        let (hash, events) = collect(Outcome::SendFails("User rejected the request.")).await;
        assert!(hash.is_none());
        assert_eq!(events, vec![TxEvent::Failed(FailureReason::UserRejected)]);
    }

    #[tokio::test]
    async fn test_drive_transaction_revert() {
        let (hash, events) = collect(Outcome::ConfirmFails("execution reverted")).await;
        assert!(hash.is_some());
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[1],
            TxEvent::Failed(FailureReason::Other(msg)) if msg.contains("execution reverted")
        ));
    }
}
