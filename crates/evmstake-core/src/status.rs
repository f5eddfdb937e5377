//! Transaction lifecycle and the status line derived from it.
//!
//! A view owns one [`TxLifecycle`] and one [`StatusBoard`]. Every phase change
//! is fed to the board, which turns it into a user-facing [`StatusMessage`]
//! and arms the settle-refresh and auto-clear deadlines. Deadlines are plain
//! [`Instant`]s polled from the UI tick, so nothing outlives the view.

use std::time::{Duration, Instant};

use alloy_primitives::TxHash;
use thiserror::Error;

use crate::types::StakingAction;

/// Delay after confirmation before snapshots are refetched.
pub const SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Delay after a failure before the status line is cleared.
pub const STATUS_CLEAR_DELAY: Duration = Duration::from_secs(5);

pub const MSG_SENT: &str = "Transaction sent, waiting for confirmation...";
pub const MSG_CONFIRMED: &str = "Transaction successful! Data will refresh shortly.";
pub const MSG_REJECTED: &str = "Transaction rejected by user.";
pub const MSG_FAILED: &str = "Transaction failed.";

/// Why a transaction ended without confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    UserRejected,
    Other(String),
}

impl FailureReason {
    /// Classify a raw signer / provider error message.
    pub fn from_message(message: &str) -> Self {
        if is_user_rejection(message) {
            FailureReason::UserRejected
        } else {
            FailureReason::Other(message.to_string())
        }
    }
}

/// True if an error message reports the signer declining the request.
pub fn is_user_rejection(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("user rejected") || lower.contains("user denied")
}

/// Phase of the single active transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TxPhase {
    #[default]
    Idle,
    AwaitingSignature(StakingAction),
    Confirming(TxHash),
    Confirmed(TxHash),
    Failed(FailureReason),
}

impl TxPhase {
    pub fn name(&self) -> &'static str {
        match self {
            TxPhase::Idle => "idle",
            TxPhase::AwaitingSignature(_) => "awaiting signature",
            TxPhase::Confirming(_) => "confirming",
            TxPhase::Confirmed(_) => "confirmed",
            TxPhase::Failed(_) => "failed",
        }
    }
}

/// Events reported by whatever submits the transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxEvent {
    Broadcast(TxHash),
    Confirmed,
    Failed(FailureReason),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("a transaction is already in progress ({0})")]
    Busy(&'static str),
    #[error("cannot {event} while {phase}")]
    InvalidTransition {
        event: &'static str,
        phase: &'static str,
    },
}

/// `Idle -> AwaitingSignature -> Confirming -> Confirmed | Failed`.
///
/// `AwaitingSignature` may also go straight to `Failed` (rejection or a
/// submission error). `Confirmed` and `Failed` are terminal until the next
/// [`TxLifecycle::begin`].
#[derive(Debug, Clone, Default)]
pub struct TxLifecycle {
    phase: TxPhase,
}

impl TxLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &TxPhase {
        &self.phase
    }

    /// A transaction is waiting on the signer or on the chain.
    pub fn is_active(&self) -> bool {
        matches!(
            self.phase,
            TxPhase::AwaitingSignature(_) | TxPhase::Confirming(_)
        )
    }

    pub fn tx_hash(&self) -> Option<TxHash> {
        match self.phase {
            TxPhase::Confirming(hash) | TxPhase::Confirmed(hash) => Some(hash),
            _ => None,
        }
    }

    /// Start a new transaction. Allowed from any non-active phase.
    pub fn begin(&mut self, action: StakingAction) -> Result<&TxPhase, LifecycleError> {
        if self.is_active() {
            return Err(LifecycleError::Busy(self.phase.name()));
        }
        self.phase = TxPhase::AwaitingSignature(action);
        Ok(&self.phase)
    }

    /// Apply a submission event.
    pub fn apply(&mut self, event: TxEvent) -> Result<&TxPhase, LifecycleError> {
        let next = match (&self.phase, event) {
            (TxPhase::AwaitingSignature(_), TxEvent::Broadcast(hash)) => TxPhase::Confirming(hash),
            (TxPhase::AwaitingSignature(_), TxEvent::Failed(reason)) => TxPhase::Failed(reason),
            (TxPhase::Confirming(hash), TxEvent::Confirmed) => TxPhase::Confirmed(*hash),
            (TxPhase::Confirming(_), TxEvent::Failed(reason)) => TxPhase::Failed(reason),
            (phase, event) => {
                return Err(LifecycleError::InvalidTransition {
                    event: match event {
                        TxEvent::Broadcast(_) => "broadcast",
                        TxEvent::Confirmed => "confirm",
                        TxEvent::Failed(_) => "fail",
                    },
                    phase: phase.name(),
                });
            }
        };
        self.phase = next;
        Ok(&self.phase)
    }

    pub fn reset(&mut self) {
        self.phase = TxPhase::Idle;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusKind {
    #[default]
    None,
    Info,
    Success,
    Error,
}

/// What a host view renders in its status line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusMessage {
    pub message: String,
    pub kind: StatusKind,
    pub tx_hash: Option<TxHash>,
}

impl StatusMessage {
    pub fn new(message: impl Into<String>, kind: StatusKind) -> Self {
        Self {
            message: message.into(),
            kind,
            tx_hash: None,
        }
    }

    pub fn with_hash(mut self, hash: TxHash) -> Self {
        self.tx_hash = Some(hash);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.message.is_empty()
    }
}

/// Side effects the owning view must carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEffect {
    /// Clear amount and percentage inputs on every form.
    ClearInputs,
    /// Refetch delegation and balance snapshots.
    Refetch,
}

/// Status line plus its pending deadlines.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    status: StatusMessage,
    clear_at: Option<Instant>,
    refetch_at: Option<Instant>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &StatusMessage {
        &self.status
    }

    /// Replace the status line, cancelling a pending auto-clear.
    pub fn set(&mut self, status: StatusMessage) {
        self.status = status;
        self.clear_at = None;
    }

    /// Drop the status line and every pending deadline.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn refetch_pending(&self) -> bool {
        self.refetch_at.is_some()
    }

    /// React to a lifecycle phase entered at `now`.
    pub fn observe(&mut self, phase: &TxPhase, now: Instant) -> Option<StatusEffect> {
        match phase {
            TxPhase::Idle => None,
            TxPhase::AwaitingSignature(action) => {
                self.set(StatusMessage::new(action.signature_prompt(), StatusKind::Info));
                None
            }
            TxPhase::Confirming(hash) => {
                self.set(StatusMessage::new(MSG_SENT, StatusKind::Info).with_hash(*hash));
                None
            }
            TxPhase::Confirmed(hash) => {
                self.set(StatusMessage::new(MSG_CONFIRMED, StatusKind::Success).with_hash(*hash));
                self.refetch_at = Some(now + SETTLE_DELAY);
                Some(StatusEffect::ClearInputs)
            }
            TxPhase::Failed(reason) => {
                let message = match reason {
                    FailureReason::UserRejected => MSG_REJECTED,
                    FailureReason::Other(_) => MSG_FAILED,
                };
                self.set(StatusMessage::new(message, StatusKind::Error));
                self.clear_at = Some(now + STATUS_CLEAR_DELAY);
                None
            }
        }
    }

    /// Fire any deadline that has passed by `now`.
    pub fn tick(&mut self, now: Instant) -> Option<StatusEffect> {
        if self.clear_at.is_some_and(|at| now >= at) {
            self.status = StatusMessage::default();
            self.clear_at = None;
        }
        if self.refetch_at.is_some_and(|at| now >= at) {
            self.refetch_at = None;
            return Some(StatusEffect::Refetch);
        }
        None
    }
}
