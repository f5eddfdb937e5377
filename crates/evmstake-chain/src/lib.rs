pub mod client;
pub mod config;
pub mod contract;
pub mod error;
pub mod queries;
pub mod transactions;
pub mod unbonding;

pub use client::*;
pub use config::*;
pub use error::*;
pub use queries::{ValidatorReader, fetch_snapshot};
pub use transactions::{
    StakingCall, TransactionSender, drive_transaction, plan_delegate, plan_undelegate,
    plan_withdraw_commission,
};
pub use unbonding::{
    HttpUnbondingSource, UnbondingQuery, UnbondingSource, UnbondingTracker, UnbondingUpdate,
    fetch_unbonding, spawn_unbonding_watcher,
};
