//! Core domain logic for managing a delegation to an EVM validator.
//!
//! This crate provides:
//! - Share / token conversion (`shares` module)
//! - Exact decimal amounts (`amount` module)
//! - Amount / percentage form state (`form` module)
//! - Transaction lifecycle and status line (`status` module)
//! - Core domain types (`types` module) and wallet session (`session` module)
//! - Display types for UI (`display` module)
//!
//! With the `persistence` feature enabled:
//! - Configuration management (`config` module)

pub mod amount;
pub mod display;
pub mod form;
pub mod session;
pub mod shares;
pub mod status;
pub mod types;

#[cfg(feature = "persistence")]
pub mod config;

pub use amount::*;
pub use display::*;
pub use form::*;
pub use session::*;
pub use shares::*;
pub use status::*;
pub use types::*;

#[cfg(feature = "persistence")]
pub use config::{AppConfig, ConfigError, ThemeConfig};
