//! # tradevault-types
//!
//! Shared types, errors, and configuration for the **TradeVault** escrow
//! settlement engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`EscrowId`], [`AccountId`], [`AssetId`]
//! - **Escrow model**: [`EscrowRecord`], [`EscrowKind`], [`EscrowStatus`], [`Settlement`]
//! - **Fee model**: [`FeeSplit`], [`compute_fee`]
//! - **Events**: [`EscrowEvent`]
//! - **Configuration**: [`EngineConfig`]
//! - **Errors**: [`EscrowError`] and [`CustodyError`] with `ESC_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod config;
pub mod constants;
pub mod error;
pub mod escrow;
pub mod event;
pub mod fee;
pub mod ids;

pub use config::*;
pub use error::*;
pub use escrow::*;
pub use event::*;
pub use fee::*;
pub use ids::*;

// Constants are accessed via `tradevault_types::constants::FOO`
// (not re-exported to avoid name collisions).
