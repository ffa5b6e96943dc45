//! # tradevault-engine
//!
//! Operator-brokered escrow engine for the **TradeVault** settlement system.
//!
//! An escrow holds one asset in custody while the two parties settle a
//! payment off-system. Trusted operators broker trades and release funds,
//! the owner administers the engine and arbitrates disputes, and depositors
//! can always get their funds back through cancellation or expiry.
//!
//! - [`EscrowEngine`]: lifecycle, administration and queries
//! - [`EscrowStore`]: sequential id allocation and record storage
//! - [`OperatorRegistry`]: the set of trusted operators
//! - [`EventJournal`]: append-only, hash-chained event log
//! - [`Clock`]: time source ([`SystemClock`], or [`ManualClock`] for tests)
//! - [`SharedEscrowEngine`]: mutex-guarded handle for multi-threaded callers
//!
//! ## Escrow Lifecycle
//!
//! ```text
//!              ┌── release (operator) ─────────────────────┐
//!              ├── claim after expiry (depositor) ─────────┤
//!              │                                           ▼
//! create ──▶ PENDING ── dispute ──▶ DISPUTED ── resolve ──▶ COMPLETED
//!              │       (depositor)             (owner)
//!              └── cancel (SELL depositor or operator) ──▶ CANCELLED
//! ```
//!
//! COMPLETED and CANCELLED are terminal.

pub mod clock;
pub mod dispute;
pub mod engine;
pub mod expiry;
pub mod journal;
pub mod registry;
pub mod shared;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::EscrowEngine;
pub use journal::{EventJournal, GENESIS_HASH, JournalEntry};
pub use registry::OperatorRegistry;
pub use shared::SharedEscrowEngine;
pub use store::EscrowStore;
