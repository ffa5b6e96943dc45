//! # tradevault-custody
//!
//! **Custody Plane**: the asset-movement capability the escrow engine
//! consumes, plus an in-memory ledger implementation.
//!
//! ## Architecture
//!
//! 1. **Custody**: trait with `lock` (pull into custody) and `pay_out`
//!    (one atomic batch of legs out of custody)
//! 2. **Ledger**: per-(account, asset) balances, allowances granted to the
//!    engine, and the engine's own custody holdings
//! 3. **SupplyConservation**: checks that balances plus custody always equal
//!    what was minted minus what was burned
//!
//! ## Flow
//!
//! ```text
//! create  → Custody.lock(depositor → custody)
//! settle  → Custody.pay_out([recipient: net, collector: fee])
//! refund  → Custody.pay_out([depositor: amount])
//! ```

pub mod custody;
pub mod ledger;
pub mod supply_conservation;

pub use custody::{Custody, Payout};
pub use ledger::Ledger;
pub use supply_conservation::SupplyConservation;
