//! The custody capability consumed by the escrow engine.

use tradevault_types::{AccountId, Amount, AssetId, CustodyError};

/// One leg of a payout batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payout {
    pub to: AccountId,
    pub amount: Amount,
}

impl Payout {
    #[must_use]
    pub fn new(to: AccountId, amount: Amount) -> Self {
        Self { to, amount }
    }
}

/// Moves assets into and out of the engine's custody.
///
/// Implementations must be all-or-nothing: a failed call leaves every
/// balance exactly as it was. `pay_out` may run arbitrary external code
/// (hooks on the receiving side), so callers must have committed their own
/// state before invoking it.
pub trait Custody {
    /// Pull `amount` of `asset` from `from` into custody.
    fn lock(&mut self, asset: &AssetId, from: AccountId, amount: Amount)
    -> Result<(), CustodyError>;

    /// Pay every leg in `payouts` out of custody, atomically.
    fn pay_out(&mut self, asset: &AssetId, payouts: &[Payout]) -> Result<(), CustodyError>;

    /// Amount of `asset` currently held in custody.
    fn held(&self, asset: &AssetId) -> Amount;
}

/// Sum of a payout batch, or `None` on overflow.
#[must_use]
pub fn batch_total(payouts: &[Payout]) -> Option<Amount> {
    payouts
        .iter()
        .try_fold(0, |acc: Amount, leg| acc.checked_add(leg.amount))
}
