//! Supply conservation invariant checker.
//!
//! Invariant enforced by the ledger after every custody movement:
//! ```text
//! ∀ asset: Σ(account balances) + custody == Σ(minted) - Σ(burned)
//! ```
//!
//! Locking, releasing, refunding and fee collection only move value between
//! accounts and custody, so none of them may change the total.

use std::collections::HashMap;

use tradevault_types::{Amount, AssetId, CustodyError};

/// Tracks per-asset issuance and validates that balances add up to it.
#[derive(Debug, Default)]
pub struct SupplyConservation {
    /// Total minted per asset since genesis.
    minted: HashMap<AssetId, Amount>,
    /// Total burned per asset since genesis.
    burned: HashMap<AssetId, Amount>,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_mint(&mut self, asset: &AssetId, amount: Amount) {
        *self.minted.entry(asset.clone()).or_insert(0) += amount;
    }

    pub fn record_burn(&mut self, asset: &AssetId, amount: Amount) {
        *self.burned.entry(asset.clone()).or_insert(0) += amount;
    }

    /// Expected total supply for an asset: minted - burned.
    #[must_use]
    pub fn expected_supply(&self, asset: &AssetId) -> Amount {
        self.total_minted(asset)
            .saturating_sub(self.total_burned(asset))
    }

    /// Compare the actual supply (balances + custody) with the expected one.
    ///
    /// # Errors
    /// Returns [`CustodyError::SupplyInvariantViolation`] if they differ.
    pub fn verify(&self, asset: &AssetId, actual_supply: Amount) -> Result<(), CustodyError> {
        let expected = self.expected_supply(asset);
        if actual_supply != expected {
            return Err(CustodyError::SupplyInvariantViolation {
                reason: format!(
                    "Asset {asset}: actual supply {actual_supply} != expected {expected} \
                     (minted={}, burned={})",
                    self.total_minted(asset),
                    self.total_burned(asset),
                ),
            });
        }
        Ok(())
    }

    /// Every asset that has ever been minted or burned.
    #[must_use]
    pub fn tracked_assets(&self) -> Vec<AssetId> {
        let mut assets: Vec<AssetId> = self
            .minted
            .keys()
            .chain(self.burned.keys())
            .cloned()
            .collect();
        assets.sort();
        assets.dedup();
        assets
    }

    #[must_use]
    pub fn total_minted(&self, asset: &AssetId) -> Amount {
        self.minted.get(asset).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total_burned(&self, asset: &AssetId) -> Amount {
        self.burned.get(asset).copied().unwrap_or(0)
    }
}
