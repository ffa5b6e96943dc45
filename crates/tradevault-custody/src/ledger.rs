//! In-memory custody ledger.
//!
//! Tracks per-(account, asset) balances, the allowance each account has
//! granted the engine, and what the engine holds in custody. Every mutation
//! is validated in full before any balance is touched, so a failed call
//! leaves the ledger unchanged.

use std::collections::{HashMap, HashSet};

use tradevault_types::{AccountId, Amount, AssetId, CustodyError};

use crate::custody::{Custody, Payout, batch_total};
use crate::supply_conservation::SupplyConservation;

/// Account balances plus the engine's custody holdings for each asset.
#[derive(Debug, Default)]
pub struct Ledger {
    /// Per-(account, asset) spendable balances.
    balances: HashMap<(AccountId, AssetId), Amount>,
    /// Per-(account, asset) amount the engine may pull on `lock`.
    allowances: HashMap<(AccountId, AssetId), Amount>,
    /// Amount of each asset held by the engine.
    custody: HashMap<AssetId, Amount>,
    /// Accounts that refuse incoming transfers.
    blocked: HashSet<AccountId>,
    supply: SupplyConservation,
}

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue new units to `account`.
    pub fn mint(&mut self, account: AccountId, asset: &AssetId, amount: Amount) {
        *self.balances.entry((account, asset.clone())).or_insert(0) += amount;
        self.supply.record_mint(asset, amount);
    }

    /// Destroy units held by `account`.
    ///
    /// # Errors
    /// Returns `InsufficientBalance` if the account holds less than `amount`.
    pub fn burn(
        &mut self,
        account: AccountId,
        asset: &AssetId,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        self.debit(account, asset, amount)?;
        self.supply.record_burn(asset, amount);
        Ok(())
    }

    /// Set how much of `asset` the engine may pull from `account`.
    pub fn approve(&mut self, account: AccountId, asset: &AssetId, amount: Amount) {
        self.allowances.insert((account, asset.clone()), amount);
    }

    /// Refuse (or accept again) transfers into `account`.
    pub fn set_blocked(&mut self, account: AccountId, blocked: bool) {
        if blocked {
            self.blocked.insert(account);
        } else {
            self.blocked.remove(&account);
        }
    }

    #[must_use]
    pub fn balance(&self, account: AccountId, asset: &AssetId) -> Amount {
        self.balances
            .get(&(account, asset.clone()))
            .copied()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn allowance(&self, account: AccountId, asset: &AssetId) -> Amount {
        self.allowances
            .get(&(account, asset.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Account balances plus custody for an asset.
    #[must_use]
    pub fn total_supply(&self, asset: &AssetId) -> Amount {
        self.balances
            .iter()
            .filter(|((_, a), _)| a == asset)
            .map(|(_, amount)| *amount)
            .sum::<Amount>()
            + self.held(asset)
    }

    /// Check the conservation invariant for every asset ever issued.
    ///
    /// # Errors
    /// Returns `SupplyInvariantViolation` naming the first asset that is off.
    pub fn verify_supply(&self) -> Result<(), CustodyError> {
        for asset in self.supply.tracked_assets() {
            self.supply.verify(&asset, self.total_supply(&asset))?;
        }
        Ok(())
    }

    fn debit(
        &mut self,
        account: AccountId,
        asset: &AssetId,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        let available = self.balance(account, asset);
        if available < amount {
            return Err(CustodyError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        self.balances
            .insert((account, asset.clone()), available - amount);
        Ok(())
    }
}

impl Custody for Ledger {
    fn lock(
        &mut self,
        asset: &AssetId,
        from: AccountId,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        let allowed = self.allowance(from, asset);
        if allowed < amount {
            return Err(CustodyError::InsufficientAllowance {
                needed: amount,
                allowed,
            });
        }
        self.debit(from, asset, amount)?;
        self.allowances
            .insert((from, asset.clone()), allowed - amount);
        *self.custody.entry(asset.clone()).or_insert(0) += amount;

        tracing::debug!(%asset, from = %from.short(), amount, "Locked into custody");
        Ok(())
    }

    fn pay_out(&mut self, asset: &AssetId, payouts: &[Payout]) -> Result<(), CustodyError> {
        let total = batch_total(payouts).ok_or(CustodyError::InsufficientCustody)?;
        let held = self.held(asset);
        if held < total {
            return Err(CustodyError::InsufficientCustody);
        }
        if let Some(leg) = payouts
            .iter()
            .find(|leg| leg.amount > 0 && self.blocked.contains(&leg.to))
        {
            return Err(CustodyError::Rejected {
                reason: format!("recipient {} does not accept transfers", leg.to),
            });
        }

        self.custody.insert(asset.clone(), held - total);
        for leg in payouts.iter().filter(|leg| leg.amount > 0) {
            *self.balances.entry((leg.to, asset.clone())).or_insert(0) += leg.amount;
            tracing::debug!(%asset, to = %leg.to.short(), amount = leg.amount, "Paid out of custody");
        }
        Ok(())
    }

    fn held(&self, asset: &AssetId) -> Amount {
        self.custody.get(asset).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usdt() -> AssetId {
        AssetId::from("USDT")
    }

    fn funded(amount: Amount) -> (Ledger, AccountId) {
        let mut ledger = Ledger::new();
        let user = AccountId::new();
        ledger.mint(user, &usdt(), amount);
        (ledger, user)
    }

    #[test]
    fn mint_increases_balance() {
        let (ledger, user) = funded(1_000);
        assert_eq!(ledger.balance(user, &usdt()), 1_000);
        assert_eq!(ledger.total_supply(&usdt()), 1_000);
    }

    #[test]
    fn lock_requires_allowance() {
        let (mut ledger, user) = funded(1_000);
        let err = ledger.lock(&usdt(), user, 400).unwrap_err();
        assert_eq!(
            err,
            CustodyError::InsufficientAllowance {
                needed: 400,
                allowed: 0
            }
        );
        assert_eq!(ledger.balance(user, &usdt()), 1_000);
        assert_eq!(ledger.held(&usdt()), 0);
    }

    #[test]
    fn lock_moves_into_custody_and_spends_allowance() {
        let (mut ledger, user) = funded(1_000);
        ledger.approve(user, &usdt(), 500);
        ledger.lock(&usdt(), user, 400).unwrap();
        assert_eq!(ledger.balance(user, &usdt()), 600);
        assert_eq!(ledger.allowance(user, &usdt()), 100);
        assert_eq!(ledger.held(&usdt()), 400);
        assert!(ledger.verify_supply().is_ok());
    }

    #[test]
    fn lock_insufficient_balance_changes_nothing() {
        let (mut ledger, user) = funded(100);
        ledger.approve(user, &usdt(), 1_000);
        let err = ledger.lock(&usdt(), user, 200).unwrap_err();
        assert!(matches!(err, CustodyError::InsufficientBalance { .. }));
        assert_eq!(ledger.balance(user, &usdt()), 100);
        assert_eq!(ledger.allowance(user, &usdt()), 1_000);
    }

    #[test]
    fn pay_out_batch_distributes_legs() {
        let (mut ledger, user) = funded(1_000_000);
        let recipient = AccountId::new();
        let collector = AccountId::new();
        ledger.approve(user, &usdt(), 1_000_000);
        ledger.lock(&usdt(), user, 1_000_000).unwrap();

        ledger
            .pay_out(
                &usdt(),
                &[
                    Payout::new(recipient, 995_000),
                    Payout::new(collector, 5_000),
                ],
            )
            .unwrap();

        assert_eq!(ledger.balance(recipient, &usdt()), 995_000);
        assert_eq!(ledger.balance(collector, &usdt()), 5_000);
        assert_eq!(ledger.held(&usdt()), 0);
        assert!(ledger.verify_supply().is_ok());
    }

    #[test]
    fn pay_out_more_than_held_fails() {
        let (mut ledger, user) = funded(100);
        ledger.approve(user, &usdt(), 100);
        ledger.lock(&usdt(), user, 100).unwrap();
        let err = ledger
            .pay_out(&usdt(), &[Payout::new(user, 101)])
            .unwrap_err();
        assert_eq!(err, CustodyError::InsufficientCustody);
        assert_eq!(ledger.held(&usdt()), 100);
    }

    #[test]
    fn blocked_recipient_rejects_whole_batch() {
        let (mut ledger, user) = funded(1_000);
        let good = AccountId::new();
        let bad = AccountId::new();
        ledger.approve(user, &usdt(), 1_000);
        ledger.lock(&usdt(), user, 1_000).unwrap();
        ledger.set_blocked(bad, true);

        let err = ledger
            .pay_out(&usdt(), &[Payout::new(good, 900), Payout::new(bad, 100)])
            .unwrap_err();
        assert!(matches!(err, CustodyError::Rejected { .. }));
        assert_eq!(ledger.balance(good, &usdt()), 0);
        assert_eq!(ledger.held(&usdt()), 1_000);

        ledger.set_blocked(bad, false);
        ledger
            .pay_out(&usdt(), &[Payout::new(good, 900), Payout::new(bad, 100)])
            .unwrap();
        assert_eq!(ledger.balance(bad, &usdt()), 100);
    }

    #[test]
    fn zero_legs_are_skipped() {
        let (mut ledger, user) = funded(100);
        let blocked = AccountId::new();
        ledger.set_blocked(blocked, true);
        ledger.approve(user, &usdt(), 100);
        ledger.lock(&usdt(), user, 100).unwrap();
        ledger
            .pay_out(&usdt(), &[Payout::new(user, 100), Payout::new(blocked, 0)])
            .unwrap();
        assert_eq!(ledger.balance(user, &usdt()), 100);
    }

    #[test]
    fn burn_reduces_expected_supply() {
        let (mut ledger, user) = funded(1_000);
        ledger.burn(user, &usdt(), 250).unwrap();
        assert_eq!(ledger.total_supply(&usdt()), 750);
        assert!(ledger.verify_supply().is_ok());
        assert!(ledger.burn(user, &usdt(), 10_000).is_err());
    }

    #[test]
    fn nonexistent_balance_is_zero() {
        let ledger = Ledger::new();
        assert_eq!(ledger.balance(AccountId::new(), &usdt()), 0);
        assert_eq!(ledger.held(&usdt()), 0);
    }
}
