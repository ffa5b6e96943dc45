//! Expiry fallback: a depositor can reclaim a PENDING escrow once its
//! timeout has elapsed, without involving an operator.

use tradevault_custody::Custody;
use tradevault_types::{
    AccountId, EscrowError, EscrowEvent, EscrowId, EscrowRecord, EscrowStatus, RefundReason,
    Result, Role,
};

use crate::clock::Clock;
use crate::engine::EscrowEngine;

impl<C: Custody, K: Clock> EscrowEngine<C, K> {
    /// PENDING → COMPLETED, refunding the depositor in full.
    ///
    /// Only allowed strictly after `expires_at`. Disputed escrows are not
    /// claimable; they wait for the owner.
    ///
    /// # Errors
    /// `NotFound`, `Unauthorized` (not the depositor), `InvalidState`,
    /// `NotExpired`, or `Custody`.
    pub fn claim_expired_escrow(&mut self, caller: AccountId, id: EscrowId) -> Result<()> {
        let record = self.store.get(id)?;
        if caller != record.depositor {
            return Err(self.unauthorized(caller, Role::Depositor));
        }
        record.ensure_status(EscrowStatus::Pending)?;
        if !record.is_expired_at(self.clock.now()) {
            return Err(EscrowError::NotExpired {
                id,
                expires_at: record.expires_at,
            });
        }
        let record = record.clone();
        let depositor = record.depositor;
        self.refund_completed(record, RefundReason::Expired)?;

        self.emit(EscrowEvent::ExpiredEscrowClaimed { id, depositor })?;
        Ok(())
    }

    /// PENDING escrows of `depositor` that are past their expiry right now.
    pub fn claimable_escrows(&self, depositor: AccountId) -> Vec<&EscrowRecord> {
        let now = self.clock.now();
        self.store
            .by_depositor(depositor)
            .filter(|rec| rec.status == EscrowStatus::Pending && rec.is_expired_at(now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use tradevault_custody::Ledger;
    use tradevault_types::{AssetId, EngineConfig, Settlement};

    use super::*;
    use crate::clock::ManualClock;

    fn setup() -> (EscrowEngine<Ledger, ManualClock>, ManualClock, AccountId, AssetId) {
        let owner = AccountId::new();
        let user = AccountId::new();
        let usdt = AssetId::from("USDT");
        let clock = ManualClock::default();

        let mut ledger = Ledger::new();
        ledger.mint(user, &usdt, 1_000_000);
        ledger.approve(user, &usdt, 1_000_000);
        let engine = EscrowEngine::new(
            owner,
            EngineConfig::new(AccountId::new()),
            ledger,
            clock.clone(),
        )
        .unwrap();
        (engine, clock, user, usdt)
    }

    #[test]
    fn claim_before_expiry_fails() {
        let (mut engine, clock, user, usdt) = setup();
        let id = engine.create_sell_escrow(user, usdt, 1_000, 0, "x").unwrap();

        clock.advance(Duration::hours(23));
        assert!(matches!(
            engine.claim_expired_escrow(user, id),
            Err(EscrowError::NotExpired { .. })
        ));
    }

    #[test]
    fn claim_exactly_at_expiry_fails() {
        let (mut engine, clock, user, usdt) = setup();
        let id = engine.create_sell_escrow(user, usdt, 1_000, 0, "x").unwrap();

        clock.advance(Duration::hours(24));
        assert!(matches!(
            engine.claim_expired_escrow(user, id),
            Err(EscrowError::NotExpired { .. })
        ));
        assert!(engine.claimable_escrows(user).is_empty());
    }

    #[test]
    fn claim_after_expiry_refunds() {
        let (mut engine, clock, user, usdt) = setup();
        let id = engine
            .create_sell_escrow(user, usdt.clone(), 1_000, 0, "x")
            .unwrap();

        clock.advance(Duration::hours(24) + Duration::seconds(1));
        assert_eq!(engine.claimable_escrows(user).len(), 1);
        engine.claim_expired_escrow(user, id).unwrap();

        let rec = engine.get_escrow(id).unwrap();
        assert_eq!(rec.status, EscrowStatus::Completed);
        assert_eq!(
            rec.settlement,
            Some(Settlement::Refunded {
                reason: RefundReason::Expired
            })
        );
        assert_eq!(engine.custody().balance(user, &usdt), 1_000_000);
        assert!(engine.claimable_escrows(user).is_empty());
    }

    #[test]
    fn only_depositor_can_claim() {
        let (mut engine, clock, user, usdt) = setup();
        let id = engine.create_sell_escrow(user, usdt, 1_000, 0, "x").unwrap();
        clock.advance(Duration::days(2));
        assert!(matches!(
            engine.claim_expired_escrow(AccountId::new(), id),
            Err(EscrowError::Unauthorized { .. })
        ));
    }

    #[test]
    fn disputed_escrow_is_not_claimable() {
        let (mut engine, clock, user, usdt) = setup();
        let id = engine.create_sell_escrow(user, usdt, 1_000, 0, "x").unwrap();
        engine.dispute_escrow(user, id).unwrap();
        clock.advance(Duration::days(2));

        assert!(matches!(
            engine.claim_expired_escrow(user, id),
            Err(EscrowError::InvalidState {
                actual: EscrowStatus::Disputed,
                ..
            })
        ));
        assert!(engine.claimable_escrows(user).is_empty());
    }

    #[test]
    fn claim_works_while_paused() {
        let (mut engine, clock, user, usdt) = setup();
        let owner = engine.owner();
        let id = engine.create_sell_escrow(user, usdt, 1_000, 0, "x").unwrap();
        engine.pause(owner).unwrap();
        clock.advance(Duration::days(2));
        engine.claim_expired_escrow(user, id).unwrap();
    }

    #[test]
    fn custom_timeout_is_honoured() {
        let owner = AccountId::new();
        let user = AccountId::new();
        let usdt = AssetId::from("USDT");
        let clock = ManualClock::default();
        let mut ledger = Ledger::new();
        ledger.mint(user, &usdt, 100);
        ledger.approve(user, &usdt, 100);

        let mut cfg = EngineConfig::new(AccountId::new());
        cfg.escrow_timeout_secs = 60;
        let mut engine = EscrowEngine::new(owner, cfg, ledger, clock.clone()).unwrap();
        let id = engine.create_sell_escrow(user, usdt, 100, 0, "x").unwrap();

        clock.advance(Duration::seconds(61));
        engine.claim_expired_escrow(user, id).unwrap();
    }
}
