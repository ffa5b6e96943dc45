//! Dispute arbitration.
//!
//! A depositor may freeze its own PENDING escrow by raising a dispute.
//! While DISPUTED the record can only be settled by the owner, who either
//! refunds the depositor in full or releases to the receiving party with
//! the normal fee.

use tradevault_custody::Custody;
use tradevault_types::{
    AccountId, EscrowError, EscrowEvent, EscrowId, EscrowStatus, RefundReason, Result, Role,
};

use crate::clock::Clock;
use crate::engine::EscrowEngine;

impl<C: Custody, K: Clock> EscrowEngine<C, K> {
    /// PENDING → DISPUTED. Only the depositor may dispute.
    ///
    /// # Errors
    /// `NotFound`, `Unauthorized` (not the depositor), or `InvalidState`.
    pub fn dispute_escrow(&mut self, caller: AccountId, id: EscrowId) -> Result<()> {
        let record = self.store.get(id)?;
        if caller != record.depositor {
            return Err(self.unauthorized(caller, Role::Depositor));
        }
        let mut updated = record.clone();
        updated.mark_disputed(self.clock.now())?;
        let depositor = updated.depositor;
        self.store.replace(updated)?;

        tracing::info!(%id, depositor = %depositor, "Escrow disputed");
        self.emit(EscrowEvent::EscrowDisputed { id, depositor })?;
        Ok(())
    }

    /// DISPUTED → COMPLETED, decided by the owner.
    ///
    /// With `favor_depositor` the full amount goes back to the depositor and
    /// no fee is charged. Otherwise the escrow is released to its recorded
    /// counterparty. A SELL escrow disputed before any operator released it
    /// has none, so only the refund ruling is accepted for it.
    ///
    /// # Errors
    /// `Unauthorized`, `NotFound`, `InvalidState`, `NoCounterparty`, or
    /// `Custody`.
    pub fn resolve_dispute(
        &mut self,
        caller: AccountId,
        id: EscrowId,
        favor_depositor: bool,
    ) -> Result<()> {
        self.require_owner(caller)?;
        let record = self.store.get(id)?;
        record.ensure_status(EscrowStatus::Disputed)?;
        let record = record.clone();

        if favor_depositor {
            self.refund_completed(record, RefundReason::DisputeRefund)?;
        } else {
            let Some(recipient) = record.counterparty else {
                tracing::warn!(%id, "Release ruling refused: no counterparty");
                return Err(EscrowError::NoCounterparty(id));
            };
            let split = self.release_to(record, caller)?;
            self.emit(EscrowEvent::EscrowReleased {
                id,
                recipient,
                net: split.net,
                fee: split.fee,
            })?;
        }

        tracing::info!(%id, favor_depositor, "Dispute resolved");
        self.emit(EscrowEvent::DisputeResolved {
            id,
            favor_depositor,
        })?;
        Ok(())
    }
}
