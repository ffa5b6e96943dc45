//! The escrow lifecycle engine.
//!
//! [`EscrowEngine`] owns every piece of mutable state: the escrow store, the
//! operator registry, fee configuration, the pause flag, the event journal,
//! and the custody backend. All operations take `&mut self`, so calls are
//! processed one at a time and each runs to completion or fails with nothing
//! changed.
//!
//! Every transition follows the same order:
//! 1. Check the caller's role
//! 2. Check the record exists and is in the required state
//! 3. Commit the new record to the store
//! 4. Move assets through custody (one `lock` or one `pay_out` batch)
//! 5. Restore the previous record if custody refused, otherwise emit the event

use rust_decimal::Decimal;
use tradevault_custody::{Custody, Payout};
use tradevault_types::{
    AccountId, Amount, AssetId, EngineConfig, EscrowError, EscrowEvent, EscrowId, EscrowKind,
    EscrowRecord, EscrowStatus, FeeSplit, RefundReason, Result, Role, Settlement, bps_to_percent,
    compute_fee,
};

use crate::clock::{Clock, SystemClock};
use crate::journal::EventJournal;
use crate::registry::OperatorRegistry;
use crate::store::EscrowStore;

/// Operator-brokered escrow engine over a custody backend `C`.
pub struct EscrowEngine<C, K = SystemClock> {
    pub(crate) owner: AccountId,
    pub(crate) config: EngineConfig,
    pub(crate) paused: bool,
    pub(crate) operators: OperatorRegistry,
    pub(crate) store: EscrowStore,
    pub(crate) journal: EventJournal,
    pub(crate) custody: C,
    pub(crate) clock: K,
}

impl<C: Custody> EscrowEngine<C, SystemClock> {
    /// Engine on wall-clock time.
    pub fn with_system_clock(owner: AccountId, config: EngineConfig, custody: C) -> Result<Self> {
        Self::new(owner, config, custody, SystemClock)
    }
}

impl<C: Custody, K: Clock> EscrowEngine<C, K> {
    /// Create an engine administered by `owner`.
    ///
    /// # Errors
    /// Returns the validation error if `config` is inconsistent.
    pub fn new(owner: AccountId, config: EngineConfig, custody: C, clock: K) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            owner = %owner,
            fee_bps = config.fee_bps,
            timeout_secs = config.escrow_timeout_secs,
            "Escrow engine initialised"
        );
        Ok(Self {
            owner,
            config,
            paused: false,
            operators: OperatorRegistry::new(),
            store: EscrowStore::new(),
            journal: EventJournal::new(),
            custody,
            clock,
        })
    }

    // =================================================================
    // Escrow creation
    // =================================================================

    /// An operator locks `amount` of its own `asset` for `counterparty`,
    /// who receives it (minus the fee) on release.
    ///
    /// # Errors
    /// `Unauthorized` (caller not an operator), `Paused`, `ZeroAmount`,
    /// or `Custody` if the lock fails.
    pub fn create_buy_escrow(
        &mut self,
        caller: AccountId,
        counterparty: AccountId,
        asset: AssetId,
        amount: Amount,
        external_amount: Amount,
        payment_reference: impl Into<String>,
    ) -> Result<EscrowId> {
        self.require_operator(caller)?;
        self.open_escrow(
            caller,
            Some(counterparty),
            EscrowKind::Buy,
            asset,
            amount,
            external_amount,
            payment_reference.into(),
        )
    }

    /// Any caller locks `amount` of its own `asset`, to be released to the
    /// operator that settles the off-system payment.
    ///
    /// # Errors
    /// `Paused`, `ZeroAmount`, or `Custody` if the lock fails.
    pub fn create_sell_escrow(
        &mut self,
        caller: AccountId,
        asset: AssetId,
        amount: Amount,
        external_amount: Amount,
        payment_reference: impl Into<String>,
    ) -> Result<EscrowId> {
        self.open_escrow(
            caller,
            None,
            EscrowKind::Sell,
            asset,
            amount,
            external_amount,
            payment_reference.into(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn open_escrow(
        &mut self,
        depositor: AccountId,
        counterparty: Option<AccountId>,
        kind: EscrowKind,
        asset: AssetId,
        amount: Amount,
        external_amount: Amount,
        payment_reference: String,
    ) -> Result<EscrowId> {
        if self.paused {
            return Err(EscrowError::Paused);
        }
        if amount == 0 {
            return Err(EscrowError::ZeroAmount);
        }

        let now = self.clock.now();
        let expires_at = now + self.config.escrow_timeout();
        let id = self.store.insert_next(|id| EscrowRecord {
            id,
            depositor,
            counterparty,
            asset: asset.clone(),
            amount,
            external_amount,
            payment_reference,
            kind,
            status: EscrowStatus::Pending,
            created_at: now,
            expires_at,
            disputed_at: None,
            settled_at: None,
            settlement: None,
        })?;

        if let Err(err) = self.custody.lock(&asset, depositor, amount) {
            self.store.rollback(id).ok_or_else(|| {
                EscrowError::Internal(format!("{id} could not be rolled back"))
            })?;
            tracing::warn!(%id, depositor = %depositor, error = %err, "Escrow lock failed, creation rolled back");
            return Err(err.into());
        }

        tracing::info!(%id, %kind, depositor = %depositor, %asset, amount, "Escrow created");
        self.emit(EscrowEvent::EscrowCreated {
            id,
            depositor,
            counterparty,
            kind,
            asset,
            amount,
        })?;
        Ok(id)
    }

    // =================================================================
    // Settlement transitions
    // =================================================================

    /// PENDING → COMPLETED: pay the receiving party net of the fee.
    ///
    /// BUY escrows pay their counterparty; SELL escrows pay the releasing
    /// operator, which becomes the counterparty.
    ///
    /// # Errors
    /// `Unauthorized`, `NotFound`, `InvalidState`, or `Custody`.
    pub fn release_escrow(&mut self, caller: AccountId, id: EscrowId) -> Result<FeeSplit> {
        self.require_operator(caller)?;
        let record = self.store.get(id)?;
        record.ensure_status(EscrowStatus::Pending)?;

        let recipient = record.counterparty.unwrap_or(caller);
        let split = self.release_to(record.clone(), caller)?;
        self.emit(EscrowEvent::EscrowReleased {
            id,
            recipient,
            net: split.net,
            fee: split.fee,
        })?;
        Ok(split)
    }

    /// PENDING → CANCELLED: refund the depositor in full, no fee.
    ///
    /// Any current operator may cancel. The depositor may cancel only a SELL
    /// escrow: a BUY depositor is the operator that brokered it, and once
    /// de-listed it keeps only the dispute and expiry paths.
    ///
    /// # Errors
    /// `NotFound`, `Unauthorized`, `InvalidState`, or `Custody`.
    pub fn cancel_escrow(&mut self, caller: AccountId, id: EscrowId) -> Result<()> {
        let record = self.store.get(id)?;
        let own_sell = record.kind == EscrowKind::Sell && caller == record.depositor;
        if !own_sell && !self.operators.contains(&caller) {
            return Err(self.unauthorized(caller, Role::DepositorOrOperator));
        }
        record.ensure_status(EscrowStatus::Pending)?;

        let mut updated = record.clone();
        updated.mark_cancelled(self.clock.now())?;
        let refund = [Payout::new(updated.depositor, updated.amount)];
        self.commit_and_pay(updated, &refund)?;

        tracing::info!(%id, by = %caller, "Escrow cancelled");
        self.emit(EscrowEvent::EscrowCancelled { id, by: caller })?;
        Ok(())
    }

    /// Settle `record` as a release to its counterparty, or to `executor`
    /// when none is set yet. Applies the fee rate in force right now.
    pub(crate) fn release_to(
        &mut self,
        mut record: EscrowRecord,
        executor: AccountId,
    ) -> Result<FeeSplit> {
        let recipient = record.counterparty.unwrap_or(executor);
        let fee_bps = self.config.fee_bps;
        let split = compute_fee(record.amount, fee_bps);
        debug_assert_eq!(split.total(), record.amount);

        record.mark_completed(
            Settlement::Released {
                recipient,
                net: split.net,
                fee: split.fee,
                fee_bps,
            },
            self.clock.now(),
        )?;
        let legs = [
            Payout::new(recipient, split.net),
            Payout::new(self.config.fee_collector, split.fee),
        ];
        let id = record.id;
        self.commit_and_pay(record, &legs)?;

        tracing::info!(
            %id,
            recipient = %recipient,
            net = split.net,
            fee = split.fee,
            fee_bps,
            "Escrow released"
        );
        Ok(split)
    }

    /// Settle `record` as a full refund to its depositor, marked COMPLETED.
    pub(crate) fn refund_completed(
        &mut self,
        mut record: EscrowRecord,
        reason: RefundReason,
    ) -> Result<()> {
        record.mark_completed(Settlement::Refunded { reason }, self.clock.now())?;
        let refund = [Payout::new(record.depositor, record.amount)];
        let id = record.id;
        self.commit_and_pay(record, &refund)?;
        tracing::info!(%id, ?reason, "Escrow refunded to depositor");
        Ok(())
    }

    /// Commit `updated` to the store, then pay `legs` out of custody. If
    /// custody refuses, the previous record is restored.
    fn commit_and_pay(&mut self, updated: EscrowRecord, legs: &[Payout]) -> Result<()> {
        let asset = updated.asset.clone();
        let previous = self.store.replace(updated)?;
        if let Err(err) = self.custody.pay_out(&asset, legs) {
            tracing::warn!(
                id = %previous.id,
                status = %previous.status,
                error = %err,
                "Custody payout failed, escrow state restored"
            );
            self.store.replace(previous)?;
            return Err(err.into());
        }
        Ok(())
    }

    // =================================================================
    // Administration (owner only)
    // =================================================================

    pub fn add_operator(&mut self, caller: AccountId, operator: AccountId) -> Result<()> {
        self.require_owner(caller)?;
        if self.operators.add(operator) {
            tracing::info!(operator = %operator, "Operator added");
            self.emit(EscrowEvent::OperatorAdded { operator })?;
        }
        Ok(())
    }

    pub fn remove_operator(&mut self, caller: AccountId, operator: AccountId) -> Result<()> {
        self.require_owner(caller)?;
        if self.operators.remove(&operator) {
            tracing::info!(operator = %operator, "Operator removed");
            self.emit(EscrowEvent::OperatorRemoved { operator })?;
        }
        Ok(())
    }

    /// Change the fee applied to future releases.
    ///
    /// # Errors
    /// `Unauthorized`, or `FeeTooHigh` above the configured cap.
    pub fn set_fee_bps(&mut self, caller: AccountId, fee_bps: u16) -> Result<()> {
        self.require_owner(caller)?;
        if fee_bps > self.config.max_fee_bps {
            return Err(EscrowError::FeeTooHigh {
                requested: fee_bps,
                max: self.config.max_fee_bps,
            });
        }
        let old_bps = std::mem::replace(&mut self.config.fee_bps, fee_bps);
        tracing::info!(old_bps, new_bps = fee_bps, "Fee updated");
        self.emit(EscrowEvent::FeeUpdated {
            old_bps,
            new_bps: fee_bps,
        })?;
        Ok(())
    }

    pub fn set_fee_collector(&mut self, caller: AccountId, collector: AccountId) -> Result<()> {
        self.require_owner(caller)?;
        let old = std::mem::replace(&mut self.config.fee_collector, collector);
        tracing::info!(old = %old, new = %collector, "Fee collector updated");
        self.emit(EscrowEvent::FeeCollectorUpdated {
            old,
            new: collector,
        })?;
        Ok(())
    }

    /// Block new escrows. Open escrows stay fully actionable.
    pub fn pause(&mut self, caller: AccountId) -> Result<()> {
        self.require_owner(caller)?;
        if !self.paused {
            self.paused = true;
            tracing::info!(by = %caller, "Escrow creation paused");
            self.emit(EscrowEvent::Paused { by: caller })?;
        }
        Ok(())
    }

    pub fn unpause(&mut self, caller: AccountId) -> Result<()> {
        self.require_owner(caller)?;
        if self.paused {
            self.paused = false;
            tracing::info!(by = %caller, "Escrow creation resumed");
            self.emit(EscrowEvent::Unpaused { by: caller })?;
        }
        Ok(())
    }

    /// Hand administration and dispute arbitration to `new_owner`.
    pub fn transfer_ownership(&mut self, caller: AccountId, new_owner: AccountId) -> Result<()> {
        self.require_owner(caller)?;
        let previous = std::mem::replace(&mut self.owner, new_owner);
        tracing::info!(previous = %previous, new = %new_owner, "Ownership transferred");
        self.emit(EscrowEvent::OwnershipTransferred {
            previous,
            new: new_owner,
        })?;
        Ok(())
    }

    // =================================================================
    // Queries
    // =================================================================

    /// # Errors
    /// Returns `NotFound` for unknown identifiers.
    pub fn get_escrow(&self, id: EscrowId) -> Result<&EscrowRecord> {
        self.store.get(id)
    }

    #[must_use]
    pub fn is_operator(&self, account: AccountId) -> bool {
        self.operators.contains(&account)
    }

    #[must_use]
    pub fn operators(&self) -> &OperatorRegistry {
        &self.operators
    }

    #[must_use]
    pub fn fee_bps(&self) -> u16 {
        self.config.fee_bps
    }

    /// The fee as a percentage (50 bps → 0.50).
    #[must_use]
    pub fn fee_percent(&self) -> Decimal {
        bps_to_percent(self.config.fee_bps)
    }

    #[must_use]
    pub fn fee_collector(&self) -> AccountId {
        self.config.fee_collector
    }

    #[must_use]
    pub fn owner(&self) -> AccountId {
        self.owner
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of escrows ever created.
    #[must_use]
    pub fn escrow_count(&self) -> usize {
        self.store.len()
    }

    pub fn escrows_by_depositor(&self, depositor: AccountId) -> Vec<&EscrowRecord> {
        self.store.by_depositor(depositor).collect()
    }

    /// Total of `asset` that open escrows hold. Equals what custody holds
    /// on the engine's behalf.
    #[must_use]
    pub fn open_amount(&self, asset: &AssetId) -> Amount {
        self.store.open_amount(asset)
    }

    #[must_use]
    pub fn store(&self) -> &EscrowStore {
        &self.store
    }

    #[must_use]
    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }

    pub fn events(&self) -> impl Iterator<Item = &EscrowEvent> {
        self.journal.events()
    }

    #[must_use]
    pub fn custody(&self) -> &C {
        &self.custody
    }

    /// Direct access to the backend, e.g. to fund accounts.
    pub fn custody_mut(&mut self) -> &mut C {
        &mut self.custody
    }

    #[must_use]
    pub fn clock(&self) -> &K {
        &self.clock
    }

    // =================================================================
    // Internal helpers
    // =================================================================

    pub(crate) fn require_owner(&self, caller: AccountId) -> Result<()> {
        if caller == self.owner {
            Ok(())
        } else {
            Err(self.unauthorized(caller, Role::Owner))
        }
    }

    pub(crate) fn require_operator(&self, caller: AccountId) -> Result<()> {
        if self.operators.contains(&caller) {
            Ok(())
        } else {
            Err(self.unauthorized(caller, Role::Operator))
        }
    }

    pub(crate) fn unauthorized(&self, caller: AccountId, required: Role) -> EscrowError {
        tracing::warn!(caller = %caller, %required, "Unauthorized escrow call rejected");
        EscrowError::Unauthorized { caller, required }
    }

    pub(crate) fn emit(&mut self, event: EscrowEvent) -> Result<()> {
        let at = self.clock.now();
        let entry = self.journal.append(event, at)?;
        tracing::debug!(
            seq = entry.seq,
            event = %entry.event,
            hash = %entry.hash_hex(),
            "Event recorded"
        );
        Ok(())
    }
}
