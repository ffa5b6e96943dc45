//! Escrow store, the single source of truth for escrow records.
//!
//! Identifiers are handed out sequentially starting at 1. Records are never
//! deleted once committed; the only removal is [`EscrowStore::rollback`],
//! which undoes a creation whose custody lock failed.

use std::collections::BTreeMap;

use tradevault_types::{
    AccountId, Amount, AssetId, EscrowError, EscrowId, EscrowRecord, EscrowStatus, Result,
    constants,
};

#[derive(Debug)]
pub struct EscrowStore {
    records: BTreeMap<EscrowId, EscrowRecord>,
    next_id: EscrowId,
}

impl EscrowStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            next_id: EscrowId(constants::FIRST_ESCROW_ID),
        }
    }

    /// Build and store a record under the next identifier.
    ///
    /// # Errors
    /// Returns `Internal` if the identifier space is exhausted.
    pub fn insert_next(
        &mut self,
        build: impl FnOnce(EscrowId) -> EscrowRecord,
    ) -> Result<EscrowId> {
        let id = self.next_id;
        let following = id
            .next()
            .ok_or_else(|| EscrowError::Internal("escrow id space exhausted".to_string()))?;
        let record = build(id);
        debug_assert_eq!(record.id, id);
        self.records.insert(id, record);
        self.next_id = following;
        Ok(id)
    }

    /// Undo the most recent `insert_next`. Returns `None` if `id` is not
    /// the latest record.
    pub fn rollback(&mut self, id: EscrowId) -> Option<EscrowRecord> {
        if id.next() != Some(self.next_id) {
            return None;
        }
        let record = self.records.remove(&id)?;
        self.next_id = id;
        Some(record)
    }

    /// Overwrite an existing record, returning the previous version.
    ///
    /// # Errors
    /// Returns `NotFound` if no record exists under `record.id`.
    pub fn replace(&mut self, record: EscrowRecord) -> Result<EscrowRecord> {
        let slot = self
            .records
            .get_mut(&record.id)
            .ok_or(EscrowError::NotFound(record.id))?;
        Ok(std::mem::replace(slot, record))
    }

    /// Look up a record.
    ///
    /// # Errors
    /// Returns `NotFound` for unknown (or reserved) identifiers.
    pub fn get(&self, id: EscrowId) -> Result<&EscrowRecord> {
        self.records.get(&id).ok_or(EscrowError::NotFound(id))
    }

    #[must_use]
    pub fn contains(&self, id: EscrowId) -> bool {
        self.records.contains_key(&id)
    }

    /// Number of escrows ever created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &EscrowRecord> {
        self.records.values()
    }

    pub fn by_depositor(&self, depositor: AccountId) -> impl Iterator<Item = &EscrowRecord> {
        self.records
            .values()
            .filter(move |rec| rec.depositor == depositor)
    }

    #[must_use]
    pub fn count_with_status(&self, status: EscrowStatus) -> usize {
        self.records
            .values()
            .filter(|rec| rec.status == status)
            .count()
    }

    /// Total amount of `asset` that open (PENDING/DISPUTED) records hold.
    #[must_use]
    pub fn open_amount(&self, asset: &AssetId) -> Amount {
        self.records
            .values()
            .filter(|rec| rec.is_open() && &rec.asset == asset)
            .map(|rec| rec.amount)
            .sum()
    }
}

impl Default for EscrowStore {
    fn default() -> Self {
        Self::new()
    }
}
