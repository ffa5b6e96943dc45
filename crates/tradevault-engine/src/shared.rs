//! Thread-safe handle to an [`EscrowEngine`].
//!
//! The engine itself is single-owner (`&mut self`). When several threads
//! submit calls, wrap it in a [`SharedEscrowEngine`]: every call takes the
//! lock for its whole duration, so operations are applied one at a time in
//! lock-acquisition order and never interleave.

use std::sync::Arc;

use parking_lot::Mutex;
use tradevault_custody::Custody;
use tradevault_types::{EscrowId, EscrowRecord, Result};

use crate::clock::{Clock, SystemClock};
use crate::engine::EscrowEngine;

pub struct SharedEscrowEngine<C, K = SystemClock> {
    inner: Arc<Mutex<EscrowEngine<C, K>>>,
}

impl<C, K> Clone for SharedEscrowEngine<C, K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Custody, K: Clock> SharedEscrowEngine<C, K> {
    #[must_use]
    pub fn new(engine: EscrowEngine<C, K>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Run `f` with exclusive access to the engine.
    ///
    /// # Errors
    /// Whatever `f` returns.
    pub fn with<T>(&self, f: impl FnOnce(&mut EscrowEngine<C, K>) -> Result<T>) -> Result<T> {
        f(&mut *self.inner.lock())
    }

    /// Copy of one record, taken under the lock.
    ///
    /// # Errors
    /// `NotFound` for unknown identifiers.
    pub fn snapshot(&self, id: EscrowId) -> Result<EscrowRecord> {
        let engine = self.inner.lock();
        engine.get_escrow(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use tradevault_custody::Ledger;
    use tradevault_types::{AccountId, AssetId, EngineConfig, EscrowError, EscrowStatus};

    use super::*;

    #[test]
    fn concurrent_creations_get_distinct_ids() {
        let owner = AccountId::new();
        let usdt = AssetId::from("USDT");
        let users: Vec<AccountId> = (0..8).map(|_| AccountId::new()).collect();

        let mut ledger = Ledger::new();
        for user in &users {
            ledger.mint(*user, &usdt, 10_000);
            ledger.approve(*user, &usdt, 10_000);
        }
        let engine =
            EscrowEngine::with_system_clock(owner, EngineConfig::new(AccountId::new()), ledger)
                .unwrap();
        let shared = SharedEscrowEngine::new(engine);

        let handles: Vec<_> = users
            .iter()
            .map(|user| {
                let shared = shared.clone();
                let user = *user;
                let usdt = usdt.clone();
                thread::spawn(move || {
                    (0..10)
                        .map(|_| {
                            shared
                                .with(|e| e.create_sell_escrow(user, usdt.clone(), 100, 0, "x"))
                                .unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<EscrowId> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 80);
        assert_eq!(ids.first(), Some(&EscrowId(1)));
        assert_eq!(ids.last(), Some(&EscrowId(80)));

        shared
            .with(|e| {
                assert_eq!(e.open_amount(&usdt), 8_000);
                assert!(e.custody().verify_supply().is_ok());
                Ok(())
            })
            .unwrap();
        assert_eq!(shared.snapshot(EscrowId(5)).unwrap().status, EscrowStatus::Pending);
    }

    #[test]
    fn snapshot_of_unknown_id_fails() {
        let engine = EscrowEngine::with_system_clock(
            AccountId::new(),
            EngineConfig::new(AccountId::new()),
            Ledger::new(),
        )
        .unwrap();
        let shared = SharedEscrowEngine::new(engine);
        assert_eq!(
            shared.snapshot(EscrowId(1)),
            Err(EscrowError::NotFound(EscrowId(1)))
        );
    }

    #[test]
    fn panic_under_the_lock_leaves_handle_usable() {
        let engine = EscrowEngine::with_system_clock(
            AccountId::new(),
            EngineConfig::new(AccountId::new()),
            Ledger::new(),
        )
        .unwrap();
        let shared = SharedEscrowEngine::new(engine);

        let other = shared.clone();
        let joined = thread::spawn(move || {
            other.with(|_| -> Result<()> { panic!("callback failed mid-call") })
        })
        .join();
        assert!(joined.is_err());

        assert_eq!(
            shared.snapshot(EscrowId(1)),
            Err(EscrowError::NotFound(EscrowId(1)))
        );
        assert!(shared.with(|e| Ok(e.is_paused())).is_ok());
    }
}
