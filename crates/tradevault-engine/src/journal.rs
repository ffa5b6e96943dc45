//! Append-only, hash-chained event journal.
//!
//! Every [`EscrowEvent`] the engine emits is appended here. Each entry's
//! hash covers the previous entry's hash, so rewriting history breaks
//! [`EventJournal::verify_chain`].
//!
//! ```text
//! hash_n = SHA-256(domain || hash_{n-1} || seq_n || at_n || json(event_n))
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tradevault_types::{EscrowError, EscrowEvent, EscrowId, Result, constants};

/// Hash preceding the first entry.
pub const GENESIS_HASH: [u8; 32] = [0u8; 32];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Position in the journal, starting at 0.
    pub seq: u64,
    pub at: DateTime<Utc>,
    pub event: EscrowEvent,
    pub prev_hash: [u8; 32],
    pub hash: [u8; 32],
}

impl JournalEntry {
    /// Lowercase hex of this entry's hash.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

#[derive(Debug, Default)]
pub struct EventJournal {
    entries: Vec<JournalEntry>,
}

impl EventJournal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `event` and return the stored entry.
    ///
    /// # Errors
    /// Returns `Internal` if the event cannot be encoded for hashing. The
    /// journal is left unchanged.
    pub fn append(&mut self, event: EscrowEvent, at: DateTime<Utc>) -> Result<&JournalEntry> {
        let seq = self.entries.len() as u64;
        let prev_hash = self.head_hash();
        let hash = entry_hash(&prev_hash, seq, at, &event)?;
        self.entries.push(JournalEntry {
            seq,
            at,
            event,
            prev_hash,
            hash,
        });
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Hash of the latest entry, or [`GENESIS_HASH`] when empty.
    #[must_use]
    pub fn head_hash(&self) -> [u8; 32] {
        self.entries.last().map_or(GENESIS_HASH, |e| e.hash)
    }

    #[must_use]
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn events(&self) -> impl Iterator<Item = &EscrowEvent> {
        self.entries.iter().map(|e| &e.event)
    }

    /// Events concerning one escrow, in emission order.
    pub fn events_for(&self, id: EscrowId) -> impl Iterator<Item = &EscrowEvent> {
        self.events().filter(move |ev| ev.escrow_id() == Some(id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recompute every hash and check the links between entries.
    #[must_use]
    pub fn verify_chain(&self) -> bool {
        let mut prev = GENESIS_HASH;
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.seq != i as u64 || entry.prev_hash != prev {
                return false;
            }
            if entry_hash(&prev, entry.seq, entry.at, &entry.event).ok() != Some(entry.hash) {
                return false;
            }
            prev = entry.hash;
        }
        true
    }
}

fn entry_hash(
    prev_hash: &[u8; 32],
    seq: u64,
    at: DateTime<Utc>,
    event: &EscrowEvent,
) -> Result<[u8; 32]> {
    let payload = serde_json::to_vec(event)
        .map_err(|e| EscrowError::Internal(format!("event encoding failed: {e}")))?;
    let mut hasher = Sha256::new();
    hasher.update(constants::JOURNAL_DOMAIN);
    hasher.update(prev_hash);
    hasher.update(seq.to_le_bytes());
    hasher.update(at.timestamp_micros().to_le_bytes());
    hasher.update(&payload);
    Ok(hasher.finalize().into())
}
