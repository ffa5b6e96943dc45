//! # Escrow records and their lifecycle
//!
//! ## State Machine
//!
//! ```text
//!                release / dispute release / refund / expiry claim
//!   ┌─────────┐─────────────────────────────────────────▶┌───────────┐
//!   │ PENDING │                                          │ COMPLETED │
//!   └──┬───┬──┘           ┌──────────┐  resolve          └───────────┘
//!      │   └─── dispute ─▶│ DISPUTED ├───────────────────────▲
//!      │ cancel           └──────────┘
//!      ▼
//!   ┌───────────┐
//!   │ CANCELLED │
//!   └───────────┘
//! ```
//!
//! `COMPLETED` and `CANCELLED` are terminal: a terminal record never changes
//! again, so replaying any transition against it fails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, AssetId, EscrowError, EscrowId, Result};

/// Which side of the off-system trade the depositor is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EscrowKind {
    /// An operator deposits on behalf of a user who will receive the asset.
    Buy,
    /// A user deposits and expects off-system payment before release.
    Sell,
}

impl std::fmt::Display for EscrowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// The lifecycle state of an escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EscrowStatus {
    /// Funds are in custody awaiting a settlement decision.
    Pending,
    /// Settled, either paid to the receiving party or refunded by arbitration/expiry.
    Completed,
    /// Frozen by the depositor until the owner resolves it.
    Disputed,
    /// Refunded to the depositor before settlement.
    Cancelled,
}

impl EscrowStatus {
    /// Can a record in this state move to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Completed | Self::Disputed | Self::Cancelled)
                | (Self::Disputed, Self::Completed)
        )
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl std::fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Disputed => write!(f, "DISPUTED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Why a record's amount went back to its depositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefundReason {
    /// Cancelled by the depositor or an operator.
    Cancelled,
    /// Dispute resolved in the depositor's favour.
    DisputeRefund,
    /// Reclaimed by the depositor after expiry.
    Expired,
}

/// How a terminal record was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Settlement {
    /// Paid out to the receiving party minus the protocol fee.
    Released {
        recipient: AccountId,
        net: Amount,
        fee: Amount,
        fee_bps: u16,
    },
    /// Returned in full to the depositor.
    Refunded { reason: RefundReason },
}

/// A single escrow: an amount of one asset held pending settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowRecord {
    /// Sequential identifier, never zero.
    pub id: EscrowId,
    /// The party whose asset is in custody.
    pub depositor: AccountId,
    /// The receiving party. Unset for SELL escrows until release.
    pub counterparty: Option<AccountId>,
    /// Which asset is held.
    pub asset: AssetId,
    /// Custodied quantity. Set once, always > 0.
    pub amount: Amount,
    /// Off-system price (e.g., fiat). Informational only.
    pub external_amount: Amount,
    /// Caller-supplied reference for the off-system payment. Never validated.
    pub payment_reference: String,
    pub kind: EscrowKind,
    pub status: EscrowStatus,
    pub created_at: DateTime<Utc>,
    /// After this instant a PENDING record may be reclaimed by its depositor.
    pub expires_at: DateTime<Utc>,
    /// When the depositor raised a dispute, if ever.
    pub disputed_at: Option<DateTime<Utc>>,
    /// When the record reached a terminal state.
    pub settled_at: Option<DateTime<Utc>>,
    /// How the record was settled. `None` while open.
    pub settlement: Option<Settlement>,
}

impl EscrowRecord {
    /// Funds are still in custody (PENDING or DISPUTED).
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Strictly past the expiry instant.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Fails with `InvalidState` unless the record is currently `expected`.
    pub fn ensure_status(&self, expected: EscrowStatus) -> Result<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(EscrowError::InvalidState {
                id: self.id,
                expected,
                actual: self.status,
            })
        }
    }

    /// PENDING → DISPUTED.
    ///
    /// # Errors
    /// Returns `InvalidState` if the record is not PENDING.
    pub fn mark_disputed(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.ensure_status(EscrowStatus::Pending)?;
        self.status = EscrowStatus::Disputed;
        self.disputed_at = Some(now);
        Ok(())
    }

    /// PENDING or DISPUTED → COMPLETED with the given settlement.
    ///
    /// A release also fixes the counterparty to the recipient.
    ///
    /// # Errors
    /// Returns `InvalidState` if the transition is not allowed.
    pub fn mark_completed(&mut self, settlement: Settlement, now: DateTime<Utc>) -> Result<()> {
        self.transition(EscrowStatus::Completed)?;
        if let Settlement::Released { recipient, .. } = settlement {
            self.counterparty = Some(recipient);
        }
        self.settlement = Some(settlement);
        self.settled_at = Some(now);
        Ok(())
    }

    /// PENDING → CANCELLED.
    ///
    /// # Errors
    /// Returns `InvalidState` if the record is not PENDING.
    pub fn mark_cancelled(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.ensure_status(EscrowStatus::Pending)?;
        self.status = EscrowStatus::Cancelled;
        self.settlement = Some(Settlement::Refunded {
            reason: RefundReason::Cancelled,
        });
        self.settled_at = Some(now);
        Ok(())
    }

    fn transition(&mut self, target: EscrowStatus) -> Result<()> {
        if !self.status.can_transition_to(target) {
            let expected = if self.status == EscrowStatus::Disputed {
                EscrowStatus::Disputed
            } else {
                EscrowStatus::Pending
            };
            return Err(EscrowError::InvalidState {
                id: self.id,
                expected,
                actual: self.status,
            });
        }
        self.status = target;
        Ok(())
    }
}

/// Dummy record for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl EscrowRecord {
    /// A PENDING record with a random non-zero amount and a 24h expiry.
    pub fn dummy(id: EscrowId, kind: EscrowKind) -> Self {
        let now = Utc::now();
        let depositor = AccountId::new();
        Self {
            id,
            depositor,
            counterparty: match kind {
                EscrowKind::Buy => Some(AccountId::new()),
                EscrowKind::Sell => None,
            },
            asset: AssetId::from("USDT"),
            amount: Amount::from(rand::random::<u32>()) + 1,
            external_amount: 160_000,
            payment_reference: "PAY-REF-TEST".to_string(),
            kind,
            status: EscrowStatus::Pending,
            created_at: now,
            expires_at: now + chrono::Duration::hours(24),
            disputed_at: None,
            settled_at: None,
            settlement: None,
        }
    }
}
