//! Notifications emitted by the engine on every state change.
//!
//! Events are the observable audit trail: each escrow transition and each
//! administrative change produces exactly one [`EscrowEvent`].

use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, AssetId, EscrowId, EscrowKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowEvent {
    EscrowCreated {
        id: EscrowId,
        depositor: AccountId,
        counterparty: Option<AccountId>,
        kind: EscrowKind,
        asset: AssetId,
        amount: Amount,
    },
    EscrowReleased {
        id: EscrowId,
        recipient: AccountId,
        net: Amount,
        fee: Amount,
    },
    EscrowCancelled {
        id: EscrowId,
        by: AccountId,
    },
    EscrowDisputed {
        id: EscrowId,
        depositor: AccountId,
    },
    DisputeResolved {
        id: EscrowId,
        favor_depositor: bool,
    },
    ExpiredEscrowClaimed {
        id: EscrowId,
        depositor: AccountId,
    },
    OperatorAdded {
        operator: AccountId,
    },
    OperatorRemoved {
        operator: AccountId,
    },
    FeeUpdated {
        old_bps: u16,
        new_bps: u16,
    },
    FeeCollectorUpdated {
        old: AccountId,
        new: AccountId,
    },
    Paused {
        by: AccountId,
    },
    Unpaused {
        by: AccountId,
    },
    OwnershipTransferred {
        previous: AccountId,
        new: AccountId,
    },
}

impl EscrowEvent {
    /// The event name, as emitted to observers.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::EscrowCreated { .. } => "EscrowCreated",
            Self::EscrowReleased { .. } => "EscrowReleased",
            Self::EscrowCancelled { .. } => "EscrowCancelled",
            Self::EscrowDisputed { .. } => "EscrowDisputed",
            Self::DisputeResolved { .. } => "DisputeResolved",
            Self::ExpiredEscrowClaimed { .. } => "ExpiredEscrowClaimed",
            Self::OperatorAdded { .. } => "OperatorAdded",
            Self::OperatorRemoved { .. } => "OperatorRemoved",
            Self::FeeUpdated { .. } => "FeeUpdated",
            Self::FeeCollectorUpdated { .. } => "FeeCollectorUpdated",
            Self::Paused { .. } => "Paused",
            Self::Unpaused { .. } => "Unpaused",
            Self::OwnershipTransferred { .. } => "OwnershipTransferred",
        }
    }

    /// The escrow this event concerns, if it is an escrow transition.
    #[must_use]
    pub fn escrow_id(&self) -> Option<EscrowId> {
        match self {
            Self::EscrowCreated { id, .. }
            | Self::EscrowReleased { id, .. }
            | Self::EscrowCancelled { id, .. }
            | Self::EscrowDisputed { id, .. }
            | Self::DisputeResolved { id, .. }
            | Self::ExpiredEscrowClaimed { id, .. } => Some(*id),
            _ => None,
        }
    }
}

impl std::fmt::Display for EscrowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.escrow_id() {
            Some(id) => write!(f, "{}({id})", self.name()),
            None => f.write_str(self.name()),
        }
    }
}
