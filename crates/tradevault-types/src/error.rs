//! Error types for the TradeVault escrow engine.
//!
//! All errors use the `ESC_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Authorization errors
//! - 2xx: Lifecycle errors
//! - 3xx: Validation / configuration errors
//! - 4xx: Administrative state errors
//! - 5xx: Custody errors
//! - 9xx: General / internal errors

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{AccountId, Amount, EscrowId, EscrowStatus};

/// The role an operation requires of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The registry owner (administrator and dispute arbiter).
    Owner,
    /// A member of the operator registry.
    Operator,
    /// The depositor of the escrow being acted on.
    Depositor,
    /// Either the depositor or a trusted operator.
    DepositorOrOperator,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owner => write!(f, "OWNER"),
            Self::Operator => write!(f, "OPERATOR"),
            Self::Depositor => write!(f, "DEPOSITOR"),
            Self::DepositorOrOperator => write!(f, "DEPOSITOR_OR_OPERATOR"),
        }
    }
}

/// Failures raised by a custody backend while moving assets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustodyError {
    /// The source account does not hold enough of the asset.
    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Amount, available: Amount },

    /// The source account has not approved the engine for enough.
    #[error("insufficient allowance: need {needed}, allowed {allowed}")]
    InsufficientAllowance { needed: Amount, allowed: Amount },

    /// Custody holds less than the payout batch requires.
    #[error("insufficient custody balance")]
    InsufficientCustody,

    /// The transfer was refused (blocked recipient, frozen asset, ...).
    #[error("transfer rejected: {reason}")]
    Rejected { reason: String },

    /// Balances no longer add up to the recorded supply.
    #[error("supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },
}

/// Central error enum for all escrow engine operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscrowError {
    // =================================================================
    // Authorization Errors (1xx)
    // =================================================================
    /// The caller lacks the role the operation requires.
    #[error("ESC_ERR_100: Unauthorized: {caller} is not {required}")]
    Unauthorized { caller: AccountId, required: Role },

    // =================================================================
    // Lifecycle Errors (2xx)
    // =================================================================
    /// No escrow exists under this identifier.
    #[error("ESC_ERR_200: Escrow not found: {0}")]
    NotFound(EscrowId),

    /// The escrow is not in the state the transition starts from.
    #[error("ESC_ERR_201: Invalid state for {id}: expected {expected}, got {actual}")]
    InvalidState {
        id: EscrowId,
        expected: EscrowStatus,
        actual: EscrowStatus,
    },

    /// The expiry claim came in before the timeout elapsed.
    #[error("ESC_ERR_202: Escrow {id} not expired until {expires_at}")]
    NotExpired {
        id: EscrowId,
        expires_at: DateTime<Utc>,
    },

    /// A release was ruled for an escrow that has nobody to receive it.
    #[error("ESC_ERR_203: Escrow {0} has no counterparty to release to")]
    NoCounterparty(EscrowId),

    // =================================================================
    // Validation Errors (3xx)
    // =================================================================
    /// Creation requested with a zero amount.
    #[error("ESC_ERR_300: Escrow amount must be greater than zero")]
    ZeroAmount,

    /// The requested fee exceeds the configured cap.
    #[error("ESC_ERR_301: Fee {requested} bps exceeds maximum {max} bps")]
    FeeTooHigh { requested: u16, max: u16 },

    /// The engine configuration is inconsistent.
    #[error("ESC_ERR_302: Invalid configuration: {0}")]
    InvalidConfig(String),

    // =================================================================
    // Administrative Errors (4xx)
    // =================================================================
    /// New escrows cannot be created while the engine is paused.
    #[error("ESC_ERR_400: Escrow creation is paused")]
    Paused,

    // =================================================================
    // Custody Errors (5xx)
    // =================================================================
    /// The underlying asset movement failed; nothing was changed.
    #[error("ESC_ERR_500: Custody failure: {0}")]
    Custody(#[from] CustodyError),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("ESC_ERR_900: Internal error: {0}")]
    Internal(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, EscrowError>;

impl From<serde_json::Error> for EscrowError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}
