//! System-wide constants for the TradeVault escrow engine.

/// Basis-point denominator: 10 000 bps = 100%.
pub const BPS_DENOMINATOR: u16 = 10_000;

/// Default protocol fee charged on release (0.5%).
pub const DEFAULT_FEE_BPS: u16 = 50;

/// Default upper bound the owner may set the fee to (10%).
pub const DEFAULT_MAX_FEE_BPS: u16 = 1_000;

/// Default window after creation before the depositor may reclaim funds (24h).
pub const DEFAULT_ESCROW_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Longest timeout window a configuration may request (365 days).
pub const MAX_ESCROW_TIMEOUT_SECS: u64 = 365 * 24 * 60 * 60;

/// First identifier handed out by the escrow store. Zero is reserved.
pub const FIRST_ESCROW_ID: u64 = 1;

/// Domain separator mixed into every audit journal hash.
pub const JOURNAL_DOMAIN: &[u8] = b"tradevault:journal:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "TradeVault";
