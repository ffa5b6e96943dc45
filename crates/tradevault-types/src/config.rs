//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::{AccountId, EscrowError, Result, constants};

/// Configuration for a single escrow engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Account that receives protocol fees.
    pub fee_collector: AccountId,
    /// Fee charged on release, in basis points.
    #[serde(default = "default_fee_bps")]
    pub fee_bps: u16,
    /// Ceiling for `fee_bps`; the owner cannot raise the fee past this.
    #[serde(default = "default_max_fee_bps")]
    pub max_fee_bps: u16,
    /// Seconds after creation before a PENDING escrow can be reclaimed.
    #[serde(default = "default_escrow_timeout_secs")]
    pub escrow_timeout_secs: u64,
}

fn default_fee_bps() -> u16 {
    constants::DEFAULT_FEE_BPS
}

fn default_max_fee_bps() -> u16 {
    constants::DEFAULT_MAX_FEE_BPS
}

fn default_escrow_timeout_secs() -> u64 {
    constants::DEFAULT_ESCROW_TIMEOUT_SECS
}

impl EngineConfig {
    /// Default settings paying fees to `fee_collector`.
    #[must_use]
    pub fn new(fee_collector: AccountId) -> Self {
        Self {
            fee_collector,
            fee_bps: constants::DEFAULT_FEE_BPS,
            max_fee_bps: constants::DEFAULT_MAX_FEE_BPS,
            escrow_timeout_secs: constants::DEFAULT_ESCROW_TIMEOUT_SECS,
        }
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_fee_bps > constants::BPS_DENOMINATOR {
            return Err(EscrowError::InvalidConfig(format!(
                "max_fee_bps {} exceeds {}",
                self.max_fee_bps,
                constants::BPS_DENOMINATOR
            )));
        }
        if self.fee_bps > self.max_fee_bps {
            return Err(EscrowError::FeeTooHigh {
                requested: self.fee_bps,
                max: self.max_fee_bps,
            });
        }
        if self.escrow_timeout_secs == 0 {
            return Err(EscrowError::InvalidConfig(
                "escrow_timeout_secs must be non-zero".to_string(),
            ));
        }
        if self.escrow_timeout_secs > constants::MAX_ESCROW_TIMEOUT_SECS {
            return Err(EscrowError::InvalidConfig(format!(
                "escrow_timeout_secs {} exceeds {}",
                self.escrow_timeout_secs,
                constants::MAX_ESCROW_TIMEOUT_SECS
            )));
        }
        Ok(())
    }

    /// The timeout window as a `chrono` duration, capped at the maximum.
    #[must_use]
    pub fn escrow_timeout(&self) -> chrono::Duration {
        let secs = self
            .escrow_timeout_secs
            .min(constants::MAX_ESCROW_TIMEOUT_SECS);
        chrono::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = EngineConfig::new(AccountId::new());
        assert_eq!(cfg.fee_bps, 50);
        assert_eq!(cfg.max_fee_bps, 1_000);
        assert_eq!(cfg.escrow_timeout(), chrono::Duration::hours(24));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn from_json_fills_defaults() {
        let collector = AccountId::new();
        let json = format!(r#"{{ "fee_collector": "{collector}" }}"#);
        let cfg = EngineConfig::from_json(&json).unwrap();
        assert_eq!(cfg, EngineConfig::new(collector));
    }

    #[test]
    fn from_json_rejects_fee_above_cap() {
        let json = format!(
            r#"{{ "fee_collector": "{}", "fee_bps": 1500, "max_fee_bps": 1000 }}"#,
            AccountId::new()
        );
        let err = EngineConfig::from_json(&json).unwrap_err();
        assert!(matches!(
            err,
            EscrowError::FeeTooHigh {
                requested: 1500,
                max: 1000
            }
        ));
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut cfg = EngineConfig::new(AccountId::new());
        cfg.escrow_timeout_secs = 0;
        assert!(matches!(
            cfg.validate().unwrap_err(),
            EscrowError::InvalidConfig(_)
        ));
    }

    #[test]
    fn rejects_timeout_above_max() {
        let mut cfg = EngineConfig::new(AccountId::new());
        cfg.escrow_timeout_secs = u64::MAX;
        assert!(cfg.validate().is_err());
        assert_eq!(cfg.escrow_timeout(), chrono::Duration::days(365));
    }

    #[test]
    fn rejects_cap_above_full_rate() {
        let mut cfg = EngineConfig::new(AccountId::new());
        cfg.max_fee_bps = 10_001;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn malformed_json_is_config_error() {
        let err = EngineConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, EscrowError::InvalidConfig(_)));
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = EngineConfig::new(AccountId::new());
        let json = serde_json::to_string(&cfg).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
