//! Protocol fee arithmetic.
//!
//! Fees are expressed in basis points and always rounded down, so the fee
//! collector receives the floor and the remainder stays with the recipient.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Amount, constants::BPS_DENOMINATOR};

/// Result of splitting a settled amount between recipient and fee collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    /// Amount paid to the receiving party.
    pub net: Amount,
    /// Amount paid to the fee collector.
    pub fee: Amount,
}

impl FeeSplit {
    /// `net + fee`. Always equals the amount the split was computed from.
    #[must_use]
    pub fn total(&self) -> Amount {
        self.net + self.fee
    }
}

/// Split `amount` into `(net, fee)` at `fee_bps`.
///
/// `fee = floor(amount * fee_bps / 10_000)`, computed without the full
/// product so any `u128` amount is safe. Rates above 100% are clamped.
#[must_use]
pub fn compute_fee(amount: Amount, fee_bps: u16) -> FeeSplit {
    let bps = Amount::from(fee_bps.min(BPS_DENOMINATOR));
    let denom = Amount::from(BPS_DENOMINATOR);
    let fee = (amount / denom) * bps + (amount % denom) * bps / denom;
    FeeSplit {
        net: amount - fee,
        fee,
    }
}

/// Human-readable percentage for a basis-point rate (50 bps → 0.50).
#[must_use]
pub fn bps_to_percent(fee_bps: u16) -> Decimal {
    Decimal::new(i64::from(fee_bps), 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifty_bps_on_one_million() {
        let split = compute_fee(1_000_000, 50);
        assert_eq!(split.fee, 5_000);
        assert_eq!(split.net, 995_000);
    }

    #[test]
    fn small_amounts_round_fee_down() {
        // 0.5% of 100 is 0.5 → floor to 0.
        let split = compute_fee(100, 50);
        assert_eq!(split.fee, 0);
        assert_eq!(split.net, 100);

        let split = compute_fee(199, 50);
        assert_eq!(split.fee, 0);
        let split = compute_fee(200, 50);
        assert_eq!(split.fee, 1);
    }

    #[test]
    fn zero_rate_charges_nothing() {
        let split = compute_fee(123_456_789, 0);
        assert_eq!(split.fee, 0);
        assert_eq!(split.net, 123_456_789);
    }

    #[test]
    fn full_rate_takes_everything() {
        let split = compute_fee(777, BPS_DENOMINATOR);
        assert_eq!(split.fee, 777);
        assert_eq!(split.net, 0);
    }

    #[test]
    fn rate_above_full_is_clamped() {
        let split = compute_fee(1_000, u16::MAX);
        assert_eq!(split.fee, 1_000);
        assert_eq!(split.net, 0);
    }

    #[test]
    fn max_amount_does_not_overflow() {
        let split = compute_fee(u128::MAX, 9_999);
        assert_eq!(split.total(), u128::MAX);
        assert!(split.fee < u128::MAX);
    }

    #[test]
    fn net_plus_fee_is_exact_for_random_inputs() {
        for _ in 0..1_000 {
            let amount: u128 = rand::random::<u64>().into();
            let bps = rand::random::<u16>() % (BPS_DENOMINATOR + 1);
            let split = compute_fee(amount, bps);
            assert_eq!(split.total(), amount, "amount={amount} bps={bps}");
            assert_eq!(split.fee, amount * u128::from(bps) / 10_000);
        }
    }

    #[test]
    fn percent_formatting() {
        assert_eq!(bps_to_percent(50).to_string(), "0.50");
        assert_eq!(bps_to_percent(1_000).to_string(), "10.00");
    }
}
