//! Campaign pricing and platform fee math.
//!
//! This module is the single source of truth for campaign prices and the
//! admin-fee rate. Settlement and withdrawals both derive their fee amounts
//! from here so every caller agrees bit-for-bit.

use crate::entities::campaign::{RateLevel, VideoDuration};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Platform cut applied on settlements (charged to the founder on top of the
/// payout) and on withdrawals (taken out of the gross).
pub const ADMIN_FEE_RATE: Decimal = dec!(0.10);

/// Price in MYR for a campaign at the given rate tier and video duration.
///
/// Pure and total over the nine possible inputs; unknown combinations are
/// unrepresentable because both axes are enums.
pub fn campaign_price(rate_level: RateLevel, duration: VideoDuration) -> Decimal {
    use RateLevel::*;
    use VideoDuration::*;
    match (rate_level, duration) {
        (Level1, ThirtySeconds) => dec!(100),
        (Level1, OneMinute) => dec!(150),
        (Level1, ThreeMinutes) => dec!(200),
        (Level2, ThirtySeconds) => dec!(250),
        (Level2, OneMinute) => dec!(375),
        (Level2, ThreeMinutes) => dec!(500),
        (Level3, ThirtySeconds) => dec!(500),
        (Level3, OneMinute) => dec!(750),
        (Level3, ThreeMinutes) => dec!(1000),
    }
}

/// The platform's cut of `amount`.
pub fn admin_fee(amount: Decimal) -> Decimal {
    amount * ADMIN_FEE_RATE
}

/// `amount` plus the platform's cut; what the founder is charged to settle a
/// payout of `amount`.
pub fn amount_with_fee(amount: Decimal) -> Decimal {
    amount + admin_fee(amount)
}
