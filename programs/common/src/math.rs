//! Fixed-point reward, penalty, and allocation math
//!
//! All amounts are integers; every division is a floor division. No
//! floating point anywhere, so the scenario arithmetic is bit-exact.

use crate::types::SECONDS_PER_YEAR;

/// Time-proportional reward for one accrual window:
/// `floor(principal * elapsed * rate_percent / 100 / SECONDS_PER_YEAR)`
///
/// Fractional units below the resolution of one elapsed window are not
/// paid; they are intentionally truncated, not carried.
#[inline]
pub fn accrued_reward(principal: u128, elapsed_secs: u64, rate_percent: u16) -> u128 {
    let numerator = principal
        .saturating_mul(elapsed_secs as u128)
        .saturating_mul(rate_percent as u128);
    numerator / (100 * SECONDS_PER_YEAR as u128)
}

/// `floor(amount * percent / 100)` — penalties and referral tiers
#[inline]
pub fn percent_of(amount: u128, percent: u8) -> u128 {
    amount.saturating_mul(percent as u128) / 100
}

/// Proportional share `floor(amount * part / total)`; 0 when `total == 0`
#[inline]
pub fn pro_rata(amount: u128, part: u128, total: u128) -> u128 {
    if total == 0 {
        return 0;
    }
    amount.saturating_mul(part) / total
}
