//! Safe arithmetic helpers - no unwrap, no panics, no as casts

/// Add u128 with saturation at MAX
pub fn add_u128(a: u128, b: u128) -> u128 {
    a.saturating_add(b)
}

/// Subtract u128 with saturation at 0
pub fn sub_u128(a: u128, b: u128) -> u128 {
    a.saturating_sub(b)
}

/// Multiply u128 with saturation
pub fn mul_u128(a: u128, b: u128) -> u128 {
    a.saturating_mul(b)
}

/// Divide u128 (returns 0 if divisor is 0)
pub fn div_u128(a: u128, b: u128) -> u128 {
    if b == 0 {
        0
    } else {
        a / b
    }
}

/// Minimum of two u128
pub fn min_u128(a: u128, b: u128) -> u128 {
    if a < b { a } else { b }
}

/// Maximum of two u128
pub fn max_u128(a: u128, b: u128) -> u128 {
    if a > b { a } else { b }
}

/// Seconds per (non-leap) accrual year
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Floor-division reward accrual:
/// `principal * elapsed * rate_percent / 100 / SECONDS_PER_YEAR`
///
/// Fractional units below the resolution of one accrual window are not paid.
pub fn accrued_reward(principal: u128, elapsed_secs: u64, rate_percent: u16) -> u128 {
    let numerator = mul_u128(mul_u128(principal, elapsed_secs as u128), rate_percent as u128);
    div_u128(numerator, mul_u128(100, SECONDS_PER_YEAR as u128))
}

/// Percent-of-amount with floor division (penalties, referral tiers)
pub fn percent_of(amount: u128, percent: u8) -> u128 {
    div_u128(mul_u128(amount, percent as u128), 100)
}

/// Proportional share `amount * part / total` (0 when total is 0)
pub fn pro_rata(amount: u128, part: u128, total: u128) -> u128 {
    div_u128(mul_u128(amount, part), total)
}
