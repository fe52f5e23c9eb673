//! Protocol constants and shared type aliases

use pinocchio::pubkey::Pubkey;

/// Maximum number of configured plans per pool
pub const MAX_PLANS: usize = 8;

/// Maximum live lots per (plan, user) position
pub const MAX_LOTS: usize = 16;

/// Referral cascade depth cap. Defensive bound on every upline walk.
pub const REFERRAL_TIERS: usize = 3;

/// Default tier percentages of realized reward (tier 1..=3)
pub const DEFAULT_TIER_PERCENT: [u8; REFERRAL_TIERS] = [3, 2, 1];

/// Seconds per (non-leap) accrual year
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// `set_penalty` rejects values at or above this
pub const EARLY_PENALTY_LIMIT: u8 = 15;

/// `set_referral_percent` rejects per-tier values at or above this
pub const REFERRAL_PERCENT_LIMIT: u8 = 10;

/// Unbound-referrer sentinel (the all-zero pubkey)
pub const ZERO_PUBKEY: Pubkey = [0u8; 32];
