//! Pure state model of the staking ledger

use arrayvec::ArrayVec;

pub const MAX_LOTS: usize = 8; // Small fixed bound for the model
pub const MAX_USERS: usize = 6;
pub const REFERRAL_TIERS: usize = 3;

/// Unbound-referrer sentinel
pub const NO_REFERRER: usize = usize::MAX;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanParams {
    pub rate_percent: u16,
    pub lock_secs: u64,
    pub penalty_percent: u8,
    pub concluded: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lot {
    pub principal: u128, // Monotonically decreasing until 0
    pub opened_at: u64,
    pub matures_at: u64,
    pub last_accrual_at: u64,
    pub unclaimed: u128,
    pub claimed: u128,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub lots: ArrayVec<Lot, MAX_LOTS>,
    pub referrer: usize, // NO_REFERRER when unbound; set at most once
    pub downline_count: u32,
    pub referral_earned: u128,
    pub referral_claimable: u128,

    // Cumulative counters for conservation checks
    pub total_deposited: u128,
    pub principal_withdrawn: u128,
    pub penalty_paid: u128,
    pub rewards_paid: u128,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct State {
    pub custody: u128,     // Mirror of the vault token balance
    pub outstanding: u128, // Sum of all lot principals
    pub plan: PlanParams,
    pub tier_percent: [u8; REFERRAL_TIERS],
    pub users: ArrayVec<User, MAX_USERS>,
}

impl Default for PlanParams {
    fn default() -> Self {
        Self {
            rate_percent: 18,
            lock_secs: 30 * 86_400,
            penalty_percent: 15,
            concluded: false,
        }
    }
}

impl Default for User {
    fn default() -> Self {
        Self {
            lots: ArrayVec::new(),
            referrer: NO_REFERRER,
            downline_count: 0,
            referral_earned: 0,
            referral_claimable: 0,
            total_deposited: 0,
            principal_withdrawn: 0,
            penalty_paid: 0,
            rewards_paid: 0,
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self {
            custody: 0,
            outstanding: 0,
            plan: PlanParams::default(),
            tier_percent: [3, 2, 1],
            users: ArrayVec::new(),
        }
    }
}
