//! Invariant checking helpers

use crate::math::*;
use crate::state::*;

/// Sum of a user's lot principals
pub fn total_principal(u: &User) -> u128 {
    u.lots.iter().fold(0u128, |acc, l| add_u128(acc, l.principal))
}

/// Sum of a user's unclaimed accrued rewards
pub fn total_unclaimed(u: &User) -> u128 {
    u.lots.iter().fold(0u128, |acc, l| add_u128(acc, l.unclaimed))
}

/// Fold pending accrual into every lot and stamp `last_accrual_at`.
/// Must run before any principal mutation in the same transition.
pub fn fold_accrual(u: &mut User, rate_percent: u16, now: u64) {
    for lot in u.lots.iter_mut() {
        let elapsed = now.saturating_sub(lot.last_accrual_at);
        let reward = accrued_reward(lot.principal, elapsed, rate_percent);
        lot.unclaimed = add_u128(lot.unclaimed, reward);
        lot.last_accrual_at = now;
    }
}

/// Swap-remove fully drained lots (principal == 0 && unclaimed == 0)
pub fn compact(u: &mut User) {
    let mut i = 0;
    while i < u.lots.len() {
        if u.lots[i].principal == 0 && u.lots[i].unclaimed == 0 {
            u.lots.swap_remove(i);
        } else {
            i += 1;
        }
    }
}

/// Conservation: lot principals equal deposits minus withdrawn principal,
/// for every user
pub fn conservation_ok(s: &State) -> bool {
    s.users.iter().all(|u| {
        total_principal(u) == sub_u128(u.total_deposited, u.principal_withdrawn)
    })
}

/// Outstanding aggregate matches the per-lot sum
pub fn outstanding_ok(s: &State) -> bool {
    let sum = s.users.iter().fold(0u128, |acc, u| add_u128(acc, total_principal(u)));
    s.outstanding == sum
}

/// Solvency: custody covers outstanding principal
pub fn solvent(s: &State) -> bool {
    s.custody >= s.outstanding
}

/// Sum of referral credits across all users
pub fn total_referral_earned(s: &State) -> u128 {
    s.users.iter().fold(0u128, |acc, u| add_u128(acc, u.referral_earned))
}
