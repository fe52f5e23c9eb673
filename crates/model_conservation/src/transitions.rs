//! State transition functions - all total, no panics
//!
//! Invalid inputs (unknown user, zero amount, insufficient balance,
//! solvency violation) leave the state unchanged, mirroring the abort
//! semantics of the program: a failed call commits nothing.

use arrayvec::ArrayVec;

use crate::helpers::*;
use crate::math::*;
use crate::state::*;

/// Top up custody without opening a lot (reward funding)
pub fn fund(mut s: State, amount: u128) -> State {
    s.custody = add_u128(s.custody, amount);
    s
}

/// Open a new lot for `uid` (deposit)
pub fn deposit(mut s: State, uid: usize, amount: u128, now: u64) -> State {
    if uid >= s.users.len() || amount == 0 || s.plan.concluded {
        return s;
    }
    if s.users[uid].lots.is_full() {
        return s;
    }

    let matures_at = now.saturating_add(s.plan.lock_secs);
    let user = &mut s.users[uid];
    user.lots.push(Lot {
        principal: amount,
        opened_at: now,
        matures_at,
        last_accrual_at: now,
        unclaimed: 0,
        claimed: 0,
    });
    user.total_deposited = add_u128(user.total_deposited, amount);

    s.custody = add_u128(s.custody, amount);
    s.outstanding = add_u128(s.outstanding, amount);
    s
}

/// Bind `uid` to `referrer` (at most once) and increment ancestor
/// downline counters, walking at most `REFERRAL_TIERS` hops
pub fn bind(mut s: State, uid: usize, referrer: usize) -> State {
    if uid >= s.users.len() || referrer >= s.users.len() || referrer == uid {
        return s;
    }
    if s.users[uid].referrer != NO_REFERRER {
        return s;
    }

    s.users[uid].referrer = referrer;

    let mut ancestor = referrer;
    for _ in 0..REFERRAL_TIERS {
        if ancestor == NO_REFERRER || ancestor >= s.users.len() {
            break;
        }
        s.users[ancestor].downline_count = s.users[ancestor].downline_count.saturating_add(1);
        ancestor = s.users[ancestor].referrer;
    }
    s
}

/// Credit the tiered referral cascade for a realized reward
fn distribute(mut s: State, uid: usize, reward: u128) -> State {
    if uid >= s.users.len() || reward == 0 {
        return s;
    }
    let mut ancestor = s.users[uid].referrer;
    for tier in 0..REFERRAL_TIERS {
        if ancestor == NO_REFERRER || ancestor >= s.users.len() {
            break;
        }
        let share = percent_of(reward, s.tier_percent[tier]);
        let acc = &mut s.users[ancestor];
        acc.referral_earned = add_u128(acc.referral_earned, share);
        acc.referral_claimable = add_u128(acc.referral_claimable, share);
        ancestor = acc.referrer;
    }
    s
}

/// Per-lot draw planned by the withdrawal allocator
#[derive(Clone, Copy, Debug)]
struct Draw {
    lot: usize,
    consumed: u128,
    reward: u128,
    penalized: bool,
}

/// Two-pass principal withdrawal: matured lots first at zero penalty,
/// then unmatured lots in sequence order with the early penalty applied
/// to the principal portion. Accrued reward is never penalized.
pub fn unstake(mut s: State, uid: usize, amount: u128, now: u64) -> State {
    if uid >= s.users.len() || amount == 0 {
        return s;
    }

    let before = s.clone();

    // Fold accrual before any principal mutation
    let rate = s.plan.rate_percent;
    fold_accrual(&mut s.users[uid], rate, now);

    let user = &s.users[uid];
    if amount > total_principal(user) {
        return before;
    }

    // Plan the allocation read-only
    let mut draws: ArrayVec<Draw, MAX_LOTS> = ArrayVec::new();
    let mut remaining = amount;
    for pass in 0..2 {
        let penalized = pass == 1;
        for (i, lot) in user.lots.iter().enumerate() {
            if remaining == 0 {
                break;
            }
            let matured = lot.matures_at <= now;
            if matured == penalized || lot.principal == 0 {
                continue;
            }
            let consumed = min_u128(lot.principal, remaining);
            let reward = if consumed == lot.principal {
                lot.unclaimed
            } else {
                pro_rata(lot.unclaimed, consumed, lot.principal)
            };
            draws.push(Draw { lot: i, consumed, reward, penalized });
            remaining = sub_u128(remaining, consumed);
        }
    }
    if remaining != 0 {
        return before; // Defensive re-check
    }

    let penalty = draws
        .iter()
        .filter(|d| d.penalized)
        .fold(0u128, |acc, d| add_u128(acc, percent_of(d.consumed, s.plan.penalty_percent)));
    let reward = draws.iter().fold(0u128, |acc, d| add_u128(acc, d.reward));
    let net = add_u128(sub_u128(amount, penalty), reward);

    // Solvency against the entry custody snapshot, with this call's
    // principal release applied to the outstanding side
    if s.custody < add_u128(net, sub_u128(s.outstanding, amount)) {
        return before;
    }

    // Commit
    for d in draws.iter() {
        let lot = &mut s.users[uid].lots[d.lot];
        lot.principal = sub_u128(lot.principal, d.consumed);
        lot.unclaimed = sub_u128(lot.unclaimed, d.reward);
    }
    let user = &mut s.users[uid];
    user.principal_withdrawn = add_u128(user.principal_withdrawn, amount);
    user.penalty_paid = add_u128(user.penalty_paid, penalty);
    user.rewards_paid = add_u128(user.rewards_paid, reward);
    s.outstanding = sub_u128(s.outstanding, amount);
    s.custody = sub_u128(s.custody, net);

    let mut s = distribute(s, uid, reward);
    compact(&mut s.users[uid]);
    s
}

/// Proportional reward claim across lots, with the rounding remainder
/// assigned in sequence order so exactly `amount` is deducted and paid
pub fn claim(mut s: State, uid: usize, amount: u128, now: u64) -> State {
    if uid >= s.users.len() || amount == 0 {
        return s;
    }

    let before = s.clone();

    let rate = s.plan.rate_percent;
    fold_accrual(&mut s.users[uid], rate, now);

    let user = &s.users[uid];
    let total = total_unclaimed(user);
    if total == 0 || amount > total {
        return before;
    }

    // Solvency: claims pay out without releasing principal
    if s.custody < add_u128(amount, s.outstanding) {
        return before;
    }

    // Floor split, then remainder in sequence order
    let mut takes: ArrayVec<u128, MAX_LOTS> = ArrayVec::new();
    let mut assigned = 0u128;
    for lot in user.lots.iter() {
        let take = pro_rata(amount, lot.unclaimed, total);
        takes.push(take);
        assigned = add_u128(assigned, take);
    }
    let mut remainder = sub_u128(amount, assigned);
    for (i, lot) in user.lots.iter().enumerate() {
        if remainder == 0 {
            break;
        }
        let headroom = sub_u128(lot.unclaimed, takes[i]);
        let extra = min_u128(headroom, remainder);
        takes[i] = add_u128(takes[i], extra);
        remainder = sub_u128(remainder, extra);
    }

    // Commit
    let user = &mut s.users[uid];
    for (i, take) in takes.iter().enumerate() {
        user.lots[i].unclaimed = sub_u128(user.lots[i].unclaimed, *take);
        user.lots[i].claimed = add_u128(user.lots[i].claimed, *take);
    }
    user.rewards_paid = add_u128(user.rewards_paid, amount);
    s.custody = sub_u128(s.custody, amount);

    let mut s = distribute(s, uid, amount);
    compact(&mut s.users[uid]);
    s
}

/// Withdraw accumulated referral earnings
pub fn withdraw_referral(mut s: State, uid: usize, amount: u128) -> State {
    if uid >= s.users.len() || amount == 0 {
        return s;
    }
    if amount > s.users[uid].referral_claimable {
        return s;
    }
    if s.custody < add_u128(amount, s.outstanding) {
        return s;
    }

    s.users[uid].referral_claimable = sub_u128(s.users[uid].referral_claimable, amount);
    s.custody = sub_u128(s.custody, amount);
    s
}
