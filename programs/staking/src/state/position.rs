//! Position account: the per-(plan, user) lot arena
//!
//! Lots are held in insertion order in a fixed arena; the live prefix is
//! `lot_count` entries long. Insertion order determines allocation
//! precedence for withdrawals and claims. Compaction swap-removes drained
//! lots, so positional indices are not stable across calls — `lot_id` is
//! the stable identity.
//!
//! Allocators plan read-only first and commit only after every check has
//! passed, so a failed call leaves the arena untouched.

use arrayvec::ArrayVec;
use model_conservation::math::{add_u128, min_u128, sub_u128};
use pinocchio::pubkey::Pubkey;
use stakepool_common::{accrued_reward, percent_of, pro_rata, StakingError, MAX_LOTS, ZERO_PUBKEY};

/// One deposit event, tracked independently with its own maturity clock
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct StakeLot {
    /// Remaining principal; monotonically decreasing until 0
    pub principal: u128,
    /// Accrued reward not yet claimed or paid out
    pub unclaimed_accrued: u128,
    /// Lifetime reward paid out of this lot
    pub cumulative_claimed: u128,
    /// Stable identity across compactions
    pub lot_id: u64,
    /// Deposit timestamp
    pub opened_at: u64,
    /// `opened_at + lock_duration`; withdrawable without penalty after this
    pub matures_at: u64,
    /// Last accrual fold timestamp
    pub last_accrual_at: u64,
}

/// Position account
/// PDA: ["position", pool, user, plan_id]
#[repr(C)]
pub struct Position {
    /// Owning user
    pub owner: Pubkey,
    /// Lot arena; first `lot_count` entries are live
    pub lots: [StakeLot; MAX_LOTS],
    /// Next lot id to assign (also counts lots ever opened)
    pub next_lot_id: u64,
    /// Live lots
    pub lot_count: u16,
    /// Plan this position belongs to
    pub plan_id: u8,
    /// Bump seed
    pub bump: u8,
    /// Padding
    pub _padding: [u8; 4],
}

/// One planned principal draw against a lot
#[derive(Debug, Clone, Copy)]
struct LotDraw {
    lot: usize,
    consumed: u128,
    reward: u128,
    penalized: bool,
}

/// Withdrawal allocation computed by the two-pass planner
#[derive(Debug)]
pub struct WithdrawalPlan {
    draws: ArrayVec<LotDraw, MAX_LOTS>,
    /// Principal consumed (equals the requested amount)
    pub principal: u128,
    /// Penalty withheld from the principal returned
    pub penalty: u128,
    /// Accrued reward realized alongside the principal
    pub reward: u128,
}

impl WithdrawalPlan {
    /// Net amount paid to the user
    pub fn net_payout(&self) -> u128 {
        add_u128(sub_u128(self.principal, self.penalty), self.reward)
    }
}

/// Claim allocation: per-lot deductions summing to the requested amount
#[derive(Debug)]
pub struct ClaimPlan {
    takes: ArrayVec<u128, MAX_LOTS>,
    /// Total paid to the user (equals the requested amount)
    pub amount: u128,
}

impl Position {
    pub const LEN: usize = core::mem::size_of::<Self>();

    const EMPTY_LOT: StakeLot = StakeLot {
        principal: 0,
        unclaimed_accrued: 0,
        cumulative_claimed: 0,
        lot_id: 0,
        opened_at: 0,
        matures_at: 0,
        last_accrual_at: 0,
    };

    pub fn is_initialized(&self) -> bool {
        self.owner != ZERO_PUBKEY
    }

    /// Initialize in-place on first use
    pub fn initialize_in_place(&mut self, owner: Pubkey, plan_id: u8, bump: u8) {
        self.owner = owner;
        self.next_lot_id = 0;
        self.lot_count = 0;
        self.plan_id = plan_id;
        self.bump = bump;
        self._padding = [0; 4];
        self.lots = [Self::EMPTY_LOT; MAX_LOTS];
    }

    fn live(&self) -> &[StakeLot] {
        &self.lots[..self.lot_count as usize]
    }

    /// Sum of live lot principals
    pub fn total_principal(&self) -> u128 {
        self.live().iter().fold(0u128, |acc, l| add_u128(acc, l.principal))
    }

    /// Sum of live unclaimed accrued rewards
    pub fn total_unclaimed(&self) -> u128 {
        self.live()
            .iter()
            .fold(0u128, |acc, l| add_u128(acc, l.unclaimed_accrued))
    }

    /// Fold pending accrual into every live lot and stamp
    /// `last_accrual_at`. Runs at the top of every mutating operation,
    /// before any principal changes, so accrual is never computed
    /// against an already-reduced principal.
    pub fn fold_accrual(&mut self, rate_percent: u16, now: u64) {
        for lot in self.lots[..self.lot_count as usize].iter_mut() {
            let elapsed = now.saturating_sub(lot.last_accrual_at);
            let reward = accrued_reward(lot.principal, elapsed, rate_percent);
            lot.unclaimed_accrued = add_u128(lot.unclaimed_accrued, reward);
            lot.last_accrual_at = now;
        }
    }

    /// Append a new lot. Returns the assigned lot id and whether this is
    /// the user's first lot ever in the plan.
    pub fn open_lot(
        &mut self,
        amount: u128,
        now: u64,
        lock_duration_secs: u64,
    ) -> Result<(u64, bool), StakingError> {
        if amount == 0 {
            return Err(StakingError::AmountMustBePositive);
        }
        if self.lot_count as usize >= MAX_LOTS {
            return Err(StakingError::PositionFull);
        }

        let first_ever = self.next_lot_id == 0;
        let lot_id = self.next_lot_id;
        self.lots[self.lot_count as usize] = StakeLot {
            principal: amount,
            unclaimed_accrued: 0,
            cumulative_claimed: 0,
            lot_id,
            opened_at: now,
            matures_at: now.saturating_add(lock_duration_secs),
            last_accrual_at: now,
        };
        self.next_lot_id += 1;
        self.lot_count += 1;
        Ok((lot_id, first_ever))
    }

    /// Plan a principal withdrawal across the live lots in two ordered
    /// passes: matured lots at zero penalty first, then unmatured lots
    /// in sequence order with the penalty applied to the principal
    /// portion. The reward portion is never penalized.
    ///
    /// Requires `fold_accrual` to have run at `now`. Read-only; commit
    /// with [`Position::commit_withdrawal`].
    pub fn plan_withdrawal(
        &self,
        amount: u128,
        penalty_percent: u8,
        now: u64,
    ) -> Result<WithdrawalPlan, StakingError> {
        if amount == 0 {
            return Err(StakingError::AmountMustBePositive);
        }
        if amount > self.total_principal() {
            return Err(StakingError::InsufficientPrincipal);
        }

        let mut draws: ArrayVec<LotDraw, MAX_LOTS> = ArrayVec::new();
        let mut penalty = 0u128;
        let mut reward = 0u128;
        let mut remaining = amount;

        for pass in 0..2 {
            let penalized = pass == 1;
            for (i, lot) in self.live().iter().enumerate() {
                if remaining == 0 {
                    break;
                }
                let matured = lot.matures_at <= now;
                if matured == penalized || lot.principal == 0 {
                    continue;
                }

                let consumed = min_u128(lot.principal, remaining);
                // Reward share for the consumed slice; the whole
                // unclaimed ledger when the lot is fully drained
                let lot_reward = if consumed == lot.principal {
                    lot.unclaimed_accrued
                } else {
                    pro_rata(lot.unclaimed_accrued, consumed, lot.principal)
                };
                if penalized {
                    penalty = add_u128(penalty, percent_of(consumed, penalty_percent));
                }
                reward = add_u128(reward, lot_reward);
                remaining = sub_u128(remaining, consumed);
                draws.push(LotDraw { lot: i, consumed, reward: lot_reward, penalized });
            }
        }

        // Defensive re-check; unreachable given the upfront balance check
        if remaining != 0 {
            return Err(StakingError::InsufficientPrincipal);
        }

        Ok(WithdrawalPlan { draws, principal: amount, penalty, reward })
    }

    /// Apply a planned withdrawal to the lots
    pub fn commit_withdrawal(&mut self, plan: &WithdrawalPlan) {
        for d in plan.draws.iter() {
            let lot = &mut self.lots[d.lot];
            lot.principal = sub_u128(lot.principal, d.consumed);
            lot.unclaimed_accrued = sub_u128(lot.unclaimed_accrued, d.reward);
        }
    }

    /// Plan a proportional reward claim: floor split by unclaimed share,
    /// then the rounding remainder assigned in sequence order up to each
    /// lot's balance, so exactly `amount` is deducted and paid.
    ///
    /// Requires `fold_accrual` to have run first.
    pub fn plan_claim(&self, amount: u128) -> Result<ClaimPlan, StakingError> {
        if amount == 0 {
            return Err(StakingError::AmountMustBePositive);
        }
        let total = self.total_unclaimed();
        if total == 0 {
            return Err(StakingError::NoEarnings);
        }
        if amount > total {
            return Err(StakingError::InsufficientEarnings);
        }

        let mut takes: ArrayVec<u128, MAX_LOTS> = ArrayVec::new();
        let mut assigned = 0u128;
        for lot in self.live() {
            let take = pro_rata(amount, lot.unclaimed_accrued, total);
            takes.push(take);
            assigned = add_u128(assigned, take);
        }

        let mut remainder = sub_u128(amount, assigned);
        for (i, lot) in self.live().iter().enumerate() {
            if remainder == 0 {
                break;
            }
            let headroom = sub_u128(lot.unclaimed_accrued, takes[i]);
            let extra = min_u128(headroom, remainder);
            takes[i] = add_u128(takes[i], extra);
            remainder = sub_u128(remainder, extra);
        }

        Ok(ClaimPlan { takes, amount })
    }

    /// Apply a planned claim to the lots
    pub fn commit_claim(&mut self, plan: &ClaimPlan) {
        for (i, take) in plan.takes.iter().enumerate() {
            let lot = &mut self.lots[i];
            lot.unclaimed_accrued = sub_u128(lot.unclaimed_accrued, *take);
            lot.cumulative_claimed = add_u128(lot.cumulative_claimed, *take);
        }
    }

    /// Swap-remove every fully drained lot (zero principal, zero
    /// unclaimed). Idempotent; does not preserve the position of the
    /// lot swapped into a freed slot. Returns the number removed.
    pub fn compact(&mut self) -> usize {
        let mut removed = 0;
        let mut i = 0;
        while i < self.lot_count as usize {
            let lot = &self.lots[i];
            if lot.principal == 0 && lot.unclaimed_accrued == 0 {
                let last = self.lot_count as usize - 1;
                self.lots[i] = self.lots[last];
                self.lots[last] = Self::EMPTY_LOT;
                self.lot_count -= 1;
                removed += 1;
            } else {
                i += 1;
            }
        }
        removed
    }
}
