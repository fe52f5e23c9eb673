//! Claim instruction - pay out accrued rewards across lots

use crate::instructions::distribute_referral_rewards;
use crate::state::{Position, ReferralAccount, StakePool};
use pinocchio::pubkey::Pubkey;
use stakepool_common::*;

/// Process a reward claim
///
/// Folds pending accrual, splits the requested amount across lots in
/// proportion to each lot's unclaimed balance, checks the pool
/// solvency guard, then commits. Principal is untouched. The claimed
/// amount feeds the referral cascade.
pub fn process_claim(
    pool: &mut StakePool,
    position: &mut Position,
    first_upline: &Pubkey,
    ancestors: &mut [&mut ReferralAccount],
    plan_id: u8,
    amount: u128,
    now: u64,
) -> Result<(), StakingError> {
    if position.plan_id != plan_id {
        return Err(StakingError::InvalidAccount);
    }

    let rate = pool.plan(plan_id)?.rate_percent;
    let tier_percent = pool.referral_tier_percent;

    position.fold_accrual(rate, now);

    let claim = position.plan_claim(amount)?;
    pool.settle_payout(amount)?;
    position.commit_claim(&claim);

    distribute_referral_rewards(&tier_percent, first_upline, amount, ancestors)?;

    position.compact();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Plan, PlanConfig, StakeLot};

    const DAY: u64 = 86_400;

    fn setup(custody: u64) -> (StakePool, Position) {
        let mut pool = StakePool {
            admin: [1; 32],
            stake_mint: [2; 32],
            vault_token_account: [3; 32],
            custody_balance: 0,
            total_outstanding_principal: 0,
            plans: [Plan {
                overall_principal: 0,
                lock_duration_secs: 0,
                position_count: 0,
                rate_percent: 0,
                early_penalty_percent: 0,
                concluded: 0,
            }; MAX_PLANS],
            plan_count: 0,
            bump: 0,
            referral_tier_percent: [0; REFERRAL_TIERS],
            _padding: [0; 11],
        };
        pool.initialize_in_place(
            [1; 32],
            [2; 32],
            [3; 32],
            &[PlanConfig {
                rate_percent: 18,
                lock_duration_secs: 30 * DAY,
                early_penalty_percent: 15,
            }],
            DEFAULT_TIER_PERCENT,
            255,
        )
        .unwrap();
        pool.sync_deposit(custody);

        let mut position = Position {
            owner: [0; 32],
            lots: [StakeLot {
                principal: 0,
                unclaimed_accrued: 0,
                cumulative_claimed: 0,
                lot_id: 0,
                opened_at: 0,
                matures_at: 0,
                last_accrual_at: 0,
            }; MAX_LOTS],
            next_lot_id: 0,
            lot_count: 0,
            plan_id: 0,
            bump: 0,
            _padding: [0; 4],
        };
        position.initialize_in_place([7; 32], 0, 254);

        (pool, position)
    }

    fn stake(pool: &mut StakePool, position: &mut Position, amount: u128, now: u64) {
        let (_, first) = position.open_lot(amount, now, 30 * DAY).unwrap();
        pool.record_deposit(0, amount, first).unwrap();
    }

    #[test]
    fn test_claim_pays_without_touching_principal() {
        let (mut pool, mut position) = setup(1100);
        stake(&mut pool, &mut position, 1000, 0);

        process_claim(&mut pool, &mut position, &ZERO_PUBKEY, &mut [], 0, 14, 30 * DAY)
            .unwrap();
        assert_eq!(position.total_principal(), 1000);
        assert_eq!(position.total_unclaimed(), 0);
        assert_eq!(position.lots[0].cumulative_claimed, 14);
        assert_eq!(pool.custody_balance, 1086);
        assert_eq!(pool.total_outstanding_principal, 1000);
    }

    #[test]
    fn test_claim_fails_when_custody_equals_outstanding() {
        // Scenario: vault holds exactly the outstanding principal
        let (mut pool, mut position) = setup(1000);
        stake(&mut pool, &mut position, 1000, 0);

        let err = process_claim(
            &mut pool,
            &mut position,
            &ZERO_PUBKEY,
            &mut [],
            0,
            1,
            30 * DAY,
        )
        .unwrap_err();
        assert_eq!(err, StakingError::InsufficientPoolBalance);
        assert_eq!(pool.custody_balance, 1000);
    }

    #[test]
    fn test_claim_splits_across_lots_proportionally() {
        let (mut pool, mut position) = setup(2000);
        stake(&mut pool, &mut position, 250, 0);
        stake(&mut pool, &mut position, 750, 0);

        // One year: 45 and 135 unclaimed
        process_claim(&mut pool, &mut position, &ZERO_PUBKEY, &mut [], 0, 100, 365 * DAY)
            .unwrap();
        assert_eq!(position.lots[0].cumulative_claimed, 25);
        assert_eq!(position.lots[1].cumulative_claimed, 75);
        assert_eq!(position.total_unclaimed(), 80);
    }

    #[test]
    fn test_claim_rejects_overdraw() {
        let (mut pool, mut position) = setup(1100);
        stake(&mut pool, &mut position, 1000, 0);

        let err = process_claim(
            &mut pool,
            &mut position,
            &ZERO_PUBKEY,
            &mut [],
            0,
            15,
            30 * DAY,
        )
        .unwrap_err();
        assert_eq!(err, StakingError::InsufficientEarnings);
        // Requested nothing yet: nothing was deducted
        assert_eq!(position.lots[0].cumulative_claimed, 0);
    }

    #[test]
    fn test_claim_requires_full_upline_chain() {
        let (mut pool, mut position) = setup(2000);
        stake(&mut pool, &mut position, 1000, 0);

        let mut tier1 = ReferralAccount {
            owner: [9; 32],
            referrer: [8; 32],
            total_referral_earned: 0,
            claimable_referral_balance: 0,
            downline_count: 1,
            bump: 252,
            _padding: [0; 11],
        };
        let mut ancestors = [&mut tier1];

        // Tier 1 is bound to [8]; omitting that account is rejected
        let err = process_claim(
            &mut pool,
            &mut position,
            &[9; 32],
            &mut ancestors,
            0,
            180,
            365 * DAY,
        )
        .unwrap_err();
        assert_eq!(err, StakingError::InvalidAccount);
    }

    #[test]
    fn test_claim_feeds_referral_cascade() {
        let (mut pool, mut position) = setup(2000);
        stake(&mut pool, &mut position, 1000, 0);

        let mut tier1 = ReferralAccount {
            owner: [9; 32],
            referrer: [8; 32],
            total_referral_earned: 0,
            claimable_referral_balance: 0,
            downline_count: 1,
            bump: 252,
            _padding: [0; 11],
        };
        let mut tier2 = ReferralAccount {
            owner: [8; 32],
            referrer: ZERO_PUBKEY,
            total_referral_earned: 0,
            claimable_referral_balance: 0,
            downline_count: 1,
            bump: 251,
            _padding: [0; 11],
        };
        let mut ancestors = [&mut tier1, &mut tier2];

        // One year accrues 180; claim all of it
        process_claim(&mut pool, &mut position, &[9; 32], &mut ancestors, 0, 180, 365 * DAY)
            .unwrap();
        assert_eq!(tier1.claimable_referral_balance, percent_of(180, 3));
        assert_eq!(tier2.claimable_referral_balance, percent_of(180, 2));
    }
}
