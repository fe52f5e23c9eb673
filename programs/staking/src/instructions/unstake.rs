//! Unstake instruction - withdraw principal with reward settlement

use crate::instructions::distribute_referral_rewards;
use crate::state::{Position, ReferralAccount, StakePool};
use pinocchio::pubkey::Pubkey;
use stakepool_common::*;

/// Process a principal withdrawal
///
/// Folds pending accrual, plans the draw across lots (matured lots
/// first at zero penalty, then unmatured lots with the plan's penalty
/// on the principal portion), checks the pool solvency guard, and only
/// then commits. The realized reward feeds the referral cascade.
///
/// Returns the net payout owed to the user.
pub fn process_unstake(
    pool: &mut StakePool,
    position: &mut Position,
    first_upline: &Pubkey,
    ancestors: &mut [&mut ReferralAccount],
    plan_id: u8,
    amount: u128,
    now: u64,
) -> Result<u128, StakingError> {
    if position.plan_id != plan_id {
        return Err(StakingError::InvalidAccount);
    }

    let plan = pool.plan(plan_id)?;
    let rate = plan.rate_percent;
    let penalty_percent = plan.early_penalty_percent;
    let tier_percent = pool.referral_tier_percent;

    position.fold_accrual(rate, now);

    let plan_out = position.plan_withdrawal(amount, penalty_percent, now)?;
    let net = plan_out.net_payout();

    pool.settle_unstake(plan_id, amount, net)?;
    position.commit_withdrawal(&plan_out);

    distribute_referral_rewards(&tier_percent, first_upline, plan_out.reward, ancestors)?;

    position.compact();
    Ok(net)
}
