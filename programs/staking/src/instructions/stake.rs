//! Stake instruction - deposit into a plan, opening a new lot

use crate::instructions::record_bind_walk;
use crate::state::{Position, ReferralAccount, StakePool};
use pinocchio::{msg, pubkey::Pubkey};
use stakepool_common::*;

/// Process a stake deposit
///
/// The deposit amount is measured as the vault balance delta against
/// the custody mirror, so fee-bearing transfers credit only what the
/// vault actually received. Pending accrual on existing lots is folded
/// before the new lot is appended.
///
/// A nonzero `referrer` binds the user's upline on first use; a fresh
/// bind walks up to three ancestors and counts the new downline in
/// each, so `uplines` must carry the referrer's bound chain.
///
/// Returns the lot id and the credited amount.
pub fn process_stake(
    pool: &mut StakePool,
    position: &mut Position,
    referral: &mut ReferralAccount,
    uplines: &mut [&mut ReferralAccount],
    referrer: &Pubkey,
    plan_id: u8,
    vault_balance: u64,
    now: u64,
) -> Result<(u64, u128), StakingError> {
    if position.plan_id != plan_id {
        return Err(StakingError::InvalidAccount);
    }

    let plan = pool.plan(plan_id)?;
    if plan.is_concluded() {
        msg!("Error: Plan no longer accepts deposits");
        return Err(StakingError::PlanConcluded);
    }
    let rate = plan.rate_percent;
    let lock = plan.lock_duration_secs;

    let received = pool.sync_deposit(vault_balance);
    if received == 0 {
        msg!("Error: No funds received in vault");
        return Err(StakingError::AmountMustBePositive);
    }

    // Fold before the principal changes
    position.fold_accrual(rate, now);

    let (lot_id, first_ever) = position.open_lot(received, now, lock)?;
    pool.record_deposit(plan_id, received, first_ever)?;

    let user = referral.owner;
    if referral.bind(referrer)? {
        record_bind_walk(&user, referrer, uplines)?;
    }

    Ok((lot_id, received))
}
