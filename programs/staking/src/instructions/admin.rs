//! Admin instructions - plan parameter updates, custody sync, recovery

use crate::state::StakePool;
use pinocchio::{msg, pubkey::Pubkey};
use stakepool_common::*;

fn require_admin(pool: &StakePool, authority: &Pubkey) -> Result<(), StakingError> {
    if !pool.is_admin(authority) {
        msg!("Error: Authority is not the pool admin");
        return Err(StakingError::Unauthorized);
    }
    Ok(())
}

/// Update a plan's annual reward rate
pub fn process_set_plan_rate(
    pool: &mut StakePool,
    authority: &Pubkey,
    plan_id: u8,
    rate_percent: u16,
) -> Result<(), StakingError> {
    require_admin(pool, authority)?;
    pool.set_rate(plan_id, rate_percent)
}

/// Update a plan's lock duration
pub fn process_set_plan_duration(
    pool: &mut StakePool,
    authority: &Pubkey,
    plan_id: u8,
    lock_secs: u64,
) -> Result<(), StakingError> {
    require_admin(pool, authority)?;
    pool.set_duration(plan_id, lock_secs)
}

/// Update a plan's early-withdrawal penalty (bounded below 15%)
pub fn process_set_plan_penalty(
    pool: &mut StakePool,
    authority: &Pubkey,
    plan_id: u8,
    penalty_percent: u8,
) -> Result<(), StakingError> {
    require_admin(pool, authority)?;
    pool.set_penalty(plan_id, penalty_percent)
}

/// Conclude or reopen a plan for new deposits
pub fn process_set_plan_concluded(
    pool: &mut StakePool,
    authority: &Pubkey,
    plan_id: u8,
    concluded: bool,
) -> Result<(), StakingError> {
    require_admin(pool, authority)?;
    pool.set_concluded(plan_id, concluded)
}

/// Update the referral cascade percentages (each bounded below 10%)
pub fn process_set_referral_percent(
    pool: &mut StakePool,
    authority: &Pubkey,
    tier_percent: [u8; REFERRAL_TIERS],
) -> Result<(), StakingError> {
    require_admin(pool, authority)?;
    pool.set_referral_percent(tier_percent)
}

/// Authorize release of a non-stake asset sent to the program by
/// mistake. The stake asset itself can never be swept this way; user
/// funds stay behind the solvency guard.
pub fn process_recover_foreign_asset(
    pool: &StakePool,
    authority: &Pubkey,
    foreign_mint: &Pubkey,
) -> Result<(), StakingError> {
    require_admin(pool, authority)?;
    if foreign_mint == &pool.stake_mint {
        msg!("Error: Cannot recover the staking asset");
        return Err(StakingError::InvalidParameter);
    }
    Ok(())
}

/// Fold a direct vault top-up (reward funding) into the custody
/// mirror. Returns the amount recognized.
pub fn process_sync_custody(
    pool: &mut StakePool,
    authority: &Pubkey,
    vault_balance: u64,
) -> Result<u128, StakingError> {
    require_admin(pool, authority)?;
    Ok(pool.sync_deposit(vault_balance))
}
