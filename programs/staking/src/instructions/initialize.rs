//! Initialize instructions - create the pool and per-user accounts

use crate::pda::{derive_pool_pda, derive_position_pda, derive_referral_pda};
use crate::state::{PlanConfig, Position, ReferralAccount, StakePool};
use pinocchio::{account_info::AccountInfo, msg, pubkey::Pubkey};
use stakepool_common::*;

/// Process pool initialization
///
/// Creates the pool account with its full plan set and referral tiers.
/// Called once by the admin at deployment.
///
/// # Arguments
/// * `program_id` - The staking program ID
/// * `pool_account` - The pool account to initialize (must be PDA)
/// * `admin` - The admin authority pubkey
/// * `stake_mint` - The single staking asset mint
/// * `vault_token_account` - The custody token account
/// * `plan_configs` - Plan parameters, fixed at construction
/// * `tier_percent` - Referral cascade percentages
pub fn process_initialize_pool(
    program_id: &Pubkey,
    pool_account: &AccountInfo,
    admin: &Pubkey,
    stake_mint: &Pubkey,
    vault_token_account: &Pubkey,
    plan_configs: &[PlanConfig],
    tier_percent: [u8; REFERRAL_TIERS],
) -> Result<(), StakingError> {
    let (expected_pda, bump) = derive_pool_pda(program_id, admin);

    if pool_account.key() != &expected_pda {
        msg!("Error: Pool account is not the correct PDA");
        return Err(StakingError::InvalidAccount);
    }

    let data = pool_account
        .try_borrow_data()
        .map_err(|_| StakingError::InvalidAccount)?;

    if data.len() != StakePool::LEN {
        msg!("Error: Pool account has incorrect size");
        return Err(StakingError::InvalidAccount);
    }

    // First bytes are the admin pubkey; nonzero means already initialized
    if data[..32].iter().any(|b| *b != 0) {
        msg!("Error: Pool account is already initialized");
        return Err(StakingError::InvalidAccount);
    }

    drop(data);

    // Initialize the pool in-place (avoids stack overflow)
    let pool = unsafe { borrow_account_data_mut::<StakePool>(pool_account)? };

    pool.initialize_in_place(
        *admin,
        *stake_mint,
        *vault_token_account,
        plan_configs,
        tier_percent,
        bump,
    )?;

    msg!("Pool initialized successfully");
    Ok(())
}

/// Process position initialization for a (user, plan) pair
pub fn process_initialize_position(
    program_id: &Pubkey,
    position_account: &AccountInfo,
    pool_key: &Pubkey,
    user: &Pubkey,
    plan_id: u8,
) -> Result<(), StakingError> {
    let (expected_pda, bump) = derive_position_pda(program_id, pool_key, user, plan_id);

    if position_account.key() != &expected_pda {
        msg!("Error: Position account is not the correct PDA");
        return Err(StakingError::InvalidAccount);
    }

    let position = unsafe { borrow_account_data_mut::<Position>(position_account)? };

    if position.is_initialized() {
        msg!("Error: Position account is already initialized");
        return Err(StakingError::InvalidAccount);
    }

    position.initialize_in_place(*user, plan_id, bump);
    Ok(())
}

/// Process referral account initialization for a user
pub fn process_initialize_referral(
    program_id: &Pubkey,
    referral_account: &AccountInfo,
    pool_key: &Pubkey,
    user: &Pubkey,
) -> Result<(), StakingError> {
    let (expected_pda, bump) = derive_referral_pda(program_id, pool_key, user);

    if referral_account.key() != &expected_pda {
        msg!("Error: Referral account is not the correct PDA");
        return Err(StakingError::InvalidAccount);
    }

    let referral = unsafe { borrow_account_data_mut::<ReferralAccount>(referral_account)? };

    if referral.is_initialized() {
        msg!("Error: Referral account is already initialized");
        return Err(StakingError::InvalidAccount);
    }

    referral.initialize_in_place(*user, bump);
    Ok(())
}
