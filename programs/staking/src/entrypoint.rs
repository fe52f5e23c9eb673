//! Staking program entrypoint

use pinocchio::{
    account_info::AccountInfo,
    msg,
    pubkey::Pubkey,
    sysvars::{clock::Clock, Sysvar},
    ProgramResult,
};

use crate::instructions::{
    process_claim, process_initialize_pool, process_initialize_position,
    process_initialize_referral, process_recover_foreign_asset, process_set_plan_concluded,
    process_set_plan_duration, process_set_plan_penalty, process_set_plan_rate,
    process_set_referral_percent, process_stake, process_sync_custody, process_unstake,
    process_withdraw_referral, StakingInstruction,
};
use crate::state::{PlanConfig, Position, ReferralAccount, StakePool};
use arrayvec::ArrayVec;
use pinocchio_log::log;
use stakepool_common::{
    borrow_account_data_mut, read_token_amount, validate_owner, validate_signer,
    validate_writable, InstructionReader, StakingError, MAX_PLANS, REFERRAL_TIERS, ZERO_PUBKEY,
};

#[cfg(feature = "bpf-entrypoint")]
pinocchio::entrypoint!(process_instruction);

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    // Check minimum instruction data length
    if instruction_data.is_empty() {
        msg!("Error: Instruction data is empty");
        return Err(StakingError::InvalidInstruction.into());
    }

    // Parse instruction discriminator
    let discriminator = instruction_data[0];
    let instruction = match discriminator {
        0 => StakingInstruction::Initialize,
        1 => StakingInstruction::Stake,
        2 => StakingInstruction::Unstake,
        3 => StakingInstruction::Claim,
        4 => StakingInstruction::WithdrawReferral,
        5 => StakingInstruction::SetPlanRate,
        6 => StakingInstruction::SetPlanDuration,
        7 => StakingInstruction::SetPlanPenalty,
        8 => StakingInstruction::SetPlanConcluded,
        9 => StakingInstruction::SetReferralPercent,
        10 => StakingInstruction::RecoverForeignAsset,
        11 => StakingInstruction::SyncCustody,
        _ => {
            msg!("Error: Unknown instruction");
            return Err(StakingError::InvalidInstruction.into());
        }
    };

    let data = &instruction_data[1..];

    // Dispatch to instruction handler
    match instruction {
        StakingInstruction::Initialize => {
            msg!("Instruction: Initialize");
            process_initialize_inner(program_id, accounts, data)
        }
        StakingInstruction::Stake => {
            msg!("Instruction: Stake");
            process_stake_inner(program_id, accounts, data)
        }
        StakingInstruction::Unstake => {
            msg!("Instruction: Unstake");
            process_unstake_inner(program_id, accounts, data)
        }
        StakingInstruction::Claim => {
            msg!("Instruction: Claim");
            process_claim_inner(program_id, accounts, data)
        }
        StakingInstruction::WithdrawReferral => {
            msg!("Instruction: WithdrawReferral");
            process_withdraw_referral_inner(program_id, accounts, data)
        }
        StakingInstruction::SetPlanRate
        | StakingInstruction::SetPlanDuration
        | StakingInstruction::SetPlanPenalty
        | StakingInstruction::SetPlanConcluded
        | StakingInstruction::SetReferralPercent
        | StakingInstruction::RecoverForeignAsset
        | StakingInstruction::SyncCustody => {
            msg!("Instruction: Admin");
            process_admin_inner(program_id, accounts, instruction, data)
        }
    }
}

/// Current chain time as seconds since the epoch
fn current_time() -> Result<u64, StakingError> {
    let clock = Clock::get().map_err(|_| StakingError::InvalidAccount)?;
    Ok(clock.unix_timestamp.max(0) as u64)
}

/// Process initialize instruction
///
/// Expected accounts:
/// 0. `[writable]` Pool account (PDA)
/// 1. `[signer]` Admin authority
///
/// Expected data layout:
/// - stake_mint: Pubkey (32 bytes)
/// - vault_token_account: Pubkey (32 bytes)
/// - tier_percent: [u8; 3]
/// - plan_count: u8
/// - per plan: rate_percent u16, lock_duration_secs u64, early_penalty_percent u8
fn process_initialize_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 2 {
        msg!("Error: Initialize instruction requires at least 2 accounts");
        return Err(StakingError::InvalidInstruction.into());
    }

    let pool_account = &accounts[0];
    let admin_account = &accounts[1];

    validate_owner(pool_account, program_id)?;
    validate_writable(pool_account)?;
    validate_signer(admin_account)?;

    let mut reader = InstructionReader::new(data);
    let stake_mint = reader.read_pubkey()?;
    let vault_token_account = reader.read_pubkey()?;
    let tier_percent = reader.read_bytes::<REFERRAL_TIERS>()?;
    let plan_count = reader.read_u8()? as usize;
    if plan_count == 0 || plan_count > MAX_PLANS {
        msg!("Error: Invalid plan count");
        return Err(StakingError::InvalidParameter.into());
    }

    let mut plan_configs: ArrayVec<PlanConfig, MAX_PLANS> = ArrayVec::new();
    for _ in 0..plan_count {
        let rate_percent = reader.read_u16()?;
        let lock_duration_secs = reader.read_u64()?;
        let early_penalty_percent = reader.read_u8()?;
        plan_configs.push(PlanConfig { rate_percent, lock_duration_secs, early_penalty_percent });
    }

    process_initialize_pool(
        program_id,
        pool_account,
        admin_account.key(),
        &stake_mint,
        &vault_token_account,
        &plan_configs,
        tier_percent,
    )?;

    Ok(())
}

/// Process stake instruction
///
/// Expected accounts:
/// 0. `[writable]` Pool account (PDA)
/// 1. `[writable]` Position account (PDA, initialized on first use)
/// 2. `[writable]` User referral account (PDA, initialized on first use)
/// 3. `[signer]` User
/// 4. `[]` Vault token account
/// 5..7. `[writable]` Referrer's referral chain (only when binding, up to 3)
///
/// Expected data layout (33 bytes):
/// - plan_id: u8
/// - referrer: Pubkey (32 bytes, zero for none)
fn process_stake_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 5 {
        msg!("Error: Stake instruction requires at least 5 accounts");
        return Err(StakingError::InvalidInstruction.into());
    }

    let pool_account = &accounts[0];
    let position_account = &accounts[1];
    let referral_account = &accounts[2];
    let user_account = &accounts[3];
    let vault_account = &accounts[4];

    validate_owner(pool_account, program_id)?;
    validate_writable(pool_account)?;
    validate_owner(position_account, program_id)?;
    validate_writable(position_account)?;
    validate_owner(referral_account, program_id)?;
    validate_writable(referral_account)?;
    validate_signer(user_account)?;

    let mut reader = InstructionReader::new(data);
    let plan_id = reader.read_u8()?;
    let referrer = reader.read_pubkey()?;

    let pool_key = *pool_account.key();
    let user = *user_account.key();

    // First use creates the per-user accounts in place
    {
        let position = unsafe { borrow_account_data_mut::<Position>(position_account)? };
        if !position.is_initialized() {
            process_initialize_position(program_id, position_account, &pool_key, &user, plan_id)?;
        }
    }
    {
        let referral = unsafe { borrow_account_data_mut::<ReferralAccount>(referral_account)? };
        if !referral.is_initialized() {
            process_initialize_referral(program_id, referral_account, &pool_key, &user)?;
        }
    }

    let pool = unsafe { borrow_account_data_mut::<StakePool>(pool_account)? };
    let position = unsafe { borrow_account_data_mut::<Position>(position_account)? };
    let referral = unsafe { borrow_account_data_mut::<ReferralAccount>(referral_account)? };

    if position.owner != user || referral.owner != user {
        msg!("Error: Account owner does not match signer");
        return Err(StakingError::InvalidAccount.into());
    }
    if vault_account.key() != &pool.vault_token_account {
        msg!("Error: Wrong vault token account");
        return Err(StakingError::InvalidAccount.into());
    }

    let vault_balance = read_token_amount(vault_account)?;
    let now = current_time()?;

    // A fresh bind walks the referrer's chain to count the new downline
    let mut uplines = if referrer != ZERO_PUBKEY && !referral.is_bound() {
        collect_ancestors(program_id, accounts, 5, referral_account.key())?
    } else {
        ArrayVec::new()
    };

    let (lot_id, received) = process_stake(
        pool,
        position,
        referral,
        &mut uplines,
        &referrer,
        plan_id,
        vault_balance,
        now,
    )?;

    log!("Stake: lot {} credited {}", lot_id, received as u64);
    Ok(())
}

/// Collect the upline referral accounts trailing an instruction's fixed
/// account list, verified program-owned, writable, and pairwise
/// distinct. Repeating an account, or passing the user's own referral
/// account again, would hand out overlapping mutable borrows.
fn collect_ancestors<'a>(
    program_id: &Pubkey,
    accounts: &'a [AccountInfo],
    first: usize,
    user_referral: &Pubkey,
) -> Result<ArrayVec<&'a mut ReferralAccount, REFERRAL_TIERS>, StakingError> {
    let mut keys: ArrayVec<&Pubkey, REFERRAL_TIERS> = ArrayVec::new();
    let mut ancestors: ArrayVec<&'a mut ReferralAccount, REFERRAL_TIERS> = ArrayVec::new();
    for account in accounts.iter().skip(first).take(REFERRAL_TIERS) {
        if account.key() == user_referral || keys.iter().any(|k| *k == account.key()) {
            msg!("Error: Duplicate referral account");
            return Err(StakingError::InvalidAccount);
        }
        validate_owner(account, program_id)?;
        validate_writable(account)?;
        keys.push(account.key());
        ancestors.push(unsafe { borrow_account_data_mut::<ReferralAccount>(account)? });
    }
    Ok(ancestors)
}

/// Process unstake instruction
///
/// Expected accounts:
/// 0. `[writable]` Pool account (PDA)
/// 1. `[writable]` Position account (PDA)
/// 2. `[]` User referral account (PDA)
/// 3. `[signer]` User
/// 4..6. `[writable]` Upline referral accounts (up to 3, chain order)
///
/// Expected data layout (17 bytes):
/// - plan_id: u8
/// - amount: u128 (16 bytes)
fn process_unstake_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 4 {
        msg!("Error: Unstake instruction requires at least 4 accounts");
        return Err(StakingError::InvalidInstruction.into());
    }

    let pool_account = &accounts[0];
    let position_account = &accounts[1];
    let referral_account = &accounts[2];
    let user_account = &accounts[3];

    validate_owner(pool_account, program_id)?;
    validate_writable(pool_account)?;
    validate_owner(position_account, program_id)?;
    validate_writable(position_account)?;
    validate_owner(referral_account, program_id)?;
    validate_signer(user_account)?;

    let mut reader = InstructionReader::new(data);
    let plan_id = reader.read_u8()?;
    let amount = reader.read_u128()?;

    let pool = unsafe { borrow_account_data_mut::<StakePool>(pool_account)? };
    let position = unsafe { borrow_account_data_mut::<Position>(position_account)? };
    let referral = unsafe { borrow_account_data_mut::<ReferralAccount>(referral_account)? };

    if position.owner != *user_account.key() || referral.owner != *user_account.key() {
        msg!("Error: Account owner does not match signer");
        return Err(StakingError::InvalidAccount.into());
    }

    let first_upline = referral.referrer;
    let now = current_time()?;
    let mut ancestors = collect_ancestors(program_id, accounts, 4, referral_account.key())?;

    let net = process_unstake(pool, position, &first_upline, &mut ancestors, plan_id, amount, now)?;

    log!("Unstake: net payout {}", net as u64);
    Ok(())
}

/// Process claim instruction
///
/// Expected accounts:
/// 0. `[writable]` Pool account (PDA)
/// 1. `[writable]` Position account (PDA)
/// 2. `[]` User referral account (PDA)
/// 3. `[signer]` User
/// 4..6. `[writable]` Upline referral accounts (up to 3, chain order)
///
/// Expected data layout (17 bytes):
/// - plan_id: u8
/// - amount: u128 (16 bytes)
fn process_claim_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 4 {
        msg!("Error: Claim instruction requires at least 4 accounts");
        return Err(StakingError::InvalidInstruction.into());
    }

    let pool_account = &accounts[0];
    let position_account = &accounts[1];
    let referral_account = &accounts[2];
    let user_account = &accounts[3];

    validate_owner(pool_account, program_id)?;
    validate_writable(pool_account)?;
    validate_owner(position_account, program_id)?;
    validate_writable(position_account)?;
    validate_owner(referral_account, program_id)?;
    validate_signer(user_account)?;

    let mut reader = InstructionReader::new(data);
    let plan_id = reader.read_u8()?;
    let amount = reader.read_u128()?;

    let pool = unsafe { borrow_account_data_mut::<StakePool>(pool_account)? };
    let position = unsafe { borrow_account_data_mut::<Position>(position_account)? };
    let referral = unsafe { borrow_account_data_mut::<ReferralAccount>(referral_account)? };

    if position.owner != *user_account.key() || referral.owner != *user_account.key() {
        msg!("Error: Account owner does not match signer");
        return Err(StakingError::InvalidAccount.into());
    }

    let first_upline = referral.referrer;
    let now = current_time()?;
    let mut ancestors = collect_ancestors(program_id, accounts, 4, referral_account.key())?;

    process_claim(pool, position, &first_upline, &mut ancestors, plan_id, amount, now)?;

    log!("Claim: paid {}", amount as u64);
    Ok(())
}

/// Process referral withdrawal instruction
///
/// Expected accounts:
/// 0. `[writable]` Pool account (PDA)
/// 1. `[writable]` User referral account (PDA)
/// 2. `[signer]` User
///
/// Expected data layout (16 bytes):
/// - amount: u128 (16 bytes)
fn process_withdraw_referral_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 3 {
        msg!("Error: WithdrawReferral instruction requires at least 3 accounts");
        return Err(StakingError::InvalidInstruction.into());
    }

    let pool_account = &accounts[0];
    let referral_account = &accounts[1];
    let user_account = &accounts[2];

    validate_owner(pool_account, program_id)?;
    validate_writable(pool_account)?;
    validate_owner(referral_account, program_id)?;
    validate_writable(referral_account)?;
    validate_signer(user_account)?;

    let mut reader = InstructionReader::new(data);
    let amount = reader.read_u128()?;

    let pool = unsafe { borrow_account_data_mut::<StakePool>(pool_account)? };
    let referral = unsafe { borrow_account_data_mut::<ReferralAccount>(referral_account)? };

    if referral.owner != *user_account.key() {
        msg!("Error: Account owner does not match signer");
        return Err(StakingError::InvalidAccount.into());
    }

    process_withdraw_referral(pool, referral, amount)?;

    log!("WithdrawReferral: paid {}", amount as u64);
    Ok(())
}

/// Process admin instructions
///
/// Expected accounts:
/// 0. `[writable]` Pool account (PDA)
/// 1. `[signer]` Admin authority
/// 2. `[]` Vault token account (SyncCustody only)
///
/// Data layout varies per instruction.
fn process_admin_inner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction: StakingInstruction,
    data: &[u8],
) -> ProgramResult {
    if accounts.len() < 2 {
        msg!("Error: Admin instructions require at least 2 accounts");
        return Err(StakingError::InvalidInstruction.into());
    }

    let pool_account = &accounts[0];
    let admin_account = &accounts[1];

    validate_owner(pool_account, program_id)?;
    validate_writable(pool_account)?;
    validate_signer(admin_account)?;

    let pool = unsafe { borrow_account_data_mut::<StakePool>(pool_account)? };
    let authority = admin_account.key();
    let mut reader = InstructionReader::new(data);

    match instruction {
        StakingInstruction::SetPlanRate => {
            let plan_id = reader.read_u8()?;
            let rate = reader.read_u16()?;
            process_set_plan_rate(pool, authority, plan_id, rate)?;
        }
        StakingInstruction::SetPlanDuration => {
            let plan_id = reader.read_u8()?;
            let lock_secs = reader.read_u64()?;
            process_set_plan_duration(pool, authority, plan_id, lock_secs)?;
        }
        StakingInstruction::SetPlanPenalty => {
            let plan_id = reader.read_u8()?;
            let penalty = reader.read_u8()?;
            process_set_plan_penalty(pool, authority, plan_id, penalty)?;
        }
        StakingInstruction::SetPlanConcluded => {
            let plan_id = reader.read_u8()?;
            let concluded = reader.read_u8()? != 0;
            process_set_plan_concluded(pool, authority, plan_id, concluded)?;
        }
        StakingInstruction::SetReferralPercent => {
            let tier_percent = reader.read_bytes::<REFERRAL_TIERS>()?;
            process_set_referral_percent(pool, authority, tier_percent)?;
        }
        StakingInstruction::RecoverForeignAsset => {
            let foreign_mint = reader.read_pubkey()?;
            process_recover_foreign_asset(pool, authority, &foreign_mint)?;
        }
        StakingInstruction::SyncCustody => {
            let vault_account = accounts.get(2).ok_or(StakingError::InvalidInstruction)?;
            if vault_account.key() != &pool.vault_token_account {
                msg!("Error: Wrong vault token account");
                return Err(StakingError::InvalidAccount.into());
            }
            let vault_balance = read_token_amount(vault_account)?;
            let received = process_sync_custody(pool, authority, vault_balance)?;
            log!("SyncCustody: recognized {}", received as u64);
        }
        _ => return Err(StakingError::InvalidInstruction.into()),
    }

    Ok(())
}
