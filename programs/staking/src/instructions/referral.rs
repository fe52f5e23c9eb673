//! Referral cascade and referral balance withdrawal

use crate::state::{ReferralAccount, StakePool};
use pinocchio::pubkey::Pubkey;
use stakepool_common::*;

/// Walk the upline chain and credit each tier's share of a realized
/// reward. `ancestors` must be the referral accounts of the chain in
/// order: the user's direct referrer first, then its referrer, and so
/// on. The walk stops at the first unbound link or after three tiers.
///
/// Each supplied account is verified against the chain: tier N's owner
/// must be the referrer recorded at tier N-1. A mismatched account is
/// rejected, and so is a truncated list: while the chain is still
/// bound, omitting the next ancestor's account cannot skip its share.
///
/// Returns the total credited across all tiers.
pub fn distribute_referral_rewards(
    tier_percent: &[u8; REFERRAL_TIERS],
    first_upline: &Pubkey,
    reward: u128,
    ancestors: &mut [&mut ReferralAccount],
) -> Result<u128, StakingError> {
    let mut total = 0u128;
    let mut upline = *first_upline;
    let mut accounts = ancestors.iter_mut();

    for tier in 0..REFERRAL_TIERS {
        if upline == ZERO_PUBKEY {
            break;
        }
        let account = accounts.next().ok_or(StakingError::InvalidAccount)?;
        if account.owner != upline {
            return Err(StakingError::InvalidAccount);
        }
        let share = percent_of(reward, tier_percent[tier]);
        account.credit(share);
        total = total.saturating_add(share);
        upline = account.referrer;
    }

    Ok(total)
}

/// Count a fresh bind in every upline's downline total, walking the
/// same chain as the cascade: `referrer` first, then its referrer, up
/// to three tiers or the first unbound link.
///
/// The chain is verified the same way, and the full bound chain must
/// be supplied. A chain that leads back to `user` would make the
/// referral graph cyclic and is rejected.
pub fn record_bind_walk(
    user: &Pubkey,
    referrer: &Pubkey,
    uplines: &mut [&mut ReferralAccount],
) -> Result<(), StakingError> {
    let mut upline = *referrer;
    let mut accounts = uplines.iter_mut();

    for _ in 0..REFERRAL_TIERS {
        if upline == ZERO_PUBKEY {
            break;
        }
        if upline == *user {
            return Err(StakingError::InvalidParameter);
        }
        let account = accounts.next().ok_or(StakingError::InvalidAccount)?;
        if account.owner != upline {
            return Err(StakingError::InvalidAccount);
        }
        account.record_downline();
        upline = account.referrer;
    }

    Ok(())
}

/// Process a referral balance withdrawal
///
/// Deducts from the user's claimable referral balance, then authorizes
/// the payout against the pool's solvency guard. Outstanding principal
/// is untouched.
pub fn process_withdraw_referral(
    pool: &mut StakePool,
    referral: &mut ReferralAccount,
    amount: u128,
) -> Result<(), StakingError> {
    referral.withdraw(amount)?;
    pool.settle_payout(amount)?;
    Ok(())
}
