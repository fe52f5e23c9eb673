//! PDA derivation for pool, position, and referral accounts

use pinocchio::pubkey::{find_program_address, Pubkey};

/// Pool PDA: ["pool", admin]
pub fn derive_pool_pda(program_id: &Pubkey, admin: &Pubkey) -> (Pubkey, u8) {
    find_program_address(&[b"pool", admin.as_ref()], program_id)
}

/// Position PDA: ["position", pool, user, plan_id]
pub fn derive_position_pda(
    program_id: &Pubkey,
    pool: &Pubkey,
    user: &Pubkey,
    plan_id: u8,
) -> (Pubkey, u8) {
    find_program_address(
        &[b"position", pool.as_ref(), user.as_ref(), &[plan_id]],
        program_id,
    )
}

/// Referral PDA: ["referral", pool, user]
pub fn derive_referral_pda(program_id: &Pubkey, pool: &Pubkey, user: &Pubkey) -> (Pubkey, u8) {
    find_program_address(&[b"referral", pool.as_ref(), user.as_ref()], program_id)
}
