//! Account validation and typed access helpers

use crate::error::StakingError;
use pinocchio::account_info::AccountInfo;
use pinocchio::pubkey::Pubkey;

/// SPL token account: 64-byte mint+owner prefix, then the u64 amount
const TOKEN_AMOUNT_OFFSET: usize = 64;
const TOKEN_ACCOUNT_MIN_LEN: usize = 72;

/// Require the account to have signed the transaction
#[inline]
pub fn validate_signer(account: &AccountInfo) -> Result<(), StakingError> {
    if !account.is_signer() {
        return Err(StakingError::Unauthorized);
    }
    Ok(())
}

/// Require the account to be owned by the given program
#[inline]
pub fn validate_owner(account: &AccountInfo, program_id: &Pubkey) -> Result<(), StakingError> {
    if !account.is_owned_by(program_id) {
        return Err(StakingError::InvalidAccount);
    }
    Ok(())
}

/// Require the account to be writable
#[inline]
pub fn validate_writable(account: &AccountInfo) -> Result<(), StakingError> {
    if !account.is_writable() {
        return Err(StakingError::InvalidAccount);
    }
    Ok(())
}

/// Borrow account data as a typed reference
///
/// # Safety
///
/// `T` must be `#[repr(C)]` and the account must hold exactly one `T`
/// written by this program (the length check enforces the size).
pub unsafe fn borrow_account_data<T>(account: &AccountInfo) -> Result<&T, StakingError> {
    let data = account
        .try_borrow_data()
        .map_err(|_| StakingError::InvalidAccount)?;
    if data.len() != core::mem::size_of::<T>() {
        return Err(StakingError::InvalidAccount);
    }
    let ptr = data.as_ptr() as *const T;
    Ok(&*ptr)
}

/// Borrow account data as a typed mutable reference
///
/// # Safety
///
/// Same contract as [`borrow_account_data`]; the account must also be
/// writable in this transaction.
pub unsafe fn borrow_account_data_mut<T>(account: &AccountInfo) -> Result<&mut T, StakingError> {
    let data = account
        .try_borrow_mut_data()
        .map_err(|_| StakingError::InvalidAccount)?;
    if data.len() != core::mem::size_of::<T>() {
        return Err(StakingError::InvalidAccount);
    }
    let ptr = data.as_ptr() as *mut T;
    Ok(&mut *ptr)
}

/// Read the balance of an SPL token account
///
/// Used to measure deposits as the post-transfer balance delta, which
/// stays correct under fee-bearing transfers.
pub fn read_token_amount(account: &AccountInfo) -> Result<u64, StakingError> {
    let data = account
        .try_borrow_data()
        .map_err(|_| StakingError::InvalidAccount)?;
    if data.len() < TOKEN_ACCOUNT_MIN_LEN {
        return Err(StakingError::InvalidAccount);
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[TOKEN_AMOUNT_OFFSET..TOKEN_AMOUNT_OFFSET + 8]);
    Ok(u64::from_le_bytes(bytes))
}
