//! Program error codes
//!
//! Every failure aborts the whole call; the runtime discards all account
//! mutations staged before the failing check.

use pinocchio::program_error::ProgramError;

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakingError {
    /// Malformed or truncated instruction data
    InvalidInstruction = 1,
    /// Missing, wrong-sized, or wrong-address account
    InvalidAccount = 2,
    /// Caller is not the pool admin
    Unauthorized = 3,
    /// Parameter outside its configured bound
    InvalidParameter = 4,
    /// Unknown plan id
    NotFound = 5,
    /// Zero amount where a positive one is required
    AmountMustBePositive = 6,
    /// Plan no longer accepts deposits
    PlanConcluded = 7,
    /// Lot array at capacity for this (plan, user)
    PositionFull = 8,
    /// Requested principal exceeds the user's staked total
    InsufficientPrincipal = 9,
    /// Requested amount exceeds accrued or referral earnings
    InsufficientEarnings = 10,
    /// Nothing accrued to claim
    NoEarnings = 11,
    /// Payout would draw down principal owed to depositors
    InsufficientPoolBalance = 12,
    /// Referrer already bound for this user
    ReferrerAlreadySet = 13,
}

impl From<StakingError> for ProgramError {
    fn from(e: StakingError) -> Self {
        ProgramError::Custom(e as u32)
    }
}
