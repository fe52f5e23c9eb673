/// Staking instruction handlers

pub mod initialize;
pub mod stake;
pub mod unstake;
pub mod claim;
pub mod referral;
pub mod admin;

pub use initialize::*;
pub use stake::*;
pub use unstake::*;
pub use claim::*;
pub use referral::*;
pub use admin::*;

/// Instruction discriminator
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakingInstruction {
    /// Initialize the pool with its plan set
    Initialize = 0,
    /// Deposit into a plan, opening a new lot
    Stake = 1,
    /// Withdraw principal (plus realized reward, minus early penalty)
    Unstake = 2,
    /// Claim accrued rewards across lots
    Claim = 3,
    /// Withdraw the accumulated referral balance
    WithdrawReferral = 4,
    /// Admin: update a plan's reward rate
    SetPlanRate = 5,
    /// Admin: update a plan's lock duration
    SetPlanDuration = 6,
    /// Admin: update a plan's early-withdrawal penalty
    SetPlanPenalty = 7,
    /// Admin: conclude or reopen a plan for deposits
    SetPlanConcluded = 8,
    /// Admin: update the referral cascade percentages
    SetReferralPercent = 9,
    /// Admin: release a non-stake asset sent to the program by mistake
    RecoverForeignAsset = 10,
    /// Admin: fold a direct vault top-up into the custody mirror
    SyncCustody = 11,
}

// Note: Instruction dispatching is handled in entrypoint.rs
// The functions in this module are called from the entrypoint after
// account deserialization and validation.
