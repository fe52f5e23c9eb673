//! Referral account: bind-once referrer link and earned-balance ledger
//!
//! PDA: ["referral", pool, user]. `referrer` is the zero pubkey until
//! bound; once set to a real key it can never change.

use model_conservation::math::{add_u128, sub_u128};
use pinocchio::pubkey::Pubkey;
use stakepool_common::{StakingError, ZERO_PUBKEY};

#[repr(C)]
pub struct ReferralAccount {
    /// Account owner (the referred user)
    pub owner: Pubkey,
    /// Upline referrer; zero pubkey means unbound
    pub referrer: Pubkey,
    /// Lifetime referral rewards credited
    pub total_referral_earned: u128,
    /// Credited but not yet withdrawn
    pub claimable_referral_balance: u128,
    /// Direct downline users bound to this owner
    pub downline_count: u32,
    /// Bump seed
    pub bump: u8,
    /// Padding
    pub _padding: [u8; 11],
}

impl ReferralAccount {
    pub const LEN: usize = core::mem::size_of::<Self>();

    pub fn is_initialized(&self) -> bool {
        self.owner != ZERO_PUBKEY
    }

    pub fn initialize_in_place(&mut self, owner: Pubkey, bump: u8) {
        self.owner = owner;
        self.referrer = ZERO_PUBKEY;
        self.total_referral_earned = 0;
        self.claimable_referral_balance = 0;
        self.downline_count = 0;
        self.bump = bump;
        self._padding = [0; 11];
    }

    pub fn is_bound(&self) -> bool {
        self.referrer != ZERO_PUBKEY
    }

    /// Bind the referrer link. Self-referral and the zero sentinel are
    /// silent no-ops, as is re-submitting the already-bound referrer.
    /// Submitting a different referrer after binding is rejected.
    pub fn bind(&mut self, referrer: &Pubkey) -> Result<bool, StakingError> {
        if *referrer == ZERO_PUBKEY || *referrer == self.owner {
            return Ok(false);
        }
        if self.is_bound() {
            if self.referrer == *referrer {
                return Ok(false);
            }
            return Err(StakingError::ReferrerAlreadySet);
        }
        self.referrer = *referrer;
        Ok(true)
    }

    /// Credit a referral reward share
    pub fn credit(&mut self, amount: u128) {
        self.total_referral_earned = add_u128(self.total_referral_earned, amount);
        self.claimable_referral_balance = add_u128(self.claimable_referral_balance, amount);
    }

    /// Count a newly bound direct downline
    pub fn record_downline(&mut self) {
        self.downline_count = self.downline_count.saturating_add(1);
    }

    /// Deduct a referral withdrawal from the claimable balance
    pub fn withdraw(&mut self, amount: u128) -> Result<(), StakingError> {
        if amount == 0 {
            return Err(StakingError::AmountMustBePositive);
        }
        if amount > self.claimable_referral_balance {
            return Err(StakingError::InsufficientEarnings);
        }
        self.claimable_referral_balance = sub_u128(self.claimable_referral_balance, amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_account() -> ReferralAccount {
        let mut acc = ReferralAccount {
            owner: [0; 32],
            referrer: [0; 32],
            total_referral_earned: 0,
            claimable_referral_balance: 0,
            downline_count: 0,
            bump: 0,
            _padding: [0; 11],
        };
        acc.initialize_in_place([1; 32], 255);
        acc
    }

    #[test]
    fn test_bind_once_semantics() {
        let mut acc = test_account();

        // Sentinel and self-referral are no-ops
        assert!(!acc.bind(&ZERO_PUBKEY).unwrap());
        assert!(!acc.bind(&[1; 32]).unwrap());
        assert!(!acc.is_bound());

        assert!(acc.bind(&[2; 32]).unwrap());
        assert!(acc.is_bound());

        // Idempotent re-bind, hard error on a different referrer
        assert!(!acc.bind(&[2; 32]).unwrap());
        assert_eq!(acc.bind(&[3; 32]).unwrap_err(), StakingError::ReferrerAlreadySet);
        assert_eq!(acc.referrer, [2; 32]);
    }

    #[test]
    fn test_credit_and_withdraw() {
        let mut acc = test_account();
        acc.credit(18);
        acc.credit(12);
        assert_eq!(acc.total_referral_earned, 30);
        assert_eq!(acc.claimable_referral_balance, 30);

        acc.withdraw(20).unwrap();
        assert_eq!(acc.claimable_referral_balance, 10);
        // Lifetime total is unaffected by withdrawals
        assert_eq!(acc.total_referral_earned, 30);

        assert_eq!(acc.withdraw(0).unwrap_err(), StakingError::AmountMustBePositive);
        assert_eq!(acc.withdraw(11).unwrap_err(), StakingError::InsufficientEarnings);
    }

    #[test]
    fn test_size_is_16_aligned() {
        assert_eq!(ReferralAccount::LEN % 16, 0);
    }
}
