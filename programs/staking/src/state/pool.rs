//! Pool account: plan registry, custody mirror, global totals, and the
//! solvency guard
//!
//! The pool holds the per-plan economic parameters and the two global
//! aggregates every payout is checked against: the custody mirror of the
//! vault token balance and the outstanding principal owed to depositors.

use model_conservation::math::{add_u128, sub_u128};
use pinocchio::pubkey::Pubkey;
use stakepool_common::{StakingError, EARLY_PENALTY_LIMIT, MAX_PLANS, REFERRAL_PERCENT_LIMIT, REFERRAL_TIERS};

/// Per-plan economic parameters
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Plan {
    /// Sum of lot principals across all users of this plan
    pub overall_principal: u128,
    /// Lock duration in seconds
    pub lock_duration_secs: u64,
    /// Users that ever opened a position in this plan
    pub position_count: u32,
    /// Annual reward rate (whole percent)
    pub rate_percent: u16,
    /// Early-withdrawal penalty on the principal portion (whole percent)
    pub early_penalty_percent: u8,
    /// Plan no longer accepts deposits when nonzero
    pub concluded: u8,
}

impl Plan {
    pub fn is_concluded(&self) -> bool {
        self.concluded != 0
    }
}

/// Plan parameters supplied at pool initialization
#[derive(Debug, Clone, Copy)]
pub struct PlanConfig {
    pub rate_percent: u16,
    pub lock_duration_secs: u64,
    pub early_penalty_percent: u8,
}

/// Pool account
/// PDA: ["pool", admin]
#[repr(C)]
pub struct StakePool {
    /// Authority for parameter mutators and foreign-asset recovery
    pub admin: Pubkey,
    /// The single staking asset
    pub stake_mint: Pubkey,
    /// Custody token account holding deposits
    pub vault_token_account: Pubkey,
    /// Internal mirror of the vault token balance
    pub custody_balance: u128,
    /// Principal owed to depositors across all plans and users
    pub total_outstanding_principal: u128,
    /// Configured plans (first `plan_count` entries live)
    pub plans: [Plan; MAX_PLANS],
    /// Number of configured plans
    pub plan_count: u8,
    /// Bump seed
    pub bump: u8,
    /// Referral cascade percentages, tier 1..=3
    pub referral_tier_percent: [u8; REFERRAL_TIERS],
    /// Padding
    pub _padding: [u8; 11],
}

impl StakePool {
    pub const LEN: usize = core::mem::size_of::<Self>();

    /// Initialize the pool in-place (avoids a large stack temporary on BPF)
    pub fn initialize_in_place(
        &mut self,
        admin: Pubkey,
        stake_mint: Pubkey,
        vault_token_account: Pubkey,
        plan_configs: &[PlanConfig],
        tier_percent: [u8; REFERRAL_TIERS],
        bump: u8,
    ) -> Result<(), StakingError> {
        if plan_configs.is_empty() || plan_configs.len() > MAX_PLANS {
            return Err(StakingError::InvalidParameter);
        }
        // Plans are fixed at construction; the tighter `set_penalty`
        // bound applies to later mutation only
        if plan_configs.iter().any(|c| c.early_penalty_percent > 100) {
            return Err(StakingError::InvalidParameter);
        }
        if tier_percent.iter().any(|p| *p >= REFERRAL_PERCENT_LIMIT) {
            return Err(StakingError::InvalidParameter);
        }

        self.admin = admin;
        self.stake_mint = stake_mint;
        self.vault_token_account = vault_token_account;
        self.custody_balance = 0;
        self.total_outstanding_principal = 0;
        self.plan_count = plan_configs.len() as u8;
        self.bump = bump;
        self.referral_tier_percent = tier_percent;
        self._padding = [0; 11];

        for (i, slot) in self.plans.iter_mut().enumerate() {
            *slot = match plan_configs.get(i) {
                Some(c) => Plan {
                    overall_principal: 0,
                    lock_duration_secs: c.lock_duration_secs,
                    position_count: 0,
                    rate_percent: c.rate_percent,
                    early_penalty_percent: c.early_penalty_percent,
                    concluded: 0,
                },
                None => Plan {
                    overall_principal: 0,
                    lock_duration_secs: 0,
                    position_count: 0,
                    rate_percent: 0,
                    early_penalty_percent: 0,
                    concluded: 0,
                },
            };
        }
        Ok(())
    }

    /// Look up a plan by id
    pub fn plan(&self, plan_id: u8) -> Result<&Plan, StakingError> {
        if plan_id >= self.plan_count {
            return Err(StakingError::NotFound);
        }
        Ok(&self.plans[plan_id as usize])
    }

    fn plan_mut(&mut self, plan_id: u8) -> Result<&mut Plan, StakingError> {
        if plan_id >= self.plan_count {
            return Err(StakingError::NotFound);
        }
        Ok(&mut self.plans[plan_id as usize])
    }

    pub fn is_admin(&self, key: &Pubkey) -> bool {
        &self.admin == key
    }

    /// Update a plan's reward rate
    pub fn set_rate(&mut self, plan_id: u8, rate_percent: u16) -> Result<(), StakingError> {
        self.plan_mut(plan_id)?.rate_percent = rate_percent;
        Ok(())
    }

    /// Update a plan's lock duration
    pub fn set_duration(&mut self, plan_id: u8, lock_secs: u64) -> Result<(), StakingError> {
        self.plan_mut(plan_id)?.lock_duration_secs = lock_secs;
        Ok(())
    }

    /// Update a plan's early-withdrawal penalty; rejects 15% and above
    pub fn set_penalty(&mut self, plan_id: u8, penalty_percent: u8) -> Result<(), StakingError> {
        if penalty_percent >= EARLY_PENALTY_LIMIT {
            return Err(StakingError::InvalidParameter);
        }
        self.plan_mut(plan_id)?.early_penalty_percent = penalty_percent;
        Ok(())
    }

    /// Conclude (or reopen) a plan for new deposits
    pub fn set_concluded(&mut self, plan_id: u8, concluded: bool) -> Result<(), StakingError> {
        self.plan_mut(plan_id)?.concluded = concluded as u8;
        Ok(())
    }

    /// Update referral tier percentages; each tier must stay below 10%
    pub fn set_referral_percent(
        &mut self,
        tier_percent: [u8; REFERRAL_TIERS],
    ) -> Result<(), StakingError> {
        if tier_percent.iter().any(|p| *p >= REFERRAL_PERCENT_LIMIT) {
            return Err(StakingError::InvalidParameter);
        }
        self.referral_tier_percent = tier_percent;
        Ok(())
    }

    /// Measure a deposit as the vault balance delta against the mirror
    /// and advance the mirror. Returns the actual received amount.
    pub fn sync_deposit(&mut self, vault_balance: u64) -> u128 {
        let received = sub_u128(vault_balance as u128, self.custody_balance);
        self.custody_balance = vault_balance as u128;
        received
    }

    /// Record a new lot's principal in the plan and global aggregates
    pub fn record_deposit(
        &mut self,
        plan_id: u8,
        amount: u128,
        first_position: bool,
    ) -> Result<(), StakingError> {
        let plan = self.plan_mut(plan_id)?;
        plan.overall_principal = add_u128(plan.overall_principal, amount);
        if first_position {
            plan.position_count = plan.position_count.saturating_add(1);
        }
        self.total_outstanding_principal = add_u128(self.total_outstanding_principal, amount);
        Ok(())
    }

    /// Guard-then-commit for an unstake: verifies the custody snapshot
    /// covers the net payout plus the principal still outstanding after
    /// this call's release, then applies both sides atomically.
    pub fn settle_unstake(
        &mut self,
        plan_id: u8,
        principal_out: u128,
        net_payout: u128,
    ) -> Result<(), StakingError> {
        let remaining = sub_u128(self.total_outstanding_principal, principal_out);
        if self.custody_balance < add_u128(net_payout, remaining) {
            return Err(StakingError::InsufficientPoolBalance);
        }
        let plan = self.plan_mut(plan_id)?;
        plan.overall_principal = sub_u128(plan.overall_principal, principal_out);
        self.total_outstanding_principal = remaining;
        self.custody_balance = sub_u128(self.custody_balance, net_payout);
        Ok(())
    }

    /// Guard-then-commit for a payout that releases no principal
    /// (reward claims and referral withdrawals)
    pub fn settle_payout(&mut self, amount: u128) -> Result<(), StakingError> {
        if self.custody_balance < add_u128(amount, self.total_outstanding_principal) {
            return Err(StakingError::InsufficientPoolBalance);
        }
        self.custody_balance = sub_u128(self.custody_balance, amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_pool() -> StakePool {
        let mut pool = StakePool {
            admin: [1; 32],
            stake_mint: [2; 32],
            vault_token_account: [3; 32],
            custody_balance: 0,
            total_outstanding_principal: 0,
            plans: [Plan {
                overall_principal: 0,
                lock_duration_secs: 0,
                position_count: 0,
                rate_percent: 0,
                early_penalty_percent: 0,
                concluded: 0,
            }; MAX_PLANS],
            plan_count: 0,
            bump: 0,
            referral_tier_percent: [0; REFERRAL_TIERS],
            _padding: [0; 11],
        };
        pool.initialize_in_place(
            [1; 32],
            [2; 32],
            [3; 32],
            &[
                PlanConfig { rate_percent: 18, lock_duration_secs: 30 * 86_400, early_penalty_percent: 15 },
                PlanConfig { rate_percent: 24, lock_duration_secs: 90 * 86_400, early_penalty_percent: 15 },
            ],
            [3, 2, 1],
            255,
        )
        .unwrap();
        pool
    }

    #[test]
    fn test_pool_size_is_16_aligned() {
        assert_eq!(StakePool::LEN % 16, 0);
        assert_eq!(core::mem::size_of::<Plan>(), 32);
    }

    #[test]
    fn test_plan_lookup() {
        let pool = test_pool();
        assert_eq!(pool.plan(0).unwrap().rate_percent, 18);
        assert_eq!(pool.plan(1).unwrap().lock_duration_secs, 90 * 86_400);
        assert_eq!(pool.plan(2).unwrap_err(), StakingError::NotFound);
    }

    #[test]
    fn test_penalty_mutator_bound() {
        let mut pool = test_pool();
        assert!(pool.set_penalty(0, 14).is_ok());
        assert_eq!(pool.plan(0).unwrap().early_penalty_percent, 14);
        assert_eq!(pool.set_penalty(0, 15).unwrap_err(), StakingError::InvalidParameter);
        assert_eq!(pool.set_penalty(9, 5).unwrap_err(), StakingError::NotFound);
    }

    #[test]
    fn test_referral_percent_bound() {
        let mut pool = test_pool();
        assert!(pool.set_referral_percent([5, 3, 1]).is_ok());
        assert_eq!(
            pool.set_referral_percent([10, 2, 1]).unwrap_err(),
            StakingError::InvalidParameter
        );
    }

    #[test]
    fn test_concluded_flag() {
        let mut pool = test_pool();
        assert!(!pool.plan(0).unwrap().is_concluded());
        pool.set_concluded(0, true).unwrap();
        assert!(pool.plan(0).unwrap().is_concluded());
        pool.set_concluded(0, false).unwrap();
        assert!(!pool.plan(0).unwrap().is_concluded());
    }

    #[test]
    fn test_sync_deposit_measures_delta() {
        let mut pool = test_pool();
        assert_eq!(pool.sync_deposit(1000), 1000);
        assert_eq!(pool.custody_balance, 1000);
        // Fee-bearing transfer: only the delta counts
        assert_eq!(pool.sync_deposit(1990), 990);
        // No new funds: nothing received
        assert_eq!(pool.sync_deposit(1990), 0);
    }

    #[test]
    fn test_record_deposit_counts_first_position_once() {
        let mut pool = test_pool();
        pool.record_deposit(0, 1000, true).unwrap();
        pool.record_deposit(0, 500, false).unwrap();
        assert_eq!(pool.plan(0).unwrap().overall_principal, 1500);
        assert_eq!(pool.plan(0).unwrap().position_count, 1);
        assert_eq!(pool.total_outstanding_principal, 1500);
    }

    #[test]
    fn test_settle_unstake_guards_solvency() {
        let mut pool = test_pool();
        pool.sync_deposit(1000);
        pool.record_deposit(0, 1000, true).unwrap();

        // Net 1014 against custody 1000: reward is unfunded
        assert_eq!(
            pool.settle_unstake(0, 1000, 1014).unwrap_err(),
            StakingError::InsufficientPoolBalance
        );
        // Nothing committed on failure
        assert_eq!(pool.custody_balance, 1000);
        assert_eq!(pool.total_outstanding_principal, 1000);

        // Fund the reward margin, then it clears
        pool.sync_deposit(1100);
        pool.settle_unstake(0, 1000, 1014).unwrap();
        assert_eq!(pool.custody_balance, 86);
        assert_eq!(pool.total_outstanding_principal, 0);
        assert_eq!(pool.plan(0).unwrap().overall_principal, 0);
    }

    #[test]
    fn test_settle_payout_scenario_c() {
        // Custody exactly equals outstanding principal: any positive
        // payout that releases no principal must fail
        let mut pool = test_pool();
        pool.sync_deposit(1000);
        pool.record_deposit(0, 1000, true).unwrap();
        assert_eq!(
            pool.settle_payout(1).unwrap_err(),
            StakingError::InsufficientPoolBalance
        );

        pool.sync_deposit(1010);
        assert!(pool.settle_payout(10).is_ok());
        assert_eq!(pool.custody_balance, 1000);
    }

    #[test]
    fn test_initialize_rejects_bad_tiers() {
        let mut pool = test_pool();
        let err = pool
            .initialize_in_place(
                [1; 32],
                [2; 32],
                [3; 32],
                &[PlanConfig { rate_percent: 18, lock_duration_secs: 0, early_penalty_percent: 0 }],
                [10, 2, 1],
                255,
            )
            .unwrap_err();
        assert_eq!(err, StakingError::InvalidParameter);
    }
}
