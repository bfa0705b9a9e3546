//! Harvest health check.
//!
//! A strategy with a health check configured asks it to validate every harvest outcome and
//! reverts with `!healthcheck` when it is rejected. The common check bounds profit and loss
//! as a share of the strategy's debt before the report. Strategies can be given their own
//! limits, a custom check replacing the default rule, or have the check disabled.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use alloy_primitives::{Address, U256};
use tracing::{debug, warn};

use crate::{
    constants::{max_bps, DEFAULT_LOSS_LIMIT_RATIO, DEFAULT_PROFIT_LIMIT_RATIO},
    utils::{
        error::{StrategyError, StrategyResult},
        math::mul_div,
    },
};

/// Figures of one harvest handed to the health check
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HarvestOutcome {
    pub profit: U256,
    pub loss: U256,
    pub debt_payment: U256,
    pub debt_outstanding: U256,
    /// Strategy debt before the report
    pub total_debt: U256,
}

#[cfg_attr(test, mockall::automock)]
pub trait HealthCheck {
    /// Returns false when the outcome must not be accepted.
    fn check(&self, strategy: Address, outcome: &HarvestOutcome) -> bool;
}

/// Profit and loss bounds in bps of the strategy debt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    pub profit_limit_ratio: U256,
    pub loss_limit_ratio: U256,
}

impl Limits {
    fn accepts(&self, outcome: &HarvestOutcome) -> bool {
        let max_profit = mul_div(outcome.total_debt, self.profit_limit_ratio, max_bps());
        let max_loss = mul_div(outcome.total_debt, self.loss_limit_ratio, max_bps());
        match (max_profit, max_loss) {
            (Ok(max_profit), Ok(max_loss)) => {
                outcome.profit <= max_profit && outcome.loss <= max_loss
            }
            _ => false,
        }
    }
}

#[derive(Clone)]
pub struct CommonHealthCheck {
    pub address: Address,
    pub governance: Address,
    pub management: Address,
    /// Global limits applied to strategies without their own
    pub limits: Limits,
    pub strategy_limits: BTreeMap<Address, Limits>,
    pub custom_checks: BTreeMap<Address, Arc<dyn HealthCheck + Send + Sync>>,
    pub disabled_checks: BTreeSet<Address>,
}

impl CommonHealthCheck {
    pub fn new(address: Address, governance: Address, management: Address) -> Self {
        Self {
            address,
            governance,
            management,
            limits: Limits {
                profit_limit_ratio: U256::from(DEFAULT_PROFIT_LIMIT_RATIO),
                loss_limit_ratio: U256::from(DEFAULT_LOSS_LIMIT_RATIO),
            },
            strategy_limits: BTreeMap::new(),
            custom_checks: BTreeMap::new(),
            disabled_checks: BTreeSet::new(),
        }
    }

    pub fn profit_limit_ratio(&self) -> U256 {
        self.limits.profit_limit_ratio
    }

    pub fn loss_limit_ratio(&self) -> U256 {
        self.limits.loss_limit_ratio
    }

    fn only_authorized(&self, caller: Address) -> StrategyResult<()> {
        if caller == self.governance || caller == self.management {
            Ok(())
        } else {
            Err(StrategyError::Unauthorized)
        }
    }

    fn validate_profit_ratio(ratio: U256) -> StrategyResult<()> {
        if ratio > max_bps() {
            return Err(StrategyError::Custom("profit ratio above 10000".to_string()));
        }
        Ok(())
    }

    fn validate_loss_ratio(ratio: U256) -> StrategyResult<()> {
        if ratio >= max_bps() {
            return Err(StrategyError::Custom("loss ratio must be below 10000".to_string()));
        }
        Ok(())
    }

    pub fn set_governance(&mut self, caller: Address, governance: Address) -> StrategyResult<()> {
        if caller != self.governance {
            return Err(StrategyError::Unauthorized);
        }
        self.governance = governance;
        Ok(())
    }

    pub fn set_management(&mut self, caller: Address, management: Address) -> StrategyResult<()> {
        if caller != self.governance {
            return Err(StrategyError::Unauthorized);
        }
        self.management = management;
        Ok(())
    }

    pub fn set_profit_limit_ratio(&mut self, caller: Address, ratio: U256) -> StrategyResult<()> {
        self.only_authorized(caller)?;
        Self::validate_profit_ratio(ratio)?;
        self.limits.profit_limit_ratio = ratio;
        Ok(())
    }

    pub fn set_loss_limit_ratio(&mut self, caller: Address, ratio: U256) -> StrategyResult<()> {
        self.only_authorized(caller)?;
        Self::validate_loss_ratio(ratio)?;
        self.limits.loss_limit_ratio = ratio;
        Ok(())
    }

    /// Limits applied to `strategy` instead of the global ones.
    pub fn set_strategy_limits(
        &mut self,
        caller: Address,
        strategy: Address,
        profit_limit_ratio: U256,
        loss_limit_ratio: U256,
    ) -> StrategyResult<()> {
        self.only_authorized(caller)?;
        Self::validate_profit_ratio(profit_limit_ratio)?;
        Self::validate_loss_ratio(loss_limit_ratio)?;
        self.strategy_limits.insert(
            strategy,
            Limits {
                profit_limit_ratio,
                loss_limit_ratio,
            },
        );
        Ok(())
    }

    /// Replaces the default rule for `strategy` with `check`.
    pub fn set_check(
        &mut self,
        caller: Address,
        strategy: Address,
        check: Arc<dyn HealthCheck + Send + Sync>,
    ) -> StrategyResult<()> {
        self.only_authorized(caller)?;
        self.custom_checks.insert(strategy, check);
        Ok(())
    }

    pub fn set_disabled_check(
        &mut self,
        caller: Address,
        strategy: Address,
        disabled: bool,
    ) -> StrategyResult<()> {
        self.only_authorized(caller)?;
        if disabled {
            self.disabled_checks.insert(strategy);
        } else {
            self.disabled_checks.remove(&strategy);
        }
        Ok(())
    }

    /// Limits in force for `strategy`
    pub fn limits_for(&self, strategy: Address) -> Limits {
        self.strategy_limits
            .get(&strategy)
            .copied()
            .unwrap_or(self.limits)
    }
}

impl HealthCheck for CommonHealthCheck {
    fn check(&self, strategy: Address, outcome: &HarvestOutcome) -> bool {
        if self.disabled_checks.contains(&strategy) {
            debug!(%strategy, "health check disabled");
            return true;
        }
        let passed = match self.custom_checks.get(&strategy) {
            Some(custom) => custom.check(strategy, outcome),
            None => self.limits_for(strategy).accepts(outcome),
        };
        if !passed {
            warn!(
                %strategy,
                profit = %outcome.profit,
                loss = %outcome.loss,
                total_debt = %outcome.total_debt,
                "health check failed"
            );
        }
        passed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    fn health_check() -> CommonHealthCheck {
        CommonHealthCheck::new(
            Address::repeat_byte(0x0c),
            Address::repeat_byte(0x01),
            Address::repeat_byte(0x02),
        )
    }

    fn outcome(profit: u64, loss: u64) -> HarvestOutcome {
        HarvestOutcome {
            profit: U256::from(profit),
            loss: U256::from(loss),
            total_debt: U256::from(10_000u64),
            ..Default::default()
        }
    }

    #[test]
    fn default_limits_bound_profit_and_loss() {
        let check = health_check();
        let strategy = Address::repeat_byte(0x5a);
        assert!(check.check(strategy, &outcome(300, 0)));
        assert!(!check.check(strategy, &outcome(301, 0)));
        assert!(check.check(strategy, &outcome(0, 100)));
        assert!(!check.check(strategy, &outcome(0, 101)));
    }

    #[test]
    fn strategy_limits_override_global_ones() {
        let mut check = health_check();
        let strategy = Address::repeat_byte(0x5a);
        let governance = check.governance;
        check
            .set_strategy_limits(governance, strategy, U256::from(1_000u64), U256::ZERO)
            .unwrap();
        assert!(check.check(strategy, &outcome(1_000, 0)));
        assert!(!check.check(strategy, &outcome(0, 1)));
        assert!(!check.check(Address::repeat_byte(0x5b), &outcome(1_000, 0)));
    }

    #[test]
    fn disabled_check_accepts_anything() {
        let mut check = health_check();
        let strategy = Address::repeat_byte(0x5a);
        let management = check.management;
        check.set_disabled_check(management, strategy, true).unwrap();
        assert!(check.check(strategy, &outcome(u64::MAX, u64::MAX)));
        check.set_disabled_check(management, strategy, false).unwrap();
        assert!(!check.check(strategy, &outcome(u64::MAX, 0)));
    }

    #[test]
    fn custom_check_replaces_default_rule() {
        let mut check = health_check();
        let strategy = Address::repeat_byte(0x5a);
        let rejected = outcome(1, 0);

        let mut custom = MockHealthCheck::new();
        custom
            .expect_check()
            .with(eq(strategy), eq(rejected))
            .times(1)
            .return_const(false);
        let governance = check.governance;
        check.set_check(governance, strategy, Arc::new(custom)).unwrap();

        assert!(!check.check(strategy, &rejected));
    }

    #[test]
    fn setters_are_gated_and_validated() {
        let mut check = health_check();
        let stranger = Address::repeat_byte(0x99);
        assert_eq!(
            check.set_profit_limit_ratio(stranger, U256::from(10u64)),
            Err(StrategyError::Unauthorized)
        );
        let governance = check.governance;
        assert!(check.set_loss_limit_ratio(governance, max_bps()).is_err());
        check.set_profit_limit_ratio(governance, max_bps()).unwrap();
        assert_eq!(check.profit_limit_ratio(), max_bps());
        assert!(check
            .set_profit_limit_ratio(governance, max_bps() + U256::from(1u64))
            .is_err());
        check.set_loss_limit_ratio(governance, U256::from(50u64)).unwrap();
        assert_eq!(check.loss_limit_ratio(), U256::from(50u64));

        let management = check.management;
        assert_eq!(
            check.set_management(management, stranger),
            Err(StrategyError::Unauthorized)
        );
    }
}
