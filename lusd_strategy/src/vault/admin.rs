//! Governance of the vault and of the strategies it lends to

use alloy_primitives::{Address, U256};
use tracing::{info, warn};

use crate::{
    constants::{max_bps, scale, MAXIMUM_STRATEGIES},
    state::State,
    types::{
        EmergencyShutdown, LockedProfitDegradationUpdated, StrategyAdded, StrategyMigrated,
        StrategyRevoked, StrategyUpdateDebtRatio, StrategyUpdateMaxDebtPerHarvest,
        StrategyUpdateMinDebtPerHarvest, StrategyUpdatePerformanceFee, UpdateDepositLimit,
        UpdateGuardian, UpdateManagement, UpdateManagementFee, UpdatePerformanceFee,
        UpdateRewards,
    },
    utils::error::{StrategyError, StrategyResult},
};

use super::{StrategyParams, Vault};

fn require(allowed: bool) -> StrategyResult<()> {
    if allowed {
        Ok(())
    } else {
        Err(StrategyError::Unauthorized)
    }
}

fn invalid<S: AsRef<str>>(reason: S) -> StrategyError {
    StrategyError::Custom(reason.as_ref().to_string())
}

impl Vault {
    fn only_governance(&self, caller: Address) -> StrategyResult<()> {
        require(caller == self.governance)
    }

    fn only_managers(&self, caller: Address) -> StrategyResult<()> {
        require(caller == self.governance || caller == self.management)
    }

    /// Drops the strategy's debt ratio to zero so its next report returns everything.
    fn revoke(&mut self, strategy: Address) -> StrategyResult<()> {
        let params = self.params_mut(strategy)?;
        let ratio = params.debt_ratio;
        params.debt_ratio(U256::ZERO);
        self.debt_ratio -= ratio;
        Ok(())
    }
}

impl State {
    /// Registers `strategy` with the vault and appends it to the withdrawal queue.
    pub fn add_strategy(
        &mut self,
        caller: Address,
        strategy: Address,
        debt_ratio: U256,
        min_debt_per_harvest: U256,
        max_debt_per_harvest: U256,
        performance_fee: U256,
    ) -> StrategyResult<()> {
        if self.vault.withdrawal_queue.len() >= MAXIMUM_STRATEGIES {
            return Err(invalid("withdrawal queue is full"));
        }
        if self.vault.emergency_shutdown {
            return Err(StrategyError::VaultShutdown);
        }
        self.vault.only_governance(caller)?;
        if strategy == Address::ZERO {
            return Err(invalid("strategy is the zero address"));
        }
        if self.vault.strategies(strategy).is_activated() {
            return Err(StrategyError::StrategyAlreadyActive(strategy));
        }
        let settings = &self.strategy(strategy)?.settings;
        if settings.vault != self.vault.address || settings.want != self.vault.token {
            return Err(invalid("strategy belongs to another vault"));
        }
        if self.vault.debt_ratio + debt_ratio > max_bps() {
            return Err(StrategyError::DebtRatioLimit);
        }
        if min_debt_per_harvest > max_debt_per_harvest {
            return Err(invalid("min debt per harvest above max"));
        }
        if performance_fee > max_bps().saturating_sub(self.vault.performance_fee) {
            return Err(invalid("performance fee too high"));
        }

        let params = StrategyParams::new(
            self.now(),
            debt_ratio,
            min_debt_per_harvest,
            max_debt_per_harvest,
            performance_fee,
        );
        self.vault.strategies.insert(strategy, params);
        self.vault.debt_ratio += debt_ratio;
        self.vault.withdrawal_queue.push(strategy);

        info!(%strategy, %debt_ratio, "strategy added");
        self.emit(
            self.vault.address,
            &StrategyAdded {
                strategy,
                debtRatio: debt_ratio,
                minDebtPerHarvest: min_debt_per_harvest,
                maxDebtPerHarvest: max_debt_per_harvest,
                performanceFee: performance_fee,
            },
        );
        Ok(())
    }

    pub fn update_strategy_debt_ratio(
        &mut self,
        caller: Address,
        strategy: Address,
        debt_ratio: U256,
    ) -> StrategyResult<()> {
        self.vault.only_managers(caller)?;
        let previous = self.vault.params(strategy)?.debt_ratio;
        let total = self.vault.debt_ratio - previous + debt_ratio;
        if total > max_bps() {
            return Err(StrategyError::DebtRatioLimit);
        }
        self.vault.params_mut(strategy)?.debt_ratio(debt_ratio);
        self.vault.debt_ratio = total;

        info!(%strategy, %debt_ratio, "strategy debt ratio updated");
        self.emit(
            self.vault.address,
            &StrategyUpdateDebtRatio {
                strategy,
                debtRatio: debt_ratio,
            },
        );
        Ok(())
    }

    pub fn update_strategy_min_debt_per_harvest(
        &mut self,
        caller: Address,
        strategy: Address,
        amount: U256,
    ) -> StrategyResult<()> {
        self.vault.only_managers(caller)?;
        let params = self.vault.params_mut(strategy)?;
        if params.max_debt_per_harvest < amount {
            return Err(invalid("min debt per harvest above max"));
        }
        params.min_debt_per_harvest(amount);
        self.emit(
            self.vault.address,
            &StrategyUpdateMinDebtPerHarvest {
                strategy,
                minDebtPerHarvest: amount,
            },
        );
        Ok(())
    }

    pub fn update_strategy_max_debt_per_harvest(
        &mut self,
        caller: Address,
        strategy: Address,
        amount: U256,
    ) -> StrategyResult<()> {
        self.vault.only_managers(caller)?;
        let params = self.vault.params_mut(strategy)?;
        if params.min_debt_per_harvest > amount {
            return Err(invalid("max debt per harvest below min"));
        }
        params.max_debt_per_harvest(amount);
        self.emit(
            self.vault.address,
            &StrategyUpdateMaxDebtPerHarvest {
                strategy,
                maxDebtPerHarvest: amount,
            },
        );
        Ok(())
    }

    pub fn update_strategy_performance_fee(
        &mut self,
        caller: Address,
        strategy: Address,
        fee: U256,
    ) -> StrategyResult<()> {
        self.vault.only_governance(caller)?;
        if fee > max_bps().saturating_sub(self.vault.performance_fee) {
            return Err(invalid("performance fee too high"));
        }
        self.vault.params_mut(strategy)?.performance_fee(fee);
        self.emit(
            self.vault.address,
            &StrategyUpdatePerformanceFee {
                strategy,
                performanceFee: fee,
            },
        );
        Ok(())
    }

    /// Revokes `strategy`. Callable by governance, the guardian or the strategy itself.
    /// A strategy already at zero debt ratio is left untouched.
    pub fn revoke_strategy(&mut self, caller: Address, strategy: Address) -> StrategyResult<()> {
        require(
            caller == strategy || caller == self.vault.governance || caller == self.vault.guardian,
        )?;
        if self.vault.params(strategy)?.debt_ratio.is_zero() {
            return Ok(());
        }
        self.vault.revoke(strategy)?;

        warn!(%strategy, "strategy revoked");
        self.emit(self.vault.address, &StrategyRevoked { strategy });
        Ok(())
    }

    /// Moves debt, ratio and funds of `old_version` to `new_version`.
    pub fn migrate_strategy(
        &mut self,
        caller: Address,
        old_version: Address,
        new_version: Address,
    ) -> StrategyResult<()> {
        self.vault.only_governance(caller)?;
        if new_version == Address::ZERO {
            return Err(invalid("strategy is the zero address"));
        }
        let old = *self.vault.params(old_version)?;
        if self.vault.strategies(new_version).is_activated() {
            return Err(StrategyError::StrategyAlreadyActive(new_version));
        }
        let settings = &self.strategy(new_version)?.settings;
        if settings.vault != self.vault.address || settings.want != self.vault.token {
            return Err(invalid("strategy belongs to another vault"));
        }

        self.vault.revoke(old_version)?;
        self.emit(self.vault.address, &StrategyRevoked { strategy: old_version });
        self.vault.debt_ratio += old.debt_ratio;
        self.vault.params_mut(old_version)?.total_debt = U256::ZERO;

        let mut params = StrategyParams::new(
            old.last_report,
            old.debt_ratio,
            old.min_debt_per_harvest,
            old.max_debt_per_harvest,
            old.performance_fee,
        );
        params.total_debt = old.total_debt;
        self.vault.strategies.insert(new_version, params);

        let vault = self.vault.address;
        self.strategy_migrate(vault, old_version, new_version)?;

        if let Some(slot) = self
            .vault
            .withdrawal_queue
            .iter_mut()
            .find(|queued| **queued == old_version)
        {
            *slot = new_version;
        }

        info!(%old_version, %new_version, "strategy migrated");
        self.emit(
            vault,
            &StrategyMigrated {
                oldVersion: old_version,
                newVersion: new_version,
            },
        );
        Ok(())
    }

    /// Activating is open to the guardian and governance, deactivating to governance only.
    pub fn set_emergency_shutdown(&mut self, caller: Address, active: bool) -> StrategyResult<()> {
        if active {
            require(caller == self.vault.guardian || caller == self.vault.governance)?;
        } else {
            self.vault.only_governance(caller)?;
        }
        self.vault.emergency_shutdown = active;

        warn!(active, "vault emergency shutdown");
        self.emit(self.vault.address, &EmergencyShutdown { active });
        Ok(())
    }

    pub fn set_deposit_limit(&mut self, caller: Address, limit: U256) -> StrategyResult<()> {
        self.vault.only_governance(caller)?;
        self.vault.deposit_limit = limit;
        self.emit(self.vault.address, &UpdateDepositLimit { depositLimit: limit });
        Ok(())
    }

    /// At most half of the gain goes to the vault performance fee.
    pub fn set_performance_fee(&mut self, caller: Address, fee: U256) -> StrategyResult<()> {
        self.vault.only_governance(caller)?;
        if fee > max_bps() / U256::from(2u64) {
            return Err(invalid("performance fee too high"));
        }
        self.vault.performance_fee = fee;
        self.emit(self.vault.address, &UpdatePerformanceFee { performanceFee: fee });
        Ok(())
    }

    pub fn set_management_fee(&mut self, caller: Address, fee: U256) -> StrategyResult<()> {
        self.vault.only_governance(caller)?;
        if fee > max_bps() {
            return Err(invalid("management fee too high"));
        }
        self.vault.management_fee = fee;
        self.emit(self.vault.address, &UpdateManagementFee { managementFee: fee });
        Ok(())
    }

    pub fn set_management(&mut self, caller: Address, management: Address) -> StrategyResult<()> {
        self.vault.only_governance(caller)?;
        self.vault.management = management;
        self.emit(self.vault.address, &UpdateManagement { management });
        Ok(())
    }

    pub fn set_rewards(&mut self, caller: Address, rewards: Address) -> StrategyResult<()> {
        self.vault.only_governance(caller)?;
        if rewards == Address::ZERO || rewards == self.vault.address {
            return Err(invalid("invalid rewards address"));
        }
        self.vault.rewards = rewards;
        self.emit(self.vault.address, &UpdateRewards { rewards });
        Ok(())
    }

    pub fn set_guardian(&mut self, caller: Address, guardian: Address) -> StrategyResult<()> {
        require(caller == self.vault.guardian || caller == self.vault.governance)?;
        self.vault.guardian = guardian;
        self.emit(self.vault.address, &UpdateGuardian { guardian });
        Ok(())
    }

    pub fn set_locked_profit_degradation(
        &mut self,
        caller: Address,
        degradation: U256,
    ) -> StrategyResult<()> {
        self.vault.only_governance(caller)?;
        if degradation > scale() {
            return Err(invalid("degradation above 1e18"));
        }
        self.vault.locked_profit_degradation = degradation;
        self.emit(
            self.vault.address,
            &LockedProfitDegradationUpdated { value: degradation },
        );
        Ok(())
    }
}
