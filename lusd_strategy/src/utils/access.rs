//! Role checks shared by the strategy entry points

use alloy_primitives::Address;

use super::error::{StrategyError, StrategyResult};

/// Snapshot of every address holding a role over a strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Roles {
    /// Vault governance
    pub governance: Address,
    /// Vault management
    pub management: Address,
    /// Vault guardian
    pub guardian: Address,
    /// Strategy strategist
    pub strategist: Address,
    /// Strategy keeper
    pub keeper: Address,
}

fn require(allowed: bool) -> StrategyResult<()> {
    if allowed {
        Ok(())
    } else {
        Err(StrategyError::Unauthorized)
    }
}

impl Roles {
    pub fn only_governance(&self, caller: Address) -> StrategyResult<()> {
        require(caller == self.governance)
    }

    pub fn only_strategist(&self, caller: Address) -> StrategyResult<()> {
        require(caller == self.strategist)
    }

    /// Strategist or governance
    pub fn only_authorized(&self, caller: Address) -> StrategyResult<()> {
        require(caller == self.strategist || caller == self.governance)
    }

    /// Strategist, governance, guardian or management
    pub fn only_emergency_authorized(&self, caller: Address) -> StrategyResult<()> {
        require(
            caller == self.strategist
                || caller == self.governance
                || caller == self.guardian
                || caller == self.management,
        )
    }

    /// Emergency authorized roles plus the keeper
    pub fn only_keepers(&self, caller: Address) -> StrategyResult<()> {
        require(caller == self.keeper || self.only_emergency_authorized(caller).is_ok())
    }

    /// Governance or management
    pub fn only_vault_managers(&self, caller: Address) -> StrategyResult<()> {
        require(caller == self.governance || caller == self.management)
    }
}
