//! Liquity stability pool: LUSD deposits absorbing liquidated debt in exchange for
//! collateral (ETH) and LQTY issuance.
//!
//! Deposits are tracked with the product/sum scheme:
//! - `P` shrinks as liquidations burn deposited LUSD,
//! - `S` accumulates ETH gained per unit staked, weighted by `P`,
//! - `G` accumulates LQTY issued per unit staked, weighted by `P`.
//!
//! A liquidation that empties the pool starts a new epoch and resets `P`.

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};
use tracing::{debug, info};

use crate::{
    constants::scale,
    state::State,
    types::{ETHGainWithdrawn, LQTYPaidToDepositor, StabilityPoolOffset, UserDepositChanged},
    utils::{
        error::{arithmetic_err, StrategyError, StrategyResult},
        math::{mul_div, mul_div_up},
    },
};

/// Deposits smaller than this fraction of their initial value are treated as fully depleted.
const DEPLETION_DIVISOR: u64 = 1_000_000_000;

/// Values of `P`, `S`, `G` and the epoch when a deposit last changed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub p: U256,
    pub s: U256,
    pub g: U256,
    pub epoch: u64,
}

#[derive(Clone, Debug)]
pub struct StabilityPool {
    pub address: Address,
    pub lusd: Address,
    pub lqty: Address,
    total_deposits: U256,
    p: U256,
    current_epoch: u64,
    epoch_to_s: BTreeMap<u64, U256>,
    epoch_to_g: BTreeMap<u64, U256>,
    /// Deposit value at the time of the last snapshot
    deposits: BTreeMap<Address, U256>,
    snapshots: BTreeMap<Address, Snapshot>,
}

impl StabilityPool {
    pub fn new(address: Address, lusd: Address, lqty: Address) -> Self {
        Self {
            address,
            lusd,
            lqty,
            total_deposits: U256::ZERO,
            p: scale(),
            current_epoch: 0,
            epoch_to_s: BTreeMap::new(),
            epoch_to_g: BTreeMap::new(),
            deposits: BTreeMap::new(),
            snapshots: BTreeMap::new(),
        }
    }

    pub fn total_lusd_deposits(&self) -> U256 {
        self.total_deposits
    }

    pub fn initial_deposit(&self, depositor: Address) -> U256 {
        self.deposits.get(&depositor).copied().unwrap_or_default()
    }

    pub fn current_epoch(&self) -> u64 {
        self.current_epoch
    }

    fn s_at(&self, epoch: u64) -> U256 {
        self.epoch_to_s.get(&epoch).copied().unwrap_or_default()
    }

    fn g_at(&self, epoch: u64) -> U256 {
        self.epoch_to_g.get(&epoch).copied().unwrap_or_default()
    }

    fn snapshot(&self, depositor: Address) -> Option<(U256, Snapshot)> {
        let initial = self.initial_deposit(depositor);
        if initial.is_zero() {
            return None;
        }
        self.snapshots
            .get(&depositor)
            .map(|snapshot| (initial, *snapshot))
    }

    /// Deposit after the liquidations since the last snapshot
    pub fn compounded_lusd_deposit(&self, depositor: Address) -> StrategyResult<U256> {
        let Some((initial, snapshot)) = self.snapshot(depositor) else {
            return Ok(U256::ZERO);
        };
        if snapshot.epoch < self.current_epoch {
            return Ok(U256::ZERO);
        }
        let compounded = mul_div(initial, self.p, snapshot.p)?;
        if compounded < initial / U256::from(DEPLETION_DIVISOR) {
            return Ok(U256::ZERO);
        }
        Ok(compounded)
    }

    /// ETH earned from liquidations since the last snapshot
    pub fn depositor_eth_gain(&self, depositor: Address) -> StrategyResult<U256> {
        let Some((initial, snapshot)) = self.snapshot(depositor) else {
            return Ok(U256::ZERO);
        };
        let delta = self.s_at(snapshot.epoch).saturating_sub(snapshot.s);
        mul_div(mul_div(initial, delta, snapshot.p)?, U256::from(1u64), scale())
    }

    /// LQTY issued to the depositor since the last snapshot
    pub fn depositor_lqty_gain(&self, depositor: Address) -> StrategyResult<U256> {
        let Some((initial, snapshot)) = self.snapshot(depositor) else {
            return Ok(U256::ZERO);
        };
        let delta = self.g_at(snapshot.epoch).saturating_sub(snapshot.g);
        mul_div(mul_div(initial, delta, snapshot.p)?, U256::from(1u64), scale())
    }

    fn update_deposit_and_snapshots(&mut self, depositor: Address, new_value: U256) {
        if new_value.is_zero() {
            self.deposits.remove(&depositor);
            self.snapshots.remove(&depositor);
            return;
        }
        self.deposits.insert(depositor, new_value);
        self.snapshots.insert(
            depositor,
            Snapshot {
                p: self.p,
                s: self.s_at(self.current_epoch),
                g: self.g_at(self.current_epoch),
                epoch: self.current_epoch,
            },
        );
    }

    /// Updates `S` and `P` for a liquidation of `debt` against the deposits.
    fn record_offset(&mut self, debt: U256, coll: U256) -> StrategyResult<()> {
        let total = self.total_deposits;
        let eth_gain_per_unit = mul_div(coll, scale(), total)?;
        let loss_per_unit = if debt == total {
            scale()
        } else {
            mul_div_up(debt, scale(), total)?.min(scale())
        };

        let marginal_eth_gain = eth_gain_per_unit
            .checked_mul(self.p)
            .ok_or(arithmetic_err("Stability pool sum overflowed."))?;
        let epoch_sum = self.epoch_to_s.entry(self.current_epoch).or_default();
        *epoch_sum += marginal_eth_gain;

        let new_product_factor = scale() - loss_per_unit;
        if new_product_factor.is_zero() {
            self.current_epoch += 1;
            self.p = scale();
        } else {
            self.p = mul_div(self.p, new_product_factor, scale())?;
        }
        self.total_deposits = total - debt;
        Ok(())
    }

    /// Updates `G` for newly issued LQTY. Returns false when nobody is staked.
    fn record_issuance(&mut self, amount: U256) -> StrategyResult<bool> {
        if self.total_deposits.is_zero() || amount.is_zero() {
            return Ok(false);
        }
        let per_unit = mul_div(amount, scale(), self.total_deposits)?;
        let marginal = per_unit
            .checked_mul(self.p)
            .ok_or(arithmetic_err("Stability pool sum overflowed."))?;
        *self.epoch_to_g.entry(self.current_epoch).or_default() += marginal;
        Ok(true)
    }
}

impl State {
    /// Sends ETH and LQTY gains to the depositor. Returns the ETH paid.
    fn pay_out_sp_gains(&mut self, depositor: Address) -> StrategyResult<U256> {
        let pool = self.stability_pool.address;
        let lqty_gain = self.stability_pool.depositor_lqty_gain(depositor)?;
        if !lqty_gain.is_zero() {
            self.ledger
                .transfer(self.stability_pool.lqty, pool, depositor, lqty_gain)?;
            self.emit(
                pool,
                &LQTYPaidToDepositor {
                    depositor,
                    LQTY: lqty_gain,
                },
            );
        }
        let eth_gain = self.stability_pool.depositor_eth_gain(depositor)?;
        if !eth_gain.is_zero() {
            self.ledger.transfer_native(pool, depositor, eth_gain)?;
        }
        Ok(eth_gain)
    }

    /// `provideToSP`: pays out pending gains and adds `amount` to the compounded deposit.
    pub fn provide_to_sp(&mut self, depositor: Address, amount: U256) -> StrategyResult<()> {
        if amount.is_zero() {
            return Err(StrategyError::ZeroAmount);
        }
        let initial = self.stability_pool.initial_deposit(depositor);
        let compounded = self.stability_pool.compounded_lusd_deposit(depositor)?;
        let eth_gain = self.pay_out_sp_gains(depositor)?;

        let pool = self.stability_pool.address;
        self.ledger
            .transfer(self.stability_pool.lusd, depositor, pool, amount)?;
        self.stability_pool.total_deposits += amount;

        let new_deposit = compounded + amount;
        self.stability_pool
            .update_deposit_and_snapshots(depositor, new_deposit);

        debug!(%depositor, %amount, %new_deposit, "provide to stability pool");
        self.emit(
            pool,
            &UserDepositChanged {
                depositor,
                newDeposit: new_deposit,
            },
        );
        self.emit(
            pool,
            &ETHGainWithdrawn {
                depositor,
                ETH: eth_gain,
                LUSDLoss: initial.saturating_sub(compounded),
            },
        );
        Ok(())
    }

    /// `withdrawFromSP`: pays out pending gains and withdraws up to the compounded deposit.
    /// Withdrawing zero only claims the gains.
    pub fn withdraw_from_sp(&mut self, depositor: Address, amount: U256) -> StrategyResult<U256> {
        let initial = self.stability_pool.initial_deposit(depositor);
        if initial.is_zero() {
            return Err(StrategyError::ZeroDeposit);
        }
        let compounded = self.stability_pool.compounded_lusd_deposit(depositor)?;
        let to_withdraw = amount.min(compounded);
        let eth_gain = self.pay_out_sp_gains(depositor)?;

        let pool = self.stability_pool.address;
        if !to_withdraw.is_zero() {
            self.ledger
                .transfer(self.stability_pool.lusd, pool, depositor, to_withdraw)?;
            self.stability_pool.total_deposits -= to_withdraw;
        }

        let new_deposit = compounded - to_withdraw;
        self.stability_pool
            .update_deposit_and_snapshots(depositor, new_deposit);

        debug!(%depositor, %to_withdraw, %new_deposit, %eth_gain, "withdraw from stability pool");
        self.emit(
            pool,
            &UserDepositChanged {
                depositor,
                newDeposit: new_deposit,
            },
        );
        self.emit(
            pool,
            &ETHGainWithdrawn {
                depositor,
                ETH: eth_gain,
                LUSDLoss: initial.saturating_sub(compounded),
            },
        );
        Ok(to_withdraw)
    }

    /// Liquidation absorbed by the pool: `debt` LUSD is burned from the deposits and
    /// `coll` ETH is distributed to depositors.
    pub fn offset(&mut self, debt: U256, coll: U256) -> StrategyResult<()> {
        let total = self.stability_pool.total_lusd_deposits();
        if total.is_zero() || debt.is_zero() {
            return Ok(());
        }
        if debt > total {
            return Err(StrategyError::Custom(
                "debt to offset exceeds stability pool deposits".to_string(),
            ));
        }
        self.stability_pool.record_offset(debt, coll)?;

        let pool = self.stability_pool.address;
        self.ledger.burn(self.stability_pool.lusd, pool, debt)?;
        self.ledger.fund_native(pool, coll);

        info!(%debt, %coll, "stability pool offset");
        self.emit(
            pool,
            &StabilityPoolOffset {
                debtToOffset: debt,
                collToAdd: coll,
            },
        );
        Ok(())
    }

    /// Community issuance of `amount` LQTY to current depositors.
    /// Nothing is issued while the pool is empty.
    pub fn issue_lqty(&mut self, amount: U256) -> StrategyResult<()> {
        if self.stability_pool.record_issuance(amount)? {
            let pool = self.stability_pool.address;
            self.ledger.mint(self.stability_pool.lqty, pool, amount)?;
            info!(%amount, "lqty issued to stability pool");
        }
        Ok(())
    }
}
