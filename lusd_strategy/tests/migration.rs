mod common;

use alloy_primitives::U256;
use common::*;
use lusd_strategy::constants::{LQTY, LUSD};

#[test]
fn migration_moves_funds_and_debt() {
    let amount = e18(10_000);
    let mut f = Fixture::with_user_funds(amount);
    let (user, gov, strategy) = (f.accounts.user, f.accounts.gov, f.strategy);
    f.deposit(user, amount);
    f.harvest().unwrap();
    assert_approx(f.eta(), amount);

    f.send_lqty(strategy, e18(3));
    let new_strategy = f.chain.deploy_strategy().unwrap();
    f.chain.migrate_strategy(gov, strategy, new_strategy).unwrap();

    assert_eq!(f.balance(LUSD, new_strategy), amount);
    assert_eq!(f.balance(LQTY, new_strategy), e18(3));
    assert_eq!(f.eta_of(strategy), U256::ZERO);
    let lqty_value = f.chain.state.lqty_to_want(new_strategy, e18(3)).unwrap();
    assert!(approx(f.eta_of(new_strategy) - lqty_value, amount));

    let vault = &f.chain.state.vault;
    assert_eq!(vault.withdrawal_queue, vec![new_strategy]);
    assert_eq!(vault.strategies(new_strategy).total_debt, amount);
    assert_eq!(vault.strategies(strategy).total_debt, U256::ZERO);
    assert_eq!(vault.strategies(strategy).debt_ratio, U256::ZERO);
}

#[test]
fn migrated_strategy_keeps_harvesting() {
    let amount = e18(10_000);
    let mut f = Fixture::with_user_funds(amount);
    let (user, gov, strategy) = (f.accounts.user, f.accounts.gov, f.strategy);
    let (strategist, keeper) = (f.accounts.strategist, f.accounts.keeper);
    f.deposit(user, amount);
    f.harvest().unwrap();

    let new_strategy = f.chain.deploy_strategy().unwrap();
    f.chain.migrate_strategy(gov, strategy, new_strategy).unwrap();

    f.chain.set_keeper(strategist, new_strategy, keeper).unwrap();
    f.chain.sleep(1);
    f.chain.harvest(keeper, new_strategy).unwrap();
    assert_eq!(f.chain.state.stability_pool.compounded_lusd_deposit(new_strategy).unwrap(), amount);
}

#[test]
fn migration_is_governance_only() {
    let mut f = Fixture::new();
    let (strategist, strategy) = (f.accounts.strategist, f.strategy);
    let new_strategy = f.chain.deploy_strategy().unwrap();
    assert_unauthorized(f.chain.migrate_strategy(strategist, strategy, new_strategy));
}
