mod common;

use alloy_primitives::U256;
use common::*;
use lusd_strategy::constants::{LQTY, LUSD};

#[test]
fn deposit_harvest_tend_and_withdraw() {
    let amount = e18(10_000);
    let mut f = Fixture::with_user_funds(amount);
    let user = f.accounts.user;
    let user_balance_before = f.balance(LUSD, user);

    f.deposit(user, amount);
    assert_eq!(f.balance(LUSD, f.vault()), amount);

    f.harvest().unwrap();
    assert_approx(f.eta(), amount);

    let (keeper, strategy) = (f.accounts.keeper, f.strategy);
    f.chain.tend(keeper, strategy).unwrap();

    f.chain.withdraw(user, U256::MAX).unwrap();
    assert_approx(f.balance(LUSD, user), user_balance_before);
}

#[test]
fn emergency_exit_returns_funds() {
    let amount = e18(10_000);
    let mut f = Fixture::with_user_funds(amount);
    let user = f.accounts.user;
    f.deposit(user, amount);
    f.harvest().unwrap();
    assert_approx(f.eta(), amount);

    let (strategist, strategy) = (f.accounts.strategist, f.strategy);
    f.chain.set_emergency_exit(strategist, strategy).unwrap();
    f.harvest().unwrap();
    assert!(f.eta() < amount);
    assert_eq!(f.balance(LUSD, strategy), U256::ZERO);
}

#[test]
fn profitable_harvest() {
    let amount = e18(10_000);
    let mut f = Fixture::with_user_funds(amount);
    let user = f.accounts.user;
    f.deposit(user, amount);
    assert_eq!(f.balance(LUSD, f.vault()), amount);

    f.harvest().unwrap();
    assert_approx(f.eta(), amount);

    let before_pps = f.price_per_share();
    let strategy = f.strategy;
    f.send_lqty(strategy, e18(20));

    f.harvest().unwrap();
    f.unlock_profit();
    let profit = f.balance(LUSD, f.vault());

    assert!(f.eta() + profit > amount);
    assert!(f.price_per_share() > before_pps);
    assert!(f.total_assets() > amount);
    assert_eq!(f.balance(LQTY, strategy), U256::ZERO);
}

#[test]
fn profitable_harvest_with_full_withdrawal() {
    let amount = e18(10_000);
    let mut f = Fixture::with_user_funds(amount);
    let user = f.accounts.user;
    f.deposit(user, amount);
    f.harvest().unwrap();
    assert_approx(f.eta(), amount);

    let (gov, strategy) = (f.accounts.gov, f.strategy);
    f.send_lqty(strategy, e18(20));

    f.chain.update_strategy_debt_ratio(gov, strategy, U256::ZERO).unwrap();
    f.chain.set_do_health_check(gov, strategy, false).unwrap();
    f.harvest().unwrap();
    f.unlock_profit();

    assert_eq!(f.params().total_debt, U256::ZERO);
    assert!(f.params().total_gain > U256::ZERO);
}

#[test]
fn change_debt_ratio() {
    let amount = e18(10_000);
    let mut f = Fixture::with_user_funds(amount);
    let (user, gov, strategy) = (f.accounts.user, f.accounts.gov, f.strategy);
    f.deposit(user, amount);
    let half = amount / U256::from(2u64);

    f.chain
        .update_strategy_debt_ratio(gov, strategy, U256::from(5_000u64))
        .unwrap();
    f.harvest().unwrap();
    assert_approx(f.eta(), half);

    f.chain
        .update_strategy_debt_ratio(gov, strategy, U256::from(10_000u64))
        .unwrap();
    f.harvest().unwrap();
    assert_approx(f.eta(), amount);

    f.chain
        .update_strategy_debt_ratio(gov, strategy, U256::from(5_000u64))
        .unwrap();
    f.harvest().unwrap();
    assert_approx(f.eta(), half);
}

#[test]
fn sweep_protects_want_and_shares() {
    let amount = e18(10_000);
    let mut f = Fixture::with_user_funds(amount);
    let (user, gov, strategy) = (f.accounts.user, f.accounts.gov, f.strategy);
    f.chain.transfer(LUSD, user, strategy, amount).unwrap();
    assert_eq!(f.chain.state.strategy(strategy).unwrap().settings.want, LUSD);
    assert!(f.balance(LUSD, strategy) > U256::ZERO);

    assert_reverts_with(f.chain.sweep(gov, strategy, LUSD), "!want");
    let vault = f.vault();
    assert_reverts_with(f.chain.sweep(gov, strategy, vault), "!shares");

    f.send_lqty(strategy, e18(5));
    assert_unauthorized(f.chain.sweep(user, strategy, LQTY));
    assert_eq!(f.chain.sweep(gov, strategy, LQTY).unwrap(), e18(5));
    assert_eq!(f.balance(LQTY, gov), e18(5));
}

#[test]
fn triggers() {
    let amount = e18(10_000);
    let mut f = Fixture::with_user_funds(amount);
    let (user, gov, strategy) = (f.accounts.user, f.accounts.gov, f.strategy);
    f.deposit(user, amount);
    f.chain
        .update_strategy_debt_ratio(gov, strategy, U256::from(5_000u64))
        .unwrap();
    f.harvest().unwrap();

    assert!(!f.chain.state.harvest_trigger(strategy, U256::ZERO).unwrap());
    assert!(!f.chain.state.tend_trigger(strategy, U256::ZERO).unwrap());

    // idle want above what the vault asks back
    f.send_lusd(strategy, e18(100));
    assert!(f.chain.state.tend_trigger(strategy, U256::ZERO).unwrap());

    f.chain.sleep(DAY);
    assert!(f.chain.state.harvest_trigger(strategy, U256::ZERO).unwrap());
}

#[test]
fn loss_when_eth_price_declines_faster() {
    let amount = e18(50_000);
    let mut f = Fixture::new();
    let (whale, gov, strategist, strategy) = (
        f.accounts.lusd_whale,
        f.accounts.gov,
        f.accounts.strategist,
        f.strategy,
    );
    f.deposit(whale, amount);
    assert_eq!(f.balance(LUSD, f.vault()), amount);
    f.harvest().unwrap();
    assert_approx(f.eta(), amount);

    let before_pps = f.price_per_share();
    f.send_eth(strategy, e18(1));
    f.send_lqty(strategy, e18(10));
    f.chain.withdraw_lusd(strategist, strategy, e18(20_000)).unwrap();
    f.drain_idle_lusd();

    f.chain.set_do_health_check(gov, strategy, false).unwrap();
    f.harvest().unwrap();
    f.unlock_profit();

    assert!(f.eta() < amount);
    assert!(f.price_per_share() < before_pps);
    assert!(f.total_assets() < amount);
    assert!(f.params().total_loss > U256::ZERO);
    assert_eq!(f.params().total_gain, U256::ZERO);
}

#[test]
fn loss_in_lusd_ends_in_profit_when_lqty_rewards_are_higher() {
    let amount = e18(50_000);
    let mut f = Fixture::new();
    let (whale, gov, strategist, strategy) = (
        f.accounts.lusd_whale,
        f.accounts.gov,
        f.accounts.strategist,
        f.strategy,
    );
    f.deposit(whale, amount);
    f.harvest().unwrap();
    assert_approx(f.eta(), amount);

    let before_pps = f.price_per_share();
    f.send_eth(strategy, e18(1));
    f.send_lqty(strategy, e18(1_500));
    f.chain.withdraw_lusd(strategist, strategy, e18(10_000)).unwrap();
    f.drain_idle_lusd();

    f.chain.set_do_health_check(gov, strategy, false).unwrap();
    f.harvest().unwrap();
    f.unlock_profit();

    assert_eq!(f.eta(), amount);
    assert!(f.price_per_share() > before_pps);
    assert!(f.total_assets() > amount);
    assert_eq!(f.params().total_loss, U256::ZERO);
    assert!(f.params().total_gain > U256::ZERO);
}

#[test]
fn failed_harvest_is_journaled_and_rolled_back() {
    let amount = e18(10_000);
    let mut f = Fixture::with_user_funds(amount);
    let (user, strategy) = (f.accounts.user, f.strategy);
    f.deposit(user, amount);

    let before = f.params();
    assert_unauthorized(f.chain.harvest(user, strategy));
    assert_eq!(f.params(), before);
    let last = f.chain.journal.last().unwrap();
    assert_eq!(last.label, "strategy.harvest");
    assert!(last.failed());
}

#[test]
fn journal_records_reverted_harvests() {
    let mut f = Fixture::new();
    let (whale, strategy) = (f.accounts.lusd_whale, f.strategy);
    f.deposit(whale, e18(10_000));
    f.harvest().unwrap();
    f.send_lusd(strategy, e18(5_000));
    assert!(f.harvest().is_err());

    let harvests: Vec<_> = f.chain.journal.by_label("strategy.harvest").collect();
    assert_eq!(harvests.len(), 2);
    assert!(!harvests[0].failed());
    assert!(harvests[1].failed());
    let line = harvests[1].entries.last().unwrap().render();
    assert!(line.contains("!healthcheck"), "{line}");
    assert!(line.contains("reverted"), "{line}");
}
