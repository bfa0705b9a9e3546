mod common;

use alloy_primitives::{Address, U256};
use common::*;
use lusd_strategy::strategy::StrategySettings;

fn settings(f: &Fixture) -> StrategySettings {
    f.chain.state.strategy(f.strategy).unwrap().settings.clone()
}

fn harvest_trigger(f: &Fixture) -> bool {
    f.chain.state.harvest_trigger(f.strategy, U256::ZERO).unwrap()
}

#[test]
fn set_strategist_acl() {
    let mut f = Fixture::new();
    let strategy = f.strategy;
    let a = f.accounts.clone();

    for caller in [a.management, a.guardian, a.keeper, a.user] {
        assert_unauthorized(f.chain.set_strategist(caller, strategy, a.user));
    }
    assert!(f.chain.set_strategist(a.gov, strategy, Address::ZERO).is_err());

    f.chain.set_strategist(a.gov, strategy, a.user).unwrap();
    assert_eq!(settings(&f).strategist, a.user);
    // the new strategist holds the role, the old one lost it
    assert_unauthorized(f.chain.set_strategist(a.strategist, strategy, a.strategist));
    f.chain.set_strategist(a.user, strategy, a.strategist).unwrap();
    assert_eq!(settings(&f).strategist, a.strategist);
}

#[test]
fn set_keeper_hands_over_harvesting() {
    let mut f = Fixture::new();
    let strategy = f.strategy;
    let a = f.accounts.clone();
    let new_keeper = f.chain.new_account();

    for caller in [a.management, a.guardian, a.keeper, a.user] {
        assert_unauthorized(f.chain.set_keeper(caller, strategy, new_keeper));
    }
    assert_unauthorized(f.chain.harvest(new_keeper, strategy));

    f.chain.set_keeper(a.strategist, strategy, new_keeper).unwrap();
    assert_eq!(settings(&f).keeper, new_keeper);
    f.chain.sleep(1);
    f.chain.harvest(new_keeper, strategy).unwrap();
    assert_unauthorized(f.chain.harvest(a.keeper, strategy));
}

#[test]
fn set_strategy_rewards_is_strategist_only() {
    let mut f = Fixture::new();
    let strategy = f.strategy;
    let a = f.accounts.clone();

    for caller in [a.gov, a.management, a.guardian, a.keeper, a.user] {
        assert_unauthorized(f.chain.set_strategy_rewards(caller, strategy, a.user));
    }
    assert!(f
        .chain
        .set_strategy_rewards(a.strategist, strategy, Address::ZERO)
        .is_err());
    f.chain.set_strategy_rewards(a.strategist, strategy, a.user).unwrap();
    assert_eq!(settings(&f).rewards, a.user);
}

#[test]
fn report_delays_drive_the_harvest_trigger() {
    let mut f = Fixture::new();
    let (whale, strategy) = (f.accounts.lusd_whale, f.strategy);
    let a = f.accounts.clone();
    f.deposit(whale, e18(1_000));
    f.harvest().unwrap();
    f.chain.sleep(60);
    assert!(!harvest_trigger(&f));

    assert_unauthorized(f.chain.set_max_report_delay(a.keeper, strategy, 30));
    f.chain.set_max_report_delay(a.strategist, strategy, 30).unwrap();
    assert_eq!(settings(&f).max_report_delay, 30);
    assert!(harvest_trigger(&f));

    assert_unauthorized(f.chain.set_min_report_delay(a.management, strategy, 3_600));
    f.chain.set_min_report_delay(a.gov, strategy, 3_600).unwrap();
    assert_eq!(settings(&f).min_report_delay, 3_600);
    assert!(!harvest_trigger(&f));
}

#[test]
fn profit_factor_weighs_the_call_cost() {
    let mut f = Fixture::new();
    let (whale, strategy) = (f.accounts.lusd_whale, f.strategy);
    let a = f.accounts.clone();
    f.deposit(whale, e18(1_000));
    f.harvest().unwrap();
    f.send_lusd(strategy, e18(10));
    f.chain.sleep(60);

    // 10 LUSD of profit against a call cost of 0.001 ETH, 2 LUSD
    let call_cost = e18(1) / U256::from(1_000u64);
    let trigger = |f: &Fixture| f.chain.state.harvest_trigger(strategy, call_cost).unwrap();
    f.chain.set_profit_factor(a.strategist, strategy, U256::from(1u64)).unwrap();
    assert!(trigger(&f));

    assert_unauthorized(f.chain.set_profit_factor(a.guardian, strategy, U256::from(100u64)));
    f.chain.set_profit_factor(a.gov, strategy, U256::from(100u64)).unwrap();
    assert_eq!(settings(&f).profit_factor, U256::from(100u64));
    assert!(!trigger(&f));
}

#[test]
fn huge_debt_threshold_does_not_fake_a_loss() {
    let mut f = Fixture::new();
    let (whale, strategy) = (f.accounts.lusd_whale, f.strategy);
    let a = f.accounts.clone();
    f.deposit(whale, e18(10_000));
    f.harvest().unwrap();
    f.chain.sleep(60);

    assert_unauthorized(f.chain.set_debt_threshold(a.user, strategy, U256::MAX));
    f.chain.set_debt_threshold(a.strategist, strategy, U256::MAX).unwrap();
    assert_eq!(settings(&f).debt_threshold, U256::MAX);
    assert!(!harvest_trigger(&f));
}

#[test]
fn debt_threshold_tolerates_small_losses() {
    let mut f = Fixture::new();
    let (whale, strategist, strategy) = (f.accounts.lusd_whale, f.accounts.strategist, f.strategy);
    f.deposit(whale, e18(10_000));
    f.harvest().unwrap();
    f.chain.withdraw_lusd(strategist, strategy, e18(5)).unwrap();
    f.drain_idle_lusd();
    f.chain.sleep(60);
    assert!(harvest_trigger(&f));

    f.chain.set_debt_threshold(strategist, strategy, e18(10)).unwrap();
    assert!(!harvest_trigger(&f));
}

#[test]
fn set_health_check_acl() {
    let mut f = Fixture::new();
    let strategy = f.strategy;
    let a = f.accounts.clone();
    let common = f.chain.state.health_check.address;

    for caller in [a.strategist, a.guardian, a.keeper, a.user] {
        assert_unauthorized(f.chain.set_health_check(caller, strategy, Address::ZERO));
    }
    f.chain.set_health_check(a.management, strategy, Address::ZERO).unwrap();
    assert_eq!(settings(&f).health_check, Address::ZERO);
    f.chain.set_health_check(a.gov, strategy, common).unwrap();
    assert_eq!(settings(&f).health_check, common);
}

#[test]
fn unknown_health_check_reverts_the_harvest() {
    let mut f = Fixture::new();
    let (gov, user, strategy) = (f.accounts.gov, f.accounts.user, f.strategy);
    f.chain.set_health_check(gov, strategy, user).unwrap();
    assert!(f.harvest().is_err());
    assert!(f.chain.journal.last().unwrap().failed());
}
