mod common;

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use common::*;
use lusd_strategy::{
    constants::{LUSD, MAX_BPS},
    HarvestOutcome, HealthCheck,
};

fn limits(f: &Fixture) -> (u64, u64) {
    let check = &f.chain.state.health_check;
    (
        check.profit_limit_ratio().to::<u64>(),
        check.loss_limit_ratio().to::<u64>(),
    )
}

#[test]
fn high_profit_causes_healthcheck_revert() {
    let mut f = Fixture::new();
    let (profit_limit, _) = limits(&f);
    let (whale, strategy) = (f.accounts.lusd_whale, f.strategy);
    f.deposit(whale, e18(50_000));
    f.harvest().unwrap();

    let total_debt = f.params().total_debt;
    f.send_lusd(strategy, fraction(total_debt, profit_limit + 1, MAX_BPS));

    let before = f.params();
    assert_reverts_with(f.harvest(), "!healthcheck");
    assert_eq!(f.params(), before);
}

#[test]
fn profit_under_max_ratio_does_not_revert() {
    let mut f = Fixture::new();
    let (profit_limit, _) = limits(&f);
    let (whale, strategy) = (f.accounts.lusd_whale, f.strategy);
    f.deposit(whale, e18(1_000));
    f.harvest().unwrap();

    let total_debt = f.params().total_debt;
    f.send_lusd(strategy, fraction(total_debt, profit_limit - 1, MAX_BPS));
    f.harvest().unwrap();
}

#[test]
fn high_loss_causes_healthcheck_revert() {
    let mut f = Fixture::new();
    let (whale, strategist, strategy) = (f.accounts.lusd_whale, f.accounts.strategist, f.strategy);
    f.deposit(whale, e18(50_000));
    f.harvest().unwrap();

    f.chain.withdraw_lusd(strategist, strategy, e18(20_000)).unwrap();
    f.drain_idle_lusd();

    assert_reverts_with(f.harvest(), "!healthcheck");
}

#[test]
fn loss_under_max_ratio_does_not_revert() {
    let mut f = Fixture::new();
    let (_, loss_limit) = limits(&f);
    let (whale, strategist, strategy) = (f.accounts.lusd_whale, f.accounts.strategist, f.strategy);
    f.deposit(whale, e18(1));
    f.harvest().unwrap();

    let total_debt = f.params().total_debt;
    f.chain
        .withdraw_lusd(strategist, strategy, fraction(total_debt, loss_limit - 1, MAX_BPS))
        .unwrap();
    f.drain_idle_lusd();

    f.harvest().unwrap();
    assert!(f.params().total_loss > U256::ZERO);
}

#[test]
fn disabled_check_is_re_enabled_by_harvest() {
    let mut f = Fixture::new();
    let (whale, gov, strategy) = (f.accounts.lusd_whale, f.accounts.gov, f.strategy);
    f.deposit(whale, e18(10_000));
    f.harvest().unwrap();

    f.send_lusd(strategy, e18(1_000));
    f.chain.set_do_health_check(gov, strategy, false).unwrap();
    f.harvest().unwrap();
    assert!(f.chain.state.strategy(strategy).unwrap().data.do_health_check);

    f.send_lusd(strategy, e18(1_000));
    assert_reverts_with(f.harvest(), "!healthcheck");
}

#[test]
fn strategy_without_health_check_accepts_any_outcome() {
    let mut f = Fixture::new();
    let (whale, gov, strategy) = (f.accounts.lusd_whale, f.accounts.gov, f.strategy);
    f.deposit(whale, e18(10_000));
    f.harvest().unwrap();

    f.chain.set_health_check(gov, strategy, Address::ZERO).unwrap();
    f.send_lusd(strategy, e18(2_000));
    f.harvest().unwrap();
    assert_eq!(f.params().total_gain, e18(2_000));
}

struct RejectEverything;

impl HealthCheck for RejectEverything {
    fn check(&self, _strategy: Address, _outcome: &HarvestOutcome) -> bool {
        false
    }
}

#[test]
fn custom_check_overrides_limits() {
    let mut f = Fixture::new();
    let (whale, management, strategy) = (f.accounts.lusd_whale, f.accounts.management, f.strategy);
    f.deposit(whale, e18(10_000));

    f.chain
        .set_custom_check(management, strategy, Arc::new(RejectEverything))
        .unwrap();
    assert_reverts_with(f.harvest(), "!healthcheck");
    assert_eq!(f.balance(LUSD, f.vault()), e18(10_000));
}

#[test]
fn health_check_admin_acl() {
    let mut f = Fixture::new();
    let (strategy, loss) = (f.strategy, f.chain.state.health_check.loss_limit_ratio());
    let a = f.accounts.clone();
    let ratio = U256::from(100u64);

    for caller in [a.strategist, a.guardian, a.keeper, a.user] {
        assert_unauthorized(f.chain.set_profit_limit_ratio(caller, ratio));
        assert_unauthorized(f.chain.set_loss_limit_ratio(caller, ratio));
        assert_unauthorized(f.chain.set_strategy_limits(caller, strategy, ratio, loss));
        assert_unauthorized(f.chain.set_disabled_check(caller, strategy, true));
        assert_unauthorized(f.chain.set_health_check_management(caller, caller));
        assert_unauthorized(f.chain.set_health_check_governance(caller, caller));
    }
    // management tunes limits but cannot hand over roles
    assert_unauthorized(f.chain.set_health_check_management(a.management, a.user));

    f.chain.set_profit_limit_ratio(a.gov, U256::from(MAX_BPS)).unwrap();
    assert!(f.chain.set_profit_limit_ratio(a.gov, U256::from(MAX_BPS + 1)).is_err());
    assert!(f.chain.set_loss_limit_ratio(a.management, U256::from(MAX_BPS)).is_err());
    f.chain.set_loss_limit_ratio(a.management, U256::from(MAX_BPS - 1)).unwrap();
    assert_eq!(limits(&f), (MAX_BPS, MAX_BPS - 1));
}

#[test]
fn health_check_roles_can_be_handed_over() {
    let mut f = Fixture::new();
    let a = f.accounts.clone();
    let ratio = U256::from(100u64);

    f.chain.set_health_check_management(a.gov, a.user).unwrap();
    assert_unauthorized(f.chain.set_profit_limit_ratio(a.management, ratio));
    f.chain.set_profit_limit_ratio(a.user, ratio).unwrap();

    f.chain.set_health_check_governance(a.gov, a.strategist).unwrap();
    assert_unauthorized(f.chain.set_loss_limit_ratio(a.gov, ratio));
    f.chain.set_health_check_management(a.strategist, a.management).unwrap();
    assert_eq!(f.chain.state.health_check.governance, a.strategist);
    assert_eq!(f.chain.state.health_check.management, a.management);
}

#[test]
fn lowered_profit_limit_and_strategy_override() {
    let mut f = Fixture::new();
    let (whale, strategy) = (f.accounts.lusd_whale, f.strategy);
    let (gov, management) = (f.accounts.gov, f.accounts.management);
    let loss = f.chain.state.health_check.loss_limit_ratio();
    f.deposit(whale, e18(10_000));
    f.harvest().unwrap();

    // 1% profit against a 0.5% limit
    f.chain
        .set_profit_limit_ratio(management, U256::from(50u64))
        .unwrap();
    f.send_lusd(strategy, e18(100));
    assert_reverts_with(f.harvest(), "!healthcheck");

    f.chain
        .set_strategy_limits(gov, strategy, U256::from(200u64), loss)
        .unwrap();
    f.harvest().unwrap();
    assert_eq!(f.params().total_gain, e18(100));
}

#[test]
fn disabled_check_lets_any_outcome_through() {
    let mut f = Fixture::new();
    let (whale, management, strategy) = (f.accounts.lusd_whale, f.accounts.management, f.strategy);
    f.deposit(whale, e18(10_000));
    f.harvest().unwrap();

    f.chain.set_disabled_check(management, strategy, true).unwrap();
    f.send_lusd(strategy, e18(2_000));
    f.harvest().unwrap();

    f.chain.set_disabled_check(management, strategy, false).unwrap();
    f.send_lusd(strategy, e18(2_000));
    assert_reverts_with(f.harvest(), "!healthcheck");
}
