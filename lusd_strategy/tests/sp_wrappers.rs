mod common;

use alloy_primitives::U256;
use common::*;
use lusd_strategy::{constants::LUSD, StrategyError};

fn lusd_balance(f: &Fixture) -> U256 {
    f.chain.state.total_lusd_balance(f.strategy).unwrap()
}

#[test]
fn withdraw_wrapper() {
    let mut f = Fixture::new();
    let amount = e18(100);
    let strategy = f.strategy;
    let accounts = f.accounts.clone();

    f.send_lusd(strategy, amount);
    assert_eq!(f.balance(LUSD, strategy), amount);

    f.chain.sleep(1);
    f.chain.tend(accounts.keeper, strategy).unwrap();
    assert_eq!(lusd_balance(&f), amount);
    assert_eq!(f.balance(LUSD, strategy), U256::ZERO);

    let mut withdrawn = 0u64;
    for (caller, wei) in [
        (accounts.gov, 1u64),
        (accounts.management, 2),
        (accounts.strategist, 3),
        (accounts.guardian, 4),
    ] {
        f.chain.withdraw_lusd(caller, strategy, U256::from(wei)).unwrap();
        withdrawn += wei;
        assert_eq!(lusd_balance(&f), amount);
        assert_eq!(f.balance(LUSD, strategy), U256::from(withdrawn));
    }

    assert_unauthorized(f.chain.withdraw_lusd(accounts.user, strategy, U256::from(5u64)));

    // capped at the remaining deposit
    f.chain
        .withdraw_lusd(accounts.gov, strategy, e18(10_000_000))
        .unwrap();
    assert_eq!(lusd_balance(&f), amount);
    assert_eq!(f.balance(LUSD, strategy), amount);

    assert_reverts_with(
        f.chain.withdraw_lusd(accounts.gov, strategy, U256::from(1u64)),
        "StabilityPool: User must have a non-zero deposit",
    );
}

#[test]
fn deposit_wrapper() {
    let mut f = Fixture::new();
    let amount = e18(100);
    let strategy = f.strategy;
    let accounts = f.accounts.clone();
    f.send_lusd(strategy, amount);

    let mut deposited = U256::ZERO;
    for (caller, wei) in [
        (accounts.gov, 1u64),
        (accounts.management, 2),
        (accounts.strategist, 3),
        (accounts.guardian, 4),
    ] {
        f.chain.deposit_lusd(caller, strategy, U256::from(wei)).unwrap();
        deposited += U256::from(wei);
        assert_eq!(lusd_balance(&f), amount);
        assert_eq!(f.balance(LUSD, strategy), amount - deposited);
    }

    assert_unauthorized(f.chain.deposit_lusd(accounts.user, strategy, U256::from(5u64)));

    assert!(matches!(
        f.chain.deposit_lusd(accounts.gov, strategy, e18(1_000)),
        Err(StrategyError::InsufficientBalance { .. })
    ));
    assert_eq!(f.balance(LUSD, strategy), amount - deposited);
}

#[test]
fn zero_deposit_reverts() {
    let mut f = Fixture::new();
    let (gov, strategy) = (f.accounts.gov, f.strategy);
    f.send_lusd(strategy, e18(1));
    assert_reverts_with(
        f.chain.deposit_lusd(gov, strategy, U256::ZERO),
        "StabilityPool: Amount must be non-zero",
    );
}
