mod common;

use alloy_primitives::U256;
use common::*;

#[test]
fn twap_setter_acl() {
    let mut f = Fixture::new();
    let strategy = f.strategy;
    let a = f.accounts.clone();
    let enabled = |f: &Fixture| f.chain.state.strategy(strategy).unwrap().settings.twap_enabled;
    assert!(enabled(&f));

    for (caller, value) in [
        (a.gov, false),
        (a.management, true),
        (a.strategist, false),
        (a.guardian, true),
    ] {
        f.chain.set_twap_enabled(caller, strategy, value).unwrap();
        assert_eq!(enabled(&f), value);
    }
    assert_unauthorized(f.chain.set_twap_enabled(a.keeper, strategy, false));
    assert_unauthorized(f.chain.set_twap_enabled(a.user, strategy, false));
}

#[test]
fn twap_enabled_fetches_price() {
    let mut f = Fixture::new();
    let (strategist, strategy) = (f.accounts.strategist, f.strategy);
    assert_eq!(f.eta(), U256::ZERO);

    f.send_lqty(strategy, e18(20));
    f.chain.set_twap_enabled(strategist, strategy, true).unwrap();
    // 20 LQTY at 0.005 WETH and 2000 USD per WETH
    assert_approx(f.eta(), e18(200));
}

#[test]
fn twap_disabled_does_not_fetch_price() {
    let mut f = Fixture::new();
    let (strategist, strategy) = (f.accounts.strategist, f.strategy);
    assert_eq!(f.eta(), U256::ZERO);

    f.send_lqty(strategy, e18(20));
    f.chain.set_twap_enabled(strategist, strategy, false).unwrap();
    assert_eq!(f.eta(), U256::ZERO);
}

#[test]
fn twap_lags_behind_a_price_move() {
    let mut f = Fixture::new();
    let (lqty_whale, strategy) = (f.accounts.lqty_whale, f.strategy);
    f.send_lqty(strategy, e18(20));
    f.chain.sleep(3_600);
    let before = f.eta();

    // Dump LQTY into the pool: the spot price falls at once, the average follows over time.
    f.chain
        .execute("dump_lqty", |state, _| {
            let path = lusd_strategy::exchange::uniswap::encode_path(
                &[lusd_strategy::constants::LQTY, lusd_strategy::constants::WETH],
                &[3_000],
            )?;
            state.exact_input(lqty_whale, lqty_whale, &path, e18(100_000), U256::ZERO)
        })
        .unwrap();
    let right_after = f.eta();
    assert!(right_after <= before);

    f.chain.sleep(3_600);
    let settled = f.eta();
    assert!(settled < right_after);
}
