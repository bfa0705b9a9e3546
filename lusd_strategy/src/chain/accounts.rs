//! Deterministic account derivation

use alloy_primitives::Address;
use rand::RngCore;
use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};

/// Derives a reproducible sequence of addresses from a seed.
#[derive(Clone)]
pub struct AddressGenerator {
    rng: ChaCha8Rng,
}

impl AddressGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Next fresh address
    pub fn next_address(&mut self) -> Address {
        let mut bytes = [0u8; 20];
        self.rng.fill_bytes(&mut bytes);
        Address::from(bytes)
    }
}

/// Named accounts of a deployment.
#[derive(Clone, Debug, PartialEq)]
pub struct Accounts {
    pub gov: Address,
    pub user: Address,
    pub rewards: Address,
    pub guardian: Address,
    pub management: Address,
    pub strategist: Address,
    pub keeper: Address,
    /// Holds a large LUSD balance
    pub lusd_whale: Address,
    /// Holds a large LQTY balance
    pub lqty_whale: Address,
    /// Holds a large DAI balance
    pub dai_whale: Address,
    /// Holds a large native balance
    pub eth_whale: Address,
}

impl Accounts {
    pub fn generate(generator: &mut AddressGenerator) -> Self {
        Self {
            gov: generator.next_address(),
            user: generator.next_address(),
            rewards: generator.next_address(),
            guardian: generator.next_address(),
            management: generator.next_address(),
            strategist: generator.next_address(),
            keeper: generator.next_address(),
            lusd_whale: generator.next_address(),
            lqty_whale: generator.next_address(),
            dai_whale: generator.next_address(),
            eth_whale: generator.next_address(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn same_seed_same_accounts() {
        let a = Accounts::generate(&mut AddressGenerator::new(7));
        let b = Accounts::generate(&mut AddressGenerator::new(7));
        assert_eq!(a, b);
    }

    #[test]
    fn accounts_are_distinct() {
        let accounts = Accounts::generate(&mut AddressGenerator::new(1));
        let set: HashSet<Address> = [
            accounts.gov,
            accounts.user,
            accounts.rewards,
            accounts.guardian,
            accounts.management,
            accounts.strategist,
            accounts.keeper,
            accounts.lusd_whale,
            accounts.lqty_whale,
            accounts.dai_whale,
            accounts.eth_whale,
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 11);
    }
}
