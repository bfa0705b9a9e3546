use alloy_primitives::{Address, U256};
use thiserror::Error;

/// Strategy ledger result
pub type StrategyResult<T> = Result<T, StrategyError>;

/// Errors raised by the vault, the strategy and their collaborators.
///
/// The display string of each variant is the revert reason a caller observes.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum StrategyError {
    /// Caller is not part of the role set guarding the operation
    #[error("!authorized")]
    Unauthorized,
    /// Strategy entry point reserved to its vault
    #[error("!vault")]
    OnlyVault,
    /// Harvest outcome rejected by the health check
    #[error("!healthcheck")]
    HealthCheck,
    /// Attempt to sweep the strategy's want token
    #[error("!want")]
    ProtectedWant,
    /// Attempt to sweep the vault's share token
    #[error("!shares")]
    ProtectedShares,
    /// Stability pool withdrawal without a deposit
    #[error("StabilityPool: User must have a non-zero deposit")]
    ZeroDeposit,
    /// Stability pool deposit of zero
    #[error("StabilityPool: Amount must be non-zero")]
    ZeroAmount,
    /// Token balance too low for the transfer
    #[error("insufficient balance of {token} for {holder}: has {balance}, needs {required}")]
    InsufficientBalance {
        token: Address,
        holder: Address,
        balance: U256,
        required: U256,
    },
    /// Spender allowance too low for the transfer
    #[error("insufficient allowance of {token} from {owner} to {spender}")]
    InsufficientAllowance {
        token: Address,
        owner: Address,
        spender: Address,
    },
    /// Native balance too low
    #[error("insufficient native balance for {holder}")]
    InsufficientNativeBalance { holder: Address },
    /// No pool exists for the pair and fee tier
    #[error("no pool for {token_in} -> {token_out} at fee {fee}")]
    PoolNotFound {
        token_in: Address,
        token_out: Address,
        fee: u32,
    },
    /// Fee tier is not one of the enabled tiers
    #[error("invalid fee tier {0}")]
    InvalidFeeTier(u32),
    /// Swap output below the requested minimum
    #[error("Too little received: {received} < {minimum}")]
    Slippage { received: U256, minimum: U256 },
    /// Deposit would exceed the vault deposit limit
    #[error("vault deposit limit exceeded")]
    DepositLimit,
    /// Vault is in emergency shutdown
    #[error("vault is shut down")]
    VaultShutdown,
    /// Total debt ratio would exceed 100%
    #[error("debt ratio limit exceeded")]
    DebtRatioLimit,
    /// Strategy is not registered in the vault
    #[error("strategy {0} is not active")]
    StrategyNotActive(Address),
    /// Strategy is already registered in the vault
    #[error("strategy {0} is already active")]
    StrategyAlreadyActive(Address),
    /// Withdrawal of zero shares
    #[error("no shares to withdraw")]
    NoShares,
    /// Withdrawal loss above the accepted maximum
    #[error("withdrawal loss {loss} exceeds max loss")]
    MaxLoss { loss: U256 },
    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A requested value does not exist
    #[error("value does not exist")]
    NonExistentValue,
    /// Arithmetic error
    #[error("arithmetic error: {0}")]
    Arithmetic(String),
    /// Unknown/Custom error
    #[error("{0}")]
    Custom(String),
}

impl StrategyError {
    /// Revert reason as a plain string.
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

pub fn arithmetic_err<S: AsRef<str>>(s: S) -> StrategyError {
    StrategyError::Arithmetic(s.as_ref().to_string())
}
