pub mod api;
pub mod chain;
pub mod config;
pub mod constants;
pub mod exchange;
pub mod health_check;
pub mod journal;
pub mod liquity;
pub mod state;
pub mod strategy;
pub mod types;
pub mod utils;
pub mod vault;

pub use chain::{tokens, Chain};
pub use config::ChainConfig;
pub use health_check::{CommonHealthCheck, HarvestOutcome, HealthCheck};
pub use state::State;
pub use utils::error::{StrategyError, StrategyResult};
