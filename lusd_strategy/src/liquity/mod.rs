//! Liquity protocol components the strategy deposits into

pub mod stability_pool;
