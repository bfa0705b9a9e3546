//! Swap venues and price sources used to turn rewards into LUSD

pub mod curve;
pub mod oracle;
pub mod uniswap;
