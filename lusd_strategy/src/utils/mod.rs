//! Utility and helper functions needed for:
//! - Error handling
//! - Fixed point arithmetic
//! - Role checks

pub mod access;
pub mod error;
pub mod math;
