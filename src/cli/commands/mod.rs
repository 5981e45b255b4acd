//! CLI command implementations

pub mod calc;
pub mod tables;
pub mod validate;
