//! mil217: MIL-HDBK-217F failure rate prediction
//!
//! Predicts part failure rates for capacitors, resistors and inductors from
//! the handbook's parts stress models, and totals them into a system report.

pub mod cli;
pub mod core;
pub mod entities;
pub mod schema;
pub mod yaml;
