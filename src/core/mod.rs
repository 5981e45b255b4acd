//! Core module - reference data, factor functions and the calculation engine

pub mod config;
pub mod engine;
pub mod factors;
pub mod tables;

pub use config::Config;
pub use engine::{Engine, EngineOptions};
pub use factors::FactorSource;
pub use tables::{ReferenceTables, TableError, TableKind, TableLookup, UnknownCodeError};
