//! Entity type definitions
//!
//! **Inputs:**
//! - [`ComponentInput`] - Component parameter record, tagged by family
//!
//! **Failure rate models:**
//! - [`capacitor`] - λb · πT · πC · πV · πQ · πE · πSR
//! - [`resistor`] - λb · πT · πP · πS · πQ · πE
//! - [`inductor`] - λb · πQ · πE
//!
//! **Outputs:**
//! - [`ComponentResult`] - Per-component factors and λp
//! - [`Report`] - Ordered results with the system total

pub mod capacitor;
pub mod component;
pub mod inductor;
pub mod resistor;
pub mod result;

pub use component::{ComponentInput, Family, Field, PartParameters};
pub use result::{Advisory, AdvisoryKind, ComponentResult, Evaluation, Factor, Factors, Report};
