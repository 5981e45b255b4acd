//! Schema system - input validation ahead of calculation

pub mod validator;

pub use validator::{
    Validation, ValidationError, ValidationErrors, ValidationLimits, Validator, Violation,
};
