//! Inductor failure rate model
//!
//! `λp = λb · πQ · πE`. The operating temperature is carried on the result
//! but takes no part in the product.

use crate::core::tables::{TableLookup, UnknownCodeError};
use crate::entities::component::{ComponentInput, Family, InductorParams};
use crate::entities::result::{Evaluation, Factor, Factors};

/// Compute λp for an inductor
pub fn evaluate<T: TableLookup + ?Sized>(
    input: &ComponentInput,
    params: &InductorParams,
    tables: &T,
) -> Result<Evaluation, UnknownCodeError> {
    let record = tables.lookup_style(Family::Inductor, &params.inductor_type)?;
    let pi_q = tables.lookup_quality(Family::Inductor, &input.quality_level)?;
    let pi_e = tables.lookup_environment(Family::Inductor, &input.environment)?;

    let factors = Factors {
        pi_q: Factor::Value(pi_q),
        pi_e: Factor::Value(pi_e),
        ..Factors::default()
    };

    Ok(Evaluation::from_factors(record.lambda_b, factors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tables::{ReferenceTables, TableKind};
    use crate::entities::component::PartParameters;

    fn run(input: &ComponentInput) -> Result<Evaluation, UnknownCodeError> {
        let tables = ReferenceTables::builtin().unwrap();
        match &input.parameters {
            PartParameters::Inductor(params) => evaluate(input, params, &tables),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_fixed_inductor() {
        let eval = run(&ComponentInput::inductor("FIXED", "LOWER", "NU", 25.0)).unwrap();
        assert_eq!(eval.lambda_b, 0.000030);
        assert!((eval.lambda_p - 0.000030 * 3.0 * 16.0).abs() < 1e-15);
        assert_eq!(eval.factors.pi_t, Factor::NotApplicable);
    }

    #[test]
    fn test_temperature_does_not_change_rate() {
        let cold = run(&ComponentInput::inductor("VARIABLE", "M", "GB", -40.0)).unwrap();
        let hot = run(&ComponentInput::inductor("VARIABLE", "M", "GB", 120.0)).unwrap();
        assert_eq!(cold, hot);
    }

    #[test]
    fn test_unknown_type() {
        let err = run(&ComponentInput::inductor("TOROID", "M", "GB", 25.0)).unwrap_err();
        assert_eq!(err.table, TableKind::InductorType);
    }
}
