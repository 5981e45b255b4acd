//! Resistor failure rate model
//!
//! `λp = λb · πT · πP · πS · πQ · πE`

use crate::core::factors::{
    power_rating_factor, power_stress_factor, temperature_factor, FactorSource,
};
use crate::core::tables::{
    StyleMeta, TableKind, TableLookup, TabulatedFactor, UnknownCodeError,
};
use crate::entities::component::{ComponentInput, Family, ResistorParams};
use crate::entities::result::{Evaluation, Factor, Factors};

/// Compute λp for a resistor
pub fn evaluate<T: TableLookup + ?Sized>(
    input: &ComponentInput,
    params: &ResistorParams,
    tables: &T,
    source: FactorSource,
) -> Result<Evaluation, UnknownCodeError> {
    let record = tables.lookup_style(Family::Resistor, &params.style)?;
    let StyleMeta::Resistor(construction) = record.meta else {
        return Err(UnknownCodeError::new(
            Family::Resistor,
            TableKind::Style,
            params.style.as_str(),
        ));
    };

    let pi_t = source.resolve(
        || {
            tables.tabulated(
                Family::Resistor,
                TabulatedFactor::Temperature,
                construction.temperature_class,
                input.temperature,
            )
        },
        || temperature_factor(input.temperature, construction.activation_energy),
    );
    let pi_p = source.resolve(
        || {
            tables.tabulated(
                Family::Resistor,
                TabulatedFactor::PowerStress,
                construction.stress_class,
                params.power_stress,
            )
        },
        || power_stress_factor(params.power_stress, construction.stress_curve),
    );
    // The rated power table has a single column
    let pi_s = source.resolve(
        || tables.tabulated(Family::Resistor, TabulatedFactor::PowerRating, 1, params.watts),
        || power_rating_factor(params.watts, construction.power_rating_exponent),
    );

    let pi_q = tables.lookup_quality(Family::Resistor, &input.quality_level)?;
    let pi_e = tables.lookup_environment(Family::Resistor, &input.environment)?;

    let factors = Factors {
        pi_t: Factor::Value(pi_t),
        pi_p: Factor::Value(pi_p),
        pi_s: Factor::Value(pi_s),
        pi_q: Factor::Value(pi_q),
        pi_e: Factor::Value(pi_e),
        ..Factors::default()
    };

    Ok(Evaluation::from_factors(record.lambda_b, factors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tables::ReferenceTables;
    use crate::entities::component::PartParameters;

    fn run(input: &ComponentInput, source: FactorSource) -> Result<Evaluation, UnknownCodeError> {
        let tables = ReferenceTables::builtin().unwrap();
        match &input.parameters {
            PartParameters::Resistor(params) => evaluate(input, params, &tables, source),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_rcr_at_reference_conditions() {
        let input = ComponentInput::resistor("RCR", 0.25, 0.4, "M", "GB", 25.0);
        let eval = run(&input, FactorSource::Equation).unwrap();

        let pi_p = 0.54 * (2.04f64 * 0.4).exp();
        let pi_s = 0.25f64.powf(0.39);
        assert!((eval.lambda_p - 0.0017 * pi_p * pi_s).abs() < 1e-15);
        assert_eq!(eval.factors.pi_c, Factor::NotApplicable);
        assert_eq!(eval.factors.pi_v, Factor::NotApplicable);
        assert_eq!(eval.factors.pi_sr, Factor::NotApplicable);
    }

    #[test]
    fn test_zero_rated_power_gives_zero_rate() {
        let input = ComponentInput::resistor("RLR", 0.0, 0.5, "M", "GB", 25.0);
        let eval = run(&input, FactorSource::Equation).unwrap();
        assert_eq!(eval.factors.pi_s, Factor::Value(0.0));
        assert_eq!(eval.lambda_p, 0.0);
    }

    #[test]
    fn test_tabulated_points() {
        let input = ComponentInput::resistor("RCR", 0.25, 0.4, "M", "GB", 150.0);
        let eval = run(&input, FactorSource::Tabulated).unwrap();
        assert_eq!(eval.factors.pi_t, Factor::Value(10.0));
        assert_eq!(eval.factors.pi_p, Factor::Value(1.2));
        assert_eq!(eval.factors.pi_s, Factor::Value(0.58));
    }

    #[test]
    fn test_higher_stress_raises_rate() {
        let low = run(
            &ComponentInput::resistor("RNR", 0.125, 0.2, "M", "GB", 25.0),
            FactorSource::Equation,
        )
        .unwrap();
        let high = run(
            &ComponentInput::resistor("RNR", 0.125, 0.95, "M", "GB", 25.0),
            FactorSource::Equation,
        )
        .unwrap();
        assert!(high.lambda_p > low.lambda_p);
    }

    #[test]
    fn test_capacitor_quality_code_not_valid_for_resistors() {
        let input = ComponentInput::resistor("RCR", 0.25, 0.4, "L", "GB", 25.0);
        let err = run(&input, FactorSource::Equation).unwrap_err();
        assert_eq!((err.family, err.table), (Family::Resistor, TableKind::Quality));
    }
}
