//! Capacitor failure rate model
//!
//! `λp = λb · πT · πC · πV · πQ · πE · πSR`

use crate::core::factors::{
    capacitance_factor, series_resistance_factor, temperature_factor, voltage_stress_factor,
    FactorSource,
};
use crate::core::tables::{
    StyleMeta, TableKind, TableLookup, TabulatedFactor, UnknownCodeError,
};
use crate::entities::component::{CapacitorParams, ComponentInput, Family};
use crate::entities::result::{Evaluation, Factor, Factors};

/// Compute λp for a capacitor
pub fn evaluate<T: TableLookup + ?Sized>(
    input: &ComponentInput,
    params: &CapacitorParams,
    tables: &T,
    source: FactorSource,
) -> Result<Evaluation, UnknownCodeError> {
    let record = tables.lookup_style(Family::Capacitor, &params.style)?;
    let StyleMeta::Capacitor(construction) = record.meta else {
        return Err(UnknownCodeError::new(
            Family::Capacitor,
            TableKind::Style,
            params.style.as_str(),
        ));
    };

    let printed = |factor: TabulatedFactor, class: u8, at: f64| {
        move || tables.tabulated(Family::Capacitor, factor, class, at)
    };

    let pi_t = source.resolve(
        printed(TabulatedFactor::Temperature, construction.temperature_class, input.temperature),
        || temperature_factor(input.temperature, construction.activation_energy),
    );
    let pi_c = source.resolve(
        printed(TabulatedFactor::Capacitance, construction.capacitance_class, params.capacitance),
        || capacitance_factor(params.capacitance, construction.capacitance_exponent),
    );
    let pi_v = source.resolve(
        printed(TabulatedFactor::VoltageStress, construction.voltage_class, params.voltage_stress),
        || voltage_stress_factor(params.voltage_stress, construction.voltage_curve),
    );

    // An absent series resistance on a tantalum style counts as 0 ohm/V
    let pi_sr = if construction.tantalum {
        series_resistance_factor(
            params.series_resistance.unwrap_or(0.0),
            tables.series_resistance(),
        )
    } else {
        1.0
    };

    let pi_q = tables.lookup_quality(Family::Capacitor, &input.quality_level)?;
    let pi_e = tables.lookup_environment(Family::Capacitor, &input.environment)?;

    let factors = Factors {
        pi_t: Factor::Value(pi_t),
        pi_c: Factor::Value(pi_c),
        pi_v: Factor::Value(pi_v),
        pi_sr: Factor::Value(pi_sr),
        pi_q: Factor::Value(pi_q),
        pi_e: Factor::Value(pi_e),
        ..Factors::default()
    };

    Ok(Evaluation::from_factors(record.lambda_b, factors))
}
