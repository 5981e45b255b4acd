//! Calculation engine - validate, evaluate per family, aggregate
//!
//! The engine holds no mutable state. Reference tables are shared behind an
//! `Arc`, so one engine can serve any number of concurrent callers and a
//! batch can be evaluated on the rayon pool with the same result as a
//! sequential run.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::factors::FactorSource;
use crate::core::tables::{ReferenceTables, TableError, TableKind, TableLookup, UnknownCodeError};
use crate::entities::component::{ComponentInput, Field, PartParameters};
use crate::entities::result::{Advisory, ComponentResult, Evaluation, Report};
use crate::entities::{capacitor, inductor, resistor};
use crate::schema::validator::{
    Validation, ValidationError, ValidationErrors, ValidationLimits, Validator, Violation,
};

/// Options fixed for the lifetime of an engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineOptions {
    #[serde(default)]
    pub factor_source: FactorSource,
    #[serde(default)]
    pub limits: ValidationLimits,
}

/// Failure rate calculation over an injected table lookup
#[derive(Debug)]
pub struct Engine<T: TableLookup = ReferenceTables> {
    tables: Arc<T>,
    options: EngineOptions,
}

impl<T: TableLookup> Clone for Engine<T> {
    fn clone(&self) -> Self {
        Self {
            tables: Arc::clone(&self.tables),
            options: self.options,
        }
    }
}

impl Engine<ReferenceTables> {
    /// Engine over the built-in handbook tables with default options
    pub fn with_defaults() -> Result<Self, TableError> {
        Ok(Self::new(ReferenceTables::builtin()?, EngineOptions::default()))
    }
}

impl<T: TableLookup> Engine<T> {
    pub fn new(tables: T, options: EngineOptions) -> Self {
        Self::from_shared(Arc::new(tables), options)
    }

    /// Engine over tables already shared with other engines
    pub fn from_shared(tables: Arc<T>, options: EngineOptions) -> Self {
        Self { tables, options }
    }

    pub fn tables(&self) -> &T {
        &self.tables
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn validator(&self) -> Validator<'_, T> {
        Validator::new(self.tables.as_ref(), self.options.limits)
    }

    /// Run only the validator
    pub fn validate(&self, inputs: &[ComponentInput]) -> Validation {
        self.validator().validate(inputs)
    }

    /// Validate then evaluate every component in order
    ///
    /// Either every component is computed or none is: any validation error
    /// rejects the whole batch.
    pub fn calculate(&self, inputs: &[ComponentInput]) -> Result<Report, ValidationErrors> {
        let advisories = self.checked(inputs)?;
        let results = inputs
            .iter()
            .zip(advisories)
            .enumerate()
            .map(|(index, (input, advisories))| self.evaluate(index, input, advisories))
            .collect();
        self.finish(results)
    }

    /// Same as [`Engine::calculate`] with components evaluated on the rayon pool
    pub fn calculate_parallel(&self, inputs: &[ComponentInput]) -> Result<Report, ValidationErrors> {
        let advisories = self.checked(inputs)?;
        let results = inputs
            .par_iter()
            .zip(advisories.into_par_iter())
            .enumerate()
            .map(|(index, (input, advisories))| self.evaluate(index, input, advisories))
            .collect();
        self.finish(results)
    }

    /// Evaluate one already-validated component
    pub fn evaluate(
        &self,
        index: usize,
        input: &ComponentInput,
        advisories: Vec<Advisory>,
    ) -> Result<ComponentResult, ValidationError> {
        let tables = self.tables.as_ref();
        let source = self.options.factor_source;
        let evaluation: Result<Evaluation, UnknownCodeError> = match &input.parameters {
            PartParameters::Capacitor(params) => capacitor::evaluate(input, params, tables, source),
            PartParameters::Resistor(params) => resistor::evaluate(input, params, tables, source),
            PartParameters::Inductor(params) => inductor::evaluate(input, params, tables),
        };

        let evaluation = evaluation.map_err(|err| {
            let field = match err.table {
                TableKind::Quality => Field::QualityLevel,
                TableKind::Environment => Field::Environment,
                _ => input.parameters.selector_field(),
            };
            ValidationError::new(index, input.display_name(index), field, Violation::UnknownCode(err))
        })?;

        let result = ComponentResult::new(
            index,
            input,
            evaluation.lambda_b,
            evaluation.factors,
            evaluation.lambda_p,
            advisories,
        );
        debug!(
            component = %result.name,
            family = %result.family,
            selector = %result.selector,
            lambda_p = result.lambda_p,
            "evaluated component"
        );
        for advisory in &result.advisories {
            warn!(component = %result.name, kind = ?advisory.kind, "{}", advisory);
        }
        Ok(result)
    }

    fn checked(&self, inputs: &[ComponentInput]) -> Result<Vec<Vec<Advisory>>, ValidationErrors> {
        self.validate(inputs).into_result().map_err(|errors| {
            debug!(errors = errors.len(), components = inputs.len(), "validation rejected batch");
            errors
        })
    }

    fn finish(
        &self,
        results: Vec<Result<ComponentResult, ValidationError>>,
    ) -> Result<Report, ValidationErrors> {
        let mut components = Vec::with_capacity(results.len());
        let mut errors = Vec::new();
        for result in results {
            match result {
                Ok(component) => components.push(component),
                Err(err) => errors.push(err),
            }
        }
        if !errors.is_empty() {
            return Err(ValidationErrors::new(errors));
        }

        let report = Report::aggregate(components);
        info!(
            components = report.component_count(),
            total_lambda_p = report.total_lambda_p,
            factor_source = %self.options.factor_source,
            "calculation complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::factors::SeriesResistanceTable;
    use crate::core::tables::{StyleMeta, StyleRecord};
    use crate::entities::component::Family;
    use crate::entities::result::Factor;

    fn engine() -> Engine {
        Engine::with_defaults().unwrap()
    }

    fn scenario() -> Vec<ComponentInput> {
        vec![
            ComponentInput::capacitor("CSR13", 10.0, 0.5, "M", "GB", 25.0).with_description("C"),
            ComponentInput::resistor("RCR", 0.25, 0.4, "M", "GB", 25.0).with_description("R"),
            ComponentInput::inductor("FIXED", "M", "GB", 25.0).with_description("L"),
        ]
    }

    #[test]
    fn test_empty_batch_gives_empty_report() {
        let report = engine().calculate(&[]).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.total_lambda_p, 0.0);
    }

    #[test]
    fn test_calculate_keeps_order_and_sums() {
        let report = engine().calculate(&scenario()).unwrap();
        let families: Vec<_> = report.components.iter().map(|c| c.family).collect();
        assert_eq!(families, vec![Family::Capacitor, Family::Resistor, Family::Inductor]);

        let sum: f64 = report.components.iter().map(|c| c.lambda_p).sum();
        assert_eq!(report.total_lambda_p, sum);
        assert_eq!(report.components[0].name, "Capacitor_1");
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let engine = engine();
        let inputs: Vec<_> = scenario().into_iter().cycle().take(60).collect();
        let sequential = engine.calculate(&inputs).unwrap();
        let parallel = engine.calculate_parallel(&inputs).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_idempotent() {
        let engine = engine();
        let first = engine.calculate(&scenario()).unwrap();
        let second = engine.calculate(&scenario()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejection_computes_nothing() {
        let mut inputs = scenario();
        inputs.push(
            ComponentInput::capacitor("NOPE123", 1.0, 0.5, "M", "GB", 25.0).with_description("bad"),
        );
        let errors = engine().calculate(&inputs).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.errors()[0].index, 3);
        assert_eq!(errors.errors()[0].field, Field::Style);
    }

    #[test]
    fn test_advisories_ride_on_results() {
        let inputs =
            vec![ComponentInput::resistor("RCR", 0.5, 0.95, "M", "GB", 25.0).with_description("R")];
        let report = engine().calculate(&inputs).unwrap();
        assert_eq!(report.components[0].advisories.len(), 1);
        assert!(report.components[0].lambda_p > 0.0);
        assert_eq!(report.advisories().count(), 1);
    }

    /// A lookup implemented outside the crate's own table type
    struct Passthrough(ReferenceTables);

    impl TableLookup for Passthrough {
        fn lookup_style(&self, family: Family, code: &str) -> Result<StyleRecord, UnknownCodeError> {
            self.0.lookup_style(family, code)
        }
        fn lookup_quality(&self, family: Family, code: &str) -> Result<f64, UnknownCodeError> {
            self.0.lookup_quality(family, code)
        }
        fn lookup_environment(&self, family: Family, code: &str) -> Result<f64, UnknownCodeError> {
            self.0.lookup_environment(family, code)
        }
        fn series_resistance(&self) -> &SeriesResistanceTable {
            self.0.series_resistance()
        }
    }

    #[test]
    fn test_custom_lookup_is_injected() {
        let shared = Arc::new(Passthrough(ReferenceTables::builtin().unwrap()));
        let engine = Engine::from_shared(Arc::clone(&shared), EngineOptions::default());
        let report = engine.calculate(&scenario()).unwrap();
        assert_eq!(report.component_count(), 3);
        assert_eq!(Arc::strong_count(&shared), 2);
        assert!(matches!(
            engine.tables().lookup_style(Family::Inductor, "FIXED").unwrap().meta,
            StyleMeta::Inductor
        ));
    }

    #[test]
    fn test_tabulated_option() {
        let engine = Engine::new(
            ReferenceTables::builtin().unwrap(),
            EngineOptions {
                factor_source: FactorSource::Tabulated,
                ..EngineOptions::default()
            },
        );
        let inputs =
            vec![ComponentInput::resistor("RCR", 0.25, 0.4, "M", "GB", 150.0).with_description("R")];
        let report = engine.calculate(&inputs).unwrap();
        assert_eq!(report.components[0].factors.pi_s, Factor::Value(0.58));
    }
}
