//! Input validation with detailed error reporting
//!
//! Every component is checked in a fixed order (description, selector,
//! numeric ranges, quality and environment codes) and every violation is
//! collected. Non-fatal conditions come back as advisories.

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::core::tables::{StyleMeta, TableLookup, UnknownCodeError};
use crate::entities::component::{ComponentInput, Field, PartParameters};
use crate::entities::result::{Advisory, AdvisoryKind};

/// Temperature range the handbook models are rated for, in °C
pub const RATED_TEMPERATURE_MIN: f64 = -55.0;
pub const RATED_TEMPERATURE_MAX: f64 = 125.0;

/// Upper bound of the accepted voltage stress ratio
pub const VOLTAGE_STRESS_MAX: f64 = 1.5;

/// Voltage stress above this is past rated voltage
pub const VOLTAGE_OVERSTRESS: f64 = 1.0;

/// Power stress above this draws a high-stress advisory
pub const HIGH_POWER_STRESS: f64 = 0.9;

/// What was wrong with one field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    Missing,
    NotFinite,
    OutOfRange { value: f64, expected: String },
    UnknownCode(UnknownCodeError),
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::Missing => write!(f, "missing value"),
            Violation::NotFinite => write!(f, "not a finite number"),
            Violation::OutOfRange { value, expected } => {
                write!(f, "{} is out of range, expected {}", value, expected)
            }
            Violation::UnknownCode(err) => write!(f, "{}", err),
        }
    }
}

/// One rejected field on one component
#[derive(Debug, Clone, PartialEq, Error, Diagnostic, Serialize)]
#[error("{component}: {field}: {violation}")]
#[diagnostic(code(mil217::validation::field))]
pub struct ValidationError {
    /// Position in the submitted list (0-based)
    pub index: usize,
    /// Component display name
    pub component: String,
    pub field: Field,
    pub violation: Violation,

    #[help]
    #[serde(skip)]
    help: Option<String>,
}

impl ValidationError {
    pub fn new(index: usize, component: impl Into<String>, field: Field, violation: Violation) -> Self {
        let help = match &violation {
            Violation::UnknownCode(err) => Some(format!(
                "run `mil217 tables {}` to list the valid codes",
                err.family
            )),
            Violation::Missing => Some(format!("add a `{}` value to the component", field)),
            _ => None,
        };
        Self {
            index,
            component: component.into(),
            field,
            violation,
            help,
        }
    }

    /// The unknown code behind this error, if that is what it is
    pub fn unknown_code(&self) -> Option<&UnknownCodeError> {
        match &self.violation {
            Violation::UnknownCode(err) => Some(err),
            _ => None,
        }
    }
}

/// Every violation found in a rejected batch
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
#[error("input rejected: {summary}")]
#[diagnostic(
    code(mil217::validation::rejected),
    help("no failure rates were computed; fix the fields listed and run again")
)]
pub struct ValidationErrors {
    summary: String,

    #[related]
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new(errors: Vec<ValidationError>) -> Self {
        let summary = if errors.len() == 1 {
            "1 error".to_string()
        } else {
            format!("{} errors", errors.len())
        };
        Self { summary, errors }
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Instrument range for operating temperature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, serde::Deserialize)]
pub struct ValidationLimits {
    pub temperature_min: f64,
    pub temperature_max: f64,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            temperature_min: -100.0,
            temperature_max: 300.0,
        }
    }
}

/// Outcome of validating a batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validation {
    pub errors: Vec<ValidationError>,
    /// Advisories per component, same order as the input
    pub advisories: Vec<Vec<Advisory>>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Advisories on success, every error otherwise
    pub fn into_result(self) -> Result<Vec<Vec<Advisory>>, ValidationErrors> {
        if self.errors.is_empty() {
            Ok(self.advisories)
        } else {
            Err(ValidationErrors::new(self.errors))
        }
    }
}

/// Component validator bound to a set of reference tables
pub struct Validator<'a, T: TableLookup + ?Sized> {
    tables: &'a T,
    limits: ValidationLimits,
}

impl<'a, T: TableLookup + ?Sized> Validator<'a, T> {
    pub fn new(tables: &'a T, limits: ValidationLimits) -> Self {
        Self { tables, limits }
    }

    /// Validate every component, collecting all errors and advisories
    pub fn validate(&self, inputs: &[ComponentInput]) -> Validation {
        let mut validation = Validation::default();
        for (index, input) in inputs.iter().enumerate() {
            let (errors, advisories) = self.validate_component(index, input);
            validation.errors.extend(errors);
            validation.advisories.push(advisories);
        }
        validation
    }

    /// Validate one component at position `index`
    pub fn validate_component(
        &self,
        index: usize,
        input: &ComponentInput,
    ) -> (Vec<ValidationError>, Vec<Advisory>) {
        let mut check = Check {
            index,
            name: input.display_name(index),
            errors: Vec::new(),
            advisories: Vec::new(),
        };
        let family = input.family();

        // 1. description
        if input.description.trim().is_empty() {
            check.reject(Field::Description, Violation::Missing);
        }

        // 2. selector
        let selector = input.parameters.selector();
        let selector_field = input.parameters.selector_field();
        let mut tantalum = None;
        if selector.trim().is_empty() {
            check.reject(selector_field, Violation::Missing);
        } else {
            match self.tables.lookup_style(family, selector) {
                Ok(record) => {
                    if let StyleMeta::Capacitor(c) = record.meta {
                        tantalum = Some(c.tantalum);
                    }
                }
                Err(err) => check.reject(selector_field, Violation::UnknownCode(err)),
            }
        }

        // 3. numeric domains
        match &input.parameters {
            PartParameters::Capacitor(c) => {
                if check.finite(Field::Capacitance, c.capacitance) && c.capacitance <= 0.0 {
                    check.out_of_range(Field::Capacitance, c.capacitance, "greater than 0 µF");
                }
                if check.finite(Field::VoltageStress, c.voltage_stress) {
                    if !(0.0..=VOLTAGE_STRESS_MAX).contains(&c.voltage_stress) {
                        check.out_of_range(
                            Field::VoltageStress,
                            c.voltage_stress,
                            format!("between 0 and {}", VOLTAGE_STRESS_MAX),
                        );
                    } else if c.voltage_stress > VOLTAGE_OVERSTRESS {
                        check.advise(
                            Field::VoltageStress,
                            AdvisoryKind::VoltageOverstress,
                            format!("applied voltage exceeds rating ({:.2})", c.voltage_stress),
                        );
                    }
                }
                if let Some(cr) = c.series_resistance {
                    if check.finite(Field::SeriesResistance, cr) {
                        if cr < 0.0 {
                            check.out_of_range(Field::SeriesResistance, cr, "0 ohm/V or more");
                        } else if tantalum == Some(false) {
                            check.advise(
                                Field::SeriesResistance,
                                AdvisoryKind::IgnoredSeriesResistance,
                                format!("style {} is not tantalum, series resistance ignored", selector),
                            );
                        }
                    }
                }
            }
            PartParameters::Resistor(r) => {
                if check.finite(Field::Watts, r.watts) {
                    if r.watts < 0.0 {
                        check.out_of_range(Field::Watts, r.watts, "0 W or more");
                    } else if r.watts == 0.0 {
                        check.advise(
                            Field::Watts,
                            AdvisoryKind::ZeroRatedPower,
                            "rated power is 0 W, failure rate will be 0",
                        );
                    }
                }
                if check.finite(Field::PowerStress, r.power_stress) {
                    if !(0.0..=1.0).contains(&r.power_stress) {
                        check.out_of_range(Field::PowerStress, r.power_stress, "between 0 and 1");
                    } else if r.power_stress > HIGH_POWER_STRESS {
                        check.advise(
                            Field::PowerStress,
                            AdvisoryKind::HighPowerStress,
                            format!("high power stress ({:.2})", r.power_stress),
                        );
                    }
                }
            }
            PartParameters::Inductor(_) => {}
        }

        if check.finite(Field::Temperature, input.temperature) {
            let t = input.temperature;
            if t < self.limits.temperature_min || t > self.limits.temperature_max {
                check.out_of_range(
                    Field::Temperature,
                    t,
                    format!(
                        "between {} and {} °C",
                        self.limits.temperature_min, self.limits.temperature_max
                    ),
                );
            } else if !(RATED_TEMPERATURE_MIN..=RATED_TEMPERATURE_MAX).contains(&t) {
                check.advise(
                    Field::Temperature,
                    AdvisoryKind::TemperatureOutsideRating,
                    format!(
                        "{} °C is outside the rated {} to {} °C",
                        t, RATED_TEMPERATURE_MIN, RATED_TEMPERATURE_MAX
                    ),
                );
            }
        }

        // 4. quality and environment
        check.code(Field::QualityLevel, &input.quality_level, |code| {
            self.tables.lookup_quality(family, code)
        });
        check.code(Field::Environment, &input.environment, |code| {
            self.tables.lookup_environment(family, code)
        });

        (check.errors, check.advisories)
    }
}

/// Accumulator for one component's findings
struct Check {
    index: usize,
    name: String,
    errors: Vec<ValidationError>,
    advisories: Vec<Advisory>,
}

impl Check {
    fn reject(&mut self, field: Field, violation: Violation) {
        self.errors
            .push(ValidationError::new(self.index, self.name.clone(), field, violation));
    }

    fn out_of_range(&mut self, field: Field, value: f64, expected: impl Into<String>) {
        self.reject(
            field,
            Violation::OutOfRange {
                value,
                expected: expected.into(),
            },
        );
    }

    /// Reject NaN and infinities; true when the value can be range-checked
    fn finite(&mut self, field: Field, value: f64) -> bool {
        if value.is_finite() {
            true
        } else {
            self.reject(field, Violation::NotFinite);
            false
        }
    }

    fn code(
        &mut self,
        field: Field,
        code: &str,
        lookup: impl FnOnce(&str) -> Result<f64, UnknownCodeError>,
    ) {
        if code.trim().is_empty() {
            self.reject(field, Violation::Missing);
        } else if let Err(err) = lookup(code) {
            self.reject(field, Violation::UnknownCode(err));
        }
    }

    fn advise(&mut self, field: Field, kind: AdvisoryKind, message: impl Into<String>) {
        self.advisories.push(Advisory::new(field, kind, message));
    }
}
