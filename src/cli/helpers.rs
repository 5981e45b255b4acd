//! Shared helper functions for CLI commands
//!
//! Component set loading, engine construction from configuration, and the
//! small formatting utilities the commands share.

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::core::engine::Engine;
use crate::core::factors::FactorSource;
use crate::entities::component::{ComponentInput, Family};
use crate::yaml::{parse_yaml_file, parse_yaml_str};

/// A component set file after defaults are applied
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSet {
    pub project: Option<String>,
    pub components: Vec<ComponentInput>,
}

/// Values filled into components that leave the key out
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SetDefaults {
    temperature: Option<f64>,
    environment: Option<String>,
    quality_level: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawComponentSet {
    #[serde(default)]
    project: Option<String>,
    #[serde(default)]
    defaults: SetDefaults,
    #[serde(default)]
    components: Vec<serde_yml::Value>,
}

/// Load a YAML or JSON component set
pub fn load_component_set(path: &Path) -> Result<ComponentSet> {
    let raw: RawComponentSet = parse_yaml_file(path)?;
    resolve_component_set(raw, &path.display().to_string())
}

/// Parse component set text; `filename` labels diagnostics
pub fn parse_component_set(content: &str, filename: &str) -> Result<ComponentSet> {
    let raw: RawComponentSet = parse_yaml_str(content, filename)?;
    resolve_component_set(raw, filename)
}

fn resolve_component_set(raw: RawComponentSet, filename: &str) -> Result<ComponentSet> {
    let defaults = raw.defaults;

    let mut components = Vec::with_capacity(raw.components.len());
    for (index, mut value) in raw.components.into_iter().enumerate() {
        if let serde_yml::Value::Mapping(ref mut map) = value {
            reject_foreign_keys(map, filename, index)?;
            fill_default(map, "temperature", defaults.temperature.map(serde_yml::Value::from));
            fill_default(map, "environment", defaults.environment.clone().map(serde_yml::Value::from));
            fill_default(
                map,
                "quality_level",
                defaults.quality_level.clone().map(serde_yml::Value::from),
            );
        }
        let component: ComponentInput = serde_yml::from_value(value).map_err(|e| {
            miette::miette!(
                help = "each component needs a `type` of capacitor, resistor or inductor",
                "{}: component {}: {}",
                filename,
                index + 1,
                e
            )
        })?;
        components.push(component);
    }

    Ok(ComponentSet {
        project: raw.project,
        components,
    })
}

/// Refuse keys that do not belong to the record's family
///
/// A missing or unknown `type` is left for deserialization to report.
fn reject_foreign_keys(map: &serde_yml::Mapping, filename: &str, index: usize) -> Result<()> {
    let Some(family) = map
        .get("type")
        .and_then(serde_yml::Value::as_str)
        .and_then(|tag| serde_yml::from_value::<Family>(serde_yml::Value::from(tag)).ok())
    else {
        return Ok(());
    };

    let foreign: Vec<String> = map
        .keys()
        .filter(|key| !key.as_str().is_some_and(|k| ComponentInput::accepts_key(family, k)))
        .map(|key| match key.as_str() {
            Some(k) => format!("`{}`", k),
            None => format!("{:?}", key),
        })
        .collect();
    if foreign.is_empty() {
        return Ok(());
    }

    let mut accepted: Vec<&str> = ComponentInput::COMMON_KEYS.to_vec();
    accepted.extend(family.parameter_keys());
    Err(miette::miette!(
        help = format!("a {} component accepts: {}", family, accepted.join(", ")),
        "{}: component {}: unexpected key{} {} for a {} component",
        filename,
        index + 1,
        if foreign.len() == 1 { "" } else { "s" },
        foreign.join(", "),
        family
    ))
}

fn fill_default(map: &mut serde_yml::Mapping, key: &str, value: Option<serde_yml::Value>) {
    if let Some(value) = value {
        let key = serde_yml::Value::from(key);
        if !map.contains_key(&key) {
            map.insert(key, value);
        }
    }
}

/// Configuration with command-line overrides applied on top
pub fn load_config(global: &GlobalOpts) -> Config {
    let mut config = Config::load();
    if let Some(ref tables) = global.tables {
        config.tables = Some(tables.clone());
    }
    if global.tabulated {
        config.factor_source = Some(FactorSource::Tabulated);
    }
    config
}

/// Engine over the configured reference tables
pub fn build_engine(config: &Config) -> Result<Engine> {
    let tables = config.reference_tables()?;
    Ok(Engine::new(tables, config.engine_options()))
}

/// Resolve `auto` against the configured default, then markdown
pub fn resolve_format(requested: OutputFormat, config: &Config) -> OutputFormat {
    match requested {
        OutputFormat::Auto => config
            .default_format
            .as_deref()
            .and_then(|f| f.parse::<OutputFormat>().ok())
            .filter(|f| *f != OutputFormat::Auto)
            .unwrap_or(OutputFormat::Md),
        other => other,
    }
}

/// Write to a file or stdout
pub fn write_output(content: &str, output_path: Option<PathBuf>, quiet: bool) -> Result<()> {
    if let Some(path) = output_path {
        let file = File::create(&path).into_diagnostic()?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content.as_bytes()).into_diagnostic()?;
        writer.flush().into_diagnostic()?;
        if !quiet {
            eprintln!("{} Report written to {}", style("✓").green(), style(path.display()).cyan());
        }
    } else {
        print!("{}", content);
    }
    Ok(())
}

/// Failure rate in scientific notation, `0` for zero
pub fn format_rate(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        format!("{:.4e}", value)
    }
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Join fields with the delimiter for a tsv or csv row
pub fn delimited_row<S: AsRef<str>>(fields: &[S], format: OutputFormat) -> String {
    let (sep, escape): (&str, fn(&str) -> String) = match format {
        OutputFormat::Csv => (",", escape_csv),
        _ => ("\t", |s: &str| s.replace(['\t', '\n'], " ")),
    };
    let cells: Vec<String> = fields.iter().map(|f| escape(f.as_ref())).collect();
    format!("{}\n", cells.join(sep))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::component::PartParameters;
    use crate::entities::result::Factor;

    const SET: &str = r#"
project: Power supply
defaults:
  temperature: 40
  environment: GF
  quality_level: M
components:
  - type: capacitor
    name: C1
    description: Output filter
    style: CSR13
    capacitance: 10
    voltage_stress: 0.5
  - type: resistor
    description: Bleeder
    style: RCR
    watts: 0.25
    power_stress: 0.4
    environment: GB
  - type: inductor
    description: Choke
    inductor_type: FIXED
    temperature: 70
"#;

    #[test]
    fn test_parse_component_set_applies_defaults() {
        let set = parse_component_set(SET, "set.yaml").unwrap();
        assert_eq!(set.project.as_deref(), Some("Power supply"));
        assert_eq!(set.components.len(), 3);

        let c1 = &set.components[0];
        assert_eq!(c1.temperature, 40.0);
        assert_eq!(c1.environment, "GF");
        assert_eq!(c1.quality_level, "M");

        // Explicit keys win over defaults
        assert_eq!(set.components[1].environment, "GB");
        assert_eq!(set.components[2].temperature, 70.0);
        assert_eq!(set.components[2].family(), Family::Inductor);
        assert!(matches!(set.components[1].parameters, PartParameters::Resistor(_)));
    }

    #[test]
    fn test_parse_json_component_set() {
        let json = r#"{"components": [{"type": "inductor", "inductor_type": "FIXED",
            "quality_level": "M", "environment": "GB", "temperature": 25}]}"#;
        let set = parse_component_set(json, "set.json").unwrap();
        assert_eq!(set.project, None);
        assert_eq!(set.components.len(), 1);
    }

    #[test]
    fn test_unknown_type_is_reported_with_position() {
        let bad = "components:\n  - type: diode\n    temperature: 25\n";
        let err = parse_component_set(bad, "bad.yaml").unwrap_err();
        assert!(err.to_string().contains("component 1"));
    }

    #[test]
    fn test_other_family_keys_are_rejected() {
        let mixed = "components:\n  - type: resistor\n    description: Pull-up\n    style: RCR\n    \
                     watts: 0.25\n    power_stress: 0.4\n    capacitance: 10\n    voltage_stress: 0.5\n    \
                     inductor_type: FIXED\n    temperature: 25\n";
        let err = parse_component_set(mixed, "mixed.yaml").unwrap_err().to_string();
        assert!(err.contains("component 1"));
        assert!(err.contains("`capacitance`"));
        assert!(err.contains("`voltage_stress`"));
        assert!(err.contains("`inductor_type`"));
        assert!(err.contains("resistor component"));
    }

    #[test]
    fn test_misspelled_key_is_rejected() {
        let typo = "components:\n  - type: capacitor\n    description: Bulk\n    style: CSR13\n    \
                    capacitance: 10\n    voltage_stress: 0.5\n    series_resistanse: 1.0\n    temperature: 25\n";
        let err = parse_component_set(typo, "typo.yaml").unwrap_err().to_string();
        assert!(err.contains("`series_resistanse`"));

        // Spelled correctly, the value reaches the πSR bands
        let fixed = typo.replace("series_resistanse", "series_resistance");
        let set = parse_component_set(&fixed, "fixed.yaml").unwrap();
        match &set.components[0].parameters {
            PartParameters::Capacitor(c) => assert_eq!(c.series_resistance, Some(1.0)),
            other => panic!("expected capacitor, got {:?}", other),
        }
        let components: Vec<_> = set
            .components
            .into_iter()
            .map(|c| ComponentInput {
                quality_level: "M".to_string(),
                environment: "GB".to_string(),
                ..c
            })
            .collect();
        let report = Engine::with_defaults().unwrap().calculate(&components).unwrap();
        assert_eq!(report.components[0].factors.pi_sr, Factor::Value(0.66));
    }

    #[test]
    fn test_load_component_set_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("set.yaml");
        std::fs::write(&path, SET).unwrap();
        assert_eq!(load_component_set(&path).unwrap().components.len(), 3);

        let err = load_component_set(&tmp.path().join("absent.yaml")).unwrap_err();
        assert!(err.to_string().contains("absent.yaml"));
    }

    #[test]
    fn test_missing_temperature_without_default_fails() {
        let bad = "components:\n  - type: inductor\n    inductor_type: FIXED\n";
        assert!(parse_component_set(bad, "bad.yaml").is_err());
    }

    #[test]
    fn test_resolve_format() {
        let mut config = Config::default();
        assert_eq!(resolve_format(OutputFormat::Auto, &config), OutputFormat::Md);
        config.default_format = Some("json".to_string());
        assert_eq!(resolve_format(OutputFormat::Auto, &config), OutputFormat::Json);
        assert_eq!(resolve_format(OutputFormat::Csv, &config), OutputFormat::Csv);
        config.default_format = Some("bogus".to_string());
        assert_eq!(resolve_format(OutputFormat::Auto, &config), OutputFormat::Md);
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(0.0), "0");
        assert_eq!(format_rate(0.0023427), "2.3427e-3");
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
    }

    #[test]
    fn test_delimited_row() {
        assert_eq!(delimited_row(&["a", "b,c"], OutputFormat::Csv), "a,\"b,c\"\n");
        assert_eq!(delimited_row(&["a", "b\tc"], OutputFormat::Tsv), "a\tb c\n");
    }
}
