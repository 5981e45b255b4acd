//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::core::engine::EngineOptions;
use crate::core::factors::FactorSource;
use crate::core::tables::{ReferenceTables, TableError};
use crate::schema::validator::ValidationLimits;

/// Project config file looked up in the working directory
pub const PROJECT_CONFIG_FILE: &str = ".mil217.yaml";

/// mil217 configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Replacement reference data file
    pub tables: Option<PathBuf>,

    /// Equation or tabulated π-factors
    pub factor_source: Option<FactorSource>,

    /// Lowest accepted operating temperature (°C)
    pub temperature_min: Option<f64>,

    /// Highest accepted operating temperature (°C)
    pub temperature_max: Option<f64>,

    /// Default output format
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::layered(
            Self::global_config_path().as_deref(),
            &cwd,
            |key| std::env::var(key).ok(),
        )
    }

    /// Merge defaults, a global file, the project file in `project_dir`
    /// and environment variables read through `env`
    pub fn layered(
        global_path: Option<&Path>,
        project_dir: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        // 1. Built-in defaults (already in Default impl)
        let mut config = Config::default();

        // 2. Global user config (~/.config/mil217/config.yaml)
        if let Some(global) = global_path.and_then(Self::read_file) {
            config.merge(global);
        }

        // 3. Project config (.mil217.yaml), table path relative to the project
        if let Some(mut project) = Self::read_file(&project_dir.join(PROJECT_CONFIG_FILE)) {
            if let Some(tables) = project.tables.take() {
                project.tables = Some(if tables.is_relative() {
                    project_dir.join(tables)
                } else {
                    tables
                });
            }
            config.merge(project);
        }

        // 4. Environment variables
        if let Some(tables) = env("MIL217_TABLES").filter(|v| !v.is_empty()) {
            config.tables = Some(PathBuf::from(tables));
        }
        if let Some(source) = env("MIL217_FACTOR_SOURCE") {
            match source.parse::<FactorSource>() {
                Ok(source) => config.factor_source = Some(source),
                Err(e) => warn!("ignoring MIL217_FACTOR_SOURCE: {}", e),
            }
        }

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(path = %path.display(), "ignoring unreadable config: {}", e);
                None
            }
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "mil217")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.tables.is_some() {
            self.tables = other.tables;
        }
        if other.factor_source.is_some() {
            self.factor_source = other.factor_source;
        }
        if other.temperature_min.is_some() {
            self.temperature_min = other.temperature_min;
        }
        if other.temperature_max.is_some() {
            self.temperature_max = other.temperature_max;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    /// Engine options with unset keys at their defaults
    ///
    /// An inverted temperature range is ignored in favor of the defaults.
    pub fn engine_options(&self) -> EngineOptions {
        let defaults = ValidationLimits::default();
        let mut limits = ValidationLimits {
            temperature_min: self.temperature_min.unwrap_or(defaults.temperature_min),
            temperature_max: self.temperature_max.unwrap_or(defaults.temperature_max),
        };
        if !(limits.temperature_min <= limits.temperature_max) {
            warn!(
                temperature_min = limits.temperature_min,
                temperature_max = limits.temperature_max,
                "ignoring inverted temperature range, using {} to {}",
                defaults.temperature_min,
                defaults.temperature_max
            );
            limits = defaults;
        }
        EngineOptions {
            factor_source: self.factor_source.unwrap_or_default(),
            limits,
        }
    }

    /// The configured reference data, or the built-in tables
    pub fn reference_tables(&self) -> Result<ReferenceTables, TableError> {
        match &self.tables {
            Some(path) => ReferenceTables::load(path),
            None => ReferenceTables::builtin(),
        }
    }
}
