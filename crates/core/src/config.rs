// Copyright 2025 allocscope contributors
// SPDX-License-Identifier: Apache-2.0

//! Analysis configuration.
//!
//! Thresholds used by the checks are named constants here and can be
//! overridden, in increasing precedence, by:
//!
//! 1. a TOML file (`allocscope.toml` in the working directory, or an explicit path)
//! 2. environment variables prefixed with `ALLOCSCOPE_`
//!
//! ```toml
//! mismatch_threshold = 0.01
//! short_measurement_micros = 100.0
//! canonical_scenarios = ["Sequential", "Random", "Mixed", "Stress"]
//! ```

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Maximum tolerated relative deviation between reported and recomputed throughput.
pub const DEFAULT_MISMATCH_THRESHOLD: f64 = 0.01;

/// Measurement windows shorter than this (in microseconds) are flagged.
pub const DEFAULT_SHORT_MEASUREMENT_MICROS: f64 = 100.0;

/// Lower bound of the relative-difference denominator.
pub const RELDIFF_EPSILON: f64 = 1e-12;

/// Preferred display order of the known benchmark scenarios.
pub const CANONICAL_SCENARIOS: [&str; 4] = ["Sequential", "Random", "Mixed", "Stress"];

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "allocscope.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "ALLOCSCOPE";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Source could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Rendering to TOML failed
    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Tunables for reconciliation and ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Relative deviation above which a throughput mismatch is reported
    pub mismatch_threshold: f64,
    /// Shortest measurement window, in microseconds, that is not flagged
    pub short_measurement_micros: f64,
    /// Denominator floor for relative differences
    pub reldiff_epsilon: f64,
    /// Known scenarios in preferred display order
    pub canonical_scenarios: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            mismatch_threshold: DEFAULT_MISMATCH_THRESHOLD,
            short_measurement_micros: DEFAULT_SHORT_MEASUREMENT_MICROS,
            reldiff_epsilon: RELDIFF_EPSILON,
            canonical_scenarios: CANONICAL_SCENARIOS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from the optional file and the process environment.
    ///
    /// Without an explicit path, `allocscope.toml` is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
        };
        let builder = Config::builder()
            .add_source(file)
            .add_source(Self::environment(None));
        Self::finish(builder.build()?)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?;
        Self::finish(config)
    }

    /// Parse configuration from TOML text with explicit environment overrides.
    pub fn from_toml_str_with_env(text: &str, env: config::Map<String, String>) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .add_source(Self::environment(Some(env)))
            .build()?;
        Self::finish(config)
    }

    fn environment(source: Option<config::Map<String, String>>) -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("canonical_scenarios")
            .source(source)
    }

    fn finish(config: Config) -> Result<Self> {
        let parsed: Self = config.try_deserialize()?;
        parsed.validate()?;
        debug!(
            mismatch_threshold = parsed.mismatch_threshold,
            short_measurement_micros = parsed.short_measurement_micros,
            scenarios = parsed.canonical_scenarios.len(),
            "Loaded analysis configuration"
        );
        Ok(parsed)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<()> {
        if !self.mismatch_threshold.is_finite() || self.mismatch_threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "mismatch_threshold must be finite and non-negative, got {}",
                self.mismatch_threshold
            )));
        }
        if !self.short_measurement_micros.is_finite() || self.short_measurement_micros < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "short_measurement_micros must be finite and non-negative, got {}",
                self.short_measurement_micros
            )));
        }
        if !self.reldiff_epsilon.is_finite() || self.reldiff_epsilon <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "reldiff_epsilon must be finite and positive, got {}",
                self.reldiff_epsilon
            )));
        }

        let mut seen = HashSet::new();
        for name in &self.canonical_scenarios {
            if name.is_empty() {
                return Err(ConfigError::Invalid(
                    "canonical_scenarios must not contain empty names".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "canonical_scenarios lists '{}' more than once",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
