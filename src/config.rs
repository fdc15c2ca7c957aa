//! Runtime configuration
//!
//! Loaded from a TOML file:
//!
//! ```toml
//! [runtime]
//! loop_frequency_hz = 30.0
//!
//! [parameters]
//! FREF_MAX_SPD_X = 1.0
//! FREF_MAX_SPD_Y = 1.0
//! FREF_MAX_SPD_Z = 0.5
//! TF_TIMEOUT = 0.5
//! ```
//!
//! The `[parameters]` table is copied verbatim into a [`ParameterStore`];
//! each behavior then picks the entries it needs and fails construction if
//! a required one is missing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use aerial_behaviors_core::parameters::{
    FollowReferenceParams, FrameNames, ParamFlags, ParamValue, ParameterError, ParameterStore, TakeoffParams,
};
use serde::Deserialize;

/// Default tick frequency (Hz)
pub const DEFAULT_LOOP_FREQUENCY_HZ: f64 = 30.0;

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    #[error("Unsupported value for parameter {0}")]
    UnsupportedValue(String),

    #[error("Loop frequency must give a positive tick period, got {0} Hz")]
    InvalidFrequency(f64),
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RuntimeSection {
    loop_frequency_hz: f64,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            loop_frequency_hz: DEFAULT_LOOP_FREQUENCY_HZ,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    runtime: RuntimeSection,
    parameters: BTreeMap<String, toml::Value>,
}

/// Loaded runtime configuration
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    loop_frequency_hz: f64,
    tick_period: Duration,
    /// Parameters for all behaviors; frame names are read-only
    pub parameters: ParameterStore,
}

impl RuntimeConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        log::info!(
            "Loaded {} parameters from {}",
            config.parameters.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;

        let frequency = file.runtime.loop_frequency_hz;
        let tick_period = tick_period(frequency)?;

        let mut parameters = ParameterStore::new();
        for (name, value) in file.parameters {
            let value = param_value(&name, value)?;
            if FrameNames::PARAMETERS.contains(&name.as_str()) {
                parameters.register(&name, value, ParamFlags::READ_ONLY)?;
            } else {
                parameters.insert(&name, value)?;
            }
        }
        FrameNames::register_defaults(&mut parameters)?;

        Ok(Self {
            loop_frequency_hz: frequency,
            tick_period,
            parameters,
        })
    }

    /// Tick frequency of the behavior runner (Hz)
    pub fn loop_frequency_hz(&self) -> f64 {
        self.loop_frequency_hz
    }

    /// Period between ticks
    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    /// Follow-reference parameters
    pub fn follow_reference_params(&self) -> Result<FollowReferenceParams, ConfigError> {
        Ok(FollowReferenceParams::from_store(&self.parameters)?)
    }

    /// Takeoff parameters
    pub fn takeoff_params(&self) -> Result<TakeoffParams, ConfigError> {
        Ok(TakeoffParams::from_store(&self.parameters)?)
    }
}

/// Period for `frequency`, which must give a representable, non-zero duration
fn tick_period(frequency: f64) -> Result<Duration, ConfigError> {
    if !(frequency.is_finite() && frequency > 0.0) {
        return Err(ConfigError::InvalidFrequency(frequency));
    }
    match Duration::try_from_secs_f64(1.0 / frequency) {
        Ok(period) if !period.is_zero() => Ok(period),
        _ => Err(ConfigError::InvalidFrequency(frequency)),
    }
}

fn param_value(name: &str, value: toml::Value) -> Result<ParamValue, ConfigError> {
    match value {
        toml::Value::Float(v) => Ok(ParamValue::Float(v)),
        toml::Value::Integer(v) => i32::try_from(v)
            .map(ParamValue::Int)
            .map_err(|_| ConfigError::UnsupportedValue(name.to_string())),
        toml::Value::Boolean(v) => Ok(ParamValue::Bool(v)),
        toml::Value::String(v) => Ok(ParamValue::String(v)),
        _ => Err(ConfigError::UnsupportedValue(name.to_string())),
    }
}
