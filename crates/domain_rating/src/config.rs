//! Rating parameter table
//!
//! The table is assembled once at startup from three layers, applied field by
//! field: built-in defaults, then the JSON file, then environment variables
//! with the same key names. After loading it is read-only and is shared as an
//! `Arc<RatingConfig>` with the components that need it.

use ::config::{Config, ConfigBuilder, Environment, File, FileFormat};
use ::config::builder::DefaultState;
use rust_decimal::Decimal;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use core_kernel::Percentage;

use crate::car::MIN_MODEL_YEAR;

/// Environment variable naming the JSON parameter file
pub const CONFIG_PATH_VAR: &str = "CONFIG_PATH";

/// File read when `CONFIG_PATH` is not set
pub const DEFAULT_CONFIG_PATH: &str = "config/insurance-config.json";

/// Optional top-level section the parameters may be nested under
const SECTION: &str = "insurance";

/// Errors that abort startup while loading the parameter table
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Unreadable or unparseable file, or a value of the wrong type
    #[error("Malformed rating parameters: {0}")]
    Malformed(#[from] ::config::ConfigError),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    fn invalid(key: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Business limits checked before any premium computation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingLimits {
    pub min_car_year: i32,
    pub max_car_value: Decimal,
    pub min_deductible_percentage: Decimal,
    pub max_deductible_percentage: Decimal,
    pub min_broker_fee: Decimal,
    pub max_broker_fee: Decimal,
}

impl Default for RatingLimits {
    fn default() -> Self {
        Self {
            min_car_year: MIN_MODEL_YEAR,
            max_car_value: Decimal::from(1_000_000),
            min_deductible_percentage: Decimal::ZERO,
            max_deductible_percentage: Decimal::ONE,
            min_broker_fee: Decimal::ZERO,
            max_broker_fee: Decimal::from(10_000),
        }
    }
}

/// Process-scoped rating parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingConfig {
    base_rate: Percentage,
    age_adjustment_rate: Percentage,
    value_adjustment_rate: Percentage,
    value_adjustment_step: Decimal,
    coverage_percentage: Percentage,
    gis_adjustment_rate: BTreeMap<String, Percentage>,
    limits: RatingLimits,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            base_rate: Percentage::zero(),
            age_adjustment_rate: Percentage::new(Decimal::new(5, 3)),
            value_adjustment_rate: Percentage::new(Decimal::new(5, 3)),
            value_adjustment_step: Decimal::from(10_000),
            coverage_percentage: Percentage::new(Decimal::ONE),
            gis_adjustment_rate: BTreeMap::new(),
            limits: RatingLimits::default(),
        }
    }
}

/// Flat parameter set after all layers are merged
#[derive(Debug, Deserialize)]
struct RatingParameters {
    base_rate: Decimal,
    age_adjustment_rate: Decimal,
    value_adjustment_rate: Decimal,
    value_adjustment_step: Decimal,
    coverage_percentage: Decimal,
    #[serde(default, deserialize_with = "gis_table")]
    gis_adjustment_rate: BTreeMap<String, Decimal>,
    min_car_year: i32,
    max_car_value: Decimal,
    min_deductible_percentage: Decimal,
    max_deductible_percentage: Decimal,
    min_broker_fee: Decimal,
    max_broker_fee: Decimal,
}

/// Accepts the GIS table as a JSON object in the file or as a JSON string
/// in an environment variable
fn gis_table<'de, D>(deserializer: D) -> Result<BTreeMap<String, Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum GisTable {
        Table(BTreeMap<String, Decimal>),
        Json(String),
    }

    match GisTable::deserialize(deserializer)? {
        GisTable::Table(table) => Ok(table),
        GisTable::Json(raw) => serde_json::from_str(&raw)
            .map_err(|e| de::Error::custom(format!("GIS_ADJUSTMENT_RATE is not a JSON object: {}", e))),
    }
}

impl RatingConfig {
    /// Loads the table from `CONFIG_PATH` (or the default path) and the
    /// process environment
    pub fn from_environment() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::from_file(&path)
    }

    /// Loads the table from a JSON file and the process environment
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::build(Some(path), Environment::default())
    }

    /// Loads the table from an optional JSON file and an explicit variable
    /// map standing in for the environment
    ///
    /// A missing file is skipped. A file that exists but cannot be parsed, or
    /// any value that fails validation, is an error.
    pub fn load(path: Option<&Path>, vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::build(path, Environment::default().source(Some(vars)))
    }

    fn build(path: Option<&Path>, environment: Environment) -> Result<Self, ConfigError> {
        let mut builder = Self::default().layer_defaults()?;

        if let Some(path) = path {
            for (key, value) in nested_section(path)? {
                builder = builder.set_default(key, value)?;
            }
            builder = builder.add_source(json_file(path));
            debug!(path = %path.display(), "Rating parameter file registered");
        }

        let parameters: RatingParameters = builder.add_source(environment).build()?.try_deserialize()?;
        let config = Self::try_from(parameters)?;
        config.validate()?;

        info!(
            states = config.gis_adjustment_rate.len(),
            "Rating parameters assembled"
        );
        Ok(config)
    }

    /// Seeds a builder with this table's values as the lowest layer
    fn layer_defaults(&self) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let limits = &self.limits;
        Ok(Config::builder()
            .set_default("base_rate", self.base_rate.value().to_string())?
            .set_default("age_adjustment_rate", self.age_adjustment_rate.value().to_string())?
            .set_default("value_adjustment_rate", self.value_adjustment_rate.value().to_string())?
            .set_default("value_adjustment_step", self.value_adjustment_step.to_string())?
            .set_default("coverage_percentage", self.coverage_percentage.value().to_string())?
            .set_default("min_car_year", i64::from(limits.min_car_year))?
            .set_default("max_car_value", limits.max_car_value.to_string())?
            .set_default("min_deductible_percentage", limits.min_deductible_percentage.to_string())?
            .set_default("max_deductible_percentage", limits.max_deductible_percentage.to_string())?
            .set_default("min_broker_fee", limits.min_broker_fee.to_string())?
            .set_default("max_broker_fee", limits.max_broker_fee.to_string())?)
    }

    /// Returns a builder-style copy with a different base rate
    pub fn with_base_rate(mut self, rate: Decimal) -> Self {
        self.base_rate = Percentage::new(rate);
        self
    }

    /// Returns a builder-style copy with a regional adjustment for `state`
    pub fn with_gis_rate(mut self, state: &str, rate: Decimal) -> Self {
        self.gis_adjustment_rate
            .insert(state.trim().to_ascii_uppercase(), Percentage::new(rate));
        self
    }

    pub fn with_limits(mut self, limits: RatingLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn base_rate(&self) -> Percentage {
        self.base_rate
    }

    pub fn age_adjustment_rate(&self) -> Percentage {
        self.age_adjustment_rate
    }

    pub fn value_adjustment_rate(&self) -> Percentage {
        self.value_adjustment_rate
    }

    pub fn value_adjustment_step(&self) -> Decimal {
        self.value_adjustment_step
    }

    pub fn coverage_percentage(&self) -> Percentage {
        self.coverage_percentage
    }

    /// Regional adjustment for a state; zero when the state is not listed
    pub fn gis_rate(&self, state_code: &str) -> Percentage {
        self.gis_adjustment_rate
            .get(&state_code.trim().to_ascii_uppercase())
            .copied()
            .unwrap_or_else(Percentage::zero)
    }

    pub fn limits(&self) -> &RatingLimits {
        &self.limits
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.value_adjustment_step <= Decimal::ZERO {
            return Err(ConfigError::invalid(
                "VALUE_ADJUSTMENT_STEP",
                "must be greater than zero",
            ));
        }

        let limits = &self.limits;
        if limits.min_car_year < MIN_MODEL_YEAR {
            return Err(ConfigError::invalid(
                "MIN_CAR_YEAR",
                format!("must be {} or later", MIN_MODEL_YEAR),
            ));
        }
        if limits.max_car_value <= Decimal::ZERO {
            return Err(ConfigError::invalid("MAX_CAR_VALUE", "must be greater than zero"));
        }
        let unit = Decimal::ZERO..=Decimal::ONE;
        if !unit.contains(&limits.min_deductible_percentage)
            || !unit.contains(&limits.max_deductible_percentage)
            || limits.min_deductible_percentage > limits.max_deductible_percentage
        {
            return Err(ConfigError::invalid(
                "MAX_DEDUCTIBLE_PERCENTAGE",
                "deductible bounds must satisfy 0 <= min <= max <= 1",
            ));
        }
        if limits.min_broker_fee < Decimal::ZERO || limits.min_broker_fee > limits.max_broker_fee {
            return Err(ConfigError::invalid(
                "MAX_BROKER_FEE",
                "broker fee bounds must satisfy 0 <= min <= max",
            ));
        }
        Ok(())
    }
}

impl TryFrom<RatingParameters> for RatingConfig {
    type Error = ConfigError;

    fn try_from(parameters: RatingParameters) -> Result<Self, Self::Error> {
        let mut gis_adjustment_rate = BTreeMap::new();
        for (state, rate) in parameters.gis_adjustment_rate {
            let code = state.trim().to_ascii_uppercase();
            if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(ConfigError::invalid(
                    "GIS_ADJUSTMENT_RATE",
                    format!("'{}' is not a 2-letter state code", state),
                ));
            }
            gis_adjustment_rate.insert(code, Percentage::new(rate));
        }

        Ok(Self {
            base_rate: Percentage::new(parameters.base_rate),
            age_adjustment_rate: Percentage::new(parameters.age_adjustment_rate),
            value_adjustment_rate: Percentage::new(parameters.value_adjustment_rate),
            value_adjustment_step: parameters.value_adjustment_step,
            coverage_percentage: Percentage::new(parameters.coverage_percentage),
            gis_adjustment_rate,
            limits: RatingLimits {
                min_car_year: parameters.min_car_year,
                max_car_value: parameters.max_car_value,
                min_deductible_percentage: parameters.min_deductible_percentage,
                max_deductible_percentage: parameters.max_deductible_percentage,
                min_broker_fee: parameters.min_broker_fee,
                max_broker_fee: parameters.max_broker_fee,
            },
        })
    }
}

fn json_file(path: &Path) -> File<::config::FileSourceFile, FileFormat> {
    File::from(path).format(FileFormat::Json).required(false)
}

/// Entries of the optional `INSURANCE` section; empty when the file or the
/// section is absent
fn nested_section(path: &Path) -> Result<::config::Map<String, ::config::Value>, ConfigError> {
    let file = Config::builder().add_source(json_file(path)).build()?;
    Ok(file.get_table(SECTION).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RatingConfig::load(None, HashMap::new()).unwrap();
        assert_eq!(config.base_rate(), Percentage::zero());
        assert_eq!(config.value_adjustment_step(), Decimal::from(10_000));
        assert_eq!(config.gis_rate("SP"), Percentage::zero());
    }

    #[test]
    fn test_gis_lookup_is_case_insensitive() {
        let config = RatingConfig::default().with_gis_rate("sp", Decimal::new(2, 2));
        assert_eq!(config.gis_rate("SP").value(), Decimal::new(2, 2));
        assert_eq!(config.gis_rate(" sp ").value(), Decimal::new(2, 2));
    }

    #[test]
    fn test_bad_env_decimal_is_fatal() {
        let vars = HashMap::from([("BASE_RATE".to_string(), "five percent".to_string())]);
        let result = RatingConfig::load(None, vars);
        assert!(matches!(result, Err(ConfigError::Malformed(_))));
    }

    #[test]
    fn test_defaults_round_trip_through_builder() {
        let parameters: RatingParameters = RatingConfig::default()
            .layer_defaults()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(RatingConfig::try_from(parameters).unwrap(), RatingConfig::default());
    }
}
