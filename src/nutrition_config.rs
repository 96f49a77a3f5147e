//! # Nutrition Configuration Module
//!
//! This module defines the tunables of the nutrition pipeline: the similarity
//! floor for food matching, the number of candidates kept, and the deficiency
//! threshold used by the balance evaluator.

use log::debug;
use std::env;
use std::str::FromStr;

use crate::nutrition_errors::NutritionError;

// Constants for nutrition configuration
pub const DEFAULT_SIMILARITY_FLOOR: f64 = 0.3;
pub const DEFAULT_MATCH_LIMIT: usize = 5;
pub const DEFAULT_DEFICIENCY_THRESHOLD: f64 = 0.8;

pub const ENV_SIMILARITY_FLOOR: &str = "NUTRITION_SIMILARITY_FLOOR";
pub const ENV_MATCH_LIMIT: &str = "NUTRITION_MATCH_LIMIT";
pub const ENV_DEFICIENCY_THRESHOLD: &str = "NUTRITION_DEFICIENCY_THRESHOLD";

/// Configuration structure for nutrition calculation
#[derive(Debug, Clone, PartialEq)]
pub struct NutritionConfig {
    /// Minimum similarity for a reference food to count as a match
    pub similarity_floor: f64,
    /// Maximum number of candidates returned by the food matcher
    pub match_limit: usize,
    /// Fulfillment ratio below which a nutrient is deficient
    pub deficiency_threshold: f64,
}

impl Default for NutritionConfig {
    fn default() -> Self {
        Self {
            similarity_floor: DEFAULT_SIMILARITY_FLOOR,
            match_limit: DEFAULT_MATCH_LIMIT,
            deficiency_threshold: DEFAULT_DEFICIENCY_THRESHOLD,
        }
    }
}

impl NutritionConfig {
    /// Build a configuration from environment variables
    ///
    /// Unset variables keep their defaults. Values that fail to parse or fall
    /// outside their valid range are reported as [`NutritionError::Config`].
    pub fn from_env() -> Result<Self, NutritionError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, NutritionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            similarity_floor: read_var(&lookup, ENV_SIMILARITY_FLOOR, defaults.similarity_floor)?,
            match_limit: read_var(&lookup, ENV_MATCH_LIMIT, defaults.match_limit)?,
            deficiency_threshold: read_var(
                &lookup,
                ENV_DEFICIENCY_THRESHOLD,
                defaults.deficiency_threshold,
            )?,
        };
        config.validate()?;
        debug!("Loaded nutrition configuration: {config:?}");
        Ok(config)
    }

    /// Check that every tunable is within its valid range
    pub fn validate(&self) -> Result<(), NutritionError> {
        if !(self.similarity_floor > 0.0 && self.similarity_floor <= 1.0) {
            return Err(NutritionError::Config(format!(
                "{ENV_SIMILARITY_FLOOR} must be within (0, 1], got {}",
                self.similarity_floor
            )));
        }
        if self.match_limit == 0 {
            return Err(NutritionError::Config(format!(
                "{ENV_MATCH_LIMIT} must be at least 1"
            )));
        }
        if !self.deficiency_threshold.is_finite() || self.deficiency_threshold <= 0.0 {
            return Err(NutritionError::InvalidThreshold(self.deficiency_threshold));
        }
        Ok(())
    }
}

fn read_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, NutritionError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| NutritionError::Config(format!("{key} has invalid value '{raw}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = NutritionConfig::default();
        assert_eq!(config.similarity_floor, 0.3);
        assert_eq!(config.match_limit, 5);
        assert_eq!(config.deficiency_threshold, 0.8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unset_variables_keep_defaults() {
        let config = NutritionConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, NutritionConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = NutritionConfig::from_lookup(lookup_from(&[
            (ENV_SIMILARITY_FLOOR, "0.5"),
            (ENV_MATCH_LIMIT, " 3 "),
            (ENV_DEFICIENCY_THRESHOLD, "0.9"),
        ]))
        .unwrap();
        assert_eq!(config.similarity_floor, 0.5);
        assert_eq!(config.match_limit, 3);
        assert_eq!(config.deficiency_threshold, 0.9);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = NutritionConfig::from_lookup(lookup_from(&[(ENV_MATCH_LIMIT, "many")]))
            .unwrap_err();
        assert!(matches!(err, NutritionError::Config(_)));

        let err = NutritionConfig::from_lookup(lookup_from(&[(ENV_SIMILARITY_FLOOR, "1.5")]))
            .unwrap_err();
        assert!(matches!(err, NutritionError::Config(_)));

        let err = NutritionConfig::from_lookup(lookup_from(&[(ENV_SIMILARITY_FLOOR, "0")]))
            .unwrap_err();
        assert!(matches!(err, NutritionError::Config(_)));

        let err = NutritionConfig::from_lookup(lookup_from(&[(ENV_DEFICIENCY_THRESHOLD, "0")]))
            .unwrap_err();
        assert_eq!(err, NutritionError::InvalidThreshold(0.0));
    }
}
