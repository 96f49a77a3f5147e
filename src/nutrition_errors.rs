//! # Nutrition Error Types Module
//!
//! This module defines the error type returned by the fallible entry points of
//! the nutrition pipeline. Matching, quantity interpretation and aggregation are
//! total; only input validation, configuration and reference loading can fail.

use thiserror::Error;

/// Errors raised by the nutrition pipeline
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NutritionError {
    /// A meal was submitted with no items
    #[error("Validation error: item list is empty")]
    EmptyItems,

    /// A recognized item carries unusable data
    #[error("Validation error: {0}")]
    InvalidItem(String),

    /// A target nutrient value is zero, negative or not a number
    #[error("Configuration error: target for '{code}' must be positive, got {value}")]
    InvalidTarget {
        /// Nutrient code of the offending target
        code: String,
        /// The rejected value
        value: f64,
    },

    /// No targets were supplied for balance evaluation
    #[error("Configuration error: no nutrient targets supplied")]
    EmptyTargets,

    /// The deficiency threshold is not a positive number
    #[error("Configuration error: deficiency threshold must be positive, got {0}")]
    InvalidThreshold(f64),

    /// A tunable read from the environment is malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// A reference food violates the snapshot invariants
    #[error("Invalid reference data: {0}")]
    InvalidReference(String),

    /// The reference food set could not be loaded
    #[error("Reference data unavailable: {0}")]
    ReferenceUnavailable(String),

    /// Targets could not be obtained for the requested profile
    #[error("Targets unavailable: {0}")]
    TargetsUnavailable(String),
}

impl From<anyhow::Error> for NutritionError {
    fn from(err: anyhow::Error) -> Self {
        NutritionError::ReferenceUnavailable(format!("{err:#}"))
    }
}
