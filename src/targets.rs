//! # Nutrient Targets Module
//!
//! Target nutrient values are supplied per trimester by an external profile
//! service. This module defines the lookup seam and a static provider that can
//! be filled in code or loaded from a JSON document of the form
//! `{"first": {"iron": 9.0, ...}, "second": {...}, "third": {...}}`.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::nutrition_errors::NutritionError;
use crate::nutrition_model::NutrientCode;

/// Per-nutrient target amounts
pub type NutrientTargets = BTreeMap<NutrientCode, f64>;

/// Pregnancy trimester a target set applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trimester {
    /// Weeks 1-13
    First,
    /// Weeks 14-27
    Second,
    /// Weeks 28 onward
    Third,
}

impl Trimester {
    /// Trimester for a week of pregnancy (1-based)
    pub fn from_week(week: u32) -> Self {
        match week {
            0..=13 => Trimester::First,
            14..=27 => Trimester::Second,
            _ => Trimester::Third,
        }
    }
}

impl fmt::Display for Trimester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Trimester::First => "first",
            Trimester::Second => "second",
            Trimester::Third => "third",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Trimester {
    type Err = NutritionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first" | "1" => Ok(Trimester::First),
            "second" | "2" => Ok(Trimester::Second),
            "third" | "3" => Ok(Trimester::Third),
            other => Err(NutritionError::Config(format!("unknown trimester '{other}'"))),
        }
    }
}

/// Supplier of target nutrient values
pub trait TargetProvider: Send + Sync {
    /// Targets for a trimester
    fn targets_for(&self, trimester: Trimester) -> Result<NutrientTargets, NutritionError>;
}

/// Targets fixed at construction time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticTargetProvider {
    targets: HashMap<Trimester, NutrientTargets>,
}

impl StaticTargetProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the targets for a trimester
    pub fn with_targets(mut self, trimester: Trimester, targets: NutrientTargets) -> Self {
        self.targets.insert(trimester, targets);
        self
    }

    /// Load targets from a JSON file keyed by trimester name
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read targets file {}", path.display()))?;
        let provider: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse targets file {}", path.display()))?;
        debug!(
            "Loaded targets for {} trimesters from {}",
            provider.targets.len(),
            path.display()
        );
        Ok(provider)
    }
}

impl TargetProvider for StaticTargetProvider {
    fn targets_for(&self, trimester: Trimester) -> Result<NutrientTargets, NutritionError> {
        self.targets
            .get(&trimester)
            .cloned()
            .ok_or_else(|| {
                NutritionError::TargetsUnavailable(format!("no targets for {trimester} trimester"))
            })
    }
}
