//! # Reference Source Module
//!
//! Loading of the reference nutrition database. The pipeline only needs a
//! `get_all` capability; storage lives outside this crate. Two sources are
//! provided: an in-memory list and a JSON file holding an array of foods.

use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::nutrition_errors::NutritionError;
use crate::nutrition_model::ReferenceFood;

/// Supplier of the complete reference food set
pub trait ReferenceSource: Send + Sync {
    /// Return every reference food
    ///
    /// Failure is final for the caller: nothing can be matched without the
    /// reference set, and retries belong to the storage behind the source.
    fn get_all(&self) -> Result<Vec<ReferenceFood>, NutritionError>;
}

/// Reference foods held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    foods: Vec<ReferenceFood>,
}

impl InMemorySource {
    /// Create a source over a fixed list of foods
    pub fn new(foods: Vec<ReferenceFood>) -> Self {
        Self { foods }
    }
}

impl ReferenceSource for InMemorySource {
    fn get_all(&self) -> Result<Vec<ReferenceFood>, NutritionError> {
        Ok(self.foods.clone())
    }
}

/// Reference foods stored as a JSON array on disk
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    /// Create a source reading from `path` on every `get_all`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the JSON file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_foods(&self) -> Result<Vec<ReferenceFood>> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read reference file {}", self.path.display()))?;
        let foods: Vec<ReferenceFood> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse reference file {}", self.path.display()))?;
        Ok(foods)
    }
}

impl ReferenceSource for JsonFileSource {
    fn get_all(&self) -> Result<Vec<ReferenceFood>, NutritionError> {
        let foods = self.read_foods()?;
        info!(
            "Loaded {} reference foods from {}",
            foods.len(),
            self.path.display()
        );
        Ok(foods)
    }
}
