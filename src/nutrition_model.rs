//! # Meal Nutrition Data Model
//!
//! This module defines the data structures flowing through the nutrition
//! pipeline: reference foods loaded from the nutrition database, recognized
//! items produced upstream, and the results of aggregation and balance scoring.
//!
//! ## Core Concepts
//!
//! - **ReferenceFood**: canonical database entry with nutrients per standard quantity
//! - **RecognizedItem**: a food name, an informal quantity and a recognition confidence
//! - **QuantityExpr**: either a gram weight or an amount of a cooking unit
//! - **NutritionResult**: per-nutrient totals, aggregate confidence and a per-item breakdown
//!
//! ## Usage
//!
//! ```rust
//! use meal_nutrition::nutrition_model::{QuantityExpr, RecognizedItem, ReferenceFood};
//!
//! let rice = ReferenceFood::new(1, "ご飯", QuantityExpr::unit("杯", 1.0))
//!     .with_alias("白米")
//!     .with_nutrient("calories", 250.0);
//!
//! let item = RecognizedItem::new("ご飯", "茶碗1杯", 0.9);
//! assert_eq!(rice.standard_quantity.to_string(), "1杯");
//! assert_eq!(item.confidence, 0.9);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identifier of a nutrient (e.g. "calories", "iron", "calcium")
pub type NutrientCode = String;

/// Canonical nutrition database entry
///
/// Nutrient values are given for one `standard_quantity` of the food.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceFood {
    /// Stable identifier, used to break ranking ties
    pub id: u64,

    /// Primary display name (e.g. "ご飯")
    pub name: String,

    /// Alternative names the food is known by
    #[serde(default)]
    pub aliases: BTreeSet<String>,

    /// Serving size the nutrient values refer to
    pub standard_quantity: QuantityExpr,

    /// Nutrient values per standard quantity
    #[serde(default)]
    pub nutrients: BTreeMap<NutrientCode, f64>,
}

/// A food item as recognized by the upstream image or text step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedItem {
    /// Free-text food name
    pub name: String,

    /// Informal quantity expression (e.g. "200g", "大さじ2", "適量")
    pub quantity: String,

    /// Recognition confidence (0.0 to 1.0)
    pub confidence: f64,
}

/// Parsed quantity: a gram weight or an amount of a cooking unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuantityExpr {
    /// Weight in grams (e.g. "100g")
    Grams {
        /// Number of grams
        grams: f64,
    },

    /// Amount of a cooking unit (e.g. "大さじ1.5", "2個")
    Unit {
        /// Unit token from the cooking vocabulary
        unit: String,
        /// Number of units
        amount: f64,
    },
}

/// A reference food matched against a free-text name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// The matched reference food
    pub food: ReferenceFood,

    /// Similarity between the query and the best of the food's names (0.0 to 1.0)
    pub similarity: f64,
}

/// Per-nutrient sums, all values non-negative
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NutrientTotals {
    values: BTreeMap<NutrientCode, f64>,
}

/// How a single recognized item contributed to the totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemBreakdown {
    /// The input item
    pub item: RecognizedItem,

    /// Best match, or `None` when nothing cleared the similarity floor
    pub matched: Option<MatchResult>,

    /// Quantity multiplier applied to the matched food (0 when unresolved)
    pub multiplier: f64,

    /// Nutrients this item added to the totals
    pub contribution: NutrientTotals,
}

/// Outcome of aggregating one meal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutritionResult {
    /// Summed nutrients across all resolved items
    pub totals: NutrientTotals,

    /// Similarity-weighted mean of item confidences (0.0 to 1.0)
    pub confidence: f64,

    /// One entry per input item, in input order
    pub per_item: Vec<ItemBreakdown>,

    /// Number of items that matched no reference food
    pub unresolved_count: usize,
}

/// A nutrient below its target, as reported by the balance evaluator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeficiencyEntry {
    /// Nutrient identifier
    pub nutrient_code: NutrientCode,

    /// Aggregated amount
    pub current_value: f64,

    /// Target amount
    pub target_value: f64,

    /// `current_value / target_value`, never negative
    pub fulfillment_ratio: f64,
}

/// Balance of a meal against a set of targets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceReport {
    /// Mean of capped fulfillment ratios (0.0 to 1.0)
    pub score: f64,

    /// Deficient nutrients, most deficient first
    pub deficient: Vec<DeficiencyEntry>,

    /// Nutrients meeting the threshold, in code order
    pub sufficient: Vec<NutrientCode>,
}

impl ReferenceFood {
    /// Create a reference food with no aliases and no nutrients
    pub fn new(id: u64, name: &str, standard_quantity: QuantityExpr) -> Self {
        Self {
            id,
            name: name.to_string(),
            aliases: BTreeSet::new(),
            standard_quantity,
            nutrients: BTreeMap::new(),
        }
    }

    /// Add an alternative name
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.insert(alias.to_string());
        self
    }

    /// Set a nutrient value per standard quantity
    pub fn with_nutrient(mut self, code: &str, value: f64) -> Self {
        self.nutrients.insert(code.to_string(), value);
        self
    }

    /// The primary name followed by every alias
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

impl RecognizedItem {
    /// Create a recognized item; confidence is clamped into [0, 1]
    pub fn new(name: &str, quantity: &str, confidence: f64) -> Self {
        Self {
            name: name.to_string(),
            quantity: quantity.to_string(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

impl QuantityExpr {
    /// Create a gram quantity
    pub fn grams(grams: f64) -> Self {
        QuantityExpr::Grams { grams }
    }

    /// Create a cooking-unit quantity
    pub fn unit(unit: &str, amount: f64) -> Self {
        QuantityExpr::Unit {
            unit: unit.to_string(),
            amount,
        }
    }

    /// The numeric part of the quantity
    pub fn amount(&self) -> f64 {
        match self {
            QuantityExpr::Grams { grams } => *grams,
            QuantityExpr::Unit { amount, .. } => *amount,
        }
    }

    /// Check if this quantity is a gram weight
    pub fn is_grams(&self) -> bool {
        matches!(self, QuantityExpr::Grams { .. })
    }
}

impl NutrientTotals {
    /// Create empty totals (every nutrient reads as zero)
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for a nutrient, 0 when absent
    pub fn get(&self, code: &str) -> f64 {
        self.values.get(code).copied().unwrap_or(0.0)
    }

    /// Add an amount to a nutrient
    pub fn add(&mut self, code: &str, amount: f64) {
        *self.values.entry(code.to_string()).or_insert(0.0) += amount;
    }

    /// Fold another set of totals into this one
    ///
    /// Plain per-code addition, so partial sums computed independently can be
    /// merged in any order.
    pub fn merge(&mut self, other: &NutrientTotals) {
        for (code, amount) in &other.values {
            self.add(code, *amount);
        }
    }

    /// Nutrients scaled by a multiplier
    pub fn scaled(nutrients: &BTreeMap<NutrientCode, f64>, multiplier: f64) -> Self {
        Self {
            values: nutrients
                .iter()
                .map(|(code, value)| (code.clone(), value * multiplier))
                .collect(),
        }
    }

    /// Iterate over `(code, value)` pairs in code order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(code, value)| (code.as_str(), *value))
    }

    /// Check if every nutrient is zero (vacuously true when empty)
    pub fn is_zero(&self) -> bool {
        self.values.values().all(|value| *value == 0.0)
    }

    /// Number of nutrient codes present
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no nutrient code is present
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(NutrientCode, f64)> for NutrientTotals {
    fn from_iter<I: IntoIterator<Item = (NutrientCode, f64)>>(iter: I) -> Self {
        let mut totals = NutrientTotals::new();
        for (code, amount) in iter {
            totals.add(&code, amount);
        }
        totals
    }
}

impl NutritionResult {
    /// Check if at least one item could not be matched
    pub fn is_degraded(&self) -> bool {
        self.unresolved_count > 0
    }

    /// Number of items that matched a reference food
    pub fn resolved_count(&self) -> usize {
        self.per_item.len() - self.unresolved_count
    }
}

fn write_amount(f: &mut fmt::Formatter<'_>, amount: f64) -> fmt::Result {
    if amount.fract() == 0.0 && amount.abs() < 1e15 {
        write!(f, "{}", amount as i64)
    } else {
        write!(f, "{amount}")
    }
}

impl fmt::Display for QuantityExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuantityExpr::Grams { grams } => {
                write_amount(f, *grams)?;
                write!(f, "g")
            }
            QuantityExpr::Unit { unit, amount } => {
                // Spoons and cups lead with the unit, counters trail the number
                if crate::quantity_patterns::is_prefix_unit(unit) {
                    write!(f, "{unit}")?;
                    write_amount(f, *amount)
                } else {
                    write_amount(f, *amount)?;
                    write!(f, "{unit}")
                }
            }
        }
    }
}

impl fmt::Display for NutritionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Nutrition ({} resolved, {} unresolved, {:.1}% confidence):",
            self.resolved_count(),
            self.unresolved_count,
            self.confidence * 100.0
        )?;

        for (code, value) in self.totals.iter() {
            writeln!(f, "  • {code}: {value:.1}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_food_builder() {
        let food = ReferenceFood::new(7, "味噌汁", QuantityExpr::unit("杯", 1.0))
            .with_alias("みそ汁")
            .with_nutrient("sodium", 800.0);

        assert_eq!(food.id, 7);
        assert_eq!(food.names().collect::<Vec<_>>(), vec!["味噌汁", "みそ汁"]);
        assert_eq!(food.nutrients.get("sodium"), Some(&800.0));
    }

    #[test]
    fn test_recognized_item_clamps_confidence() {
        assert_eq!(RecognizedItem::new("卵", "1個", 1.4).confidence, 1.0);
        assert_eq!(RecognizedItem::new("卵", "1個", -0.2).confidence, 0.0);
    }

    #[test]
    fn test_quantity_display() {
        assert_eq!(QuantityExpr::grams(100.0).to_string(), "100g");
        assert_eq!(QuantityExpr::grams(12.5).to_string(), "12.5g");
        assert_eq!(QuantityExpr::unit("大さじ", 1.0).to_string(), "大さじ1");
        assert_eq!(QuantityExpr::unit("杯", 1.0).to_string(), "1杯");
        assert_eq!(QuantityExpr::unit("切れ", 2.0).to_string(), "2切れ");
    }

    #[test]
    fn test_quantity_deserializes_both_shapes() {
        let grams: QuantityExpr = serde_json::from_str(r#"{"grams": 150}"#).unwrap();
        assert_eq!(grams, QuantityExpr::grams(150.0));

        let unit: QuantityExpr =
            serde_json::from_str(r#"{"unit": "個", "amount": 1}"#).unwrap();
        assert_eq!(unit, QuantityExpr::unit("個", 1.0));
        assert!(!unit.is_grams());
    }

    #[test]
    fn test_totals_missing_code_reads_zero() {
        let mut totals = NutrientTotals::new();
        totals.add("iron", 2.0);
        totals.add("iron", 1.5);

        assert_eq!(totals.get("iron"), 3.5);
        assert_eq!(totals.get("calcium"), 0.0);
        assert!(!totals.is_zero());
        assert!(NutrientTotals::new().is_zero());
    }

    #[test]
    fn test_totals_merge_is_order_independent() {
        let a: NutrientTotals = [("iron".to_string(), 1.0), ("calories".to_string(), 100.0)]
            .into_iter()
            .collect();
        let b: NutrientTotals = [("iron".to_string(), 2.0)].into_iter().collect();
        let c: NutrientTotals = [("calcium".to_string(), 50.0)].into_iter().collect();

        let mut left = a.clone();
        left.merge(&b);
        left.merge(&c);

        let mut right = c.clone();
        right.merge(&b);
        right.merge(&a);

        assert_eq!(left, right);
        assert_eq!(left.get("iron"), 3.0);
    }

    #[test]
    fn test_totals_serialize_as_map() {
        let totals: NutrientTotals = [("calories".to_string(), 250.0)].into_iter().collect();
        let json = serde_json::to_string(&totals).unwrap();
        assert_eq!(json, r#"{"calories":250.0}"#);
    }
}
