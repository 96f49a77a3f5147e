//! # Nutrition Aggregator Module
//!
//! This module combines the recognized items of a meal into nutrient totals.
//! Each item is matched against the reference snapshot, scaled by its quantity
//! multiplier and summed per nutrient code. The aggregate confidence is the
//! mean of item confidences weighted by match similarity.
//!
//! ## Unresolved items
//!
//! An item that matches no reference food stays in the per-item breakdown with
//! a zero multiplier and an empty contribution. It carries no weight in the
//! confidence mean, and the result reports it through `unresolved_count`.
//! A meal where nothing matched yields zero totals and zero confidence.

use log::{debug, info, warn};

use crate::food_matcher::ReferenceSnapshot;
use crate::nutrition_config::DEFAULT_SIMILARITY_FLOOR;
use crate::nutrition_model::{ItemBreakdown, NutrientTotals, NutritionResult, RecognizedItem};
use crate::quantity_interpreter::estimate_multiplier_for;

/// Aggregates recognized items against one reference snapshot
///
/// # Examples
///
/// ```rust
/// use meal_nutrition::food_matcher::ReferenceSnapshot;
/// use meal_nutrition::nutrition_aggregator::NutritionAggregator;
/// use meal_nutrition::nutrition_model::{QuantityExpr, RecognizedItem, ReferenceFood};
///
/// let snapshot = ReferenceSnapshot::new(vec![
///     ReferenceFood::new(1, "ご飯", QuantityExpr::unit("杯", 1.0)).with_nutrient("calories", 250.0),
/// ])?;
/// let aggregator = NutritionAggregator::new(&snapshot);
///
/// let result = aggregator.aggregate(&[RecognizedItem::new("ご飯", "2杯", 0.9)]);
/// assert_eq!(result.totals.get("calories"), 500.0);
/// assert!((result.confidence - 0.9).abs() < 1e-12);
/// # Ok::<(), meal_nutrition::nutrition_errors::NutritionError>(())
/// ```
pub struct NutritionAggregator<'a> {
    snapshot: &'a ReferenceSnapshot,
    similarity_floor: f64,
}

/// Running sums for the similarity-weighted confidence mean
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ConfidenceAccumulator {
    weighted_sum: f64,
    total_weight: f64,
}

impl ConfidenceAccumulator {
    fn add(&mut self, confidence: f64, weight: f64) {
        self.weighted_sum += confidence * weight;
        self.total_weight += weight;
    }

    fn mean(&self) -> f64 {
        if self.total_weight > 0.0 {
            (self.weighted_sum / self.total_weight).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl<'a> NutritionAggregator<'a> {
    /// Create an aggregator with the default similarity floor
    pub fn new(snapshot: &'a ReferenceSnapshot) -> Self {
        Self::with_floor(snapshot, DEFAULT_SIMILARITY_FLOOR)
    }

    /// Create an aggregator with a custom similarity floor
    pub fn with_floor(snapshot: &'a ReferenceSnapshot, similarity_floor: f64) -> Self {
        Self {
            snapshot,
            similarity_floor,
        }
    }

    /// Aggregate the items of one meal
    ///
    /// Never fails: an empty list or a list of unmatched items yields zero
    /// totals and zero confidence.
    pub fn aggregate(&self, items: &[RecognizedItem]) -> NutritionResult {
        let mut totals = NutrientTotals::new();
        let mut confidence = ConfidenceAccumulator::default();
        let mut per_item = Vec::with_capacity(items.len());
        let mut unresolved_count = 0;

        for item in items {
            let breakdown = self.resolve_item(item);

            match &breakdown.matched {
                Some(matched) => {
                    confidence.add(item.confidence, matched.similarity);
                    totals.merge(&breakdown.contribution);
                }
                None => unresolved_count += 1,
            }
            per_item.push(breakdown);
        }

        let result = NutritionResult {
            totals,
            confidence: confidence.mean(),
            per_item,
            unresolved_count,
        };

        if items.is_empty() {
            debug!("Aggregated an empty meal");
        } else if result.unresolved_count == items.len() {
            warn!("None of {} items matched a reference food", items.len());
        } else {
            info!(
                "Aggregated {} items ({} unresolved) with {:.1}% confidence",
                items.len(),
                result.unresolved_count,
                result.confidence * 100.0
            );
        }
        result
    }

    /// Match one item and compute its contribution
    fn resolve_item(&self, item: &RecognizedItem) -> ItemBreakdown {
        let Some(matched) = self.snapshot.best_match(&item.name, self.similarity_floor) else {
            debug!("No reference food for {:?}", item.name);
            return ItemBreakdown {
                item: item.clone(),
                matched: None,
                multiplier: 0.0,
                contribution: NutrientTotals::new(),
            };
        };

        let multiplier = estimate_multiplier_for(&item.quantity, &matched.food.standard_quantity);
        let contribution = NutrientTotals::scaled(&matched.food.nutrients, multiplier);
        debug!(
            "{:?} -> {:?} (similarity {:.3}, multiplier {multiplier})",
            item.name, matched.food.name, matched.similarity
        );

        ItemBreakdown {
            item: item.clone(),
            matched: Some(matched),
            multiplier,
            contribution,
        }
    }

    /// Aggregate several meals and sum their totals
    ///
    /// Each meal is aggregated on its own; the returned totals are the merge of
    /// every meal's totals, which does not depend on meal order.
    pub fn aggregate_meals(
        &self,
        meals: &[Vec<RecognizedItem>],
    ) -> (Vec<NutritionResult>, NutrientTotals) {
        let results: Vec<NutritionResult> =
            meals.iter().map(|meal| self.aggregate(meal)).collect();

        let mut combined = NutrientTotals::new();
        for result in &results {
            combined.merge(&result.totals);
        }
        (results, combined)
    }
}
