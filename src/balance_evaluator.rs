//! # Balance Evaluator Module
//!
//! Compares aggregated nutrient totals against per-nutrient targets. The
//! overall score is the mean of fulfillment ratios capped at 1, so a surplus
//! in one nutrient cannot hide a shortfall in another.

use log::debug;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::nutrition_config::DEFAULT_DEFICIENCY_THRESHOLD;
use crate::nutrition_errors::NutritionError;
use crate::nutrition_model::{BalanceReport, DeficiencyEntry, NutrientCode, NutrientTotals};

/// Evaluate totals against targets with the default threshold (0.8)
pub fn evaluate_default(
    totals: &NutrientTotals,
    targets: &BTreeMap<NutrientCode, f64>,
) -> Result<BalanceReport, NutritionError> {
    evaluate(totals, targets, DEFAULT_DEFICIENCY_THRESHOLD)
}

/// Evaluate totals against targets
///
/// A nutrient is deficient when `total / target < threshold`. Nutrients that
/// appear in `totals` but not in `targets` are ignored.
///
/// # Errors
///
/// - [`NutritionError::EmptyTargets`] when no targets are given
/// - [`NutritionError::InvalidTarget`] when a target is zero, negative or not finite
/// - [`NutritionError::InvalidThreshold`] when the threshold is not a positive number
///
/// # Examples
///
/// ```rust
/// use meal_nutrition::balance_evaluator::evaluate;
/// use meal_nutrition::nutrition_model::NutrientTotals;
/// use std::collections::BTreeMap;
///
/// let targets = BTreeMap::from([("iron".to_string(), 10.0), ("calcium".to_string(), 20.0)]);
/// let totals: NutrientTotals = [("iron".to_string(), 2.0), ("calcium".to_string(), 19.0)]
///     .into_iter()
///     .collect();
///
/// let report = evaluate(&totals, &targets, 0.8)?;
/// assert_eq!(report.deficient.len(), 1);
/// assert_eq!(report.deficient[0].nutrient_code, "iron");
/// assert_eq!(report.sufficient, vec!["calcium".to_string()]);
/// # Ok::<(), meal_nutrition::nutrition_errors::NutritionError>(())
/// ```
pub fn evaluate(
    totals: &NutrientTotals,
    targets: &BTreeMap<NutrientCode, f64>,
    threshold: f64,
) -> Result<BalanceReport, NutritionError> {
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(NutritionError::InvalidThreshold(threshold));
    }
    if targets.is_empty() {
        return Err(NutritionError::EmptyTargets);
    }
    if let Some((code, value)) = targets
        .iter()
        .find(|(_, value)| !value.is_finite() || **value <= 0.0)
    {
        return Err(NutritionError::InvalidTarget {
            code: code.clone(),
            value: *value,
        });
    }

    let mut capped_sum = 0.0;
    let mut deficient = Vec::new();
    let mut sufficient = Vec::new();

    for (code, target) in targets {
        let current = totals.get(code);
        let ratio = (current / target).max(0.0);
        capped_sum += ratio.min(1.0);

        if ratio < threshold {
            deficient.push(DeficiencyEntry {
                nutrient_code: code.clone(),
                current_value: current,
                target_value: *target,
                fulfillment_ratio: ratio,
            });
        } else {
            sufficient.push(code.clone());
        }
    }

    deficient.sort_by(|a, b| {
        a.fulfillment_ratio
            .partial_cmp(&b.fulfillment_ratio)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.nutrient_code.cmp(&b.nutrient_code))
    });

    let score = (capped_sum / targets.len() as f64).clamp(0.0, 1.0);
    debug!(
        "Balance score {score:.3}: {} deficient, {} sufficient",
        deficient.len(),
        sufficient.len()
    );

    Ok(BalanceReport {
        score,
        deficient,
        sufficient,
    })
}
