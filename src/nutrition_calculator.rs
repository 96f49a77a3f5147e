//! # Nutrition Calculator
//!
//! This module is the entry point used by the meal-analysis and advice
//! workflows. It owns the food matcher and configuration, validates inbound
//! data, and wires matching, quantity interpretation, aggregation and balance
//! evaluation together.
//!
//! ## Usage
//!
//! ```rust
//! use meal_nutrition::nutrition_calculator::NutritionCalculator;
//! use meal_nutrition::nutrition_config::NutritionConfig;
//! use meal_nutrition::nutrition_model::{QuantityExpr, RecognizedItem, ReferenceFood};
//! use meal_nutrition::reference_source::InMemorySource;
//! use std::collections::BTreeMap;
//!
//! let source = InMemorySource::new(vec![
//!     ReferenceFood::new(1, "ご飯", QuantityExpr::unit("杯", 1.0))
//!         .with_nutrient("calories", 250.0)
//!         .with_nutrient("iron", 0.2),
//! ]);
//! let calculator = NutritionCalculator::from_source(&source, NutritionConfig::default())?;
//!
//! let result = calculator.calculate_nutrition(&[RecognizedItem::new("ご飯", "茶碗1杯", 0.9)])?;
//! assert_eq!(result.totals.get("calories"), 250.0);
//!
//! let targets = BTreeMap::from([("iron".to_string(), 10.0)]);
//! let report = calculator.evaluate_balance(&result.totals, &targets, None)?;
//! assert_eq!(report.deficient[0].nutrient_code, "iron");
//! # Ok::<(), meal_nutrition::nutrition_errors::NutritionError>(())
//! ```

use log::{info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::balance_evaluator::evaluate;
use crate::food_matcher::{FoodMatcher, ReferenceSnapshot};
use crate::nutrition_aggregator::NutritionAggregator;
use crate::nutrition_config::NutritionConfig;
use crate::nutrition_errors::NutritionError;
use crate::nutrition_model::{
    BalanceReport, MatchResult, NutrientCode, NutrientTotals, NutritionResult, RecognizedItem,
};
use crate::reference_source::ReferenceSource;
use crate::targets::{TargetProvider, Trimester};

/// Stateless nutrition pipeline over a swappable reference snapshot
#[derive(Debug)]
pub struct NutritionCalculator {
    matcher: FoodMatcher,
    config: NutritionConfig,
}

impl NutritionCalculator {
    /// Create a calculator over an existing snapshot
    pub fn new(
        snapshot: ReferenceSnapshot,
        config: NutritionConfig,
    ) -> Result<Self, NutritionError> {
        config.validate()?;
        Ok(Self {
            matcher: FoodMatcher::with_floor(snapshot, config.similarity_floor),
            config,
        })
    }

    /// Load the reference set from a source and build a calculator
    ///
    /// # Errors
    ///
    /// Fails when the source cannot deliver the reference set, when the set
    /// violates snapshot invariants, or when the configuration is invalid.
    pub fn from_source(
        source: &dyn ReferenceSource,
        config: NutritionConfig,
    ) -> Result<Self, NutritionError> {
        let snapshot = ReferenceSnapshot::new(source.get_all()?)?;
        Self::new(snapshot, config)
    }

    /// Reload the reference set and swap it in atomically
    ///
    /// Calculations already running keep the snapshot they started with. On
    /// failure the current snapshot stays in place.
    pub fn refresh(
        &self,
        source: &dyn ReferenceSource,
    ) -> Result<Arc<ReferenceSnapshot>, NutritionError> {
        let snapshot = match source.get_all().and_then(ReferenceSnapshot::new) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("Reference refresh failed, keeping current snapshot: {err}");
                return Err(err);
            }
        };
        Ok(self.matcher.replace_snapshot(snapshot))
    }

    /// Active configuration
    pub fn config(&self) -> &NutritionConfig {
        &self.config
    }

    /// Candidate reference foods for a free-text name
    pub fn find_matches(&self, name: &str) -> Vec<MatchResult> {
        self.matcher.find_matches(name, self.config.match_limit)
    }

    /// Compute the nutrition profile of one meal
    ///
    /// # Errors
    ///
    /// - [`NutritionError::EmptyItems`] when `items` is empty
    /// - [`NutritionError::InvalidItem`] when an item's confidence is not a number
    pub fn calculate_nutrition(
        &self,
        items: &[RecognizedItem],
    ) -> Result<NutritionResult, NutritionError> {
        let items = validate_items(items)?;
        let snapshot = self.matcher.snapshot();
        let aggregator = NutritionAggregator::with_floor(&snapshot, self.config.similarity_floor);
        Ok(aggregator.aggregate(&items))
    }

    /// Compute several meals and their combined totals
    ///
    /// Every meal is validated as in [`NutritionCalculator::calculate_nutrition`].
    pub fn calculate_meals(
        &self,
        meals: &[Vec<RecognizedItem>],
    ) -> Result<(Vec<NutritionResult>, NutrientTotals), NutritionError> {
        let meals = meals
            .iter()
            .map(|meal| validate_items(meal))
            .collect::<Result<Vec<_>, _>>()?;
        let snapshot = self.matcher.snapshot();
        let aggregator = NutritionAggregator::with_floor(&snapshot, self.config.similarity_floor);
        Ok(aggregator.aggregate_meals(&meals))
    }

    /// Score totals against targets
    ///
    /// `threshold` defaults to the configured deficiency threshold.
    pub fn evaluate_balance(
        &self,
        totals: &NutrientTotals,
        targets: &BTreeMap<NutrientCode, f64>,
        threshold: Option<f64>,
    ) -> Result<BalanceReport, NutritionError> {
        evaluate(
            totals,
            targets,
            threshold.unwrap_or(self.config.deficiency_threshold),
        )
    }

    /// Score totals against the targets for a trimester
    pub fn evaluate_for_trimester(
        &self,
        totals: &NutrientTotals,
        provider: &dyn TargetProvider,
        trimester: Trimester,
    ) -> Result<BalanceReport, NutritionError> {
        let targets = provider.targets_for(trimester)?;
        let report = self.evaluate_balance(totals, &targets, None)?;
        info!(
            "Balance for {trimester} trimester: score {:.2}, {} deficient",
            report.score,
            report.deficient.len()
        );
        Ok(report)
    }
}

/// Reject empty meals and unusable confidences; clamp the rest into [0, 1]
fn validate_items(items: &[RecognizedItem]) -> Result<Vec<RecognizedItem>, NutritionError> {
    if items.is_empty() {
        return Err(NutritionError::EmptyItems);
    }

    items
        .iter()
        .map(|item| {
            if !item.confidence.is_finite() {
                return Err(NutritionError::InvalidItem(format!(
                    "confidence for '{}' is not a number",
                    item.name
                )));
            }
            Ok(RecognizedItem {
                confidence: item.confidence.clamp(0.0, 1.0),
                ..item.clone()
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition_model::{QuantityExpr, ReferenceFood};
    use crate::reference_source::InMemorySource;
    use crate::targets::StaticTargetProvider;

    fn sample_source() -> InMemorySource {
        InMemorySource::new(vec![
            ReferenceFood::new(1, "ご飯", QuantityExpr::unit("杯", 1.0))
                .with_nutrient("calories", 250.0),
            ReferenceFood::new(2, "納豆", QuantityExpr::grams(50.0))
                .with_nutrient("calories", 100.0)
                .with_nutrient("iron", 1.5),
        ])
    }

    fn calculator() -> NutritionCalculator {
        NutritionCalculator::from_source(&sample_source(), NutritionConfig::default()).unwrap()
    }

    struct FailingSource;

    impl ReferenceSource for FailingSource {
        fn get_all(&self) -> Result<Vec<ReferenceFood>, NutritionError> {
            Err(NutritionError::ReferenceUnavailable("database offline".to_string()))
        }
    }

    #[test]
    fn test_empty_items_rejected() {
        assert_eq!(calculator().calculate_nutrition(&[]), Err(NutritionError::EmptyItems));
    }

    #[test]
    fn test_nan_confidence_rejected() {
        let item = RecognizedItem {
            name: "ご飯".to_string(),
            quantity: "1杯".to_string(),
            confidence: f64::NAN,
        };
        assert!(matches!(
            calculator().calculate_nutrition(&[item]),
            Err(NutritionError::InvalidItem(_))
        ));
    }

    #[test]
    fn test_out_of_range_confidence_clamped() {
        let item = RecognizedItem {
            name: "ご飯".to_string(),
            quantity: "1杯".to_string(),
            confidence: 1.7,
        };
        let result = calculator().calculate_nutrition(&[item]).unwrap();
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.per_item[0].item.confidence, 1.0);
    }

    #[test]
    fn test_unavailable_reference_is_hard_failure() {
        let err = NutritionCalculator::from_source(&FailingSource, NutritionConfig::default())
            .unwrap_err();
        assert!(matches!(err, NutritionError::ReferenceUnavailable(_)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = NutritionConfig {
            match_limit: 0,
            ..Default::default()
        };
        assert!(NutritionCalculator::from_source(&sample_source(), config).is_err());
    }

    #[test]
    fn test_refresh_swaps_snapshot() {
        let calculator = calculator();
        let replacement = InMemorySource::new(vec![ReferenceFood::new(
            5,
            "豆腐",
            QuantityExpr::grams(100.0),
        )
        .with_nutrient("calcium", 90.0)]);

        let old = calculator.refresh(&replacement).unwrap();
        assert_eq!(old.len(), 2);
        assert!(calculator.find_matches("ご飯").is_empty());
        assert_eq!(calculator.find_matches("豆腐")[0].food.id, 5);
    }

    #[test]
    fn test_failed_refresh_keeps_snapshot() {
        let calculator = calculator();
        assert!(calculator.refresh(&FailingSource).is_err());
        assert_eq!(calculator.find_matches("ご飯")[0].food.id, 1);
    }

    #[test]
    fn test_threshold_override() {
        let calculator = calculator();
        let totals: NutrientTotals = [("iron".to_string(), 7.0)].into_iter().collect();
        let targets = BTreeMap::from([("iron".to_string(), 10.0)]);

        let default = calculator.evaluate_balance(&totals, &targets, None).unwrap();
        assert_eq!(default.deficient.len(), 1);

        let lenient = calculator.evaluate_balance(&totals, &targets, Some(0.5)).unwrap();
        assert!(lenient.deficient.is_empty());
    }

    #[test]
    fn test_evaluate_for_trimester() {
        let calculator = calculator();
        let result = calculator
            .calculate_nutrition(&[RecognizedItem::new("納豆", "100g", 0.8)])
            .unwrap();
        let provider = StaticTargetProvider::new().with_targets(
            Trimester::Third,
            BTreeMap::from([("iron".to_string(), 15.0)]),
        );

        let report = calculator
            .evaluate_for_trimester(&result.totals, &provider, Trimester::Third)
            .unwrap();
        assert!((report.score - 0.2).abs() < 1e-12);
        assert!(calculator
            .evaluate_for_trimester(&result.totals, &provider, Trimester::First)
            .is_err());
    }

    #[test]
    fn test_calculate_meals_validates_each_meal() {
        let calculator = calculator();
        let meals = vec![vec![RecognizedItem::new("ご飯", "1杯", 0.9)], vec![]];
        assert_eq!(calculator.calculate_meals(&meals), Err(NutritionError::EmptyItems));

        let meals = vec![
            vec![RecognizedItem::new("ご飯", "2杯", 0.9)],
            vec![RecognizedItem::new("納豆", "50g", 0.9)],
        ];
        let (results, combined) = calculator.calculate_meals(&meals).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(combined.get("calories"), 600.0);
    }
}
