//! # Food Matcher Module
//!
//! This module resolves free-text food names against the reference nutrition
//! database. The reference set lives in an immutable [`ReferenceSnapshot`];
//! the [`FoodMatcher`] hands out shared handles to the current snapshot and
//! swaps in a new one on refresh, so in-flight calculations keep the snapshot
//! they started with.

use log::{debug, info, trace};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use crate::nutrition_config::{DEFAULT_MATCH_LIMIT, DEFAULT_SIMILARITY_FLOOR};
use crate::nutrition_errors::NutritionError;
use crate::nutrition_model::{MatchResult, ReferenceFood};
use crate::similarity::similarity;
use crate::text_normalizer::normalize;

/// A reference food with its names pre-normalized for matching
#[derive(Debug, Clone)]
struct IndexedFood {
    food: ReferenceFood,
    keys: Vec<String>,
}

/// Immutable, validated set of reference foods
#[derive(Debug, Clone, Default)]
pub struct ReferenceSnapshot {
    foods: Vec<IndexedFood>,
}

impl ReferenceSnapshot {
    /// Build a snapshot from reference foods
    ///
    /// # Errors
    ///
    /// Returns [`NutritionError::InvalidReference`] when ids repeat, a standard
    /// quantity is not a positive number, or a nutrient value is negative or
    /// not finite.
    pub fn new(foods: Vec<ReferenceFood>) -> Result<Self, NutritionError> {
        let mut seen_ids = HashSet::new();
        let mut indexed = Vec::with_capacity(foods.len());

        for food in foods {
            validate_food(&food)?;
            if !seen_ids.insert(food.id) {
                return Err(NutritionError::InvalidReference(format!(
                    "duplicate food id {}",
                    food.id
                )));
            }

            let keys = food
                .names()
                .map(normalize)
                .filter(|key| !key.is_empty())
                .collect();
            indexed.push(IndexedFood { food, keys });
        }

        info!("Built reference snapshot with {} foods", indexed.len());
        Ok(Self { foods: indexed })
    }

    /// Number of foods in the snapshot
    pub fn len(&self) -> usize {
        self.foods.len()
    }

    /// Check if the snapshot holds no foods
    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }

    /// Look up a food by id
    pub fn get(&self, id: u64) -> Option<&ReferenceFood> {
        self.foods
            .iter()
            .map(|indexed| &indexed.food)
            .find(|food| food.id == id)
    }

    /// Rank reference foods by similarity to a free-text name
    ///
    /// Each food scores the best similarity across its name and aliases.
    /// Foods below `floor` or with no similarity at all are dropped; the rest
    /// are sorted by descending similarity, ties broken by ascending id, and
    /// truncated to `limit`.
    pub fn find_matches(&self, name: &str, floor: f64, limit: usize) -> Vec<MatchResult> {
        let query = normalize(name);
        if query.is_empty() {
            trace!("Empty query after normalization: {name:?}");
            return Vec::new();
        }

        let mut matches: Vec<MatchResult> = self
            .foods
            .iter()
            .filter_map(|indexed| {
                let best = indexed
                    .keys
                    .iter()
                    .map(|key| similarity(&query, key))
                    .fold(0.0_f64, f64::max);
                (best > 0.0 && best >= floor).then(|| MatchResult {
                    food: indexed.food.clone(),
                    similarity: best,
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.food.id.cmp(&b.food.id))
        });
        matches.truncate(limit);

        debug!(
            "Query {name:?} -> {} candidates{}",
            matches.len(),
            matches
                .first()
                .map(|m| format!(", best {:?} ({:.3})", m.food.name, m.similarity))
                .unwrap_or_default()
        );
        matches
    }

    /// The single best match above `floor`, if any
    pub fn best_match(&self, name: &str, floor: f64) -> Option<MatchResult> {
        self.find_matches(name, floor, 1).into_iter().next()
    }
}

fn validate_food(food: &ReferenceFood) -> Result<(), NutritionError> {
    let amount = food.standard_quantity.amount();
    if !amount.is_finite() || amount <= 0.0 {
        return Err(NutritionError::InvalidReference(format!(
            "food {} ({}) has non-positive standard quantity {}",
            food.id, food.name, food.standard_quantity
        )));
    }

    if let Some((code, value)) = food
        .nutrients
        .iter()
        .find(|(_, value)| !value.is_finite() || **value < 0.0)
    {
        return Err(NutritionError::InvalidReference(format!(
            "food {} ({}) has invalid value {value} for nutrient '{code}'",
            food.id, food.name
        )));
    }

    Ok(())
}

/// Thread-safe matcher over a swappable reference snapshot
///
/// Readers clone an `Arc` to the current snapshot and never hold the lock
/// while scoring. [`FoodMatcher::replace_snapshot`] swaps the pointer; the
/// old snapshot stays alive until its last reader drops it.
#[derive(Debug)]
pub struct FoodMatcher {
    snapshot: RwLock<Arc<ReferenceSnapshot>>,
    similarity_floor: f64,
}

impl FoodMatcher {
    /// Create a matcher over a snapshot with the default similarity floor
    pub fn new(snapshot: ReferenceSnapshot) -> Self {
        Self::with_floor(snapshot, DEFAULT_SIMILARITY_FLOOR)
    }

    /// Create a matcher with a custom similarity floor
    pub fn with_floor(snapshot: ReferenceSnapshot, similarity_floor: f64) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(snapshot)),
            similarity_floor,
        }
    }

    /// Shared handle to the current snapshot
    pub fn snapshot(&self) -> Arc<ReferenceSnapshot> {
        let guard = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Atomically replace the reference snapshot
    ///
    /// Returns the snapshot that was replaced.
    pub fn replace_snapshot(&self, snapshot: ReferenceSnapshot) -> Arc<ReferenceSnapshot> {
        let replacement = Arc::new(snapshot);
        let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        info!(
            "Replacing reference snapshot ({} -> {} foods)",
            guard.len(),
            replacement.len()
        );
        std::mem::replace(&mut *guard, replacement)
    }

    /// Minimum similarity a candidate needs to be returned
    pub fn similarity_floor(&self) -> f64 {
        self.similarity_floor
    }

    /// Find up to `limit` reference foods matching a free-text name
    ///
    /// An empty list means no food cleared the similarity floor.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use meal_nutrition::food_matcher::{FoodMatcher, ReferenceSnapshot};
    /// use meal_nutrition::nutrition_model::{QuantityExpr, ReferenceFood};
    ///
    /// let snapshot = ReferenceSnapshot::new(vec![
    ///     ReferenceFood::new(1, "ご飯", QuantityExpr::unit("杯", 1.0)),
    ///     ReferenceFood::new(2, "食パン", QuantityExpr::unit("枚", 1.0)),
    /// ])?;
    /// let matcher = FoodMatcher::new(snapshot);
    ///
    /// let matches = matcher.find_matches("ご飯", 5);
    /// assert_eq!(matches[0].food.id, 1);
    /// assert_eq!(matches[0].similarity, 1.0);
    /// assert!(matcher.find_matches("ステーキ", 5).is_empty());
    /// # Ok::<(), meal_nutrition::nutrition_errors::NutritionError>(())
    /// ```
    pub fn find_matches(&self, name: &str, limit: usize) -> Vec<MatchResult> {
        self.snapshot()
            .find_matches(name, self.similarity_floor, limit)
    }

    /// Find matches with the default candidate limit
    pub fn find_default_matches(&self, name: &str) -> Vec<MatchResult> {
        self.find_matches(name, DEFAULT_MATCH_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition_model::QuantityExpr;

    fn sample_snapshot() -> ReferenceSnapshot {
        ReferenceSnapshot::new(vec![
            ReferenceFood::new(3, "ご飯", QuantityExpr::unit("杯", 1.0))
                .with_alias("白米")
                .with_alias("ライス"),
            ReferenceFood::new(1, "玄米ご飯", QuantityExpr::unit("杯", 1.0)),
            ReferenceFood::new(2, "味噌汁", QuantityExpr::unit("杯", 1.0)).with_alias("みそ汁"),
            ReferenceFood::new(4, "Natto", QuantityExpr::grams(50.0)),
        ])
        .unwrap()
    }

    #[test]
    fn test_exact_name_ranks_first() {
        let matcher = FoodMatcher::new(sample_snapshot());
        let matches = matcher.find_matches("ご飯", 5);

        assert_eq!(matches[0].food.id, 3);
        assert_eq!(matches[0].similarity, 1.0);
        // "ご飯" is contained in "玄米ご飯": base 0.5 + bonus 0.15
        assert_eq!(matches[1].food.id, 1);
        assert!((matches[1].similarity - 0.65).abs() < 1e-12);
    }

    #[test]
    fn test_alias_match() {
        let matcher = FoodMatcher::new(sample_snapshot());
        let matches = matcher.find_matches("みそ汁", 5);
        assert_eq!(matches[0].food.id, 2);
        assert_eq!(matches[0].similarity, 1.0);

        let matches = matcher.find_matches("ライス", 5);
        assert_eq!(matches[0].food.id, 3);
    }

    #[test]
    fn test_normalization_applies_to_both_sides() {
        let matcher = FoodMatcher::new(sample_snapshot());
        let matches = matcher.find_matches("ＮＡＴＴＯ！", 5);
        assert_eq!(matches[0].food.id, 4);
        assert_eq!(matches[0].similarity, 1.0);
    }

    #[test]
    fn test_no_match_is_empty() {
        let matcher = FoodMatcher::new(sample_snapshot());
        assert!(matcher.find_matches("ステーキ", 5).is_empty());
        assert!(matcher.find_matches("", 5).is_empty());
        assert!(matcher.find_matches("  、。", 5).is_empty());
    }

    #[test]
    fn test_limit_and_floor() {
        let matcher = FoodMatcher::new(sample_snapshot());
        assert_eq!(matcher.find_matches("ご飯", 1).len(), 1);

        let strict = FoodMatcher::with_floor(sample_snapshot(), 0.9);
        let matches = strict.find_matches("ご飯", 5);
        assert_eq!(matches.len(), 1);
        assert!(matches.iter().all(|m| m.similarity >= 0.9));
    }

    #[test]
    fn test_zero_floor_never_returns_unrelated_foods() {
        let snapshot = sample_snapshot();
        assert!(snapshot.find_matches("ステーキ", 0.0, 5).is_empty());
        assert!(snapshot.best_match("ステーキ", 0.0).is_none());
    }

    #[test]
    fn test_ties_broken_by_id() {
        let snapshot = ReferenceSnapshot::new(vec![
            ReferenceFood::new(9, "りんご", QuantityExpr::unit("個", 1.0)),
            ReferenceFood::new(5, "りんご", QuantityExpr::unit("個", 1.0)),
            ReferenceFood::new(7, "りんご", QuantityExpr::unit("個", 1.0)),
        ])
        .unwrap();
        let ids: Vec<u64> = FoodMatcher::new(snapshot)
            .find_default_matches("りんご")
            .iter()
            .map(|m| m.food.id)
            .collect();
        assert_eq!(ids, vec![5, 7, 9]);
    }

    #[test]
    fn test_snapshot_validation() {
        let zero_serving = ReferenceFood::new(1, "水", QuantityExpr::grams(0.0));
        assert!(matches!(
            ReferenceSnapshot::new(vec![zero_serving]),
            Err(NutritionError::InvalidReference(_))
        ));

        let negative = ReferenceFood::new(1, "水", QuantityExpr::grams(100.0))
            .with_nutrient("calories", -1.0);
        assert!(ReferenceSnapshot::new(vec![negative]).is_err());

        let duplicate = vec![
            ReferenceFood::new(1, "水", QuantityExpr::grams(100.0)),
            ReferenceFood::new(1, "お茶", QuantityExpr::grams(100.0)),
        ];
        assert!(ReferenceSnapshot::new(duplicate).is_err());
    }

    #[test]
    fn test_replace_snapshot_keeps_old_readers() {
        let matcher = FoodMatcher::new(sample_snapshot());
        let before = matcher.snapshot();

        let replacement = ReferenceSnapshot::new(vec![ReferenceFood::new(
            10,
            "ステーキ",
            QuantityExpr::grams(150.0),
        )])
        .unwrap();
        let old = matcher.replace_snapshot(replacement);

        assert!(Arc::ptr_eq(&before, &old));
        assert_eq!(before.len(), 4);
        assert!(before.best_match("ご飯", 0.3).is_some());

        assert_eq!(matcher.snapshot().len(), 1);
        assert!(matcher.find_matches("ご飯", 5).is_empty());
        assert_eq!(matcher.find_matches("ステーキ", 5)[0].food.id, 10);
    }

    #[test]
    fn test_lookup_by_id() {
        let snapshot = sample_snapshot();
        assert_eq!(snapshot.get(2).map(|f| f.name.as_str()), Some("味噌汁"));
        assert!(snapshot.get(99).is_none());
    }
}
