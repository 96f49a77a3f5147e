//! # Meal Nutrition
//!
//! Turns recognized food items (name, informal quantity, confidence) into a
//! standardized nutrition profile: per-nutrient totals with a propagated
//! confidence score, and a balance report against trimester-specific targets.
//!
//! Pipeline: text normalization → fuzzy food matching → quantity
//! interpretation → aggregation → balance evaluation.

pub mod balance_evaluator;
pub mod food_matcher;
pub mod nutrition_aggregator;
pub mod nutrition_calculator;
pub mod nutrition_config;
pub mod nutrition_errors;
pub mod nutrition_model;
pub mod quantity_interpreter;
pub mod quantity_patterns;
pub mod reference_source;
pub mod similarity;
pub mod targets;
pub mod text_normalizer;
