//! # Quantity Interpreter
//!
//! This module turns informal quantity expressions into a multiplier relative
//! to a reference food's standard quantity.
//!
//! ## Policy
//!
//! 1. Both sides carry a gram amount: `input_grams / standard_grams`
//! 2. Both sides carry the same cooking unit: `input_amount / standard_amount`
//! 3. Anything else: `1.0`, one standard serving
//!
//! The fallback deliberately under-estimates ambiguous input ("適量", "少々",
//! "1人前") rather than guessing.
//!
//! ## Usage
//!
//! ```rust
//! use meal_nutrition::quantity_interpreter::estimate_multiplier;
//!
//! assert_eq!(estimate_multiplier("200g", "100g"), 2.0);
//! assert_eq!(estimate_multiplier("大さじ2", "大さじ1"), 2.0);
//! assert_eq!(estimate_multiplier("適量", "1人前"), 1.0);
//! ```

use log::{debug, trace};

use crate::nutrition_model::QuantityExpr;
use crate::quantity_patterns::{COOKING_UNIT_REGEX, GRAM_REGEX};
use crate::text_normalizer::fold_width;

/// Multiplier used whenever the two quantities cannot be compared
pub const FALLBACK_MULTIPLIER: f64 = 1.0;

/// Estimate how many standard servings an input quantity represents
///
/// Always returns a positive, finite number.
pub fn estimate_multiplier(input_quantity: &str, standard_quantity: &str) -> f64 {
    let input = prepare(input_quantity);
    let standard = prepare(standard_quantity);

    if let (Some(input_grams), Some(standard_grams)) = (find_grams(&input), find_grams(&standard))
    {
        if let Some(ratio) = positive_ratio(input_grams, standard_grams) {
            debug!("Gram ratio {input_quantity:?} / {standard_quantity:?} = {ratio}");
            return ratio;
        }
    }

    if let (Some((input_unit, input_amount)), Some((standard_unit, standard_amount))) =
        (find_cooking_unit(&input), find_cooking_unit(&standard))
    {
        if input_unit == standard_unit {
            if let Some(ratio) = positive_ratio(input_amount, standard_amount) {
                debug!("Unit ratio {input_quantity:?} / {standard_quantity:?} = {ratio} ({input_unit})");
                return ratio;
            }
        } else {
            trace!("Unit mismatch: {input_unit} vs {standard_unit}");
        }
    }

    debug!("No comparable quantity in {input_quantity:?} / {standard_quantity:?}, using fallback");
    FALLBACK_MULTIPLIER
}

/// Estimate the multiplier against a structured standard quantity
pub fn estimate_multiplier_for(input_quantity: &str, standard: &QuantityExpr) -> f64 {
    estimate_multiplier(input_quantity, &standard.to_string())
}

/// Parse the first recognizable quantity in a string
///
/// Gram amounts take precedence over cooking units, matching the multiplier
/// policy. Returns `None` when neither is present.
///
/// # Examples
///
/// ```rust
/// use meal_nutrition::quantity_interpreter::parse_quantity;
/// use meal_nutrition::nutrition_model::QuantityExpr;
///
/// assert_eq!(parse_quantity("１５０ｇ"), Some(QuantityExpr::grams(150.0)));
/// assert_eq!(parse_quantity("小さじ1/2"), Some(QuantityExpr::unit("小さじ", 0.5)));
/// assert_eq!(parse_quantity("少々"), None);
/// ```
pub fn parse_quantity(text: &str) -> Option<QuantityExpr> {
    let prepared = prepare(text);
    if let Some(grams) = find_grams(&prepared) {
        return Some(QuantityExpr::grams(grams));
    }
    find_cooking_unit(&prepared).map(|(unit, amount)| QuantityExpr::unit(&unit, amount))
}

/// Fold a quantity string into a form the patterns can read
///
/// Whitespace is dropped so "200 g" reads as "200g"; full-width digits,
/// letters, decimal point, comma and slash become half-width.
fn prepare(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '．' => '.',
            '／' => '/',
            '，' => ',',
            other => fold_width(other),
        })
        .collect()
}

fn find_grams(text: &str) -> Option<f64> {
    let captures = GRAM_REGEX.captures(text)?;
    parse_number(&captures["num"])
}

fn find_cooking_unit(text: &str) -> Option<(String, f64)> {
    let captures = COOKING_UNIT_REGEX.captures(text)?;
    let (unit, number) = match (captures.name("unit_first"), captures.name("num_after")) {
        (Some(unit), Some(number)) => (unit, number),
        _ => (captures.name("unit_after")?, captures.name("num_first")?),
    };
    Some((unit.as_str().to_string(), parse_number(number.as_str())?))
}

/// Parse a decimal ("1.5"), a grouped number ("1,500") or a fraction ("1/2")
fn parse_number(text: &str) -> Option<f64> {
    let text = text.replace(',', "");
    let value = match text.split_once('/') {
        Some((numerator, denominator)) => {
            let numerator: f64 = numerator.parse().ok()?;
            let denominator: f64 = denominator.parse().ok()?;
            if denominator == 0.0 {
                return None;
            }
            numerator / denominator
        }
        None => text.parse().ok()?,
    };
    value.is_finite().then_some(value)
}

fn positive_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    let ratio = numerator / denominator;
    (ratio.is_finite() && ratio > 0.0).then_some(ratio)
}
