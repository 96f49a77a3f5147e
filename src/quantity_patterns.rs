//! # Quantity Patterns Module
//!
//! This module contains the regex patterns and unit vocabulary used to read
//! informal quantity expressions such as "200g", "大さじ2" or "茶碗1杯".

use lazy_static::lazy_static;
use regex::Regex;

/// Gram unit tokens, matched after full-width folding ("ｇ" becomes "g")
pub const GRAM_UNITS: &[&str] = &["g", "グラム"];

/// Units written before their amount ("大さじ2")
pub const PREFIX_UNITS: &[&str] = &["大さじ", "小さじ", "カップ"];

/// Counter units written after their amount ("1杯", "2個")
pub const COUNTER_UNITS: &[&str] = &["杯", "個", "切れ", "枚"];

// A grouped number ("1,500"), a fraction ("1/2") or a plain decimal ("1", "1.5")
const NUMBER_PATTERN: &str = r"\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+/\d+|\d+(?:\.\d+)?";

lazy_static! {
    /// A number immediately followed by a gram unit
    ///
    /// The number must not continue a longer one ("1,5g") and the unit must
    /// not start a word ("2glasses").
    pub static ref GRAM_REGEX: Regex = Regex::new(&format!(
        r"(?:^|[^0-9,.])(?P<num>{NUMBER_PATTERN})(?:{})(?:[^a-z]|$)",
        GRAM_UNITS.join("|")
    ))
    .expect("Gram pattern should be valid");

    /// A cooking unit followed by its amount, or an amount followed by its unit
    pub static ref COOKING_UNIT_REGEX: Regex = {
        let units = PREFIX_UNITS
            .iter()
            .chain(COUNTER_UNITS.iter())
            .copied()
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(
            r"(?P<unit_first>{units})(?P<num_after>{NUMBER_PATTERN})|(?P<num_first>{NUMBER_PATTERN})(?P<unit_after>{units})"
        ))
        .expect("Cooking unit pattern should be valid")
    };
}

/// Check if a unit is conventionally written before its amount
pub fn is_prefix_unit(unit: &str) -> bool {
    PREFIX_UNITS.contains(&unit)
}

/// Check if a unit belongs to the cooking vocabulary
pub fn is_cooking_unit(unit: &str) -> bool {
    PREFIX_UNITS.contains(&unit) || COUNTER_UNITS.contains(&unit)
}
