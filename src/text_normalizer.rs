//! # Text Normalizer Module
//!
//! Canonicalizes food names before matching: lower-case, no whitespace,
//! full-width digits and Latin letters folded to half-width, and
//! sentence punctuation removed.

/// Offset between a full-width form and its ASCII counterpart
const FULL_WIDTH_OFFSET: u32 = 0xFEE0;

/// Punctuation removed from food names
const STRIPPED_PUNCTUATION: &[char] = &['、', '。', '！', '？', '!', '?', '，', '．', '・'];

/// Normalize a food name for matching
///
/// # Examples
///
/// ```rust
/// use meal_nutrition::text_normalizer::normalize;
///
/// assert_eq!(normalize("Ｃｏｆｆｅｅ　ミルク！"), "coffeeミルク");
/// assert_eq!(normalize("卵 ２個"), "卵2個");
/// assert_eq!(normalize(""), "");
/// ```
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(fold_width)
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
        .collect()
}

/// Map a full-width digit or Latin letter to its half-width form
///
/// Every other character is returned unchanged.
pub fn fold_width(c: char) -> char {
    match c {
        '\u{FF10}'..='\u{FF19}' | '\u{FF21}'..='\u{FF3A}' | '\u{FF41}'..='\u{FF5A}' => {
            char::from_u32(c as u32 - FULL_WIDTH_OFFSET).unwrap_or(c)
        }
        _ => c,
    }
}
