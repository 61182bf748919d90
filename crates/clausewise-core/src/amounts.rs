//! Monetary amount extraction.

use std::sync::LazyLock;

use regex::Regex;

/// Currency symbol every extracted amount starts with.
pub const CURRENCY_SYMBOL: char = '\u{20b9}';

/// `₹`, optional whitespace, digits with optional comma groups, optional
/// decimal fraction. Comma groups are not fixed at three digits so lakh
/// grouping (`₹1,00,000`) stays one amount.
static AMOUNT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{CURRENCY_SYMBOL}\s?\d+(?:,\d+)*(?:\.\d+)?"))
        .expect("amount pattern should compile")
});

/// All amounts in first-occurrence order. Duplicates are kept.
pub fn extract_amounts(text: &str) -> Vec<String> {
    AMOUNT_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}
