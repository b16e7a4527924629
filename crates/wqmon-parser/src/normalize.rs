//! Normalization of lab-report cell annotations into plain numbers.
//!
//! Rules are applied in a fixed order and the first match wins:
//!
//! 1. non-text cells pass through unchanged
//! 2. surrounding whitespace is trimmed, then one leading and one trailing `*` are removed
//! 3. `-` or `—` becomes 0
//! 4. a parenthesized number, e.g. `12 (3.2)`, yields the number inside the parentheses
//! 5. `@` yields the number after it
//! 6. `<` yields the number after it, halved (half the detection limit)
//! 7. `ND` (any case) or `N.A.` becomes 0
//! 8. anything else is parsed as a number, or returned as the stripped text

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::NormalizeError;
use crate::model::CellValue;

static PARENTHESIZED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([\d.]+)\)").expect("valid parenthesized pattern"));
static AT_SIGN: Lazy<Regex> = Lazy::new(|| Regex::new(r"@([\d.]+)").expect("valid @ pattern"));
static BELOW_LIMIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<\s*([\d.]+)").expect("valid detection limit pattern"));

pub fn normalize_cell(value: &CellValue) -> CellValue {
    match value {
        CellValue::Text(text) => normalize_text(text),
        other => other.clone(),
    }
}

pub fn normalize_text(raw: &str) -> CellValue {
    let value = strip_markers(raw.trim());

    if value == "-" || value == "—" {
        return CellValue::Number(0.0);
    }

    if value.contains('(') && value.contains(')') {
        if let Some(number) = capture_number(&PARENTHESIZED, value) {
            return CellValue::Number(number);
        }
    }

    if value.contains('@') {
        if let Some(number) = capture_number(&AT_SIGN, value) {
            return CellValue::Number(number);
        }
    }

    if value.contains('<') {
        if let Some(number) = capture_number(&BELOW_LIMIT, value) {
            return CellValue::Number(number / 2.0);
        }
    }

    if value.to_uppercase() == "ND" || value == "N.A." {
        return CellValue::Number(0.0);
    }

    match value.trim().parse::<f64>() {
        Ok(number) => CellValue::Number(number),
        Err(_) => CellValue::Text(value.to_string()),
    }
}

/// Classifies a normalized cell from a measurement column.
pub fn require_numeric(value: &CellValue) -> Result<Option<f64>, NormalizeError> {
    match value {
        CellValue::Empty => Ok(None),
        CellValue::Number(number) => Ok(Some(*number)),
        CellValue::Text(text) if text.trim().is_empty() => Ok(None),
        CellValue::Text(text) => Err(NormalizeError::NotNumeric(text.clone())),
        CellValue::Bool(flag) => Err(NormalizeError::Boolean(*flag)),
        CellValue::DateTime(_) => Err(NormalizeError::DateTime(value.to_string())),
    }
}

fn strip_markers(value: &str) -> &str {
    let value = value.strip_prefix('*').unwrap_or(value);
    value.strip_suffix('*').unwrap_or(value)
}

fn capture_number(pattern: &Regex, value: &str) -> Option<f64> {
    pattern
        .captures(value)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}
