//! Best-effort decimal extraction from OCR'd quantity and price text.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::debug;

use super::patterns::NON_NUMERIC;

/// Extract a decimal from noisy text such as `"$1,234.56"` or `"12 pcs"`.
///
/// Every character other than an ASCII digit, `.` or `-` is dropped. Only the
/// first `.` survives as the decimal point. Any `-` marks the value negative,
/// wherever it appears, and only one sign is kept. Blank or unparsable input
/// yields zero.
pub fn extract_numeric(text: &str) -> Decimal {
    if text.trim().is_empty() {
        return Decimal::ZERO;
    }

    let cleaned = NON_NUMERIC.replace_all(text, "");

    let mut negative = false;
    let mut seen_point = false;
    let mut number = String::with_capacity(cleaned.len() + 2);

    for c in cleaned.chars() {
        match c {
            '-' => negative = true,
            '.' if seen_point => {}
            '.' => {
                seen_point = true;
                number.push('.');
            }
            _ => number.push(c),
        }
    }

    let number = number.trim_end_matches('.');
    if number.is_empty() {
        return Decimal::ZERO;
    }

    let mut normalized = String::with_capacity(number.len() + 2);
    if negative {
        normalized.push('-');
    }
    if number.starts_with('.') {
        normalized.push('0');
    }
    normalized.push_str(number);

    match Decimal::from_str(&normalized) {
        Ok(value) => value,
        Err(e) => {
            debug!("Could not parse {:?} (from {:?}): {}", normalized, text, e);
            Decimal::ZERO
        }
    }
}
