//! ABN (Australian Business Number) normalization and validation.

use super::patterns::{ABN_PATTERN, WHITESPACE};

/// Normalize a vendor ABN field value.
///
/// A value that is exactly one labelled or grouped ABN
/// (`"ABN: 85 663 589 062"`) collapses to its 11 digits. Anything else keeps
/// every character except whitespace, so longer digit runs and values holding
/// several numbers are never truncated.
pub fn normalize_abn(value: &str) -> String {
    if let Some(caps) = ABN_PATTERN.captures(value) {
        return format!("{}{}{}{}", &caps[1], &caps[2], &caps[3], &caps[4]);
    }

    WHITESPACE.replace_all(value, "").into_owned()
}

/// Validate an ABN using the ATO modulus 89 checksum.
///
/// Subtract 1 from the first digit, weight the digits by
/// 10, 1, 3, 5, 7, 9, 11, 13, 15, 17, 19 and require the sum to be
/// divisible by 89.
pub fn validate_abn(abn: &str) -> bool {
    const WEIGHTS: [u32; 11] = [10, 1, 3, 5, 7, 9, 11, 13, 15, 17, 19];

    let digits: Vec<u32> = abn.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() != 11 || abn.chars().any(|c| !c.is_ascii_digit() && !c.is_whitespace()) {
        return false;
    }

    if digits[0] == 0 {
        return false;
    }

    let sum: u32 = digits
        .iter()
        .zip(WEIGHTS.iter())
        .enumerate()
        .map(|(i, (&d, &w))| if i == 0 { (d - 1) * w } else { d * w })
        .sum();

    sum % 89 == 0
}

/// Format an ABN in the usual 2-3-3-3 grouping.
pub fn format_abn(abn: &str) -> String {
    let digits: String = abn.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 11 {
        return abn.to_string();
    }

    format!(
        "{} {} {} {}",
        &digits[0..2],
        &digits[2..5],
        &digits[5..8],
        &digits[8..11]
    )
}
