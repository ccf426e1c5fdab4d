//! Common regex patterns for purchase order extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Everything that can't be part of a plain decimal
    pub static ref NON_NUMERIC: Regex = Regex::new(r"[^0-9.\-]").unwrap();

    pub static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    // Email pattern
    pub static ref EMAIL: Regex = Regex::new(
        r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}"
    ).unwrap();

    // Message body: after the first run of three line breaks, up to a sign-off
    pub static ref MESSAGE_BODY: Regex = Regex::new(
        r"(?is)(?:\r?\n){3}(.*?)(?:Thanks|Regards|Best Wishes|Cheers|Thank You|From: )"
    ).unwrap();

    // Whole value is one ABN, optionally labelled, digits grouped 2-3-3-3
    pub static ref ABN_PATTERN: Regex = Regex::new(
        r"(?i)^\s*(?:A\.?B\.?N\.?[\s:]*)?(\d{2})\s?(\d{3})\s?(\d{3})\s?(\d{3})\s*$"
    ).unwrap();
}
