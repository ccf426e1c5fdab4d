//! Rules over the accompanying message and free text values.

use super::patterns::{EMAIL, MESSAGE_BODY};

/// Pull the order notes out of a message body.
///
/// The notes are whatever follows the first run of three line breaks up to
/// the first sign-off, with HTML entities decoded.
pub fn extract_order_notes(message: &str) -> Option<String> {
    let caps = MESSAGE_BODY.captures(message)?;
    let body = caps[1].trim();
    if body.is_empty() {
        return None;
    }

    Some(html_escape::decode_html_entities(body).into_owned())
}

/// All email addresses in `text`, in order of appearance.
pub fn extract_emails(text: &str) -> Vec<String> {
    EMAIL.find_iter(text).map(|m| m.as_str().to_string()).collect()
}
