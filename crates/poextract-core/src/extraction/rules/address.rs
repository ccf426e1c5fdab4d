//! Delivery address decomposition.
//!
//! One pattern, built from the configured vocabularies, recognizes in order:
//! an optional property type, an optional unit or lot, the street number, the
//! street name, a street type, then optional suburb, state, 4-digit postcode
//! and country. Number, name and street type anchor the match.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use tracing::debug;

use crate::error::ExtractionError;
use crate::models::config::AddressConfig;
use crate::models::deal::Address;

lazy_static! {
    static ref DEFAULT_SPLITTER: AddressSplitter =
        AddressSplitter::new(&AddressConfig::default()).unwrap();
}

/// Split a free-form address using the default vocabularies.
pub fn split_address(text: &str) -> Address {
    DEFAULT_SPLITTER.split(text)
}

/// Compiled address pattern.
#[derive(Debug, Clone)]
pub struct AddressSplitter {
    pattern: Regex,
}

impl AddressSplitter {
    /// Compile the pattern for the given vocabularies.
    pub fn new(config: &AddressConfig) -> Result<Self, ExtractionError> {
        let street_types = alternation(&config.street_types)
            .ok_or_else(|| ExtractionError::Vocabulary("street_types".to_string()))?;

        let state = alternation(&config.states)
            .map(|states| format!(r"(?:\b(?P<state>{states})\b,? *?)?"))
            .unwrap_or_default();

        let country = alternation(&config.countries)
            .map(|countries| format!(r"(?:\b(?P<country>{countries})\b\.?)?"))
            .unwrap_or_default();

        let pattern = format!(
            concat!(
                r"(?i)^",
                r"(?:(?P<property_type>[a-z ,.']+?) *?)?",
                r"(?:(?P<unit>\d+-\d+|\d+)(?:,|/|-| *?))?",
                r"\b(?P<number>\d+[a-z]?)\b *?",
                r"(?P<street>[\w '-]+)",
                r"\b(?P<street_type>{street_types})\b\.?,? *?",
                r"(?:(?P<suburb>[a-z'.]+(?:[-, ]+[a-z'.]+)*?),? *?)?",
                r"{state}",
                r"(?:(?P<postcode>\d{{4}}),? *?)?",
                r"{country}",
                r"\s*$"
            ),
            street_types = street_types,
            state = state,
            country = country,
        );

        Ok(Self {
            pattern: Regex::new(&pattern)?,
        })
    }

    /// Decompose `text`. On failure only `error` is set.
    pub fn split(&self, text: &str) -> Address {
        let text = text.replace(['\r', '\n'], " ");
        let text = text.trim();

        if text.is_empty() {
            debug!("Empty delivery address");
            return Address::not_found();
        }

        // Slashes separate unit and number; the substitution keeps byte offsets.
        let searchable = text.replace('/', " ");
        let Some(caps) = self.pattern.captures(&searchable) else {
            debug!("Address did not match: {:?}", text);
            return Address::not_found();
        };

        let street_end = caps.name("street_type").map(|m| m.end()).unwrap_or(0);
        let street_address = text[..street_end].trim().trim_end_matches(',').trim();

        Address {
            street_address: non_empty(street_address),
            suburb: group(&caps, "suburb"),
            state: group(&caps, "state"),
            post_code: group(&caps, "postcode"),
            country: group(&caps, "country"),
            error: None,
        }
    }
}

/// Longest-first alternation of escaped vocabulary entries.
fn alternation(values: &[String]) -> Option<String> {
    let mut entries: Vec<&str> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect();

    if entries.is_empty() {
        return None;
    }

    entries.sort_by(|a, b| b.len().cmp(&a.len()));
    Some(
        entries
            .iter()
            .map(|e| regex::escape(e).replace(' ', r"\s+"))
            .collect::<Vec<_>>()
            .join("|"),
    )
}

fn group(caps: &Captures<'_>, name: &str) -> Option<String> {
    caps.name(name).and_then(|m| non_empty(m.as_str().trim()))
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_canonical_address() {
        let address = split_address("12 Smith Street, Newtown NSW 2042");

        assert_eq!(
            address,
            Address {
                street_address: Some("12 Smith Street".to_string()),
                suburb: Some("Newtown".to_string()),
                state: Some("NSW".to_string()),
                post_code: Some("2042".to_string()),
                country: None,
                error: None,
            }
        );
    }

    #[test]
    fn test_unit_with_slash_and_newlines() {
        let address = split_address("5/12 Smith St\nNewtown NSW 2042");

        assert_eq!(address.street_address.as_deref(), Some("5/12 Smith St"));
        assert_eq!(address.suburb.as_deref(), Some("Newtown"));
        assert_eq!(address.state.as_deref(), Some("NSW"));
        assert_eq!(address.post_code.as_deref(), Some("2042"));
        assert!(address.error.is_none());
    }

    #[test]
    fn test_country_token() {
        let address = split_address("40 Queen Rd, Brisbane QLD 4000 Australia");

        assert_eq!(address.street_address.as_deref(), Some("40 Queen Rd"));
        assert_eq!(address.suburb.as_deref(), Some("Brisbane"));
        assert_eq!(address.state.as_deref(), Some("QLD"));
        assert_eq!(address.post_code.as_deref(), Some("4000"));
        assert_eq!(address.country.as_deref(), Some("Australia"));
    }

    #[test]
    fn test_no_street_type_is_not_found() {
        let address = split_address("PO Box 123 Newtown");
        assert_eq!(address, Address::not_found());

        assert_eq!(split_address("   "), Address::not_found());
    }

    #[test]
    fn test_custom_vocabulary() {
        let config = AddressConfig {
            street_types: vec!["Gasse".to_string()],
            states: Vec::new(),
            countries: Vec::new(),
        };
        let splitter = AddressSplitter::new(&config).unwrap();

        let address = splitter.split("7 Mueller Gasse, Wien");
        assert_eq!(address.street_address.as_deref(), Some("7 Mueller Gasse"));
        assert_eq!(address.suburb.as_deref(), Some("Wien"));
        assert!(address.state.is_none());
    }

    #[test]
    fn test_empty_street_types_rejected() {
        let config = AddressConfig {
            street_types: Vec::new(),
            ..AddressConfig::default()
        };
        assert!(matches!(
            AddressSplitter::new(&config),
            Err(ExtractionError::Vocabulary(_))
        ));
    }
}
