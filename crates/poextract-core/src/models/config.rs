//! Configuration structures for the extraction pipeline.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PoError, Result};
use crate::extraction::header::HeaderDictionary;

/// Main configuration for the poextract pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoConfig {
    /// Table header synonyms.
    pub headers: HeaderDictionary,

    /// Address matching vocabularies.
    pub address: AddressConfig,

    /// Summary field and line item handling.
    pub extraction: ExtractionConfig,
}

/// Vocabularies the address pattern is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressConfig {
    /// Street type tokens, full names and abbreviations.
    pub street_types: Vec<String>,

    /// State names and abbreviations.
    pub states: Vec<String>,

    /// Country tokens accepted after the postcode.
    pub countries: Vec<String>,
}

const STREET_TYPES: &[&str] = &[
    "STREET", "ST", "ROAD", "RD", "GROVE", "GR", "DRIVE", "DR", "AVENUE", "AVE", "CIRCUIT",
    "CCT", "CLOSE", "CL", "COURT", "CRT", "CT", "CRESCENT", "CRES", "PLACE", "PL", "PARADE",
    "PDE", "BOULEVARD", "BLVD", "HIGHWAY", "HWY", "ALLEY", "ALLY", "APPROACH", "APP",
    "ARCADE", "ARC", "BROW", "BYPASS", "BYPA", "CAUSEWAY", "CWAY", "CIRCUS", "CIRC", "COPSE",
    "CPSE", "CORNER", "CNR", "COVE", "END", "ESPLANADE", "ESP", "FLAT", "FREEWAY", "FWAY",
    "FRONTAGE", "FRNT", "GARDENS", "GDNS", "GLADE", "GLD", "GLEN", "GREEN", "GRN", "HEIGHTS",
    "HTS", "LANE", "LINK", "LOOP", "MALL", "MEWS", "PACKET", "PCKT", "PARK", "PARKWAY",
    "PKWY", "PROMENADE", "PROM", "RESERVE", "RES", "RIDGE", "RDGE", "RISE", "ROW", "SQUARE",
    "SQ", "STRIP", "STRP", "TARN", "TERRACE", "TCE", "THOROUGHFARE", "TFRE", "TRACK", "TRAC",
    "TRUNKWAY", "TWAY", "VIEW", "VISTA", "VSTA", "WALK", "WAY", "WALKWAY", "WWAY", "YARD",
];

const STATES: &[&str] = &[
    "New South Wales",
    "NSW",
    "Victoria",
    "VIC",
    "Queensland",
    "QLD",
    "Australian Capital Territory",
    "ACT",
    "South Australia",
    "SA",
    "Western Australia",
    "West Australia",
    "WA",
    "Tasmania",
    "TAS",
    "Northern Territory",
    "NT",
];

const COUNTRIES: &[&str] = &["Australia", "Aus", "Au"];

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl Default for AddressConfig {
    fn default() -> Self {
        Self {
            street_types: to_strings(STREET_TYPES),
            states: to_strings(STATES),
            countries: to_strings(COUNTRIES),
        }
    }
}

/// Summary field and line item configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// ABNs that never identify a vendor (e.g. the receiving company's own).
    pub excluded_abns: Vec<String>,

    /// Reject ABNs that fail the modulus 89 checksum.
    pub validate_abn: bool,

    /// Fall back to provider expense line items when no table yields any.
    pub use_expense_line_items: bool,

    /// Feed QUERY answers whose alias names a summary field into the deal.
    pub use_query_fields: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            excluded_abns: vec!["85663589062".to_string()],
            validate_abn: false,
            use_expense_line_items: true,
            use_query_fields: true,
        }
    }
}

impl PoConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| PoError::Config(format!("invalid configuration in {}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
