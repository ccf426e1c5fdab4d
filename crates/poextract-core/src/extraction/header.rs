//! Header synonyms and the canonical line item fields they map to.

use serde::{Deserialize, Serialize};

use super::rules::extract_numeric;
use crate::models::deal::LineItem;

/// Semantic line item field a table column can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalField {
    #[serde(rename = "SKU")]
    Sku,
    Name,
    Quantity,
    UnitPrice,
    Discount,
    NetPrice,
}

impl CanonicalField {
    /// Write one cell value into the matching line item field.
    ///
    /// Blank values leave the field untouched.
    pub fn apply(self, item: &mut LineItem, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }

        match self {
            CanonicalField::Sku => item.sku = Some(value.to_string()),
            CanonicalField::Name => item.name = Some(value.to_string()),
            CanonicalField::Quantity => item.quantity = extract_numeric(value),
            CanonicalField::UnitPrice => item.unit_price = extract_numeric(value),
            CanonicalField::Discount => item.discount = extract_numeric(value),
            CanonicalField::NetPrice => item.net_price = extract_numeric(value),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalField::Sku => "SKU",
            CanonicalField::Name => "Name",
            CanonicalField::Quantity => "Quantity",
            CanonicalField::UnitPrice => "UnitPrice",
            CanonicalField::Discount => "Discount",
            CanonicalField::NetPrice => "NetPrice",
        }
    }
}

/// One synonym → field entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderSynonym {
    /// Header label as it appears in tables (matched case-insensitively).
    pub label: String,
    pub field: CanonicalField,
}

/// Ordered synonym list used to find header rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderDictionary {
    entries: Vec<HeaderSynonym>,
}

const DEFAULT_SYNONYMS: &[(&str, CanonicalField)] = &[
    ("part #", CanonicalField::Sku),
    ("vendor code", CanonicalField::Sku),
    ("part id", CanonicalField::Sku),
    ("product code", CanonicalField::Sku),
    ("budget code", CanonicalField::Sku),
    ("item", CanonicalField::Sku),
    ("description", CanonicalField::Name),
    ("quantity", CanonicalField::Quantity),
    ("qty", CanonicalField::Quantity),
    ("amount ordered", CanonicalField::Quantity),
    ("quantity ordered", CanonicalField::Quantity),
    ("unit price", CanonicalField::UnitPrice),
    ("quoted unit price", CanonicalField::UnitPrice),
    ("unit cost", CanonicalField::UnitPrice),
    ("quoted price", CanonicalField::UnitPrice),
    ("discount", CanonicalField::Discount),
    ("net price", CanonicalField::NetPrice),
];

impl Default for HeaderDictionary {
    fn default() -> Self {
        Self {
            entries: DEFAULT_SYNONYMS
                .iter()
                .map(|&(label, field)| HeaderSynonym {
                    label: label.to_string(),
                    field,
                })
                .collect(),
        }
    }
}

impl HeaderDictionary {
    /// A dictionary with no synonyms.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a synonym.
    pub fn with_synonym(mut self, label: impl Into<String>, field: CanonicalField) -> Self {
        self.entries.push(HeaderSynonym {
            label: label.into(),
            field,
        });
        self
    }

    /// Find the synonym matching a cell's text, ignoring case and surrounding
    /// whitespace. The first matching entry wins.
    pub fn lookup(&self, text: &str) -> Option<&HeaderSynonym> {
        let normalized = text.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|e| e.label.trim().to_lowercase() == normalized)
    }

    /// Check whether a cell's text is a known header label.
    pub fn is_header(&self, text: &str) -> bool {
        self.lookup(text).is_some()
    }

    pub fn entries(&self) -> &[HeaderSynonym] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
