//! Deal data models produced from a purchase order or invoice.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A complete deal assembled from one processed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    /// Deal name (purchase order number, or the context subject).
    pub deal_name: String,

    /// Purchase order number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_order_no: Option<String>,

    /// Delivery address.
    pub delivery_address: Address,

    /// Subtotal before tax.
    pub sub_total: Decimal,

    /// Tax amount.
    pub tax: Decimal,

    /// Total amount.
    pub total: Decimal,

    /// Delivery date exactly as printed on the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<String>,

    /// Vendor company.
    pub company: Company,

    /// Order notes taken from the accompanying message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_notes: Option<String>,

    /// Sender of the accompanying message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales_rep_name: Option<String>,

    /// Email addresses found in summary fields, for sales rep assignment.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<String>,

    /// Line items.
    pub line_items: Vec<LineItem>,

    /// Extraction metadata.
    pub metadata: ExtractionMetadata,
}

impl Deal {
    /// Create an empty deal.
    pub fn new() -> Self {
        Self {
            deal_name: String::new(),
            purchase_order_no: None,
            delivery_address: Address::default(),
            sub_total: Decimal::ZERO,
            tax: Decimal::ZERO,
            total: Decimal::ZERO,
            delivery_date: None,
            company: Company::default(),
            order_notes: None,
            sales_rep_name: None,
            emails: Vec::new(),
            line_items: Vec::new(),
            metadata: ExtractionMetadata::default(),
        }
    }

    /// Check the deal for gaps worth reporting.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.deal_name.trim().is_empty() {
            issues.push("Missing deal name".to_string());
        }

        if self.purchase_order_no.is_none() {
            issues.push("Missing purchase order number".to_string());
        }

        if self.company.name.is_none() {
            issues.push("Missing vendor name".to_string());
        }

        if let Some(error) = &self.delivery_address.error {
            issues.push(format!("Delivery address: {}", error));
        }

        if self.line_items.is_empty() {
            issues.push("No line items".to_string());
        }

        if self.total.is_zero() {
            issues.push("Total is zero".to_string());
        }

        if !self.sub_total.is_zero() && !self.total.is_zero() {
            let expected = self.sub_total + self.tax;
            if (expected - self.total).abs() > Decimal::new(1, 2) {
                issues.push(format!(
                    "Subtotal plus tax ({}) differs from total ({})",
                    expected, self.total
                ));
            }
        }

        issues
    }
}

impl Default for Deal {
    fn default() -> Self {
        Self::new()
    }
}

/// Vendor company.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Vendor name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Vendor web domain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Australian Business Number, whitespace stripped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abn: Option<String>,
}

/// Address decomposed from a free-form string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Everything up to and including the street type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suburb: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    /// Set instead of the fields above when decomposition fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Address {
    /// An address that could not be decomposed.
    pub fn not_found() -> Self {
        Self {
            error: Some("Address not found".to_string()),
            ..Self::default()
        }
    }

    /// Check if the address has any structured data.
    pub fn is_empty(&self) -> bool {
        self.street_address.is_none()
            && self.suburb.is_none()
            && self.state.is_none()
            && self.post_code.is_none()
            && self.country.is_none()
    }

    /// Format address as a single line.
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if let Some(street) = &self.street_address {
            parts.push(street.clone());
        }

        let locality: Vec<&str> = [&self.suburb, &self.state, &self.post_code]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .collect();
        if !locality.is_empty() {
            parts.push(locality.join(" "));
        }

        if let Some(country) = &self.country {
            parts.push(country.clone());
        }
        parts.join(", ")
    }
}

/// A single line item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Product code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,

    pub quantity: Decimal,

    pub unit_price: Decimal,

    pub discount: Decimal,

    pub net_price: Decimal,

    /// Raw text of every mapped cell in the source row.
    pub expense_raw: String,
}

impl LineItem {
    /// A line item is kept only when it names a product somehow.
    pub fn is_identifiable(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        filled(&self.sku) || filled(&self.name)
    }
}

/// Where a deal's line items were taken from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItemSource {
    /// Reconstructed TABLE blocks.
    Tables,
    /// Provider expense line-item groups.
    ExpenseGroups,
    /// No line items were found.
    #[default]
    None,
}

/// Metadata about the extraction process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    /// When the deal was assembled.
    pub processed_at: DateTime<Utc>,

    /// Number of TABLE blocks in the document.
    pub tables_found: usize,

    /// Number of tables in which a header row was found.
    pub tables_with_header: usize,

    /// Origin of the line items.
    pub line_item_source: LineItemSource,

    /// Processing time in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,

    /// Warnings or issues encountered during extraction.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Default for ExtractionMetadata {
    fn default() -> Self {
        Self {
            processed_at: Utc::now(),
            tables_found: 0,
            tables_with_header: 0,
            line_item_source: LineItemSource::None,
            processing_time_ms: None,
            warnings: Vec::new(),
        }
    }
}
