//! Document analysis provider boundary.
//!
//! The provider turns a source document into blocks and expense documents.
//! Everything it returns is fully materialized: all pages and continuation
//! responses are merged before the analyzer sees them.

mod json;

pub use json::JsonFileProvider;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::models::block::Block;

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Source of analyzed documents.
pub trait DocumentAnalysisProvider {
    /// Analyze the document at `source`.
    fn analyze(&self, source: &Path) -> Result<AnalyzedDocument>;

    /// Short provider name for logs.
    fn name(&self) -> &str;
}

/// Provider output for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AnalyzedDocument {
    /// Layout blocks (pages, lines, words, tables, cells, forms, queries).
    #[serde(default)]
    pub blocks: Vec<Block>,

    /// Expense analysis results.
    #[serde(default)]
    pub expense_documents: Vec<ExpenseDocument>,
}

/// A response file holds either one response or a list of paginated ones.
#[derive(Deserialize)]
#[serde(untagged)]
enum ResponseFile {
    Paged(Vec<AnalyzedDocument>),
    Single(AnalyzedDocument),
}

impl AnalyzedDocument {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            expense_documents: Vec::new(),
        }
    }

    /// Attach expense documents.
    pub fn with_expense_documents(mut self, documents: Vec<ExpenseDocument>) -> Self {
        self.expense_documents = documents;
        self
    }

    /// Parse a response, merging paginated responses in order.
    pub fn from_json(json: &str) -> Result<Self> {
        match serde_json::from_str(json)? {
            ResponseFile::Single(document) => Ok(document),
            ResponseFile::Paged(pages) => Ok(Self::from_pages(pages)),
        }
    }

    /// Concatenate paginated responses.
    pub fn from_pages(pages: impl IntoIterator<Item = AnalyzedDocument>) -> Self {
        pages.into_iter().fold(Self::default(), |mut merged, page| {
            merged.merge(page);
            merged
        })
    }

    /// Append another response's blocks and expense documents.
    pub fn merge(&mut self, other: AnalyzedDocument) {
        self.blocks.extend(other.blocks);
        self.expense_documents.extend(other.expense_documents);
    }

    /// True when there is nothing to extract from.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.expense_documents.is_empty()
    }

    /// Summary fields of every expense document, in document order.
    pub fn summary_fields(&self) -> impl Iterator<Item = &ExpenseField> {
        self.expense_documents
            .iter()
            .flat_map(|d| d.summary_fields.iter())
    }

    /// Expense line items of every document, in document and group order.
    pub fn expense_line_items(&self) -> impl Iterator<Item = &ExpenseLineItem> {
        self.expense_documents
            .iter()
            .flat_map(|d| d.line_item_groups.iter())
            .flat_map(|g| g.line_items.iter())
    }
}

/// One expense (invoice or receipt) found by the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExpenseDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expense_index: Option<u32>,

    /// Document level fields such as PO_NUMBER or TOTAL.
    #[serde(default)]
    pub summary_fields: Vec<ExpenseField>,

    #[serde(default)]
    pub line_item_groups: Vec<LineItemGroup>,
}

/// A typed field with its label and value detections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExpenseField {
    /// Normalized field type, e.g. `VENDOR_NAME`.
    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<Detection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_detection: Option<Detection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_detection: Option<Detection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
}

impl ExpenseField {
    /// Build a field from its type and value text.
    pub fn new(field_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field_type: Some(Detection::new(field_type)),
            label_detection: None,
            value_detection: Some(Detection::new(value)),
            page_number: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label_detection = Some(Detection::new(label));
        self
    }

    pub fn type_text(&self) -> Option<&str> {
        self.field_type.as_ref()?.text.as_deref()
    }

    pub fn label_text(&self) -> Option<&str> {
        self.label_detection.as_ref()?.text.as_deref()
    }

    pub fn value_text(&self) -> Option<&str> {
        self.value_detection.as_ref()?.text.as_deref()
    }
}

/// Detected text with its confidence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Detection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl Detection {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            confidence: None,
        }
    }
}

/// A group of expense line items, usually one per table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LineItemGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_item_group_index: Option<u32>,

    #[serde(default)]
    pub line_items: Vec<ExpenseLineItem>,
}

/// Fields of one expense line item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExpenseLineItem {
    #[serde(default)]
    pub line_item_expense_fields: Vec<ExpenseField>,
}
