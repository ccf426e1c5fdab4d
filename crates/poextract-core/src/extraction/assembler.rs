//! Deal assembly from summary fields, line items and message context.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::header::CanonicalField;
use super::rules::{
    AddressSplitter, extract_emails, extract_numeric, extract_order_notes, normalize_abn,
    validate_abn,
};
use crate::error::ExtractionError;
use crate::graph::QueryAnswer;
use crate::models::config::{ExtractionConfig, PoConfig};
use crate::models::context::DocumentContext;
use crate::models::deal::{Deal, LineItem};
use crate::provider::{ExpenseField, ExpenseLineItem};

/// Document level field types the assembler understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SummaryFieldType {
    PoNumber,
    VendorName,
    ReceiverAddress,
    Subtotal,
    Tax,
    Total,
    DeliveryDate,
    VendorAbnNumber,
    VendorUrl,
    #[serde(other)]
    Other,
}

impl SummaryFieldType {
    /// Parse a provider field type or query alias.
    ///
    /// Case, spaces and hyphens are ignored, so `PO_NUMBER`, `po-number` and
    /// `Po Number` are equivalent.
    pub fn parse(s: &str) -> Self {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();

        match normalized.as_str() {
            "PO_NUMBER" | "PURCHASE_ORDER" | "PURCHASEORDER" => Self::PoNumber,
            "VENDOR_NAME" => Self::VendorName,
            "RECEIVER_ADDRESS" => Self::ReceiverAddress,
            "SUBTOTAL" => Self::Subtotal,
            "TAX" => Self::Tax,
            "TOTAL" => Self::Total,
            "DELIVERY_DATE" => Self::DeliveryDate,
            "VENDOR_ABN_NUMBER" => Self::VendorAbnNumber,
            "VENDOR_URL" => Self::VendorUrl,
            _ => Self::Other,
        }
    }
}

/// A document level key/value reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryField {
    pub field_type: SummaryFieldType,
    /// Label printed on the document, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub value: String,
}

impl SummaryField {
    pub fn new(field_type: SummaryFieldType, value: impl Into<String>) -> Self {
        Self {
            field_type,
            label: None,
            value: value.into(),
        }
    }

    /// Convert an expense summary field. Fields without a value are dropped.
    pub fn from_expense(field: &ExpenseField) -> Option<Self> {
        let value = field.value_text()?;
        Some(Self {
            field_type: field
                .type_text()
                .map(SummaryFieldType::parse)
                .unwrap_or(SummaryFieldType::Other),
            label: field.label_text().map(str::to_string),
            value: value.to_string(),
        })
    }

    /// Convert a query answer whose alias names a summary field type.
    pub fn from_query(answer: &QueryAnswer) -> Option<Self> {
        let field_type = SummaryFieldType::parse(answer.alias.as_deref()?);
        if field_type == SummaryFieldType::Other {
            return None;
        }
        Some(Self {
            field_type,
            label: Some(answer.question.clone()),
            value: answer.answer.clone()?,
        })
    }
}

/// Builds a [`Deal`] from everything extracted for one document.
#[derive(Debug, Clone)]
pub struct DealAssembler {
    config: ExtractionConfig,
    address: AddressSplitter,
}

impl DealAssembler {
    /// Create an assembler; fails if the address vocabularies are unusable.
    pub fn new(config: &PoConfig) -> Result<Self, ExtractionError> {
        Ok(Self {
            config: config.extraction.clone(),
            address: AddressSplitter::new(&config.address)?,
        })
    }

    /// Replace the summary field and line item settings.
    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.config = config;
        self
    }

    /// Assemble a deal.
    ///
    /// Fields are applied in order, so a later value replaces an earlier one,
    /// except for the ABN where the first accepted value is kept.
    pub fn assemble<'a>(
        &self,
        fields: impl IntoIterator<Item = &'a SummaryField>,
        line_items: Vec<LineItem>,
        context: &DocumentContext,
    ) -> Deal {
        let mut deal = Deal::new();

        for field in fields {
            self.collect_emails(&mut deal, &field.value);
            self.apply(&mut deal, field);
        }

        deal.deal_name = deal_name(&deal, context);
        deal.sales_rep_name = context
            .sender
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        deal.order_notes = context.message.as_deref().and_then(extract_order_notes);
        deal.line_items = line_items;

        deal
    }

    /// Apply one summary field. Returns whether the deal changed.
    pub fn apply(&self, deal: &mut Deal, field: &SummaryField) -> bool {
        let value = field.value.trim();
        if value.is_empty() {
            return false;
        }

        match field.field_type {
            SummaryFieldType::PoNumber => deal.purchase_order_no = Some(value.to_string()),
            SummaryFieldType::VendorName => deal.company.name = Some(value.to_string()),
            SummaryFieldType::ReceiverAddress => {
                deal.delivery_address = self.address.split(value);
                if deal.delivery_address.error.is_some() {
                    warn!("Could not split delivery address: {:?}", value);
                }
            }
            SummaryFieldType::Subtotal => deal.sub_total = extract_numeric(value),
            SummaryFieldType::Tax => deal.tax = extract_numeric(value),
            SummaryFieldType::Total => deal.total = extract_numeric(value),
            SummaryFieldType::DeliveryDate => deal.delivery_date = Some(value.to_string()),
            SummaryFieldType::VendorAbnNumber => return self.apply_abn(deal, value),
            SummaryFieldType::VendorUrl => deal.company.domain = Some(value.to_string()),
            SummaryFieldType::Other => return false,
        }

        debug!("Applied {:?}", field.field_type);
        true
    }

    fn apply_abn(&self, deal: &mut Deal, value: &str) -> bool {
        if deal.company.abn.is_some() {
            debug!("ABN already set, ignoring {:?}", value);
            return false;
        }

        let abn = normalize_abn(value);
        if self.config.excluded_abns.iter().any(|ex| normalize_abn(ex) == abn) {
            debug!("Suppressed excluded ABN {}", abn);
            return false;
        }
        if self.config.validate_abn && !validate_abn(&abn) {
            warn!("Rejected ABN with bad checksum: {}", abn);
            return false;
        }

        deal.company.abn = Some(abn);
        true
    }

    fn collect_emails(&self, deal: &mut Deal, value: &str) {
        for email in extract_emails(value) {
            if !deal.emails.contains(&email) {
                deal.emails.push(email);
            }
        }
    }

    /// Line items from provider expense groups, keeping only identifiable ones.
    pub fn expense_line_items<'a>(
        &self,
        items: impl IntoIterator<Item = &'a ExpenseLineItem>,
    ) -> Vec<LineItem> {
        items
            .into_iter()
            .map(expense_line_item)
            .filter(LineItem::is_identifiable)
            .collect()
    }
}

fn expense_line_item(expense: &ExpenseLineItem) -> LineItem {
    let mut item = LineItem::default();

    for field in &expense.line_item_expense_fields {
        let Some(value) = field.value_text() else {
            continue;
        };
        let canonical = match field.type_text().unwrap_or_default() {
            "PRODUCT_CODE" => CanonicalField::Sku,
            "ITEM" => CanonicalField::Name,
            "QUANTITY" => CanonicalField::Quantity,
            "UNIT_PRICE" => CanonicalField::UnitPrice,
            "PRICE" => CanonicalField::NetPrice,
            "EXPENSE_ROW" => {
                item.expense_raw = value.trim().to_string();
                continue;
            }
            _ => continue,
        };
        canonical.apply(&mut item, value);
    }

    item
}

fn deal_name(deal: &Deal, context: &DocumentContext) -> String {
    deal.purchase_order_no
        .as_deref()
        .or(context.subject.as_deref())
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn assembler() -> DealAssembler {
        DealAssembler::new(&PoConfig::default()).unwrap()
    }

    fn field(field_type: SummaryFieldType, value: &str) -> SummaryField {
        SummaryField::new(field_type, value)
    }

    #[test]
    fn test_parse_field_type() {
        assert_eq!(SummaryFieldType::parse("PO_NUMBER"), SummaryFieldType::PoNumber);
        assert_eq!(SummaryFieldType::parse("PurchaseOrder"), SummaryFieldType::PoNumber);
        assert_eq!(SummaryFieldType::parse("vendor-abn-number"), SummaryFieldType::VendorAbnNumber);
        assert_eq!(SummaryFieldType::parse("AMOUNT_PAID"), SummaryFieldType::Other);
    }

    #[test]
    fn test_summary_dispatch() {
        let fields = vec![
            field(SummaryFieldType::PoNumber, "PO-4471"),
            field(SummaryFieldType::VendorName, "ACME Supplies"),
            field(SummaryFieldType::ReceiverAddress, "12 Smith Street,\nNewtown NSW 2042"),
            field(SummaryFieldType::Subtotal, "$1,000.00"),
            field(SummaryFieldType::Tax, "$100.00"),
            field(SummaryFieldType::Total, "$1,100.00"),
            field(SummaryFieldType::DeliveryDate, "next Tuesday"),
            field(SummaryFieldType::VendorAbnNumber, "51 824 753 556"),
            field(SummaryFieldType::VendorUrl, "acme.com.au"),
            field(SummaryFieldType::Other, "ignored"),
        ];

        let deal = assembler().assemble(&fields, Vec::new(), &DocumentContext::new());

        assert_eq!(deal.deal_name, "PO-4471");
        assert_eq!(deal.purchase_order_no.as_deref(), Some("PO-4471"));
        assert_eq!(deal.company.name.as_deref(), Some("ACME Supplies"));
        assert_eq!(deal.company.abn.as_deref(), Some("51824753556"));
        assert_eq!(deal.company.domain.as_deref(), Some("acme.com.au"));
        assert_eq!(deal.delivery_address.suburb.as_deref(), Some("Newtown"));
        assert_eq!(deal.sub_total, Decimal::new(100000, 2));
        assert_eq!(deal.tax, Decimal::new(10000, 2));
        assert_eq!(deal.total, Decimal::new(110000, 2));
        assert_eq!(deal.delivery_date.as_deref(), Some("next Tuesday"));
    }

    #[test]
    fn test_excluded_abn_suppressed() {
        let fields = vec![field(SummaryFieldType::VendorAbnNumber, "85 663 589 062")];
        let deal = assembler().assemble(&fields, Vec::new(), &DocumentContext::new());

        assert!(deal.company.abn.is_none());
    }

    #[test]
    fn test_value_with_two_abns_kept_whole() {
        let fields = vec![field(
            SummaryFieldType::VendorAbnNumber,
            "85 663 589 062 / 51 824 753 556",
        )];
        let deal = assembler().assemble(&fields, Vec::new(), &DocumentContext::new());

        assert_eq!(deal.company.abn.as_deref(), Some("85663589062/51824753556"));
    }

    #[test]
    fn test_unmatched_address_does_not_stop_assembly() {
        let fields = vec![
            field(SummaryFieldType::PoNumber, "PO-9001"),
            field(SummaryFieldType::ReceiverAddress, "PO Box 123 Newtown"),
            field(SummaryFieldType::VendorName, "ACME Supplies"),
            field(SummaryFieldType::Total, "$55.00"),
        ];
        let deal = assembler().assemble(&fields, Vec::new(), &DocumentContext::new());

        assert_eq!(deal.delivery_address.error.as_deref(), Some("Address not found"));
        assert!(deal.delivery_address.street_address.is_none());
        assert_eq!(deal.purchase_order_no.as_deref(), Some("PO-9001"));
        assert_eq!(deal.deal_name, "PO-9001");
        assert_eq!(deal.company.name.as_deref(), Some("ACME Supplies"));
        assert_eq!(deal.total, Decimal::new(5500, 2));
    }

    #[test]
    fn test_first_abn_wins() {
        let fields = vec![
            field(SummaryFieldType::VendorAbnNumber, "85 663 589 062"),
            field(SummaryFieldType::VendorAbnNumber, "51 824 753 556"),
            field(SummaryFieldType::VendorAbnNumber, "33 102 417 032"),
        ];
        let deal = assembler().assemble(&fields, Vec::new(), &DocumentContext::new());

        assert_eq!(deal.company.abn.as_deref(), Some("51824753556"));
    }

    #[test]
    fn test_abn_checksum_validation() {
        let mut config = PoConfig::default();
        config.extraction.validate_abn = true;
        let assembler = DealAssembler::new(&config).unwrap();

        let mut deal = Deal::new();
        assert!(!assembler.apply(&mut deal, &field(SummaryFieldType::VendorAbnNumber, "51824753557")));
        assert!(assembler.apply(&mut deal, &field(SummaryFieldType::VendorAbnNumber, "51824753556")));
    }

    #[test]
    fn test_deal_name_falls_back_to_subject() {
        let context = DocumentContext::new().with_subject("  Order for site 4 ");
        let fields = vec![field(SummaryFieldType::PoNumber, "   ")];
        let deal = assembler().assemble(&fields, Vec::new(), &context);

        assert!(deal.purchase_order_no.is_none());
        assert_eq!(deal.deal_name, "Order for site 4");

        let deal = assembler().assemble(&[], Vec::new(), &DocumentContext::new());
        assert_eq!(deal.deal_name, "");
    }

    #[test]
    fn test_emails_collected_from_all_values() {
        let fields = vec![
            field(SummaryFieldType::Other, "sales@acme.com.au"),
            field(SummaryFieldType::VendorName, "ACME (orders@acme.com.au)"),
            field(SummaryFieldType::Other, "sales@acme.com.au"),
        ];
        let deal = assembler().assemble(&fields, Vec::new(), &DocumentContext::new());

        assert_eq!(deal.emails, vec!["sales@acme.com.au", "orders@acme.com.au"]);
    }

    #[test]
    fn test_context_fields() {
        let context = DocumentContext::new()
            .with_sender("Jo Buyer")
            .with_message("Hi\n\n\nPlease call before delivery.\nRegards");
        let deal = assembler().assemble(&[], Vec::new(), &context);

        assert_eq!(deal.sales_rep_name.as_deref(), Some("Jo Buyer"));
        assert_eq!(deal.order_notes.as_deref(), Some("Please call before delivery."));
    }

    #[test]
    fn test_expense_line_items() {
        let items = vec![
            ExpenseLineItem {
                line_item_expense_fields: vec![
                    ExpenseField::new("PRODUCT_CODE", "AB-100"),
                    ExpenseField::new("ITEM", "Rubber mat"),
                    ExpenseField::new("QUANTITY", "4"),
                    ExpenseField::new("UNIT_PRICE", "$12.50"),
                    ExpenseField::new("PRICE", "$50.00"),
                    ExpenseField::new("EXPENSE_ROW", "AB-100 Rubber mat 4 $12.50 $50.00"),
                ],
            },
            ExpenseLineItem {
                line_item_expense_fields: vec![ExpenseField::new("PRICE", "$9.00")],
            },
        ];

        let line_items = assembler().expense_line_items(&items);

        assert_eq!(line_items.len(), 1);
        let item = &line_items[0];
        assert_eq!(item.sku.as_deref(), Some("AB-100"));
        assert_eq!(item.name.as_deref(), Some("Rubber mat"));
        assert_eq!(item.quantity, Decimal::new(4, 0));
        assert_eq!(item.unit_price, Decimal::new(1250, 2));
        assert_eq!(item.net_price, Decimal::new(5000, 2));
        assert_eq!(item.expense_raw, "AB-100 Rubber mat 4 $12.50 $50.00");
    }

    #[test]
    fn test_query_answers_become_fields() {
        let answer = QueryAnswer {
            question: "What is the purchase order number?".to_string(),
            alias: Some("PurchaseOrder".to_string()),
            answer: Some("PO-9".to_string()),
        };
        let field = SummaryField::from_query(&answer).unwrap();
        assert_eq!(field.field_type, SummaryFieldType::PoNumber);
        assert_eq!(field.value, "PO-9");

        let unaliased = QueryAnswer {
            alias: Some("ProductCode".to_string()),
            ..answer
        };
        assert!(SummaryField::from_query(&unaliased).is_none());
    }
}
