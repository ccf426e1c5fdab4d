//! Purchase order analyzer: block graph in, deal out.

use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::assembler::{DealAssembler, SummaryField};
use super::mapper::LineItemMapper;
use crate::error::{ExtractionError, Result};
use crate::graph::{BlockGraph, KeyValue};
use crate::models::config::PoConfig;
use crate::models::context::DocumentContext;
use crate::models::deal::{Deal, LineItem, LineItemSource};
use crate::provider::{AnalyzedDocument, DocumentAnalysisProvider};
use crate::table::{Grid, TableReconstructor};

/// Result of purchase order extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Assembled deal.
    pub deal: Deal,
    /// One report per TABLE block, in document order.
    pub tables: Vec<TableReport>,
    /// Resolved KEY_VALUE_SET pairs.
    pub form_fields: Vec<KeyValue>,
    /// Extraction warnings.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Diagnostics for one reconstructed table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReport {
    /// Position of the table among the document's tables.
    pub index: usize,
    pub table_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    pub rows: usize,
    pub columns: u32,
    /// Row used as the header, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_row: Option<u32>,
    pub line_items: usize,
    pub skipped_rows: usize,
}

/// A table with its grid and the line items mapped from it.
#[derive(Debug, Clone)]
pub struct AnalyzedTable {
    pub report: TableReport,
    pub grid: Grid,
    pub line_items: Vec<LineItem>,
}

/// Trait for deal extraction.
pub trait DealExtractor {
    /// Extract a deal from an analyzed document.
    fn extract(&self, document: &AnalyzedDocument, context: &DocumentContext)
    -> Result<ExtractionResult>;

    /// Run a provider on `source`, then extract.
    fn extract_from(
        &self,
        provider: &dyn DocumentAnalysisProvider,
        source: &Path,
        context: &DocumentContext,
    ) -> Result<ExtractionResult> {
        let document = provider.analyze(source)?;
        self.extract(&document, context)
    }
}

/// Table-driven purchase order analyzer.
#[derive(Debug, Clone)]
pub struct PurchaseOrderAnalyzer {
    config: PoConfig,
    reconstructor: TableReconstructor,
    mapper: LineItemMapper,
    assembler: DealAssembler,
}

impl PurchaseOrderAnalyzer {
    /// Create an analyzer for the given configuration.
    pub fn new(config: PoConfig) -> Result<Self> {
        let assembler = DealAssembler::new(&config)?;
        Ok(Self {
            mapper: LineItemMapper::new(config.headers.clone()),
            reconstructor: TableReconstructor::new(),
            assembler,
            config,
        })
    }

    /// Create an analyzer with the default dictionaries.
    pub fn with_defaults() -> Result<Self> {
        Self::new(PoConfig::default())
    }

    /// Set ABN checksum validation.
    pub fn with_abn_validation(mut self, validate: bool) -> Self {
        self.config.extraction.validate_abn = validate;
        self.sync_assembler()
    }

    /// Set the expense line item fallback.
    pub fn with_expense_line_items(mut self, enabled: bool) -> Self {
        self.config.extraction.use_expense_line_items = enabled;
        self.sync_assembler()
    }

    /// Set whether QUERY answers feed the summary fields.
    pub fn with_query_fields(mut self, enabled: bool) -> Self {
        self.config.extraction.use_query_fields = enabled;
        self.sync_assembler()
    }

    fn sync_assembler(mut self) -> Self {
        self.assembler = self.assembler.with_config(self.config.extraction.clone());
        self
    }

    pub fn config(&self) -> &PoConfig {
        &self.config
    }

    /// Reconstruct and map every table in the graph.
    pub fn tables(&self, graph: &BlockGraph<'_>) -> Vec<AnalyzedTable> {
        graph
            .tables()
            .enumerate()
            .map(|(index, table)| {
                let grid = self.reconstructor.reconstruct(graph, table);
                let mapped = self.mapper.map(&grid);

                AnalyzedTable {
                    report: TableReport {
                        index,
                        table_id: table.id.clone(),
                        page: table.page,
                        rows: grid.row_count(),
                        columns: grid.column_count(),
                        header_row: mapped.header_row,
                        line_items: mapped.line_items.len(),
                        skipped_rows: mapped.skipped_rows,
                    },
                    grid,
                    line_items: mapped.line_items,
                }
            })
            .collect()
    }

    fn summary_fields(&self, graph: &BlockGraph<'_>, document: &AnalyzedDocument) -> Vec<SummaryField> {
        let mut fields = Vec::new();

        if self.config.extraction.use_query_fields {
            fields.extend(graph.query_answers().iter().filter_map(SummaryField::from_query));
        }
        fields.extend(document.summary_fields().filter_map(SummaryField::from_expense));

        debug!("Collected {} summary fields", fields.len());
        fields
    }
}

impl DealExtractor for PurchaseOrderAnalyzer {
    fn extract(
        &self,
        document: &AnalyzedDocument,
        context: &DocumentContext,
    ) -> Result<ExtractionResult> {
        let start = Instant::now();
        let mut warnings = Vec::new();

        if document.is_empty() {
            return Err(ExtractionError::NoData.into());
        }

        info!(
            "Analyzing document with {} blocks and {} expense documents",
            document.blocks.len(),
            document.expense_documents.len()
        );

        let graph = BlockGraph::new(&document.blocks)?;

        // Line items from tables
        let tables = self.tables(&graph);
        let mut line_items = Vec::new();
        for table in &tables {
            if table.report.header_row.is_none() {
                warnings.push(format!("No header row in table {}", table.report.index + 1));
            }
            line_items.extend(table.line_items.iter().cloned());
        }

        let mut source = if line_items.is_empty() {
            LineItemSource::None
        } else {
            LineItemSource::Tables
        };

        if line_items.is_empty() && self.config.extraction.use_expense_line_items {
            line_items = self
                .assembler
                .expense_line_items(document.expense_line_items());
            if !line_items.is_empty() {
                debug!("Using {} expense line items", line_items.len());
                source = LineItemSource::ExpenseGroups;
            }
        }

        // Summary fields
        let fields = self.summary_fields(&graph, document);
        let mut deal = self.assembler.assemble(&fields, line_items, context);

        let validation_issues = deal.validate();
        if !validation_issues.is_empty() {
            warn!("Deal {:?} has {} issues", deal.deal_name, validation_issues.len());
            warnings.extend(validation_issues);
        }

        let processing_time_ms = start.elapsed().as_millis() as u64;
        deal.metadata.tables_found = tables.len();
        deal.metadata.tables_with_header = tables
            .iter()
            .filter(|t| t.report.header_row.is_some())
            .count();
        deal.metadata.line_item_source = source;
        deal.metadata.processing_time_ms = Some(processing_time_ms);
        deal.metadata.warnings = warnings.clone();

        info!(
            "Extracted deal {:?} with {} line items from {} tables",
            deal.deal_name,
            deal.line_items.len(),
            tables.len()
        );

        Ok(ExtractionResult {
            deal,
            tables: tables.into_iter().map(|t| t.report).collect(),
            form_fields: graph.key_value_pairs(),
            warnings,
            processing_time_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PoError;
    use crate::models::block::{Block, BlockType, Query, RelationshipType};
    use crate::provider::{ExpenseDocument, ExpenseField, ExpenseLineItem, LineItemGroup};
    use rust_decimal::Decimal;

    fn cell(id: &str, row: u32, column: u32, text: &str) -> Vec<Block> {
        let word = format!("{id}-w");
        vec![
            Block::cell(id, row, column).with_children([word.clone()]),
            Block::word(word, text),
        ]
    }

    fn table_document(rows: &[&[&str]]) -> AnalyzedDocument {
        let mut blocks = Vec::new();
        let mut cell_ids = Vec::new();
        for (r, row) in rows.iter().enumerate() {
            for (c, text) in row.iter().enumerate() {
                let id = format!("c{}-{}", r + 1, c + 1);
                blocks.extend(cell(&id, r as u32 + 1, c as u32 + 1, text));
                cell_ids.push(id);
            }
        }
        blocks.push(Block::new("t1", BlockType::Table).with_children(cell_ids));
        AnalyzedDocument::new(blocks)
    }

    fn expense_document(fields: Vec<ExpenseField>, items: Vec<ExpenseLineItem>) -> ExpenseDocument {
        ExpenseDocument {
            expense_index: Some(1),
            summary_fields: fields,
            line_item_groups: vec![LineItemGroup {
                line_item_group_index: Some(1),
                line_items: items,
            }],
        }
    }

    #[test]
    fn test_extract_from_table_and_summary() {
        let document = table_document(&[
            &["Part #", "Description", "Qty", "Unit Price"],
            &["AB-100", "Rubber mat", "4", "$12.50"],
        ])
        .with_expense_documents(vec![expense_document(
            vec![
                ExpenseField::new("PO_NUMBER", "PO-4471"),
                ExpenseField::new("TOTAL", "$50.00"),
                ExpenseField::new("SUBTOTAL", "$50.00"),
            ],
            Vec::new(),
        )]);

        let analyzer = PurchaseOrderAnalyzer::with_defaults().unwrap();
        let result = analyzer.extract(&document, &DocumentContext::new()).unwrap();

        assert_eq!(result.deal.deal_name, "PO-4471");
        assert_eq!(result.deal.total, Decimal::new(5000, 2));
        assert_eq!(result.deal.line_items.len(), 1);
        assert_eq!(result.deal.metadata.line_item_source, LineItemSource::Tables);
        assert_eq!(result.tables.len(), 1);
        assert_eq!(result.tables[0].header_row, Some(1));
        assert_eq!(result.tables[0].line_items, 1);
    }

    #[test]
    fn test_expense_line_item_fallback() {
        let items = vec![ExpenseLineItem {
            line_item_expense_fields: vec![
                ExpenseField::new("ITEM", "Safety cone"),
                ExpenseField::new("QUANTITY", "10"),
            ],
        }];
        let document = table_document(&[&["Total", "$10.00"]])
            .with_expense_documents(vec![expense_document(Vec::new(), items)]);

        let analyzer = PurchaseOrderAnalyzer::with_defaults().unwrap();
        let result = analyzer.extract(&document, &DocumentContext::new()).unwrap();

        assert_eq!(result.deal.metadata.line_item_source, LineItemSource::ExpenseGroups);
        assert_eq!(result.deal.line_items[0].name.as_deref(), Some("Safety cone"));
        assert!(result.warnings.iter().any(|w| w.contains("No header row")));

        let analyzer = PurchaseOrderAnalyzer::with_defaults()
            .unwrap()
            .with_expense_line_items(false);
        let result = analyzer.extract(&document, &DocumentContext::new()).unwrap();
        assert!(result.deal.line_items.is_empty());
        assert_eq!(result.deal.metadata.line_item_source, LineItemSource::None);
    }

    #[test]
    fn test_query_answers_feed_summary() {
        let blocks = vec![
            Block {
                query: Some(Query {
                    text: "What is the purchase order number?".to_string(),
                    alias: Some("PO_NUMBER".to_string()),
                }),
                ..Block::new("q1", BlockType::Query)
            }
            .with_relationship(RelationshipType::Answer, ["r1"]),
            Block::new("r1", BlockType::QueryResult).with_text("PO-77"),
        ];
        let document = AnalyzedDocument::new(blocks);

        let analyzer = PurchaseOrderAnalyzer::with_defaults().unwrap();
        let result = analyzer.extract(&document, &DocumentContext::new()).unwrap();
        assert_eq!(result.deal.purchase_order_no.as_deref(), Some("PO-77"));

        let analyzer = analyzer.with_query_fields(false);
        let result = analyzer.extract(&document, &DocumentContext::new()).unwrap();
        assert!(result.deal.purchase_order_no.is_none());
    }

    #[test]
    fn test_empty_document_fails() {
        let analyzer = PurchaseOrderAnalyzer::with_defaults().unwrap();
        let err = analyzer
            .extract(&AnalyzedDocument::default(), &DocumentContext::new())
            .unwrap_err();

        assert!(matches!(err, PoError::Extraction(ExtractionError::NoData)));
    }

    #[test]
    fn test_cyclic_graph_fails() {
        let blocks = vec![
            Block::new("a", BlockType::Table).with_children(["b"]),
            Block::new("b", BlockType::Cell).with_children(["a"]),
        ];
        let analyzer = PurchaseOrderAnalyzer::with_defaults().unwrap();
        let err = analyzer
            .extract(&AnalyzedDocument::new(blocks), &DocumentContext::new())
            .unwrap_err();

        assert!(matches!(err, PoError::Graph(_)));
    }

    #[test]
    fn test_extraction_is_repeatable() {
        let document = table_document(&[
            &["Item", "Description", "Net Price"],
            &["X1", "Widget", "$5.00"],
            &["X2", "Gadget", "$7.00"],
        ]);
        let analyzer = PurchaseOrderAnalyzer::with_defaults().unwrap();

        let first = analyzer.extract(&document, &DocumentContext::new()).unwrap();
        let second = analyzer.extract(&document, &DocumentContext::new()).unwrap();

        assert_eq!(first.deal.line_items, second.deal.line_items);
        assert_eq!(first.tables, second.tables);
    }
}
