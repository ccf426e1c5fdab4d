//! Purchase order extraction: header mapping, field rules and deal assembly.

pub mod analyzer;
pub mod assembler;
pub mod header;
pub mod mapper;
pub mod rules;

pub use analyzer::{AnalyzedTable, DealExtractor, ExtractionResult, PurchaseOrderAnalyzer, TableReport};
pub use assembler::{DealAssembler, SummaryField, SummaryFieldType};
pub use header::{CanonicalField, HeaderDictionary, HeaderSynonym};
pub use mapper::{LineItemMapper, MappedTable};
