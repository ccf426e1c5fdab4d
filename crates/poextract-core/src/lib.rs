//! Core library for purchase order extraction.
//!
//! This crate provides:
//! - An arena-backed graph over document analysis blocks
//! - Table reconstruction from TABLE and CELL blocks
//! - Header discovery and line item mapping through a synonym dictionary
//! - Field normalization (amounts, delivery addresses, ABNs, order notes)
//! - Deal assembly from summary fields, query answers and expense documents

pub mod error;
pub mod extraction;
pub mod graph;
pub mod models;
pub mod provider;
pub mod table;

pub use error::{PoError, Result};
pub use extraction::{
    CanonicalField, DealExtractor, ExtractionResult, HeaderDictionary, LineItemMapper,
    PurchaseOrderAnalyzer, TableReport,
};
pub use graph::BlockGraph;
pub use models::block::{Block, BlockType};
pub use models::config::PoConfig;
pub use models::context::DocumentContext;
pub use models::deal::{Address, Company, Deal, LineItem};
pub use provider::{AnalyzedDocument, DocumentAnalysisProvider, JsonFileProvider};
pub use table::{Grid, TableReconstructor};
