//! Inspect command - show what the analyzer sees in a response.

use std::path::PathBuf;

use clap::Args;
use console::style;

use poextract_core::graph::BlockGraph;
use poextract_core::models::block::BlockType;
use poextract_core::provider::{DocumentAnalysisProvider, JsonFileProvider};
use poextract_core::extraction::{PurchaseOrderAnalyzer, SummaryField};

use super::load_config;

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Analysis response file
    #[arg(required = true)]
    input: PathBuf,

    /// Also list form fields, query answers and expense summary fields
    #[arg(long)]
    fields: bool,
}

pub async fn run(args: InspectArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let document = JsonFileProvider::new().allow_empty().analyze(&args.input)?;
    let graph = BlockGraph::new(&document.blocks)?;
    let analyzer = PurchaseOrderAnalyzer::new(config)?;

    println!(
        "{} {} blocks, {} pages, {} expense documents",
        style("ℹ").blue(),
        graph.len(),
        graph.blocks_of_type(BlockType::Page).count(),
        document.expense_documents.len()
    );

    let tables = analyzer.tables(&graph);
    if tables.is_empty() {
        println!("{}", style("No tables found").yellow());
    }

    for table in &tables {
        let report = &table.report;
        println!();
        println!(
            "{} ({} rows x {} columns{})",
            style(format!("Table {}", report.index + 1)).bold(),
            report.rows,
            report.columns,
            report.page.map(|p| format!(", page {}", p)).unwrap_or_default()
        );
        println!("{}", table.grid.to_text());

        match report.header_row {
            Some(row) => println!(
                "{} header row {}, {} line items, {} rows skipped",
                style("✓").green(),
                row,
                report.line_items,
                report.skipped_rows
            ),
            None => println!("{} no header row", style("✗").red()),
        }
    }

    if args.fields {
        println!();
        println!("{}", style("Form fields:").bold());
        for kv in graph.key_value_pairs() {
            println!("  {} = {}", kv.key, kv.value);
        }

        println!("{}", style("Query answers:").bold());
        for answer in graph.query_answers() {
            println!(
                "  [{}] {} = {}",
                answer.alias.as_deref().unwrap_or("-"),
                answer.question,
                answer.answer.as_deref().unwrap_or("")
            );
        }

        println!("{}", style("Summary fields:").bold());
        for field in document.summary_fields().filter_map(SummaryField::from_expense) {
            println!(
                "  {:?} ({}) = {}",
                field.field_type,
                field.label.as_deref().unwrap_or("-"),
                field.value.replace('\n', " ")
            );
        }
    }

    Ok(())
}
