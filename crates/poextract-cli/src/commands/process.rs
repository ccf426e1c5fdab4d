//! Process command - extract a deal from a single analysis response.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use poextract_core::extraction::rules::format_abn;
use poextract_core::extraction::{DealExtractor, ExtractionResult, PurchaseOrderAnalyzer};
use poextract_core::models::deal::Deal;
use poextract_core::provider::{DocumentAnalysisProvider, JsonFileProvider};

use super::{ContextArgs, load_config};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Analysis response file (JSON, single or paginated)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    #[command(flatten)]
    context: ContextArgs,

    /// Show extraction warnings and timing
    #[arg(long)]
    show_report: bool,

    /// Validate extracted data
    #[arg(long)]
    validate: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one row per line item
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")?
            .progress_chars("##-"),
    );

    pb.set_message("Loading response...");
    pb.set_position(10);
    let provider = JsonFileProvider::new();
    let document = provider.analyze(&args.input)?;

    pb.set_message("Extracting deal...");
    pb.set_position(50);
    let context = args.context.to_context()?;
    let analyzer = PurchaseOrderAnalyzer::new(config)?;
    let result = analyzer.extract(&document, &context)?;

    pb.set_position(100);
    pb.finish_and_clear();

    if args.validate {
        let issues = result.deal.validate();
        if !issues.is_empty() {
            eprintln!("{}", style("Validation issues:").yellow());
            for issue in &issues {
                eprintln!("  - {}", issue);
            }
        }
    }

    let output = format_deal(&result.deal, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_report {
        print_report(&result);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn print_report(result: &ExtractionResult) {
    eprintln!();
    for table in &result.tables {
        let header = table
            .header_row
            .map(|r| format!("header row {}", r))
            .unwrap_or_else(|| "no header".to_string());
        eprintln!(
            "{} Table {} ({}x{}): {}, {} line items, {} rows skipped",
            style("ℹ").blue(),
            table.index + 1,
            table.rows,
            table.columns,
            header,
            table.line_items,
            table.skipped_rows
        );
    }
    for warning in &result.warnings {
        eprintln!("{} {}", style("⚠").yellow(), warning);
    }
    eprintln!(
        "{} Processing time: {}ms",
        style("ℹ").blue(),
        result.processing_time_ms
    );
}

pub fn format_deal(deal: &Deal, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(deal)?),
        OutputFormat::Csv => format_csv(deal),
        OutputFormat::Text => Ok(format_text(deal)),
    }
}

fn format_csv(deal: &Deal) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "deal_name",
        "purchase_order_no",
        "vendor",
        "abn",
        "sku",
        "name",
        "quantity",
        "unit_price",
        "discount",
        "net_price",
        "expense_raw",
    ])?;

    let po = deal.purchase_order_no.clone().unwrap_or_default();
    let vendor = deal.company.name.clone().unwrap_or_default();
    let abn = deal.company.abn.clone().unwrap_or_default();

    for item in &deal.line_items {
        wtr.write_record([
            &deal.deal_name,
            &po,
            &vendor,
            &abn,
            &item.sku.clone().unwrap_or_default(),
            &item.name.clone().unwrap_or_default(),
            &item.quantity.to_string(),
            &item.unit_price.to_string(),
            &item.discount.to_string(),
            &item.net_price.to_string(),
            &item.expense_raw,
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(deal: &Deal) -> String {
    let mut output = String::new();

    output.push_str(&format!("Deal: {}\n", deal.deal_name));
    if let Some(po) = &deal.purchase_order_no {
        output.push_str(&format!("PO number: {}\n", po));
    }
    if let Some(date) = &deal.delivery_date {
        output.push_str(&format!("Delivery date: {}\n", date));
    }
    output.push('\n');

    output.push_str("Vendor:\n");
    output.push_str(&format!("  {}\n", deal.company.name.as_deref().unwrap_or("-")));
    if let Some(abn) = &deal.company.abn {
        output.push_str(&format!("  ABN: {}\n", format_abn(abn)));
    }
    if let Some(domain) = &deal.company.domain {
        output.push_str(&format!("  {}\n", domain));
    }
    output.push('\n');

    output.push_str("Deliver to:\n");
    match &deal.delivery_address.error {
        Some(error) => output.push_str(&format!("  ({})\n", error)),
        None => output.push_str(&format!("  {}\n", deal.delivery_address.format())),
    }
    output.push('\n');

    output.push_str(&format!("Line items ({}):\n", deal.line_items.len()));
    for item in &deal.line_items {
        output.push_str(&format!(
            "  {:<12} {:<30} {:>8} x {:>10}\n",
            item.sku.as_deref().unwrap_or("-"),
            item.name.as_deref().unwrap_or("-"),
            item.quantity,
            item.unit_price
        ));
    }
    output.push('\n');

    output.push_str("Summary:\n");
    output.push_str(&format!("  Subtotal: {}\n", deal.sub_total));
    output.push_str(&format!("  Tax:      {}\n", deal.tax));
    output.push_str(&format!("  Total:    {}\n", deal.total));

    if let Some(notes) = &deal.order_notes {
        output.push_str(&format!("\nNotes: {}\n", notes));
    }

    output
}
