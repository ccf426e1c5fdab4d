//! Batch processing command for multiple analysis responses.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use poextract_core::extraction::{DealExtractor, PurchaseOrderAnalyzer};
use poextract_core::models::context::DocumentContext;
use poextract_core::models::deal::Deal;
use poextract_core::provider::JsonFileProvider;

use super::process::{OutputFormat, format_deal};
use super::{ContextArgs, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern for analysis response files
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    #[command(flatten)]
    context: ContextArgs,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    deal: Option<Deal>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("json"))
        })
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let analyzer = Arc::new(PurchaseOrderAnalyzer::new(config)?);
    let context = Arc::new(args.context.to_context()?);
    let semaphore = Arc::new(Semaphore::new(args.jobs.max(1)));
    info!("Processing {} files with {} workers", files.len(), args.jobs.max(1));

    let mut tasks = JoinSet::new();
    for (index, path) in files.iter().cloned().enumerate() {
        let analyzer = Arc::clone(&analyzer);
        let context = Arc::clone(&context);
        let semaphore = Arc::clone(&semaphore);

        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await?;
            let file_start = Instant::now();
            let task_path = path.clone();

            let result = tokio::task::spawn_blocking(move || {
                process_single_file(&task_path, &analyzer, &context)
            })
            .await
            .map_err(|e| anyhow::anyhow!("Worker panicked: {}", e))?;

            Ok::<_, anyhow::Error>((index, path, result, file_start.elapsed().as_millis() as u64))
        });
    }

    let mut results = Vec::with_capacity(files.len());
    while let Some(joined) = tasks.join_next().await {
        let (index, path, result, processing_time_ms) = joined??;

        match result {
            Ok(deal) => results.push((
                index,
                ProcessResult {
                    path,
                    deal: Some(deal),
                    error: None,
                    processing_time_ms,
                },
            )),
            Err(e) => {
                let error_msg = e.to_string();
                if !args.continue_on_error {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    tasks.abort_all();
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
                warn!("Failed to process {}: {}", path.display(), error_msg);
                results.push((
                    index,
                    ProcessResult {
                        path,
                        deal: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    },
                ));
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_and_clear();

    results.sort_by_key(|(index, _)| *index);
    let results: Vec<ProcessResult> = results.into_iter().map(|(_, r)| r).collect();

    let successful: Vec<_> = results.iter().filter(|r| r.deal.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            if let Some(deal) = &result.deal {
                let output_name = result
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("deal");
                let output_path =
                    output_dir.join(format!("{}.{}", output_name, args.format.extension()));

                fs::write(&output_path, format_deal(deal, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for result in &failed {
            eprintln!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_single_file(
    path: &Path,
    analyzer: &PurchaseOrderAnalyzer,
    context: &DocumentContext,
) -> poextract_core::Result<Deal> {
    let provider = JsonFileProvider::new();
    let result = analyzer.extract_from(&provider, path, context)?;
    Ok(result.deal)
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "deal_name",
        "purchase_order_no",
        "vendor",
        "abn",
        "total",
        "line_items",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        let processing_time_ms = result.processing_time_ms.to_string();

        if let Some(deal) = &result.deal {
            let total = deal.total.to_string();
            let line_items = deal.line_items.len().to_string();
            wtr.write_record([
                filename,
                "success",
                deal.deal_name.as_str(),
                deal.purchase_order_no.as_deref().unwrap_or(""),
                deal.company.name.as_deref().unwrap_or(""),
                deal.company.abn.as_deref().unwrap_or(""),
                total.as_str(),
                line_items.as_str(),
                processing_time_ms.as_str(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                "",
                processing_time_ms.as_str(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
