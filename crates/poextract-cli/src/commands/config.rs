//! Config command - manage configuration.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;

use serde_json::Value;

use poextract_core::extraction::CanonicalField;
use poextract_core::models::config::PoConfig;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Initialize a new configuration file
    Init(InitArgs),

    /// Get a specific configuration value
    Get {
        /// Configuration key (e.g., "extraction.validate_abn")
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// New value
        value: String,
    },

    /// Map another table header label to a line item field
    AddHeader {
        /// Header label as printed on documents
        label: String,
        /// Field: SKU, Name, Quantity, UnitPrice, Discount or NetPrice
        field: String,
    },

    /// Show configuration file path
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Output path for configuration file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config_path = config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    match args.command {
        ConfigCommand::Show => show_config(&config_path),
        ConfigCommand::Init(init_args) => init_config(init_args, &config_path),
        ConfigCommand::Get { key } => get_config(&config_path, &key),
        ConfigCommand::Set { key, value } => set_config(&config_path, &key, &value),
        ConfigCommand::AddHeader { label, field } => add_header(&config_path, &label, &field),
        ConfigCommand::Path => show_path(&config_path),
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("poextract")
        .join("config.json")
}

fn load(config_path: &Path) -> anyhow::Result<PoConfig> {
    if config_path.exists() {
        Ok(PoConfig::from_file(config_path)?)
    } else {
        Ok(PoConfig::default())
    }
}

fn show_config(config_path: &Path) -> anyhow::Result<()> {
    let config = if config_path.exists() {
        PoConfig::from_file(config_path)?
    } else {
        eprintln!(
            "{} No config file found, showing defaults.",
            style("ℹ").blue()
        );
        PoConfig::default()
    };

    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}

fn init_config(args: InitArgs, config_path: &Path) -> anyhow::Result<()> {
    let output_path = args.output.unwrap_or_else(|| config_path.to_path_buf());

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            output_path.display()
        );
    }

    save(&PoConfig::default(), &output_path)?;

    println!(
        "{} Created configuration file at {}",
        style("✓").green(),
        output_path.display()
    );

    Ok(())
}

fn get_config(config_path: &Path, key: &str) -> anyhow::Result<()> {
    let json = serde_json::to_value(load(config_path)?)?;

    let value = key
        .split('.')
        .try_fold(&json, |current, part| match part.parse::<usize>() {
            Ok(i) if current.is_array() => current.get(i),
            _ => current.get(part),
        })
        .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))?;

    println!("{}", serde_json::to_string_pretty(value)?);

    Ok(())
}

fn set_config(config_path: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let config = load(config_path)?;

    // Bare words are taken as strings
    let parsed_value: Value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));

    let mut json = serde_json::to_value(&config)?;
    let slot = key
        .split('.')
        .try_fold(&mut json, |current, part| match part.parse::<usize>() {
            Ok(i) if current.is_array() => current.get_mut(i),
            _ => current.get_mut(part),
        })
        .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))?;
    *slot = parsed_value.clone();

    let config: PoConfig = serde_json::from_value(json)
        .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))?;
    save(&config, config_path)?;

    println!(
        "{} Set {} = {}",
        style("✓").green(),
        key,
        serde_json::to_string(&parsed_value)?
    );

    Ok(())
}

fn add_header(config_path: &Path, label: &str, field: &str) -> anyhow::Result<()> {
    let field: CanonicalField = serde_json::from_value(Value::String(field.to_string()))
        .map_err(|_| {
            anyhow::anyhow!(
                "Unknown field {}; expected SKU, Name, Quantity, UnitPrice, Discount or NetPrice",
                field
            )
        })?;

    let mut config = load(config_path)?;
    if let Some(existing) = config.headers.lookup(label) {
        anyhow::bail!(
            "Header '{}' already maps to {}",
            existing.label,
            existing.field.as_str()
        );
    }

    config.headers = config.headers.with_synonym(label.trim().to_lowercase(), field);
    save(&config, config_path)?;

    println!(
        "{} Header '{}' now maps to {}",
        style("✓").green(),
        label.trim(),
        field.as_str()
    );

    Ok(())
}

fn save(config: &PoConfig, config_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    config.save(config_path)?;
    Ok(())
}

fn show_path(config_path: &Path) -> anyhow::Result<()> {
    println!("Configuration file: {}", config_path.display());

    if config_path.exists() {
        println!("Status: {}", style("exists").green());
    } else {
        println!("Status: {}", style("not created").yellow());
        println!();
        println!("Run 'poextract config init' to create a configuration file.");
    }

    Ok(())
}
