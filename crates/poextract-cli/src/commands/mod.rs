//! Subcommands.

pub mod batch;
pub mod config;
pub mod inspect;
pub mod process;

use std::path::Path;

use poextract_core::models::config::PoConfig;
use poextract_core::models::context::DocumentContext;

/// Load the configuration given on the command line, else the default file,
/// else built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<PoConfig> {
    if let Some(path) = config_path {
        return Ok(PoConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        return Ok(PoConfig::from_file(&default_path)?);
    }

    Ok(PoConfig::default())
}

/// Message context shared by `process` and `batch`.
#[derive(clap::Args, Clone, Debug, Default)]
pub struct ContextArgs {
    /// Sender of the accompanying message (sales rep)
    #[arg(long)]
    pub sender: Option<String>,

    /// Message subject, used as the deal name when there is no PO number
    #[arg(long)]
    pub subject: Option<String>,

    /// File holding the message body, for order notes
    #[arg(long)]
    pub message_file: Option<std::path::PathBuf>,
}

impl ContextArgs {
    pub fn to_context(&self) -> anyhow::Result<DocumentContext> {
        let message = match &self.message_file {
            Some(path) => Some(std::fs::read_to_string(path)?),
            None => None,
        };

        Ok(DocumentContext {
            sender: self.sender.clone(),
            subject: self.subject.clone(),
            message,
        })
    }
}
