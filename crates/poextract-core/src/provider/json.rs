//! Provider backed by pre-computed JSON responses on disk.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use super::{AnalyzedDocument, DocumentAnalysisProvider, Result};
use crate::error::ProviderError;

/// Reads a saved analysis response (single or paginated) from a file.
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    /// Treat a response with no blocks and no expense documents as an error.
    require_content: bool,
}

impl JsonFileProvider {
    pub fn new() -> Self {
        Self {
            require_content: true,
        }
    }

    /// Accept empty responses instead of failing.
    pub fn allow_empty(mut self) -> Self {
        self.require_content = false;
        self
    }

    /// Parse a response already held in memory.
    pub fn parse(&self, json: &str) -> Result<AnalyzedDocument> {
        let document = AnalyzedDocument::from_json(json)?;
        if self.require_content && document.is_empty() {
            return Err(ProviderError::EmptyDocument);
        }
        Ok(document)
    }
}

impl Default for JsonFileProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentAnalysisProvider for JsonFileProvider {
    fn analyze(&self, source: &Path) -> Result<AnalyzedDocument> {
        info!("Loading analysis response from {}", source.display());

        let json = fs::read_to_string(source).map_err(|source_err| ProviderError::Read {
            path: source.to_path_buf(),
            source: source_err,
        })?;

        let document = self.parse(&json)?;
        debug!(
            "Loaded {} blocks and {} expense documents",
            document.blocks.len(),
            document.expense_documents.len()
        );
        Ok(document)
    }

    fn name(&self) -> &str {
        "json-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_is_read_error() {
        let provider = JsonFileProvider::new();
        let err = provider
            .analyze(Path::new("/nonexistent/response.json"))
            .unwrap_err();

        assert!(matches!(err, ProviderError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/response.json"));
    }

    #[test]
    fn test_empty_response_rejected_by_default() {
        let provider = JsonFileProvider::new();
        assert!(matches!(provider.parse("{}"), Err(ProviderError::EmptyDocument)));

        let lenient = JsonFileProvider::new().allow_empty();
        assert!(lenient.parse("{}").unwrap().is_empty());
    }

    #[test]
    fn test_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("response.json");
        let mut file = fs::File::create(&path).unwrap();
        write!(file, r#"{{"Blocks": [{{"Id": "w1", "BlockType": "WORD", "Text": "Hi"}}]}}"#).unwrap();

        let document = JsonFileProvider::new().analyze(&path).unwrap();
        assert_eq!(document.blocks[0].text.as_deref(), Some("Hi"));
    }
}
