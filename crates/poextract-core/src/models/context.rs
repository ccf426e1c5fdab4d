//! Contextual metadata that accompanies a document.

use serde::{Deserialize, Serialize};

/// Message the document arrived with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentContext {
    /// Sender address or display name.
    pub sender: Option<String>,

    /// Message subject; fallback deal name.
    pub subject: Option<String>,

    /// Raw message body.
    pub message: Option<String>,
}

impl DocumentContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
