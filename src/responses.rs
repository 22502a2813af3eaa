use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// One canned reply, keyed by intent label.
#[derive(Debug, Clone, Deserialize)]
pub struct IntentResponse {
    pub intent: String,
    pub response: String,
}

/// Static intent → reply mapping, loaded once at startup and read-only
/// thereafter. Labels need not be unique; the first match wins.
#[derive(Debug, Clone, Deserialize)]
pub struct IntentResponseTable {
    #[serde(rename = "intentResponses")]
    entries: Vec<IntentResponse>,
}

impl IntentResponseTable {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read response file {:?}", path))?;
        let table: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse response file {:?}", path))?;

        info!("loaded {} intent responses from {:?}", table.entries.len(), path);
        Ok(table)
    }

    pub fn from_entries(entries: Vec<IntentResponse>) -> Self {
        Self { entries }
    }

    /// First reply whose intent matches the label.
    pub fn reply_for(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.intent == label)
            .map(|entry| entry.response.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
