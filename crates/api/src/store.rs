use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use extract::{DocumentType, Extraction, ExtractionStatus};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

/// Extractions this service can export, keyed by id.
pub struct ExtractionStore {
    records: DashMap<String, Extraction>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionSummary {
    pub id: String,
    pub file_name: String,
    pub document_type: DocumentType,
    pub status: ExtractionStatus,
    pub page_count: u32,
    pub created_at: DateTime<Utc>,
}

impl ExtractionStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn get(&self, id: &str) -> Option<Extraction> {
        self.records.get(id).map(|r| r.value().clone())
    }

    /// Store a record, assigning a fresh id if it has none. Returns the id.
    pub fn insert(&self, mut extraction: Extraction) -> String {
        if extraction.id.is_empty() {
            extraction.id = Uuid::new_v4().to_string();
        }
        let id = extraction.id.clone();
        self.records.insert(id.clone(), extraction);
        id
    }

    /// Newest first.
    pub fn list(&self) -> Vec<ExtractionSummary> {
        let mut summaries: Vec<ExtractionSummary> = self
            .records
            .iter()
            .map(|r| {
                let e = r.value();
                ExtractionSummary {
                    id: e.id.clone(),
                    file_name: e.file_name.clone(),
                    document_type: e.document_type.clone(),
                    status: e.status,
                    page_count: e.page_count(),
                    created_at: e.created_at,
                }
            })
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        summaries
    }

    /// Load every `*.json` file in `dir`. Files that do not parse are skipped.
    pub async fn load_dir(&self, dir: &Path) -> Result<usize> {
        let mut entries = fs::read_dir(dir)
            .await
            .context(format!("Failed to read data directory: {:?}", dir))?;

        let mut loaded = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            match read_record(&path).await {
                Ok(extraction) => {
                    let id = self.insert(extraction);
                    debug!(id = %id, path = %path.display(), "Loaded extraction");
                    loaded += 1;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable extraction file");
                }
            }
        }

        Ok(loaded)
    }
}

impl Default for ExtractionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// A file holds either a bare extraction or an `{ "extraction": ... }` envelope.
async fn read_record(path: &Path) -> Result<Extraction> {
    let raw = fs::read_to_string(path)
        .await
        .context(format!("Failed to read file: {:?}", path))?;
    let mut value: Value = serde_json::from_str(&raw).context("Invalid JSON")?;

    if let Some(inner) = value.get_mut("extraction") {
        value = inner.take();
    }

    serde_json::from_value(value).context("Not an extraction record")
}
