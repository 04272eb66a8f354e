//! Document text extraction.
//!
//! Converts a downloaded file's bytes to plain text based on file type.
//! Only the extraction contract lives here: plain text and CSV pass
//! through, HTML is tag-stripped, and formats needing a dedicated parser
//! yield empty text, which the retrieval pipeline reports as missing
//! content.

use crate::storage::FileStorage;
use crate::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Boundary trait: resolve a document URL to its plain text.
#[async_trait::async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract the document's full text. Empty text means the content could
    /// not be extracted.
    async fn extract(&self, file_url: &str, api_key: &str) -> Result<String>;
}

/// Extractor that downloads through [`FileStorage`] and dispatches on the
/// file extension.
pub struct StorageTextExtractor {
    storage: Arc<dyn FileStorage>,
}

impl StorageTextExtractor {
    pub fn new(storage: Arc<dyn FileStorage>) -> Self {
        Self { storage }
    }
}

#[async_trait::async_trait]
impl TextExtractor for StorageTextExtractor {
    async fn extract(&self, file_url: &str, api_key: &str) -> Result<String> {
        let file = self.storage.download(file_url, api_key).await?;
        Ok(extract_text(&file.filename, &file.bytes))
    }
}

/// Extract text from raw bytes based on file type. Pure function.
pub fn extract_text(filename: &str, bytes: &[u8]) -> String {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match extension.as_str() {
        "html" | "htm" => html_to_text(&String::from_utf8_lossy(bytes)),
        "pdf" => {
            warn!(file = filename, "no PDF parser configured, treating content as missing");
            String::new()
        }
        // txt, csv and anything unrecognized: best-effort text decode.
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Visible text of an HTML document, script and style content excluded,
/// one line per text node.
fn html_to_text(html: &str) -> String {
    let document = scraper::Html::parse_document(html);
    let mut lines = Vec::new();
    for node in document.root_element().descendants() {
        if let Some(text) = node.value().as_text() {
            let excluded = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map(|element| matches!(element.name(), "script" | "style"))
                    .unwrap_or(false)
            });
            if excluded {
                continue;
            }
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed.to_string());
            }
        }
    }
    lines.join("\n")
}
