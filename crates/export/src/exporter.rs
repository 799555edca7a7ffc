use crate::error::Result;
use crate::filename::export_file_name;
use crate::format::ExportFormat;
use crate::json::JsonView;
use crate::sink::{ExportPayload, FileSink};
use crate::xlsx::{BundledLoader, WorkbookLoader, build_workbook};
use crate::{csv_export, json, markdown, text};
use extract::Extraction;
use tracing::{debug, info, warn};

/// Turns extractions into downloadable files.
pub struct Exporter<L = BundledLoader> {
    loader: L,
    json_view: JsonView,
}

impl Default for Exporter<BundledLoader> {
    fn default() -> Self {
        Self::new(BundledLoader)
    }
}

impl<L: WorkbookLoader> Exporter<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            json_view: JsonView::default(),
        }
    }

    pub fn with_json_view(mut self, view: JsonView) -> Self {
        self.json_view = view;
        self
    }

    /// Encode without saving. Only the spreadsheet path awaits anything.
    pub async fn encode(&self, extraction: &Extraction, format: ExportFormat) -> Result<ExportPayload> {
        let bytes = match format {
            ExportFormat::Json => json::encode(extraction, self.json_view)?.into_bytes(),
            ExportFormat::Text => text::encode(extraction).into_bytes(),
            ExportFormat::Markdown => markdown::encode(extraction).into_bytes(),
            ExportFormat::Csv => csv_export::encode(extraction)?.into_bytes(),
            ExportFormat::Xlsx => {
                let writer = self.loader.load().await.inspect_err(|e| {
                    warn!(file_name = %extraction.file_name, error = %e, "Spreadsheet writer failed to load");
                })?;
                writer.write(&build_workbook(extraction))?
            }
        };

        let payload = ExportPayload {
            file_name: export_file_name(&extraction.file_name, format),
            mime_type: format.mime_type(),
            bytes,
        };
        debug!(
            format = %format,
            file_name = %payload.file_name,
            bytes = payload.bytes.len(),
            "Encoded export"
        );
        Ok(payload)
    }

    /// Encode, then hand the result to `sink`. Nothing reaches the sink if encoding fails.
    pub async fn export<S: FileSink>(
        &self,
        extraction: &Extraction,
        format: ExportFormat,
        sink: &S,
    ) -> Result<ExportPayload> {
        let payload = self.encode(extraction, format).await?;
        sink.save(&payload)?;
        info!(
            extraction_id = %extraction.id,
            format = %format,
            file_name = %payload.file_name,
            "Export saved"
        );
        Ok(payload)
    }
}
