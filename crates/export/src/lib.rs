//! Export of finished extractions as JSON, plain text, Markdown, CSV and XLSX.
//!
//! Every encoder is a pure function of the [`Extraction`](extract::Extraction)
//! it is given. [`Exporter`] ties them together with file naming and a
//! [`FileSink`].

pub mod csv_export;
pub mod error;
pub mod exporter;
pub mod filename;
pub mod format;
pub mod json;
pub mod markdown;
pub mod sink;
pub mod text;
pub mod xlsx;

#[cfg(test)]
mod fixtures;

pub use error::{ExportError, Result};
pub use exporter::Exporter;
pub use filename::{base_name, export_file_name};
pub use format::{ExportFormat, UnknownFormat};
pub use json::JsonView;
pub use sink::{DirectorySink, ExportPayload, FileSink, MemorySink};
pub use xlsx::{BundledLoader, OoxmlWriter, Workbook, WorkbookLoader, WorkbookWriter};
