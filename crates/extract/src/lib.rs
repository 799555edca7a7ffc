pub mod client;
pub mod normalizer;
pub mod retry;
pub mod schema;

pub use client::ExtractionClient;
pub use normalizer::{LineItemTable, resolve_label, resolve_value, scalar_text};
pub use retry::RetryPolicy;
pub use schema::{
    DocumentType, ExtractedData, Extraction, ExtractionEnvelope, ExtractionStatus, Field,
    GeneralData, LineItem, Page, TemplateData,
};
