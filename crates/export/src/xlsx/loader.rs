use super::writer::{OoxmlWriter, WorkbookWriter};
use crate::error::Result;
use std::future::Future;

/// Obtains a spreadsheet writer at export time. A failed load surfaces as
/// [`ExportError::Load`](crate::ExportError::Load).
pub trait WorkbookLoader: Send + Sync {
    fn load(&self) -> impl Future<Output = Result<Box<dyn WorkbookWriter>>> + Send;
}

/// The writer compiled into this crate; loading cannot fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledLoader;

impl WorkbookLoader for BundledLoader {
    async fn load(&self) -> Result<Box<dyn WorkbookWriter>> {
        Ok(Box::new(OoxmlWriter))
    }
}
