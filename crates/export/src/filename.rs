use crate::format::ExportFormat;
use regex::Regex;
use std::sync::LazyLock;

// Last dot and what follows, as long as it stays within the final path segment.
static EXTENSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.[^./\\]+$").unwrap());

/// Strip the trailing extension, if any.
pub fn base_name(file_name: &str) -> &str {
    match EXTENSION.find(file_name) {
        Some(m) => &file_name[..m.start()],
        None => file_name,
    }
}

/// `report.pdf` -> `report.csv`; `a.b.pdf` -> `a.b.csv`; `report` -> `report.csv`.
pub fn export_file_name(original: &str, format: ExportFormat) -> String {
    format!("{}.{}", base_name(original), format.extension())
}
