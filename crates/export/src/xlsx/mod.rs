//! Spreadsheet export.
//!
//! Building the [`Workbook`] is pure and synchronous. Turning it into bytes
//! needs a [`WorkbookWriter`], which is obtained through a [`WorkbookLoader`]
//! so that the capability can be loaded lazily, or stubbed out in tests.

mod loader;
mod writer;

pub use loader::{BundledLoader, WorkbookLoader};
pub use writer::{MAX_CELL_CHARS, OoxmlWriter, WorkbookWriter, column_name};

use chrono::SecondsFormat;
use extract::{ExtractedData, Extraction, LineItemTable, TemplateData, resolve_label, resolve_value};
use serde_json::Value;

pub const GENERAL_SHEET: &str = "Extraction";
pub const HEADER_FIELDS_SHEET: &str = "Header Fields";
pub const LINE_ITEMS_SHEET: &str = "Line Items";

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Primitives keep their native type; null becomes empty text; anything
    /// else is stored as its JSON text.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Cell::Text(String::new()),
            Some(Value::String(s)) => Cell::Text(s.clone()),
            Some(Value::Bool(b)) => Cell::Bool(*b),
            Some(Value::Number(n)) => match n.as_f64() {
                Some(f) if f.is_finite() => Cell::Number(f),
                _ => Cell::Text(n.to_string()),
            },
            Some(other) => Cell::Text(other.to_string()),
        }
    }
}

/// A row with no cells is written as a blank row.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

pub fn build_workbook(extraction: &Extraction) -> Workbook {
    match &extraction.extracted_data {
        ExtractedData::General(data) => {
            let mut sheet = Sheet::new(GENERAL_SHEET);
            sheet.push_row(vec![Cell::text("Field"), Cell::text("Value")]);
            sheet.push_row(vec![
                Cell::text("Document Type"),
                Cell::text(extraction.document_type.as_str()),
            ]);
            sheet.push_row(vec![
                Cell::text("File Name"),
                Cell::text(extraction.file_name.as_str()),
            ]);
            sheet.push_row(vec![
                Cell::text("Extracted"),
                Cell::text(
                    extraction
                        .created_at
                        .to_rfc3339_opts(SecondsFormat::Millis, true),
                ),
            ]);
            sheet.push_row(Vec::new());
            let content = if !data.markdown.is_empty() {
                &data.markdown
            } else {
                &data.text
            };
            sheet.push_row(vec![Cell::text("Content"), Cell::text(content.as_str())]);

            Workbook {
                sheets: vec![sheet],
            }
        }
        ExtractedData::Template(data) => build_template(data),
    }
}

fn build_template(data: &TemplateData) -> Workbook {
    let mut workbook = Workbook::default();

    if !data.header_fields.is_empty() {
        let mut sheet = Sheet::new(HEADER_FIELDS_SHEET);
        sheet.push_row(vec![Cell::text("Field"), Cell::text("Value")]);
        for field in &data.header_fields {
            sheet.push_row(vec![
                Cell::text(resolve_label(field)),
                Cell::text(resolve_value(field)),
            ]);
        }
        workbook.sheets.push(sheet);
    }

    let table = LineItemTable::new(&data.line_items);
    if !table.is_empty() {
        let mut sheet = Sheet::new(LINE_ITEMS_SHEET);
        sheet.push_row(table.columns().iter().map(|c| Cell::text(*c)).collect());
        for row in table.raw_rows() {
            sheet.push_row(row.into_iter().map(Cell::from_value).collect());
        }
        workbook.sheets.push(sheet);
    }

    // A package needs at least one sheet.
    if workbook.sheets.is_empty() {
        let mut sheet = Sheet::new(HEADER_FIELDS_SHEET);
        sheet.push_row(vec![Cell::text("Field"), Cell::text("Value")]);
        workbook.sheets.push(sheet);
    }

    workbook
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{general, invoice, line_item, template};
    use extract::Field;
    use serde_json::json;

    #[test]
    fn test_general_sheet_layout() {
        let workbook = build_workbook(&general("plain", "# Notes"));
        assert_eq!(workbook.sheets.len(), 1);

        let sheet = workbook.sheet(GENERAL_SHEET).unwrap();
        assert_eq!(sheet.rows.len(), 6);
        assert_eq!(
            sheet.rows[3],
            vec![Cell::text("Extracted"), Cell::text("2024-03-15T14:30:05.000Z")]
        );
        assert!(sheet.rows[4].is_empty());
        assert_eq!(sheet.rows[5], vec![Cell::text("Content"), Cell::text("# Notes")]);
    }

    #[test]
    fn test_template_sheets_keep_native_types() {
        let workbook = build_workbook(&invoice());
        let names: Vec<&str> = workbook.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, [HEADER_FIELDS_SHEET, LINE_ITEMS_SHEET]);

        let header = workbook.sheet(HEADER_FIELDS_SHEET).unwrap();
        assert_eq!(header.rows[3], vec![Cell::text("Total"), Cell::text("1234.50")]);

        let items = workbook.sheet(LINE_ITEMS_SHEET).unwrap();
        assert_eq!(items.rows.len(), 3);
        assert_eq!(
            items.rows[1],
            vec![
                Cell::text("Widget"),
                Cell::Number(2.0),
                Cell::Number(9.99),
                Cell::Bool(true)
            ]
        );
    }

    #[test]
    fn test_empty_line_items_have_no_sheet() {
        let workbook = build_workbook(&template(vec![Field::new("Vendor", "Acme")], Vec::new()));
        assert!(workbook.sheet(LINE_ITEMS_SHEET).is_none());
        assert!(workbook.sheet(HEADER_FIELDS_SHEET).is_some());
    }

    #[test]
    fn test_empty_template_still_has_a_sheet() {
        let workbook = build_workbook(&template(Vec::new(), Vec::new()));
        assert_eq!(workbook.sheets.len(), 1);
        assert_eq!(workbook.sheets[0].rows.len(), 1);
    }

    #[test]
    fn test_unlabelled_field_reads_unknown() {
        let unlabelled = Field {
            key: None,
            name: None,
            value: Some("42".to_string()),
        };
        let named = Field {
            key: None,
            name: Some("Due Date".to_string()),
            value: None,
        };
        let workbook = build_workbook(&template(vec![unlabelled, named], Vec::new()));
        let header = workbook.sheet(HEADER_FIELDS_SHEET).unwrap();
        assert_eq!(header.rows[1], vec![Cell::text("Unknown"), Cell::text("42")]);
        assert_eq!(header.rows[2], vec![Cell::text("Due Date"), Cell::text("")]);
    }

    #[test]
    fn test_cell_from_value() {
        assert_eq!(Cell::from_value(None), Cell::text(""));
        assert_eq!(Cell::from_value(Some(&json!(null))), Cell::text(""));
        assert_eq!(Cell::from_value(Some(&json!([1, 2]))), Cell::text("[1,2]"));
        assert_eq!(Cell::from_value(Some(&json!(-3))), Cell::Number(-3.0));
    }

    #[test]
    fn test_columns_follow_first_item() {
        let items = vec![
            line_item(json!({"A": 1, "B": 2})),
            line_item(json!({"A": 3, "B": 4, "C": 5})),
        ];
        let workbook = build_workbook(&template(Vec::new(), items));
        let sheet = workbook.sheet(LINE_ITEMS_SHEET).unwrap();
        assert_eq!(sheet.rows[0], vec![Cell::text("A"), Cell::text("B")]);
        assert_eq!(sheet.rows[2], vec![Cell::Number(3.0), Cell::Number(4.0)]);
    }
}
