use crate::schema::{Field, LineItem};
use serde_json::Value;
use tracing::debug;

const UNKNOWN_LABEL: &str = "Unknown";

/// Label shown for a header field: `key`, then `name`, then "Unknown".
pub fn resolve_label(field: &Field) -> &str {
    field
        .key
        .as_deref()
        .or(field.name.as_deref())
        .unwrap_or(UNKNOWN_LABEL)
}

pub fn resolve_value(field: &Field) -> &str {
    field.value.as_deref().unwrap_or("")
}

/// Render a line item value as display text. Null becomes empty, never "null".
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Tabular view over line items. Columns come from the first item only;
/// later items are projected onto those columns.
pub struct LineItemTable<'a> {
    columns: Vec<&'a str>,
    items: &'a [LineItem],
}

impl<'a> LineItemTable<'a> {
    pub fn new(items: &'a [LineItem]) -> Self {
        let columns: Vec<&str> = items
            .first()
            .map(|first| first.keys().map(String::as_str).collect())
            .unwrap_or_default();

        for (idx, item) in items.iter().enumerate().skip(1) {
            let dropped: Vec<&str> = item
                .keys()
                .map(String::as_str)
                .filter(|key| !columns.contains(key))
                .collect();
            if !dropped.is_empty() {
                debug!(
                    item = idx + 1,
                    dropped = ?dropped,
                    "Line item has keys outside the first item's columns"
                );
            }
        }

        Self { columns, items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn columns(&self) -> &[&'a str] {
        &self.columns
    }

    /// Raw values per row in column order; `None` where the item lacks the column.
    pub fn raw_rows(&self) -> impl Iterator<Item = Vec<Option<&'a Value>>> + '_ {
        self.items
            .iter()
            .map(|item| self.columns.iter().map(|col| item.get(*col)).collect())
    }

    /// Display text per row in column order.
    pub fn rows(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.raw_rows().map(|row| {
            row.into_iter()
                .map(|value| value.map(scalar_text).unwrap_or_default())
                .collect()
        })
    }
}
