//! Shared extraction records for encoder tests.

use chrono::{DateTime, TimeZone, Utc};
use extract::{
    DocumentType, ExtractedData, Extraction, ExtractionStatus, Field, GeneralData, LineItem, Page,
    TemplateData,
};
use serde_json::{Value, json};

pub fn created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 5).unwrap()
}

pub fn line_item(value: Value) -> LineItem {
    match value {
        Value::Object(map) => map,
        other => panic!("line item must be an object, got {other}"),
    }
}

pub fn general(text: &str, markdown: &str) -> Extraction {
    Extraction {
        id: "gen-1".to_string(),
        file_name: "notes.pdf".to_string(),
        document_type: DocumentType::General,
        status: ExtractionStatus::Completed,
        pages_processed: 2,
        file_size: 20_480,
        created_at: created_at(),
        extracted_data: ExtractedData::General(GeneralData {
            markdown: markdown.to_string(),
            text: text.to_string(),
            pages: vec![
                Page {
                    page_number: 1,
                    ..Page::default()
                },
                Page {
                    page_number: 2,
                    ..Page::default()
                },
            ],
        }),
    }
}

pub fn template(header_fields: Vec<Field>, line_items: Vec<LineItem>) -> Extraction {
    Extraction {
        id: "inv-1".to_string(),
        file_name: "invoice-0042.pdf".to_string(),
        document_type: DocumentType::Invoice,
        status: ExtractionStatus::Completed,
        pages_processed: 1,
        file_size: 8_192,
        created_at: created_at(),
        extracted_data: ExtractedData::Template(TemplateData {
            header_fields,
            line_items,
        }),
    }
}

pub fn invoice() -> Extraction {
    template(
        vec![
            Field::new("Vendor", "Acme Corp"),
            Field::new("Invoice Number", "INV-0042"),
            Field {
                key: None,
                name: Some("Total".to_string()),
                value: Some("1234.50".to_string()),
            },
        ],
        vec![
            line_item(json!({
                "Description": "Widget",
                "Quantity": 2,
                "Unit Price": 9.99,
                "Taxable": true
            })),
            line_item(json!({
                "Description": "Bolts | M4",
                "Quantity": 100,
                "Unit Price": 0.05,
                "Taxable": false
            })),
        ],
    )
}
