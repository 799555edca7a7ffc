use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One line item row: field name -> scalar value, in the order the backend sent them.
pub type LineItem = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DocumentType {
    General,
    Invoice,
    Bank,
    Contract,
    PurchaseOrder,
    Resume,
    Other(String),
}

impl DocumentType {
    pub fn as_str(&self) -> &str {
        match self {
            DocumentType::General => "general",
            DocumentType::Invoice => "invoice",
            DocumentType::Bank => "bank",
            DocumentType::Contract => "contract",
            DocumentType::PurchaseOrder => "po",
            DocumentType::Resume => "resume",
            DocumentType::Other(other) => other,
        }
    }

    /// General documents carry free-form content; everything else is template-shaped.
    pub fn is_general(&self) -> bool {
        matches!(self, DocumentType::General)
    }
}

impl From<String> for DocumentType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "general" => DocumentType::General,
            "invoice" => DocumentType::Invoice,
            "bank" => DocumentType::Bank,
            "contract" => DocumentType::Contract,
            "po" => DocumentType::PurchaseOrder,
            "resume" => DocumentType::Resume,
            _ => DocumentType::Other(value),
        }
    }
}

impl From<DocumentType> for String {
    fn from(value: DocumentType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStatus {
    Pending,
    Processing,
    #[default]
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Page {
    pub page_number: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub markdown: String,
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralData {
    #[serde(deserialize_with = "null_as_default")]
    pub markdown: String,
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateData {
    #[serde(deserialize_with = "null_as_default")]
    pub header_fields: Vec<Field>,
    #[serde(deserialize_with = "null_as_default")]
    pub line_items: Vec<LineItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<String>,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            name: None,
            value: Some(value.into()),
        }
    }
}

/// An explicit `null` reads the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Backends occasionally send numbers or booleans for header values.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

/// Payload of an extraction. The JSON carries no tag: the shape is picked by the
/// owning record's `documentType`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractedData {
    General(GeneralData),
    Template(TemplateData),
}

impl ExtractedData {
    pub fn from_value(document_type: &DocumentType, value: Value) -> serde_json::Result<Self> {
        let value = match value {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        if document_type.is_general() {
            Ok(ExtractedData::General(serde_json::from_value(value)?))
        } else {
            Ok(ExtractedData::Template(serde_json::from_value(value)?))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ExtractionRecord")]
pub struct Extraction {
    pub id: String,
    pub file_name: String,
    pub document_type: DocumentType,
    pub status: ExtractionStatus,
    pub pages_processed: u32,
    pub file_size: u64,
    pub created_at: DateTime<Utc>,
    pub extracted_data: ExtractedData,
}

/// Wire form before `extractedData` has been resolved against `documentType`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtractionRecord {
    #[serde(default)]
    id: String,
    file_name: String,
    document_type: DocumentType,
    #[serde(default)]
    status: ExtractionStatus,
    #[serde(default)]
    pages_processed: u32,
    #[serde(default)]
    file_size: u64,
    created_at: DateTime<Utc>,
    #[serde(default)]
    extracted_data: Value,
}

impl TryFrom<ExtractionRecord> for Extraction {
    type Error = serde_json::Error;

    fn try_from(record: ExtractionRecord) -> Result<Self, Self::Error> {
        let extracted_data = ExtractedData::from_value(&record.document_type, record.extracted_data)?;
        Ok(Extraction {
            id: record.id,
            file_name: record.file_name,
            document_type: record.document_type,
            status: record.status,
            pages_processed: record.pages_processed,
            file_size: record.file_size,
            created_at: record.created_at,
            extracted_data,
        })
    }
}

impl Extraction {
    pub fn general(&self) -> Option<&GeneralData> {
        match &self.extracted_data {
            ExtractedData::General(data) => Some(data),
            ExtractedData::Template(_) => None,
        }
    }

    pub fn template(&self) -> Option<&TemplateData> {
        match &self.extracted_data {
            ExtractedData::Template(data) => Some(data),
            ExtractedData::General(_) => None,
        }
    }

    /// Page count as shown on the dashboard: rendered pages for general
    /// documents, the processed counter otherwise.
    pub fn page_count(&self) -> u32 {
        match &self.extracted_data {
            ExtractedData::General(data) if !data.pages.is_empty() => data.pages.len() as u32,
            _ => self.pages_processed,
        }
    }
}

/// Body of `GET /api/extractions/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionEnvelope {
    pub extraction: Extraction,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_general_shape_from_document_type() {
        let extraction: Extraction = serde_json::from_value(json!({
            "id": "abc",
            "fileName": "scan.pdf",
            "documentType": "general",
            "createdAt": "2024-03-01T12:00:00Z",
            "extractedData": { "text": "Hello" }
        }))
        .unwrap();

        let data = extraction.general().unwrap();
        assert_eq!(data.text, "Hello");
        assert_eq!(data.markdown, "");
        assert!(data.pages.is_empty());
        assert_eq!(extraction.status, ExtractionStatus::Completed);
    }

    #[test]
    fn test_template_shape_keeps_line_item_order() {
        let extraction: Extraction = serde_json::from_value(json!({
            "fileName": "invoice.pdf",
            "documentType": "invoice",
            "status": "completed",
            "createdAt": "2024-03-01T12:00:00Z",
            "extractedData": {
                "headerFields": [{ "key": "Vendor", "value": "Acme" }, { "name": "Total", "value": 42.5 }],
                "lineItems": [{ "Zeta": 1, "Alpha": "two" }]
            }
        }))
        .unwrap();

        let data = extraction.template().unwrap();
        assert_eq!(data.header_fields[1].value.as_deref(), Some("42.5"));
        let keys: Vec<&String> = data.line_items[0].keys().collect();
        assert_eq!(keys, ["Zeta", "Alpha"]);
    }

    #[test]
    fn test_missing_extracted_data_defaults_to_empty() {
        let extraction: Extraction = serde_json::from_value(json!({
            "fileName": "resume.docx",
            "documentType": "resume",
            "status": "archived",
            "createdAt": "2024-03-01T12:00:00Z"
        }))
        .unwrap();

        let data = extraction.template().unwrap();
        assert!(data.header_fields.is_empty());
        assert!(data.line_items.is_empty());
        assert_eq!(extraction.status, ExtractionStatus::Unknown);
    }

    #[test]
    fn test_null_nested_fields_read_as_empty() {
        let invoice: Extraction = serde_json::from_value(json!({
            "fileName": "invoice.pdf",
            "documentType": "invoice",
            "createdAt": "2024-03-01T12:00:00Z",
            "extractedData": {
                "headerFields": [{ "key": "Vendor", "value": "Acme" }],
                "lineItems": null
            }
        }))
        .unwrap();
        let data = invoice.template().unwrap();
        assert_eq!(data.header_fields.len(), 1);
        assert!(data.line_items.is_empty());

        let notes: Extraction = serde_json::from_value(json!({
            "fileName": "notes.pdf",
            "documentType": "general",
            "createdAt": "2024-03-01T12:00:00Z",
            "extractedData": {
                "text": "Hello",
                "markdown": null,
                "pages": [{ "pageNumber": 1, "text": null }]
            }
        }))
        .unwrap();
        let data = notes.general().unwrap();
        assert_eq!(data.text, "Hello");
        assert_eq!(data.markdown, "");
        assert_eq!(data.pages[0].text, "");

        let empty: Extraction = serde_json::from_value(json!({
            "fileName": "po.pdf",
            "documentType": "po",
            "createdAt": "2024-03-01T12:00:00Z",
            "extractedData": { "headerFields": null, "lineItems": null }
        }))
        .unwrap();
        assert_eq!(empty.template(), Some(&TemplateData::default()));
    }

    #[test]
    fn test_document_type_wire_names() {
        assert_eq!(DocumentType::from("po".to_string()), DocumentType::PurchaseOrder);
        assert_eq!(
            DocumentType::from("receipt".to_string()),
            DocumentType::Other("receipt".to_string())
        );
        assert_eq!(String::from(DocumentType::PurchaseOrder), "po");
    }

    #[test]
    fn test_serialized_record_reads_back() {
        let original = Extraction {
            id: "x1".to_string(),
            file_name: "a.pdf".to_string(),
            document_type: DocumentType::Bank,
            status: ExtractionStatus::Completed,
            pages_processed: 3,
            file_size: 1024,
            created_at: "2024-03-01T12:00:00Z".parse().unwrap(),
            extracted_data: ExtractedData::Template(TemplateData {
                header_fields: vec![Field::new("Account", "123")],
                line_items: Vec::new(),
            }),
        };

        let json = serde_json::to_string(&original).unwrap();
        assert!(json.contains("\"documentType\":\"bank\""));
        let parsed: Extraction = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }
}
