use crate::error::Result;
use extract::{DocumentType, ExtractedData, Extraction};
use serde::{Deserialize, Serialize};

/// Which object the JSON export carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonView {
    /// `extractedData` alone, as on the extraction detail page.
    #[default]
    Data,
    /// File name, document type and page count around the data, as on the dashboard.
    Summary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary<'a> {
    file_name: &'a str,
    document_type: &'a DocumentType,
    page_count: u32,
    extracted_data: &'a ExtractedData,
}

/// Pretty-printed with two-space indentation.
pub fn encode(extraction: &Extraction, view: JsonView) -> Result<String> {
    let json = match view {
        JsonView::Data => serde_json::to_string_pretty(&extraction.extracted_data)?,
        JsonView::Summary => serde_json::to_string_pretty(&Summary {
            file_name: &extraction.file_name,
            document_type: &extraction.document_type,
            page_count: extraction.page_count(),
            extracted_data: &extraction.extracted_data,
        })?,
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{general, invoice};
    use serde_json::{Value, json};

    #[test]
    fn test_data_view_round_trips() {
        let extraction = invoice();
        let output = encode(&extraction, JsonView::Data).unwrap();

        assert!(output.starts_with("{\n  \"headerFields\""));
        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["headerFields"][0]["key"], "Vendor");
        assert_eq!(parsed["lineItems"][1]["Description"], "Bolts | M4");
    }

    #[test]
    fn test_summary_view_counts_pages() {
        let extraction = general("Hello", "# Hello");
        let output = encode(&extraction, JsonView::Summary).unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["fileName"], "notes.pdf");
        assert_eq!(parsed["documentType"], "general");
        assert_eq!(parsed["pageCount"], json!(2));
        assert_eq!(parsed["extractedData"]["text"], "Hello");
    }

    #[test]
    fn test_special_characters_are_escaped() {
        let mut extraction = general("quote \" and \\ and \n newline", "");
        extraction.file_name = "weird \"name\".pdf".to_string();
        let output = encode(&extraction, JsonView::Summary).unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["fileName"], "weird \"name\".pdf");
        assert_eq!(parsed["extractedData"]["text"], "quote \" and \\ and \n newline");
    }
}
