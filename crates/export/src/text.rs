use extract::{ExtractedData, Extraction, LineItemTable, TemplateData, resolve_label, resolve_value};

const DIVIDER_WIDTH: usize = 50;

/// Plain-text rendering. General documents prefer the non-markup `text`.
pub fn encode(extraction: &Extraction) -> String {
    match &extraction.extracted_data {
        ExtractedData::General(data) => {
            if !data.text.is_empty() {
                data.text.clone()
            } else {
                data.markdown.clone()
            }
        }
        ExtractedData::Template(data) => encode_template(data),
    }
}

fn encode_template(data: &TemplateData) -> String {
    let divider = "=".repeat(DIVIDER_WIDTH);
    let mut sections = Vec::new();

    if !data.header_fields.is_empty() {
        let mut section = format!("Header Fields\n{divider}\n");
        for field in &data.header_fields {
            section.push_str(&format!("{}: {}\n", resolve_label(field), resolve_value(field)));
        }
        sections.push(section);
    }

    let table = LineItemTable::new(&data.line_items);
    if !table.is_empty() {
        let mut section = format!("Line Items\n{divider}\n");
        let items: Vec<String> = table
            .rows()
            .enumerate()
            .map(|(idx, row)| {
                let mut item = format!("Item {}:\n", idx + 1);
                for (column, value) in table.columns().iter().zip(row) {
                    item.push_str(&format!("  {column}: {value}\n"));
                }
                item
            })
            .collect();
        section.push_str(&items.join("\n"));
        sections.push(section);
    }

    sections.join("\n")
}
