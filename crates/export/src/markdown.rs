use extract::{ExtractedData, Extraction, LineItemTable, TemplateData, resolve_label, resolve_value};

pub const EMPTY_CONTENT: &str = "_No content extracted._";

/// Markdown document with a metadata preamble. Template data becomes GFM tables.
pub fn encode(extraction: &Extraction) -> String {
    let mut out = preamble(extraction);

    match &extraction.extracted_data {
        ExtractedData::General(data) => {
            let body = if !data.markdown.is_empty() {
                &data.markdown
            } else if !data.text.is_empty() {
                &data.text
            } else {
                EMPTY_CONTENT
            };
            out.push_str(body);
            out.push('\n');
        }
        ExtractedData::Template(data) => out.push_str(&template_tables(data)),
    }

    out
}

fn preamble(extraction: &Extraction) -> String {
    format!(
        "# {}\n\n**Document Type:** {}\n\n**Extracted:** {}\n\n",
        extraction.file_name,
        extraction.document_type,
        extraction.created_at.format("%-m/%-d/%Y, %-I:%M:%S %p UTC"),
    )
}

fn template_tables(data: &TemplateData) -> String {
    let mut sections = Vec::new();

    if !data.header_fields.is_empty() {
        let rows = data
            .header_fields
            .iter()
            .map(|field| vec![resolve_label(field).to_string(), resolve_value(field).to_string()]);
        sections.push(format!(
            "## Header Fields\n\n{}",
            table(&["Field", "Value"], rows)
        ));
    }

    let items = LineItemTable::new(&data.line_items);
    if !items.is_empty() {
        sections.push(format!(
            "## Line Items\n\n{}",
            table(items.columns(), items.rows())
        ));
    }

    sections.join("\n")
}

fn table<H, R>(headers: &[H], rows: R) -> String
where
    H: AsRef<str>,
    R: IntoIterator<Item = Vec<String>>,
{
    let mut out = row(headers.iter().map(|h| h.as_ref()));
    out.push_str(&row(headers.iter().map(|_| "---")));
    for cells in rows {
        out.push_str(&row(cells.iter().map(String::as_str)));
    }
    out
}

fn row<'a>(cells: impl Iterator<Item = &'a str>) -> String {
    let cells: Vec<String> = cells.map(escape_cell).collect();
    format!("| {} |\n", cells.join(" | "))
}

/// Keep a value inside its table cell: backslashes and pipes are escaped, line
/// breaks become `<br>`. Backslashes go first so a literal `\|` renders as typed.
pub fn escape_cell(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace(['\n', '\r'], "<br>")
}
