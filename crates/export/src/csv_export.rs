use crate::error::{ExportError, Result};
use chrono::SecondsFormat;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use extract::{ExtractedData, Extraction, LineItemTable, TemplateData, resolve_label, resolve_value};

/// CSV rendering. Data cells are always quoted with embedded quotes doubled;
/// section titles and header rows are left bare unless they need quoting.
pub fn encode(extraction: &Extraction) -> Result<String> {
    match &extraction.extracted_data {
        ExtractedData::General(data) => {
            let mut out = String::from("Field,Value\n");
            let extracted = extraction
                .created_at
                .to_rfc3339_opts(SecondsFormat::Millis, true);
            let mut rows = vec![
                ["Document Type", extraction.document_type.as_str()],
                ["File Name", extraction.file_name.as_str()],
                ["Extracted", extracted.as_str()],
            ];
            let content = if !data.text.is_empty() {
                &data.text
            } else {
                &data.markdown
            };
            if !content.is_empty() {
                rows.push(["Content", content.as_str()]);
            }
            write_rows(&mut out, QuoteStyle::Always, rows)?;
            Ok(out)
        }
        ExtractedData::Template(data) => encode_template(data),
    }
}

fn encode_template(data: &TemplateData) -> Result<String> {
    let mut out = String::new();

    if !data.header_fields.is_empty() {
        out.push_str("Header Fields\nField,Value\n");
        let rows = data
            .header_fields
            .iter()
            .map(|field| [resolve_label(field), resolve_value(field)]);
        write_rows(&mut out, QuoteStyle::Always, rows)?;
        out.push('\n');
    }

    let table = LineItemTable::new(&data.line_items);
    if !table.is_empty() {
        out.push_str("Line Items\n");
        write_rows(&mut out, QuoteStyle::Necessary, [table.columns()])?;
        write_rows(&mut out, QuoteStyle::Always, table.rows())?;
        out.push('\n');
    }

    Ok(out)
}

fn write_rows<R, I, T>(out: &mut String, style: QuoteStyle, rows: R) -> Result<()>
where
    R: IntoIterator<Item = I>,
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut writer = WriterBuilder::new()
        .quote_style(style)
        .flexible(true)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for row in rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;
    out.push_str(&String::from_utf8_lossy(&bytes));
    Ok(())
}
