use super::{Cell, Sheet, Workbook};
use crate::error::Result;
use quick_xml::escape::escape;
use std::io::{Cursor, Write};
use tracing::warn;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Longest text a spreadsheet cell may hold.
pub const MAX_CELL_CHARS: usize = 32_767;

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const STYLES: &str = r#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#;

/// Serializes a [`Workbook`] into spreadsheet file bytes.
pub trait WorkbookWriter: Send + Sync {
    fn write(&self, workbook: &Workbook) -> Result<Vec<u8>>;
}

/// Writes a minimal Office Open XML package: one part per sheet, inline strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct OoxmlWriter;

impl WorkbookWriter for OoxmlWriter {
    fn write(&self, workbook: &Workbook) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        add_part(&mut zip, "[Content_Types].xml", &content_types(workbook))?;
        add_part(&mut zip, "_rels/.rels", &package_rels())?;
        add_part(&mut zip, "xl/workbook.xml", &workbook_xml(workbook))?;
        add_part(&mut zip, "xl/_rels/workbook.xml.rels", &workbook_rels(workbook))?;
        add_part(
            &mut zip,
            "xl/styles.xml",
            &format!(r#"{XML_DECL}<styleSheet xmlns="{MAIN_NS}">{STYLES}</styleSheet>"#),
        )?;
        for (idx, sheet) in workbook.sheets.iter().enumerate() {
            add_part(
                &mut zip,
                &format!("xl/worksheets/sheet{}.xml", idx + 1),
                &sheet_xml(sheet),
            )?;
        }

        Ok(zip.finish()?.into_inner())
    }
}

fn add_part(zip: &mut ZipWriter<Cursor<Vec<u8>>>, name: &str, body: &str) -> Result<()> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(name, options)?;
    zip.write_all(body.as_bytes())?;
    Ok(())
}

fn content_types(workbook: &Workbook) -> String {
    let mut xml = format!(
        r#"{XML_DECL}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#
    );
    for idx in 1..=workbook.sheets.len() {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{idx}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn package_rels() -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="{PKG_REL_NS}"><Relationship Id="rId1" Type="{REL_NS}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
    )
}

fn workbook_xml(workbook: &Workbook) -> String {
    let mut xml = format!(r#"{XML_DECL}<workbook xmlns="{MAIN_NS}" xmlns:r="{REL_NS}"><sheets>"#);
    for (idx, sheet) in workbook.sheets.iter().enumerate() {
        let id = idx + 1;
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{id}" r:id="rId{id}"/>"#,
            escape(sheet_name(&sheet.name).as_str())
        ));
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn workbook_rels(workbook: &Workbook) -> String {
    let mut xml = format!(r#"{XML_DECL}<Relationships xmlns="{PKG_REL_NS}">"#);
    let count = workbook.sheets.len();
    for id in 1..=count {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{id}" Type="{REL_NS}/worksheet" Target="worksheets/sheet{id}.xml"/>"#
        ));
    }
    xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="{REL_NS}/styles" Target="styles.xml"/>"#,
        count + 1
    ));
    xml.push_str("</Relationships>");
    xml
}

fn sheet_xml(sheet: &Sheet) -> String {
    let mut xml = format!(r#"{XML_DECL}<worksheet xmlns="{MAIN_NS}"><sheetData>"#);
    for (row_idx, row) in sheet.rows.iter().enumerate() {
        if row.is_empty() {
            continue;
        }
        let row_num = row_idx + 1;
        xml.push_str(&format!(r#"<row r="{row_num}">"#));
        for (col_idx, cell) in row.iter().enumerate() {
            let reference = format!("{}{}", column_name(col_idx), row_num);
            xml.push_str(&cell_xml(&reference, cell));
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

fn cell_xml(reference: &str, cell: &Cell) -> String {
    match cell {
        Cell::Number(n) => format!(r#"<c r="{reference}"><v>{n}</v></c>"#),
        Cell::Bool(b) => format!(r#"<c r="{reference}" t="b"><v>{}</v></c>"#, u8::from(*b)),
        Cell::Text(s) => format!(
            r#"<c r="{reference}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
            escape(cell_text(reference, s).as_str())
        ),
    }
}

/// Drop characters XML 1.0 cannot carry and cap the length.
fn cell_text(reference: &str, text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| {
            matches!(c, '\t' | '\n' | '\r') || !(c.is_control() || is_xml_noncharacter(*c))
        })
        .collect();
    if cleaned.chars().count() > MAX_CELL_CHARS {
        warn!(
            cell = reference,
            chars = cleaned.chars().count(),
            "Cell text exceeds spreadsheet limit, truncating"
        );
        return cleaned.chars().take(MAX_CELL_CHARS).collect();
    }
    cleaned
}

/// U+FFFE and U+FFFF fall outside the XML 1.0 `Char` production.
fn is_xml_noncharacter(c: char) -> bool {
    matches!(c, '\u{FFFE}' | '\u{FFFF}')
}

/// Sheet names are capped at 31 characters and may not contain `[]:*?/\`.
fn sheet_name(name: &str) -> String {
    name.chars()
        .map(|c| if "[]:*?/\\".contains(c) { '_' } else { c })
        .take(31)
        .collect()
}

/// Zero-based column index to spreadsheet letters: 0 -> A, 25 -> Z, 26 -> AA.
pub fn column_name(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{general, invoice, template};
    use crate::xlsx::{GENERAL_SHEET, HEADER_FIELDS_SHEET, LINE_ITEMS_SHEET, build_workbook};
    use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
    use extract::Field;

    fn reopen(bytes: Vec<u8>) -> Xlsx<Cursor<Vec<u8>>> {
        open_workbook_from_rs(Cursor::new(bytes)).unwrap()
    }

    #[test]
    fn test_column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn test_template_workbook_reopens() {
        let bytes = OoxmlWriter.write(&build_workbook(&invoice())).unwrap();
        let mut workbook = reopen(bytes);

        assert_eq!(workbook.sheet_names(), [HEADER_FIELDS_SHEET, LINE_ITEMS_SHEET]);

        let header = workbook.worksheet_range(HEADER_FIELDS_SHEET).unwrap();
        assert_eq!(header.get_value((1, 0)), Some(&Data::String("Vendor".to_string())));
        assert_eq!(header.get_value((1, 1)), Some(&Data::String("Acme Corp".to_string())));

        let items = workbook.worksheet_range(LINE_ITEMS_SHEET).unwrap();
        assert_eq!(items.get_value((0, 2)), Some(&Data::String("Unit Price".to_string())));
        assert_eq!(items.get_value((2, 0)), Some(&Data::String("Bolts | M4".to_string())));
        assert_eq!(items.get_value((1, 2)), Some(&Data::Float(9.99)));
        assert_eq!(items.get_value((2, 3)), Some(&Data::Bool(false)));
    }

    #[test]
    fn test_general_workbook_keeps_blank_row() {
        let bytes = OoxmlWriter
            .write(&build_workbook(&general("", "A & B <tag>\nnext")))
            .unwrap();
        let mut workbook = reopen(bytes);
        let range = workbook.worksheet_range(GENERAL_SHEET).unwrap();

        assert_eq!(range.get_value((4, 0)), Some(&Data::Empty));
        assert_eq!(range.get_value((5, 0)), Some(&Data::String("Content".to_string())));
        assert_eq!(
            range.get_value((5, 1)),
            Some(&Data::String("A & B <tag>\nnext".to_string()))
        );
    }

    #[test]
    fn test_control_characters_are_dropped() {
        assert_eq!(cell_text("A1", "a\u{0}b\u{1b}c\td"), "abc\td");
        assert_eq!(cell_text("A1", "x\u{FFFE}y\u{FFFF}z\u{FFFD}"), "xyz\u{FFFD}");
    }

    #[test]
    fn test_noncharacters_do_not_break_the_package() {
        let fields = vec![Field::new("Memo", "before\u{FFFF}after")];
        let bytes = OoxmlWriter.write(&build_workbook(&template(fields, Vec::new()))).unwrap();
        let mut workbook = reopen(bytes);
        let range = workbook.worksheet_range(HEADER_FIELDS_SHEET).unwrap();
        assert_eq!(
            range.get_value((1, 1)),
            Some(&Data::String("beforeafter".to_string()))
        );
    }

    #[test]
    fn test_long_text_is_truncated() {
        let long = "x".repeat(MAX_CELL_CHARS + 10);
        assert_eq!(cell_text("A1", &long).len(), MAX_CELL_CHARS);
    }

    #[test]
    fn test_sheet_name_sanitized() {
        assert_eq!(sheet_name("Q1/Q2 [draft]"), "Q1_Q2 _draft_");
        assert_eq!(sheet_name(&"n".repeat(40)).len(), 31);
    }
}
