// src/authoring/readers.rs

//! Binary import formats: Excel workbooks through calamine, PDF text
//! through lopdf.

use std::io::Cursor;

use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use lopdf::Document;

use crate::{
    authoring::import::{PdfTextExtractor, SheetRow, SpreadsheetReader},
    error::AppError,
};

/// Reads `.xlsx` and `.xls` workbooks. The format is sniffed from the
/// bytes, not the file name.
#[derive(Debug, Default, Clone, Copy)]
pub struct CalamineReader;

impl SpreadsheetReader for CalamineReader {
    fn first_sheet_rows(&self, bytes: &[u8]) -> Result<Vec<SheetRow>, AppError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| AppError::SupplierError(format!("Could not read the workbook: {}", e)))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| AppError::SupplierError("The workbook has no sheets.".to_string()))?
            .map_err(|e| AppError::SupplierError(format!("Could not read the first sheet: {}", e)))?;

        Ok(rows_by_header(&range))
    }
}

/// Maps every row below the first to its header cells. Columns without a
/// header are dropped, missing trailing cells read as empty.
fn rows_by_header(range: &Range<Data>) -> Vec<SheetRow> {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Vec::new();
    };
    let header: Vec<String> = header.iter().map(|cell| cell.to_string().trim().to_string()).collect();

    rows.map(|cells| {
        header
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.is_empty())
            .map(|(col, name)| {
                let value = cells.get(col).map(ToString::to_string).unwrap_or_default();
                (name.clone(), value)
            })
            .collect()
    })
    .collect()
}

/// Pulls the text layer out of a PDF, one page per line block.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfExtractor;

impl PdfTextExtractor for LopdfExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, AppError> {
        let document = Document::load_mem(bytes)
            .map_err(|e| AppError::SupplierError(format!("Could not read the PDF: {}", e)))?;

        let pages = document
            .get_pages()
            .into_keys()
            .map(|page| {
                document.extract_text(&[page]).map_err(|e| {
                    AppError::SupplierError(format!("Could not read page {} of the PDF: {}", page, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let text = pages.join("\n");
        if text.trim().is_empty() {
            return Err(AppError::SupplierError(
                "The PDF has no extractable text.".to_string(),
            ));
        }
        tracing::debug!(pages = pages.len(), "PDF pages read");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use lopdf::{
        Object, Stream,
        content::{Content, Operation},
        dictionary,
    };
    use rust_xlsxwriter::Workbook;

    use super::*;

    fn workbook(rows: &[&[&str]]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                sheet.write_string(r as u32, c as u16, *value).unwrap();
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    /// A PDF with one text line per page.
    fn pdf(pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let kids: Vec<Object> = pages
            .iter()
            .map(|line| {
                let content = Content {
                    operations: vec![
                        Operation::new("BT", vec![]),
                        Operation::new("Tf", vec!["F1".into(), 12.into()]),
                        Operation::new("Td", vec![72.into(), 720.into()]),
                        Operation::new("Tj", vec![Object::string_literal(*line)]),
                        Operation::new("ET", vec![]),
                    ],
                };
                let content_id =
                    doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "Contents" => content_id,
                    "Resources" => resources_id,
                })
                .into()
            })
            .collect();

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => kids.len() as i64,
                "Kids" => kids,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn first_sheet_rows_are_keyed_by_header() {
        let bytes = workbook(&[
            &["questionText", "type", "options", "correctAnswers"],
            &["Capital?", "multiple-choice", "Jakarta|Bandung", "Jakarta"],
            &["Formula of water?", "short-answer"],
        ]);

        let rows = CalamineReader.first_sheet_rows(&bytes).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["questionText"], "Capital?");
        assert_eq!(rows[0]["options"], "Jakarta|Bandung");
        assert_eq!(rows[1]["type"], "short-answer");
        assert_eq!(rows[1]["correctAnswers"], "");
    }

    #[test]
    fn numeric_cells_read_as_plain_numbers() {
        let mut range: Range<Data> = Range::new((0, 0), (1, 2));
        range.set_value((0, 0), Data::String("questionText".into()));
        range.set_value((0, 1), Data::String(" correctAnswers ".into()));
        range.set_value((1, 0), Data::String("2+2?".into()));
        range.set_value((1, 1), Data::Float(4.0));
        range.set_value((1, 2), Data::String("no header".into()));

        let rows = rows_by_header(&range);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["correctAnswers"], "4");
        assert_eq!(rows[0].len(), 2);
    }

    #[test]
    fn garbage_workbook_is_a_supplier_error() {
        assert!(matches!(
            CalamineReader.first_sheet_rows(b"PK not really a zip"),
            Err(AppError::SupplierError(_))
        ));
    }

    #[test]
    fn pdf_pages_are_joined_by_newlines() {
        let bytes = pdf(&["1. What is 2+2? Answer: 4", "2. Capital of Indonesia? Answer: Jakarta"]);

        let text = LopdfExtractor.extract_text(&bytes).unwrap();
        let first = text.find("What is 2+2?").unwrap();
        let second = text.find("Capital of Indonesia?").unwrap();
        assert!(first < second);
        assert!(text[first..second].contains('\n'));
    }

    #[test]
    fn pdf_without_text_is_rejected() {
        let bytes = pdf(&[""]);
        assert!(matches!(
            LopdfExtractor.extract_text(&bytes),
            Err(AppError::SupplierError(msg)) if msg.contains("no extractable text")
        ));
        assert!(matches!(
            LopdfExtractor.extract_text(b"%PDF-1.5 truncated"),
            Err(AppError::SupplierError(_))
        ));
    }
}
