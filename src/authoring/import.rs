// src/authoring/import.rs

//! Question suppliers: uploaded files, pasted text and AI generation.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::{
    authoring::{
        ai::{GenerateRequest, QuestionGenerator},
        draft::QuestionSource,
    },
    error::AppError,
    models::question::{QuestionCandidate, QuestionType},
};

/// Separator inside multi-value CSV and spreadsheet cells.
const MULTI_VALUE_SEPARATOR: char = '|';

const CSV_HEADER: [&str; 4] = ["questionText", "type", "options", "correctAnswers"];

/// Import formats, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Json,
    Csv,
    Xlsx,
    Xls,
    Pdf,
}

impl FileKind {
    pub fn from_filename(filename: &str) -> Result<Self, AppError> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "json" => Ok(FileKind::Json),
            "csv" => Ok(FileKind::Csv),
            "xlsx" => Ok(FileKind::Xlsx),
            "xls" => Ok(FileKind::Xls),
            "pdf" => Ok(FileKind::Pdf),
            _ => Err(AppError::UnsupportedFileType(
                "Unsupported file type. Please use .json, .csv, .xlsx or .pdf".to_string(),
            )),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Json => "json",
            FileKind::Csv => "csv",
            FileKind::Xlsx => "xlsx",
            FileKind::Xls => "xls",
            FileKind::Pdf => "pdf",
        }
    }
}

/// One spreadsheet row keyed by the header cell of its column.
pub type SheetRow = HashMap<String, String>;

/// Reads the rows of the first worksheet of an Excel workbook.
pub trait SpreadsheetReader: Send + Sync {
    fn first_sheet_rows(&self, bytes: &[u8]) -> Result<Vec<SheetRow>, AppError>;
}

/// Extracts the plain text of a PDF, page by page.
pub trait PdfTextExtractor: Send + Sync {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, AppError>;
}

/// Turns outside material into question candidates.
///
/// Nothing here touches a draft: callers append the returned candidates
/// only when the whole import succeeded.
#[derive(Clone)]
pub struct QuestionImporter {
    generator: Arc<dyn QuestionGenerator>,
    spreadsheets: Option<Arc<dyn SpreadsheetReader>>,
    pdfs: Option<Arc<dyn PdfTextExtractor>>,
}

impl QuestionImporter {
    pub fn new(generator: Arc<dyn QuestionGenerator>) -> Self {
        Self {
            generator,
            spreadsheets: None,
            pdfs: None,
        }
    }

    pub fn with_spreadsheet_reader(mut self, reader: Arc<dyn SpreadsheetReader>) -> Self {
        self.spreadsheets = Some(reader);
        self
    }

    pub fn with_pdf_extractor(mut self, extractor: Arc<dyn PdfTextExtractor>) -> Self {
        self.pdfs = Some(extractor);
        self
    }

    /// Parses an uploaded file according to its extension.
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn import_file(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(QuestionSource, Vec<QuestionCandidate>), AppError> {
        let kind = FileKind::from_filename(filename)?;

        let candidates = match kind {
            FileKind::Json => parse_json(bytes)?,
            FileKind::Csv => parse_csv(bytes)?,
            FileKind::Xlsx | FileKind::Xls => {
                let reader = self.spreadsheets.as_ref().ok_or_else(|| {
                    AppError::SupplierError(
                        "Excel import is not available on this server".to_string(),
                    )
                })?;
                rows_to_candidates(reader.first_sheet_rows(bytes)?)
            }
            FileKind::Pdf => {
                let extractor = self.pdfs.as_ref().ok_or_else(|| {
                    AppError::SupplierError("PDF import is not available on this server".to_string())
                })?;
                let text = extractor.extract_text(bytes)?;
                tracing::info!(chars = text.len(), "PDF text extracted, sending to AI");
                self.generator.extract_from_text(&text).await?
            }
        };

        let candidates = non_empty(candidates, "No valid questions found in the file.")?;
        tracing::info!(count = candidates.len(), kind = kind.label(), "File imported");
        Ok((QuestionSource::Import(kind.label()), candidates))
    }

    /// Sends pasted text to the AI for question extraction.
    pub async fn import_text(
        &self,
        text: &str,
    ) -> Result<(QuestionSource, Vec<QuestionCandidate>), AppError> {
        if text.trim().is_empty() {
            return Err(AppError::BadRequest("Text must not be empty.".to_string()));
        }

        let candidates = self.generator.extract_from_text(text).await?;
        let candidates = non_empty(candidates, "No valid questions found in the text.")?;
        Ok((QuestionSource::ExtractedText, candidates))
    }

    pub async fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<(QuestionSource, Vec<QuestionCandidate>), AppError> {
        request.validate()?;

        let candidates = self.generator.generate(request).await?;
        let candidates = non_empty(candidates, "The AI returned no questions.")?;
        Ok((QuestionSource::Generated, candidates))
    }
}

fn non_empty(
    candidates: Vec<QuestionCandidate>,
    message: &str,
) -> Result<Vec<QuestionCandidate>, AppError> {
    if candidates.is_empty() {
        return Err(AppError::SupplierError(message.to_string()));
    }
    Ok(candidates)
}

/// A JSON array of candidates.
pub fn parse_json(bytes: &[u8]) -> Result<Vec<QuestionCandidate>, AppError> {
    Ok(serde_json::from_slice(bytes)?)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsvRow {
    #[serde(default)]
    question_text: String,
    #[serde(default, rename = "type")]
    question_type: String,
    #[serde(default)]
    options: String,
    #[serde(default)]
    correct_answers: String,
}

/// CSV with a `questionText,type,options,correctAnswers` header.
/// Rows without question text are skipped.
pub fn parse_csv(bytes: &[u8]) -> Result<Vec<QuestionCandidate>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let mut candidates = Vec::new();
    for row in reader.deserialize() {
        let row: CsvRow = row?;
        if row.question_text.is_empty() {
            continue;
        }
        candidates.push(candidate_from_cells(
            row.question_text,
            &row.question_type,
            &row.options,
            &row.correct_answers,
        ));
    }
    Ok(candidates)
}

fn rows_to_candidates(rows: Vec<SheetRow>) -> Vec<QuestionCandidate> {
    let cell = |row: &SheetRow, key: &str| row.get(key).map(|v| v.trim().to_string()).unwrap_or_default();

    rows.iter()
        .filter_map(|row| {
            let text = cell(row, "questionText");
            if text.is_empty() {
                return None;
            }
            Some(candidate_from_cells(
                text,
                &cell(row, "type"),
                &cell(row, "options"),
                &cell(row, "correctAnswers"),
            ))
        })
        .collect()
}

fn candidate_from_cells(
    text: String,
    question_type: &str,
    options: &str,
    correct_answers: &str,
) -> QuestionCandidate {
    QuestionCandidate {
        question_text: Some(text),
        question_type: (!question_type.is_empty()).then(|| question_type.to_string()),
        options: Some(split_multi(options)),
        correct_answers: Some(split_multi(correct_answers)),
    }
}

fn split_multi(cell: &str) -> Vec<String> {
    if cell.is_empty() {
        return Vec::new();
    }
    cell.split(MULTI_VALUE_SEPARATOR).map(str::to_string).collect()
}

/// Downloadable example for the JSON import.
pub fn json_template() -> String {
    let template = json!([
        {
            "questionText": "Multiple choice example: What is the capital of Indonesia?",
            "type": QuestionType::SingleChoice.as_str(),
            "options": ["Jakarta", "Bandung", "Surabaya", "Medan"],
            "correctAnswers": ["Jakarta"]
        },
        {
            "questionText": "Multiple answer example: Which of these are large islands of Indonesia?",
            "type": QuestionType::MultiChoice.as_str(),
            "options": ["Java", "Bali", "Sumatra", "Lombok"],
            "correctAnswers": ["Java", "Sumatra"]
        },
        {
            "questionText": "Short answer example: Who was the first president of Indonesia?",
            "type": QuestionType::ShortAnswer.as_str(),
            "options": [],
            "correctAnswers": ["Soekarno"]
        }
    ]);
    serde_json::to_string_pretty(&template).unwrap_or_default()
}

/// Downloadable example for the CSV import.
pub fn csv_template() -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    writer.write_record([
        "What is the capital of Indonesia?",
        QuestionType::SingleChoice.as_str(),
        "Jakarta|Bandung|Surabaya|Medan",
        "Jakarta",
    ])?;
    writer.write_record([
        "Which of these are large islands?",
        QuestionType::MultiChoice.as_str(),
        "Java|Bali|Sumatra|Lombok",
        "Java|Sumatra",
    ])?;
    writer.write_record([
        "Who was the first president of Indonesia?",
        QuestionType::ShortAnswer.as_str(),
        "",
        "Soekarno",
    ])?;

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AppError::InternalServerError(e.to_string()))
}
