// src/authoring/ai.rs

//! AI question supplier.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use url::Url;
use validator::Validate;

use crate::{
    config::{GeminiConfig, MAX_GENERATED_QUESTIONS},
    error::AppError,
    models::question::{QuestionCandidate, QuestionType},
};

const REQUEST_TIMEOUT_SECS: u64 = 120;
const GENERATE_TEMPERATURE: f64 = 0.8;
const EXTRACT_TEMPERATURE: f64 = 0.2;

/// DTO for asking the AI for new questions.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 1, max = 200, message = "Topic must not be empty."))]
    pub topic: String,
    #[validate(range(min = 1, max = MAX_GENERATED_QUESTIONS))]
    pub count: u32,
    #[validate(length(min = 1, message = "Pick at least one question type."))]
    pub types: Vec<QuestionType>,
}

/// Something that can produce question candidates from a topic or from
/// unstructured text. Failures come back as `AppError::SupplierError`.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<Vec<QuestionCandidate>, AppError>;

    /// Pulls exam questions out of text such as an extracted PDF.
    async fn extract_from_text(&self, text: &str) -> Result<Vec<QuestionCandidate>, AppError>;
}

/// Google Gemini over its `generateContent` REST endpoint.
pub struct GeminiGenerator {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiGenerator {
    pub fn new(config: GeminiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, client }
    }

    fn api_key(&self) -> Result<&str, AppError> {
        self.config.api_key.as_deref().ok_or_else(|| {
            AppError::SupplierError(
                "AI is not configured (GEMINI_API_KEY missing). Cannot use AI features."
                    .to_string(),
            )
        })
    }

    fn endpoint(&self, model: &str) -> Result<Url, AppError> {
        Url::parse(&self.config.base_url)
            .and_then(|base| base.join(&format!("v1beta/models/{}:generateContent", model)))
            .map_err(|e| AppError::SupplierError(format!("Invalid Gemini base URL: {}", e)))
    }

    #[tracing::instrument(skip(self, prompt))]
    async fn call(&self, model: &str, prompt: String, temperature: f64) -> Result<Vec<QuestionCandidate>, AppError> {
        let api_key = self.api_key()?;

        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: response_schema(),
                temperature,
            },
        };

        let response = self
            .client
            .post(self.endpoint(model)?)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::SupplierError(format!(
                        "AI request timed out after {}s",
                        REQUEST_TIMEOUT_SECS
                    ))
                } else {
                    AppError::SupplierError(format!("AI request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::SupplierError(format!(
                "AI request failed (HTTP {}): {}",
                status.as_u16(),
                body
            )));
        }

        let payload: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AppError::SupplierError(format!("Unreadable AI response: {}", e)))?;

        let text = payload
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        let candidates: Vec<QuestionCandidate> = serde_json::from_str(strip_code_fence(&text))?;
        tracing::info!(count = candidates.len(), "AI returned question candidates");
        Ok(candidates)
    }
}

#[async_trait]
impl QuestionGenerator for GeminiGenerator {
    async fn generate(&self, request: &GenerateRequest) -> Result<Vec<QuestionCandidate>, AppError> {
        let types: Vec<&str> = request.types.iter().map(QuestionType::as_str).collect();
        let prompt = format!(
            "You are an experienced curriculum designer for junior high school.\n\
             Write {count} exam questions about the topic: \"{topic}\".\n\n\
             Use a mix of these question types: {types}.\n\n\
             Answer with a JSON array of question objects matching the schema.\n\
             For 'short-answer' questions the 'options' array must be empty.\n\
             For choice questions every correct answer must be the exact text of one of the options.\n\
             Keep the content suitable for students aged 13 to 15.",
            count = request.count,
            topic = request.topic,
            types = types.join(", "),
        );

        self.call(&self.config.generate_model, prompt, GENERATE_TEMPERATURE)
            .await
    }

    async fn extract_from_text(&self, text: &str) -> Result<Vec<QuestionCandidate>, AppError> {
        let prompt = format!(
            "You extract exam questions for an online exam application.\n\
             The text below was taken from a document (often a PDF) containing exam questions.\n\
             Turn it into a JSON array of question objects matching the schema.\n\n\
             - Identify the text of each question.\n\
             - The type must be one of 'multiple-choice', 'multiple-answer', 'short-answer'.\n\
             - List every option of choice questions; leave 'options' empty for 'short-answer'.\n\
             - 'correctAnswers' holds the expected text for short answers and the text of the correct option(s) otherwise.\n\
             - Tolerate broken formatting, page breaks and OCR noise.\n\
             - When a detail cannot be determined, make a reasonable assumption or leave it empty.\n\n\
             Text:\n---\n{text}\n---"
        );

        self.call(&self.config.extract_model, prompt, EXTRACT_TEMPERATURE)
            .await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
    temperature: f64,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

/// Schema the model must answer with: an array of question candidates.
fn response_schema() -> Value {
    let types: Vec<&str> = QuestionType::ALL.iter().map(QuestionType::as_str).collect();
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "questionText": { "type": "STRING" },
                "type": { "type": "STRING", "enum": types },
                "options": { "type": "ARRAY", "items": { "type": "STRING" } },
                "correctAnswers": { "type": "ARRAY", "items": { "type": "STRING" } }
            },
            "required": ["questionText", "type", "options", "correctAnswers"]
        }
    })
}

/// Models sometimes wrap JSON in a ```json fence despite the mime type.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}
