// src/models/question.rs

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// How a question is answered.
///
/// The wire names are the ones used by the import templates and the AI
/// response schema; the `single-choice`/`multi-choice` spellings are
/// accepted on input as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    /// Exactly one option is picked (radio buttons).
    #[serde(rename = "multiple-choice", alias = "single-choice")]
    SingleChoice,
    /// Any subset of the options is picked (checkboxes).
    #[serde(rename = "multiple-answer", alias = "multi-choice")]
    MultiChoice,
    /// Free text, compared literally.
    #[serde(rename = "short-answer")]
    ShortAnswer,
}

impl QuestionType {
    pub const ALL: [QuestionType; 3] = [
        QuestionType::SingleChoice,
        QuestionType::MultiChoice,
        QuestionType::ShortAnswer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "multiple-choice",
            QuestionType::MultiChoice => "multiple-answer",
            QuestionType::ShortAnswer => "short-answer",
        }
    }

    pub fn has_options(&self) -> bool {
        !matches!(self, QuestionType::ShortAnswer)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "multiple-choice" | "single-choice" => Ok(QuestionType::SingleChoice),
            "multiple-answer" | "multi-choice" => Ok(QuestionType::MultiChoice),
            "short-answer" => Ok(QuestionType::ShortAnswer),
            other => Err(format!("unknown question type '{}'", other)),
        }
    }
}

/// A question as stored inside an exam, answer key included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,

    #[serde(rename = "questionText")]
    pub text: String,

    #[serde(rename = "type")]
    pub question_type: QuestionType,

    /// Empty for short-answer questions.
    pub options: Vec<String>,

    /// For choice questions these should be a subset of `options`.
    /// Not enforced: authoring accepts whatever the supplier produced.
    pub correct_answers: Vec<String>,
}

impl Question {
    /// The answer key under set semantics.
    pub fn correct_set(&self) -> BTreeSet<&str> {
        self.correct_answers.iter().map(String::as_str).collect()
    }

    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o == value)
    }

    pub fn to_public(&self) -> PublicQuestion {
        PublicQuestion {
            id: self.id.clone(),
            text: self.text.clone(),
            question_type: self.question_type,
            options: self.options.clone(),
        }
    }
}

/// DTO for sending a question to a student (excludes the answer key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: String,
    #[serde(rename = "questionText")]
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub options: Vec<String>,
}

/// A question produced by a supplier (file import, AI, manual form) that
/// has not been given an id yet. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionCandidate {
    #[serde(default)]
    pub question_text: Option<String>,

    /// Kept as a raw string so one odd row does not reject a whole file.
    #[serde(default, rename = "type")]
    pub question_type: Option<String>,

    #[serde(default)]
    pub options: Option<Vec<String>>,

    #[serde(default)]
    pub correct_answers: Option<Vec<String>>,
}

impl QuestionCandidate {
    /// Fills the gaps and attaches `id`.
    ///
    /// Missing text becomes empty, a missing or unknown type becomes
    /// short-answer, missing lists become empty.
    pub fn into_question(self, id: String) -> Question {
        let question_type = match self.question_type.as_deref() {
            None => QuestionType::ShortAnswer,
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("{}; treating question {} as short-answer", e, id);
                QuestionType::ShortAnswer
            }),
        };

        Question {
            id,
            text: self.question_text.unwrap_or_default(),
            question_type,
            options: self.options.unwrap_or_default(),
            correct_answers: self.correct_answers.unwrap_or_default(),
        }
    }
}

/// DTO for the manual question form.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ManualQuestionRequest {
    #[validate(length(min = 1, max = 2000, message = "Question text is required."))]
    pub question_text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<String>,
    #[validate(custom(function = validate_answer_list))]
    pub correct_answers: Vec<String>,
}

impl ManualQuestionRequest {
    /// Checks the form and turns it into a candidate.
    ///
    /// Blank lines are dropped; options are discarded for short-answer
    /// questions and required otherwise.
    pub fn into_candidate(self) -> Result<QuestionCandidate, validator::ValidationErrors> {
        self.validate()?;

        let options: Vec<String> = if self.question_type.has_options() {
            non_blank(self.options)
        } else {
            Vec::new()
        };

        if self.question_type.has_options() && options.is_empty() {
            let mut errors = validator::ValidationErrors::new();
            errors.add(
                "options",
                validator::ValidationError::new("options_required")
                    .with_message("Choice questions need at least one option.".into()),
            );
            return Err(errors);
        }

        Ok(QuestionCandidate {
            question_text: Some(self.question_text),
            question_type: Some(self.question_type.as_str().to_string()),
            options: Some(options),
            correct_answers: Some(non_blank(self.correct_answers)),
        })
    }
}

fn validate_answer_list(answers: &[String]) -> Result<(), validator::ValidationError> {
    if answers.iter().all(|a| a.trim().is_empty()) {
        return Err(validator::ValidationError::new("correct_answers_required")
            .with_message("At least one correct answer is required.".into()));
    }
    Ok(())
}

fn non_blank(values: Vec<String>) -> Vec<String> {
    values.into_iter().filter(|v| !v.trim().is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_type_wire_names() {
        let json = serde_json::to_string(&QuestionType::MultiChoice).unwrap();
        assert_eq!(json, "\"multiple-answer\"");

        let parsed: QuestionType = serde_json::from_str("\"single-choice\"").unwrap();
        assert_eq!(parsed, QuestionType::SingleChoice);
        assert_eq!(" Short-Answer ".parse::<QuestionType>(), Ok(QuestionType::ShortAnswer));
        assert!("essay".parse::<QuestionType>().is_err());
    }

    #[test]
    fn candidate_defaults_fill_missing_fields() {
        let q = QuestionCandidate::default().into_question("q-1".to_string());
        assert_eq!(q.id, "q-1");
        assert_eq!(q.text, "");
        assert_eq!(q.question_type, QuestionType::ShortAnswer);
        assert!(q.options.is_empty());
        assert!(q.correct_answers.is_empty());
    }

    #[test]
    fn candidate_with_unknown_type_becomes_short_answer() {
        let candidate = QuestionCandidate {
            question_text: Some("Essay?".into()),
            question_type: Some("essay".into()),
            ..Default::default()
        };
        let q = candidate.into_question("x".into());
        assert_eq!(q.question_type, QuestionType::ShortAnswer);
    }

    #[test]
    fn manual_request_drops_options_for_short_answer() {
        let req = ManualQuestionRequest {
            question_text: "Chemical formula of water?".into(),
            question_type: QuestionType::ShortAnswer,
            options: vec!["ignored".into()],
            correct_answers: vec!["H2O".into(), "  ".into()],
        };
        let candidate = req.into_candidate().unwrap();
        assert_eq!(candidate.options, Some(vec![]));
        assert_eq!(candidate.correct_answers, Some(vec!["H2O".to_string()]));
    }

    #[test]
    fn manual_request_requires_options_for_choice() {
        let req = ManualQuestionRequest {
            question_text: "Pick one".into(),
            question_type: QuestionType::SingleChoice,
            options: vec!["".into()],
            correct_answers: vec!["A".into()],
        };
        assert!(req.into_candidate().is_err());
    }

    #[test]
    fn manual_request_requires_an_answer() {
        let req = ManualQuestionRequest {
            question_text: "Pick one".into(),
            question_type: QuestionType::SingleChoice,
            options: vec!["A".into()],
            correct_answers: vec![" ".into()],
        };
        assert!(req.into_candidate().is_err());
    }
}
