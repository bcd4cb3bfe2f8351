// src/models/exam.rs

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::question::{PublicQuestion, Question};

/// A committed exam. Read-only once students can open it.
/// Only serialized: every instance goes through [`Exam::new`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: String,
    pub title: String,
    pub subject: String,

    /// Time allowed for one attempt, in minutes.
    #[serde(rename = "duration")]
    pub duration_minutes: u32,

    questions: Vec<Question>,
}

impl Exam {
    /// Builds an exam, rejecting a zero duration or an empty question list.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        subject: impl Into<String>,
        duration_minutes: u32,
        questions: Vec<Question>,
    ) -> Result<Self, AppError> {
        if duration_minutes == 0 {
            return Err(AppError::BadRequest(
                "Exam duration must be greater than zero.".to_string(),
            ));
        }
        if questions.is_empty() {
            return Err(AppError::BadRequest(
                "An exam needs at least one question.".to_string(),
            ));
        }

        Ok(Self {
            id: id.into(),
            title: title.into(),
            subject: subject.into(),
            duration_minutes,
            questions,
        })
    }

    /// Never empty.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn duration_seconds(&self) -> u64 {
        u64::from(self.duration_minutes) * 60
    }

    pub fn summary(&self) -> ExamSummary {
        ExamSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            subject: self.subject.clone(),
            duration_minutes: self.duration_minutes,
            question_count: self.questions.len(),
        }
    }
}

/// Row for the exam listings (student dashboard, admin list).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSummary {
    pub id: String,
    pub title: String,
    pub subject: String,
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
    pub question_count: usize,
}

/// Exam header plus questions without answer keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicExam {
    pub id: String,
    pub title: String,
    pub subject: String,
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
    pub questions: Vec<PublicQuestion>,
}

impl From<&Exam> for PublicExam {
    fn from(exam: &Exam) -> Self {
        Self {
            id: exam.id.clone(),
            title: exam.title.clone(),
            subject: exam.subject.clone(),
            duration_minutes: exam.duration_minutes,
            questions: exam.questions.iter().map(Question::to_public).collect(),
        }
    }
}
