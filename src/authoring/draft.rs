// src/authoring/draft.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::DEFAULT_DRAFT_DURATION_MINUTES,
    error::AppError,
    models::{
        exam::Exam,
        question::{Question, QuestionCandidate},
    },
};

/// Where a draft question came from. Shows up as the prefix of its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionSource {
    Manual,
    /// File import, tagged with the file kind label (`json`, `csv`, ...).
    Import(&'static str),
    Generated,
    ExtractedText,
}

impl QuestionSource {
    fn id_prefix(&self) -> String {
        match self {
            QuestionSource::Manual => "manual".to_string(),
            QuestionSource::Import(kind) => format!("upl-{}", kind),
            QuestionSource::Generated => "gen".to_string(),
            QuestionSource::ExtractedText => "text-ai".to_string(),
        }
    }

    /// A fresh id; random so it never repeats within a draft or across saves.
    fn fresh_id(&self) -> String {
        format!("{}-{}", self.id_prefix(), Uuid::new_v4())
    }
}

/// An exam being assembled by an administrator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftExam {
    pub title: String,
    pub subject: String,
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
    pub questions: Vec<Question>,
}

impl Default for DraftExam {
    fn default() -> Self {
        Self {
            title: String::new(),
            subject: String::new(),
            duration_minutes: DEFAULT_DRAFT_DURATION_MINUTES,
            questions: Vec::new(),
        }
    }
}

/// DTO for editing the draft header. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftDetails {
    pub title: Option<String>,
    pub subject: Option<String>,
    #[serde(rename = "duration")]
    pub duration_minutes: Option<u32>,
}

impl DraftExam {
    pub fn set_details(&mut self, details: DraftDetails) {
        if let Some(title) = details.title {
            self.title = title;
        }
        if let Some(subject) = details.subject {
            self.subject = subject;
        }
        if let Some(duration) = details.duration_minutes {
            self.duration_minutes = duration;
        }
    }

    /// Gives every candidate a fresh id and appends it. Returns the added
    /// questions.
    ///
    /// Question content is taken as is, including choice questions whose
    /// correct answers are not among their options.
    pub fn add_candidates(
        &mut self,
        source: QuestionSource,
        candidates: Vec<QuestionCandidate>,
    ) -> &[Question] {
        let start = self.questions.len();
        self.questions.extend(
            candidates
                .into_iter()
                .map(|candidate| candidate.into_question(source.fresh_id())),
        );
        &self.questions[start..]
    }

    /// Appends one question from the manual entry form.
    pub fn add_question(&mut self, candidate: QuestionCandidate) -> &Question {
        let question = candidate.into_question(QuestionSource::Manual.fresh_id());
        self.questions.push(question);
        &self.questions[self.questions.len() - 1]
    }

    /// Returns `false` when no question has that id.
    pub fn remove_question(&mut self, question_id: &str) -> bool {
        let before = self.questions.len();
        self.questions.retain(|q| q.id != question_id);
        self.questions.len() != before
    }

    /// Turns the draft into an exam and starts a new, empty draft.
    ///
    /// Title and subject must be non-empty, the duration positive and at
    /// least one question present. On failure nothing changes.
    pub fn commit(&mut self) -> Result<Exam, AppError> {
        if self.title.trim().is_empty()
            || self.subject.trim().is_empty()
            || self.duration_minutes == 0
            || self.questions.is_empty()
        {
            return Err(AppError::BadRequest(
                "Please provide a title, a subject, a duration (> 0) and at least one question."
                    .to_string(),
            ));
        }

        let exam = Exam::new(
            format!("exam-{}", Uuid::new_v4()),
            self.title.clone(),
            self.subject.clone(),
            self.duration_minutes,
            self.questions.clone(),
        )?;
        *self = DraftExam::default();
        Ok(exam)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::models::question::QuestionType;

    fn candidate(text: &str) -> QuestionCandidate {
        QuestionCandidate {
            question_text: Some(text.to_string()),
            question_type: Some("short-answer".to_string()),
            options: None,
            correct_answers: Some(vec!["x".to_string()]),
        }
    }

    fn complete_draft() -> DraftExam {
        let mut draft = DraftExam::default();
        draft.set_details(DraftDetails {
            title: Some("Quiz".into()),
            subject: Some("Math".into()),
            duration_minutes: Some(30),
        });
        draft.add_candidates(QuestionSource::Manual, vec![candidate("one")]);
        draft
    }

    #[test]
    fn new_draft_has_default_duration() {
        assert_eq!(DraftExam::default().duration_minutes, 60);
    }

    #[test]
    fn candidates_get_unique_prefixed_ids() {
        let mut draft = DraftExam::default();
        let added = draft.add_candidates(
            QuestionSource::Import("csv"),
            vec![candidate("a"), candidate("b"), candidate("c")],
        );
        assert_eq!(added.len(), 3);
        assert!(added.iter().all(|q| q.id.starts_with("upl-csv-")));

        draft.add_candidates(QuestionSource::Generated, vec![candidate("d")]);
        let ids: HashSet<&str> = draft.questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids.len(), 4);
        assert_eq!(draft.questions[3].question_type, QuestionType::ShortAnswer);
    }

    #[test]
    fn manual_question_gets_manual_prefix() {
        let mut draft = DraftExam::default();
        let id = draft.add_question(candidate("typed in")).id.clone();
        assert!(id.starts_with("manual-"));
        assert_eq!(draft.questions.len(), 1);
    }

    #[test]
    fn remove_question_by_id() {
        let mut draft = complete_draft();
        let id = draft.questions[0].id.clone();
        assert!(draft.remove_question(&id));
        assert!(!draft.remove_question(&id));
        assert!(draft.questions.is_empty());
    }

    #[test]
    fn commit_validates_and_resets() {
        let mut draft = complete_draft();
        let exam = draft.commit().unwrap();
        assert!(exam.id.starts_with("exam-"));
        assert_eq!(exam.question_count(), 1);
        assert_eq!(draft, DraftExam::default());
    }

    #[test]
    fn incomplete_draft_is_rejected_unchanged() {
        let cases: Vec<fn(&mut DraftExam)> = vec![
            |d: &mut DraftExam| d.title = "  ".into(),
            |d: &mut DraftExam| d.subject = String::new(),
            |d: &mut DraftExam| d.duration_minutes = 0,
            |d: &mut DraftExam| d.questions.clear(),
        ];
        for breakage in cases {
            let mut draft = complete_draft();
            breakage(&mut draft);
            let snapshot = draft.clone();
            assert!(matches!(draft.commit(), Err(AppError::BadRequest(_))));
            assert_eq!(draft, snapshot);
        }
    }

    #[test]
    fn mismatched_answer_key_is_accepted() {
        let mut draft = complete_draft();
        draft.add_candidates(
            QuestionSource::Manual,
            vec![QuestionCandidate {
                question_text: Some("Pick".into()),
                question_type: Some("multiple-choice".into()),
                options: Some(vec!["A".into(), "B".into()]),
                correct_answers: Some(vec!["Z".into()]),
            }],
        );
        assert!(draft.commit().is_ok());
    }
}
