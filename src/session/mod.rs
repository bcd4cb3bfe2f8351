// src/session/mod.rs

//! One student's attempt at one exam.
//!
//! [`ExamSession`] is a plain state machine driven by answer, navigation,
//! tick and submit events. The clock that feeds it ticks lives in
//! [`timer`], and [`registry`] owns the live sessions of the server.

pub mod registry;
pub mod timer;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::AppError,
    grading::{GradeReport, grade},
    models::{
        answer::{AnswerPayload, AnswerStore, AnswerValue},
        exam::Exam,
        question::PublicQuestion,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    InProgress,
    Submitted,
}

/// What ended the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitKind {
    /// The student pressed "finish".
    Manual,
    /// The clock ran out.
    Auto,
}

/// Whether an event changed the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mutation {
    Applied,
    /// Session already submitted or navigation target out of range.
    Ignored,
}

/// Result handed back once an attempt is submitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub session_id: Uuid,
    pub exam_id: String,
    pub student_id: String,
    pub kind: SubmitKind,
    pub report: GradeReport,
    /// Two-decimal rendering of `report.score`.
    pub score: String,
    pub message: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct ExamSession {
    id: Uuid,
    student_id: String,
    exam: Arc<Exam>,
    current_index: usize,
    answers: AnswerStore,
    remaining_seconds: u64,
    status: SessionStatus,
    started_at: DateTime<Utc>,
}

impl ExamSession {
    /// Opens a fresh attempt at the first question with the full time.
    pub fn start(exam: Arc<Exam>, student_id: impl Into<String>) -> Self {
        let remaining_seconds = exam.duration_seconds();
        Self {
            id: Uuid::new_v4(),
            student_id: student_id.into(),
            exam,
            current_index: 0,
            answers: AnswerStore::new(),
            remaining_seconds,
            status: SessionStatus::InProgress,
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    pub fn exam(&self) -> &Exam {
        &self.exam
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == SessionStatus::InProgress
    }

    /// Records (or clears) the answer to `question_id`.
    ///
    /// Unknown questions and malformed payloads are rejected without
    /// touching the session. After submission the call is ignored.
    pub fn set_answer(&mut self, question_id: &str, payload: AnswerPayload) -> Result<Mutation, AppError> {
        if !self.is_in_progress() {
            tracing::debug!(session = %self.id, "answer ignored: session already submitted");
            return Ok(Mutation::Ignored);
        }

        let question = self
            .exam
            .question(question_id)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown question '{}'", question_id)))?;

        let value = AnswerValue::from_payload(question, payload)?;
        self.answers.record(question_id, value);
        Ok(Mutation::Applied)
    }

    /// Moves to question `index`. Out-of-range targets leave the position alone.
    pub fn go_to(&mut self, index: usize) -> Mutation {
        if !self.is_in_progress() || index >= self.exam.question_count() {
            tracing::debug!(session = %self.id, index, "navigation ignored");
            return Mutation::Ignored;
        }
        self.current_index = index;
        Mutation::Applied
    }

    pub fn next(&mut self) -> Mutation {
        self.go_to(self.current_index + 1)
    }

    pub fn previous(&mut self) -> Mutation {
        match self.current_index.checked_sub(1) {
            Some(index) => self.go_to(index),
            None => Mutation::Ignored,
        }
    }

    /// Advances the clock by one second.
    ///
    /// When the time reaches zero the session submits itself and the
    /// outcome is returned; this happens exactly once.
    pub fn tick(&mut self) -> Option<SubmissionOutcome> {
        if !self.is_in_progress() {
            return None;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            return self.submit(SubmitKind::Auto);
        }
        None
    }

    /// Ends the attempt and grades it.
    ///
    /// Only the first call does anything; later calls return `None`, so a
    /// manual submit racing the clock grades once.
    pub fn submit(&mut self, kind: SubmitKind) -> Option<SubmissionOutcome> {
        if !self.is_in_progress() {
            tracing::debug!(session = %self.id, ?kind, "duplicate submit ignored");
            return None;
        }
        self.status = SessionStatus::Submitted;

        let report = grade(&self.exam, &self.answers);
        let score = report.display_score();
        tracing::info!(
            session = %self.id,
            exam = %self.exam.id,
            student = %self.student_id,
            ?kind,
            score = %score,
            "Exam submitted"
        );

        let message = match kind {
            SubmitKind::Manual => format!("Exam finished! Your score: {}", score),
            SubmitKind::Auto => format!(
                "Time is up! Your exam was submitted automatically. Your score: {}",
                score
            ),
        };

        Some(SubmissionOutcome {
            session_id: self.id,
            exam_id: self.exam.id.clone(),
            student_id: self.student_id.clone(),
            kind,
            report,
            score,
            message,
            submitted_at: Utc::now(),
        })
    }

    /// Snapshot of what the student currently sees.
    pub fn view(&self) -> SessionView {
        let question = &self.exam.questions()[self.current_index];
        SessionView {
            session_id: self.id,
            exam_id: self.exam.id.clone(),
            title: self.exam.title.clone(),
            subject: self.exam.subject.clone(),
            status: self.status,
            current_index: self.current_index,
            total_questions: self.exam.question_count(),
            question: question.to_public(),
            current_answer: self
                .answers
                .get(&question.id)
                .map(AnswerValue::to_vec)
                .unwrap_or_default(),
            answered_count: self.answers.len(),
            remaining_seconds: self.remaining_seconds,
            clock: format_clock(self.remaining_seconds),
            started_at: self.started_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: Uuid,
    pub exam_id: String,
    pub title: String,
    pub subject: String,
    pub status: SessionStatus,
    pub current_index: usize,
    pub total_questions: usize,
    pub question: PublicQuestion,
    pub current_answer: Vec<String>,
    pub answered_count: usize,
    pub remaining_seconds: u64,
    pub clock: String,
    pub started_at: DateTime<Utc>,
}

/// `HH:MM:SS` rendering of a number of seconds.
pub fn format_clock(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}
