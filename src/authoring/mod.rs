// src/authoring/mod.rs

pub mod ai;
pub mod draft;
pub mod import;
pub mod readers;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use draft::DraftExam;

use crate::{error::AppError, models::exam::Exam, store::ExamStore};

/// One draft exam per administrator, keyed by the admin's token subject.
///
/// Supplier calls (file parsing, AI) must finish before the lock is taken.
#[derive(Clone, Default)]
pub struct DraftBoard {
    drafts: Arc<Mutex<HashMap<String, DraftExam>>>,
}

impl DraftBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self, admin: &str) -> DraftExam {
        self.drafts
            .lock()
            .await
            .get(admin)
            .cloned()
            .unwrap_or_default()
    }

    /// Runs `f` against the admin's draft, creating an empty one first if
    /// needed.
    pub async fn edit<T>(&self, admin: &str, f: impl FnOnce(&mut DraftExam) -> T) -> T {
        let mut drafts = self.drafts.lock().await;
        f(drafts.entry(admin.to_string()).or_default())
    }

    /// Saves the admin's draft as a new exam and resets it. The draft only
    /// changes once the store accepted the exam.
    pub async fn commit(&self, admin: &str, exams: &dyn ExamStore) -> Result<Arc<Exam>, AppError> {
        let mut drafts = self.drafts.lock().await;
        let draft = drafts.entry(admin.to_string()).or_default();

        let mut next = draft.clone();
        let exam = next.commit()?;
        let stored = exams.insert(exam).await?;
        *draft = next;

        tracing::info!(exam = %stored.id, questions = stored.question_count(), admin = %admin, "Exam saved");
        Ok(stored)
    }
}
