// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    authoring::{DraftBoard, ai::QuestionGenerator, import::QuestionImporter},
    config::Config,
    error::AppError,
    session::registry::SessionRegistry,
    store::{ExamStore, StudentStore},
    utils::hash::hash_password,
};

pub type SharedExamStore = Arc<dyn ExamStore>;
pub type SharedStudentStore = Arc<dyn StudentStore>;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub exams: SharedExamStore,
    pub students: SharedStudentStore,
    pub sessions: SessionRegistry,
    pub drafts: DraftBoard,
    pub importer: QuestionImporter,
    /// Argon2 hash of the configured admin password.
    pub admin_password_hash: Arc<str>,
}

impl AppState {
    /// Wires the stores and question generator together. The session clock
    /// period comes from `config`.
    pub fn new(
        config: Config,
        exams: SharedExamStore,
        students: SharedStudentStore,
        generator: Arc<dyn QuestionGenerator>,
    ) -> Result<Self, AppError> {
        let admin_password_hash = hash_password(&config.admin_password)?.into();
        Ok(Self {
            sessions: SessionRegistry::new(config.tick_period()),
            drafts: DraftBoard::new(),
            importer: QuestionImporter::new(generator),
            admin_password_hash,
            exams,
            students,
            config,
        })
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for SharedExamStore {
    fn from_ref(state: &AppState) -> Self {
        state.exams.clone()
    }
}

impl FromRef<AppState> for SharedStudentStore {
    fn from_ref(state: &AppState) -> Self {
        state.students.clone()
    }
}

impl FromRef<AppState> for SessionRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for DraftBoard {
    fn from_ref(state: &AppState) -> Self {
        state.drafts.clone()
    }
}

impl FromRef<AppState> for QuestionImporter {
    fn from_ref(state: &AppState) -> Self {
        state.importer.clone()
    }
}
