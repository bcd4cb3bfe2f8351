// src/handlers/exams.rs

//! Student-facing exam routes. Every handler runs behind
//! `student_middleware`, so `Claims::sub` is the student id.

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{answer::AnswerPayload, exam::ExamSummary},
    session::registry::SessionRegistry,
    state::SharedExamStore,
    utils::jwt::Claims,
};

/// Lists the exams a student can take.
pub async fn list_exams(State(exams): State<SharedExamStore>) -> Json<Vec<ExamSummary>> {
    let summaries = exams.list().await.iter().map(|e| e.summary()).collect();
    Json(summaries)
}

/// Starts a timed attempt. Returns 201 and the first question.
pub async fn start_session(
    State(exams): State<SharedExamStore>,
    State(sessions): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let exam = exams
        .get(&exam_id)
        .await
        .ok_or_else(|| AppError::NotFound("Exam not found".to_string()))?;

    let view = sessions.start(exam, &claims.sub);
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_session(
    State(sessions): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(sessions.view(session_id, &claims.sub)?))
}

/// Records the answer to one question. An empty `values` list clears it.
pub async fn set_answer(
    State(sessions): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Path((session_id, question_id)): Path<(Uuid, String)>,
    Json(payload): Json<AnswerPayload>,
) -> Result<impl IntoResponse, AppError> {
    let reply = sessions.set_answer(session_id, &claims.sub, &question_id, payload)?;
    Ok(Json(reply))
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub index: usize,
}

/// Jumps to a question. Out-of-range indices leave the position unchanged.
pub async fn navigate(
    State(sessions): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<NavigateRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(sessions.go_to(session_id, &claims.sub, payload.index)?))
}

/// Finishes the attempt. Repeating the call returns the same outcome.
pub async fn submit(
    State(sessions): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(sessions.submit(session_id, &claims.sub)?))
}

pub async fn get_result(
    State(sessions): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(sessions.result(session_id, &claims.sub)?))
}

/// Leaves the exam page without submitting. The attempt is discarded.
pub async fn dispose_session(
    State(sessions): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    sessions.dispose(session_id, &claims.sub)?;
    Ok(StatusCode::NO_CONTENT)
}
