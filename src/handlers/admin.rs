// src/handlers/admin.rs

//! Admin routes: exam catalogue, draft authoring and the student roster.
//! All handlers run behind `admin_middleware`.

use axum::{
    Json,
    body::Bytes,
    extract::{Extension, Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    authoring::{
        DraftBoard,
        ai::GenerateRequest,
        draft::{DraftDetails, QuestionSource},
        import::{QuestionImporter, csv_template, json_template},
    },
    error::AppError,
    models::{
        exam::ExamSummary,
        question::{ManualQuestionRequest, QuestionCandidate},
        user::CreateStudentRequest,
    },
    state::{SharedExamStore, SharedStudentStore},
    utils::jwt::Claims,
};

/// Lists all exams.
/// Admin only.
pub async fn list_exams(State(exams): State<SharedExamStore>) -> Json<Vec<ExamSummary>> {
    Json(exams.list().await.iter().map(|e| e.summary()).collect())
}

/// Full exam including answer keys.
pub async fn get_exam(
    State(exams): State<SharedExamStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let exam = exams
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound("Exam not found".to_string()))?;
    Ok(Json(exam.as_ref().clone()))
}

pub async fn get_draft(
    State(drafts): State<DraftBoard>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    Json(drafts.snapshot(&claims.sub).await)
}

/// Updates title, subject and duration of the draft.
pub async fn update_draft(
    State(drafts): State<DraftBoard>,
    Extension(claims): Extension<Claims>,
    Json(details): Json<DraftDetails>,
) -> impl IntoResponse {
    let draft = drafts
        .edit(&claims.sub, |draft| {
            draft.set_details(details);
            draft.clone()
        })
        .await;
    Json(draft)
}

/// Adds one question from the manual entry form.
pub async fn add_question(
    State(drafts): State<DraftBoard>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ManualQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let candidate = payload.into_candidate()?;
    let question = drafts
        .edit(&claims.sub, |draft| draft.add_question(candidate).clone())
        .await;
    Ok((StatusCode::CREATED, Json(question)))
}

pub async fn remove_question(
    State(drafts): State<DraftBoard>,
    Extension(claims): Extension<Claims>,
    Path(question_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let removed = drafts
        .edit(&claims.sub, |draft| draft.remove_question(&question_id))
        .await;
    if !removed {
        return Err(AppError::NotFound("Question not found in draft".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ImportQuery {
    pub filename: String,
}

/// Imports questions from an uploaded file (raw body, name in the query).
pub async fn import_file(
    State(importer): State<QuestionImporter>,
    State(drafts): State<DraftBoard>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ImportQuery>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let (source, candidates) = importer.import_file(&query.filename, &body).await?;
    Ok(append(&drafts, &claims.sub, source, candidates).await)
}

#[derive(Debug, Deserialize)]
pub struct ImportTextRequest {
    pub text: String,
}

/// Extracts questions from pasted text via the AI.
pub async fn import_text(
    State(importer): State<QuestionImporter>,
    State(drafts): State<DraftBoard>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ImportTextRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (source, candidates) = importer.import_text(&payload.text).await?;
    Ok(append(&drafts, &claims.sub, source, candidates).await)
}

/// Generates questions on a topic via the AI.
pub async fn generate(
    State(importer): State<QuestionImporter>,
    State(drafts): State<DraftBoard>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<GenerateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (source, candidates) = importer.generate(&payload).await?;
    Ok(append(&drafts, &claims.sub, source, candidates).await)
}

async fn append(
    drafts: &DraftBoard,
    admin: &str,
    source: QuestionSource,
    candidates: Vec<QuestionCandidate>,
) -> (StatusCode, Json<serde_json::Value>) {
    let (added, draft) = drafts
        .edit(admin, |draft| {
            let added = draft.add_candidates(source, candidates).len();
            (added, draft.clone())
        })
        .await;

    (
        StatusCode::CREATED,
        Json(json!({
            "added": added,
            "draft": draft,
        })),
    )
}

/// Saves the draft as a new exam.
pub async fn commit_draft(
    State(drafts): State<DraftBoard>,
    State(exams): State<SharedExamStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let exam = drafts.commit(&claims.sub, exams.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(exam.summary())))
}

/// Downloadable import template (`json` or `csv`).
pub async fn template(Path(format): Path<String>) -> Result<impl IntoResponse, AppError> {
    let (content_type, filename, body) = match format.as_str() {
        "json" => ("application/json", "question_template.json", json_template()),
        "csv" => ("text/csv; charset=utf-8", "question_template.csv", csv_template()?),
        _ => {
            return Err(AppError::NotFound(format!(
                "No template for format '{}'",
                format
            )));
        }
    };

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    ))
}

pub async fn list_students(State(students): State<SharedStudentStore>) -> impl IntoResponse {
    Json(students.list().await)
}

pub async fn create_student(
    State(students): State<SharedStudentStore>,
    Json(payload): Json<CreateStudentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let student = payload.into_student()?;
    students.insert(student.clone()).await?;
    tracing::info!(student = %student.id, "Student registered");
    Ok((StatusCode::CREATED, Json(student)))
}

pub async fn delete_student(
    State(students): State<SharedStudentStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    students.remove(&id).await?;
    tracing::info!(student = %id, "Student removed");
    Ok(StatusCode::NO_CONTENT)
}
