// src/handlers/auth.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{LoginRequest, Role},
    state::AppState,
    utils::{hash::verify_password, jwt::sign_jwt},
};

const ADMIN_DISPLAY_NAME: &str = "Administrator";

/// Authenticates a student or the administrator and returns a JWT token.
///
/// Students log in with their registration number as both username and
/// password; the number must be on the roster. The admin uses the
/// configured credentials.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let (sub, name) = match payload.role {
        Role::Student => {
            if payload.username != payload.password {
                return Err(AppError::AuthError(
                    "Student id and password must be the same.".to_string(),
                ));
            }
            let student = state
                .students
                .get(&payload.username)
                .await
                .ok_or_else(|| AppError::AuthError("Student id not found.".to_string()))?;
            (student.id, student.name)
        }
        Role::Admin => {
            let password_ok = verify_password(&payload.password, &state.admin_password_hash)?;
            if payload.username != state.config.admin_username || !password_ok {
                return Err(AppError::AuthError(
                    "Invalid admin username or password.".to_string(),
                ));
            }
            (payload.username, ADMIN_DISPLAY_NAME.to_string())
        }
    };

    let token = sign_jwt(
        &sub,
        &name,
        payload.role,
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )?;

    tracing::info!(user = %sub, role = payload.role.as_str(), "User logged in");

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "role": payload.role,
        "id": sub,
        "name": name,
    })))
}
