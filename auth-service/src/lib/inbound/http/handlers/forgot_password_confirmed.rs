use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use crate::inbound::http::router::AppState;

pub async fn forgot_password_confirmed(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordConfirmedRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .auth_service
        .complete_reset_password(&body.token, &body.password)
        .await
        .map_err(ApiError::from)
        .map(|_| StatusCode::NO_CONTENT)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ForgotPasswordConfirmedRequest {
    token: String,
    password: String,
}
