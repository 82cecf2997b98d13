use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use models::user::{self, NewUser};
use service::errors::ServiceError;

use crate::errors::ApiError;
use crate::startup::AppState;

/// Parse the `:user_id` path segment; ids are non-negative integers.
pub fn parse_user_id(raw: &str) -> Result<i64, ApiError> {
    let id: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest("userId must be an integer".into()))?;
    if id < 0 {
        return Err(ApiError::BadRequest("userId must be a non-negative integer".into()));
    }
    Ok(id)
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<user::Model>>, ApiError> {
    Ok(Json(state.users.get_all_users().await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<user::Model>, ApiError> {
    let id = parse_user_id(&user_id)?;
    let found = state
        .users
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User"))?;
    Ok(Json(found))
}

pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<user::Model>), ApiError> {
    let Json(input) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let created = state.users.create_user(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_user_id(&user_id)?;
    if state.users.delete_user(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServiceError::not_found("User").into())
    }
}
