use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::db;
use crate::dto::{CreateWeightLogRequest, DeleteResponse};
use crate::error::{AppError, AppResult};
use crate::models::weight_log::WeightLog;
use crate::AppState;

pub async fn list_weight_logs(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<WeightLog>>> {
    let logs = db::weight_logs::list(&state.db, auth_user.id).await?;
    Ok(Json(logs))
}

pub async fn create_weight_log(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateWeightLogRequest>,
) -> AppResult<Json<WeightLog>> {
    body.validate()?;

    let log = db::weight_logs::insert(
        &state.db,
        auth_user.id,
        body.weight_kg,
        body.logged_at.unwrap_or_else(Utc::now),
    )
    .await?;
    Ok(Json(log))
}

pub async fn delete_weight_log(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(log_id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    if !db::weight_logs::delete(&state.db, auth_user.id, log_id).await? {
        return Err(AppError::NotFound("Weight log not found".into()));
    }

    Ok(Json(DeleteResponse {
        deleted: true,
        id: log_id,
    }))
}
