use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::context::resolve_timezone;
use crate::db;
use crate::dto::{
    CreateFromTextRequest, DayQuery, DeleteResponse, FoodEntryRequest, ImportResponse,
    ParseFoodRequest, ParseFoodResponse,
};
use crate::error::{AppError, AppResult};
use crate::models::food_entry::{FoodEntry, NewFoodEntry};
use crate::services::aggregation::{window_boundaries, WindowType};
use crate::services::csv_io;
use crate::AppState;

/// Parse a description without saving anything.
pub async fn parse_food(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<ParseFoodRequest>,
) -> AppResult<Json<ParseFoodResponse>> {
    body.validate()?;

    let cancel = state.shutdown.child_token();
    let food_items = state.parser.parse_with_cancel(&body.text, &cancel).await?;

    tracing::info!(user_id = %auth_user.id, items = food_items.len(), "Parsed food description");
    Ok(Json(ParseFoodResponse { food_items }))
}

/// Parse a description and persist every recognized item.
pub async fn create_from_text(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateFromTextRequest>,
) -> AppResult<Json<Vec<FoodEntry>>> {
    body.validate()?;

    let cancel = state.shutdown.child_token();
    let candidates = state.parser.parse_with_cancel(&body.text, &cancel).await?;
    if candidates.is_empty() {
        return Err(AppError::Validation(
            "No food items were recognized in the description".into(),
        ));
    }

    let logged_at = body.logged_at.unwrap_or_else(Utc::now);
    let new_entries: Vec<NewFoodEntry> = candidates
        .into_iter()
        .map(|c| c.into_new_entry(auth_user.id, logged_at))
        .collect();

    let saved = db::food_entries::insert_many(&state.db, &new_entries).await?;
    tracing::info!(user_id = %auth_user.id, count = saved.len(), "Food entries created from text");
    Ok(Json(saved))
}

pub async fn create_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<FoodEntryRequest>,
) -> AppResult<Json<FoodEntry>> {
    body.validate()?;

    let new_entry = body.into_new_entry(auth_user.id);
    let mut saved = db::food_entries::insert_many(&state.db, std::slice::from_ref(&new_entry)).await?;
    saved
        .pop()
        .map(Json)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Insert returned no row")))
}

/// Entries of one local calendar day.
pub async fn list_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<DayQuery>,
) -> AppResult<Json<Vec<FoodEntry>>> {
    let tz = resolve_timezone(query.tz.as_deref(), state.config.default_timezone)?;
    let date = query
        .date
        .unwrap_or_else(|| Utc::now().with_timezone(&tz).date_naive());

    let window = window_boundaries(date, 0, WindowType::Day, None)?;
    let (start, end) = window.utc_range(tz);
    let entries = db::food_entries::list_between(&state.db, auth_user.id, start, end).await?;

    Ok(Json(entries))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
    Json(body): Json<FoodEntryRequest>,
) -> AppResult<Json<FoodEntry>> {
    body.validate()?;

    let replacement = body.into_new_entry(auth_user.id);
    let entry = db::food_entries::replace(&state.db, entry_id, &replacement)
        .await?
        .ok_or(AppError::NotFound("Food entry not found".into()))?;

    Ok(Json(entry))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    if !db::food_entries::delete(&state.db, auth_user.id, entry_id).await? {
        return Err(AppError::NotFound("Food entry not found".into()));
    }

    Ok(Json(DeleteResponse {
        deleted: true,
        id: entry_id,
    }))
}

pub async fn export_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<impl IntoResponse> {
    let entries = db::food_entries::list_all(&state.db, auth_user.id).await?;
    let csv = csv_io::export_entries(&entries)?;

    let disposition = format!(
        "attachment; filename=\"food-entries-{}.csv\"",
        Utc::now().format("%Y-%m-%d")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

pub async fn import_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    body: Bytes,
) -> AppResult<Json<ImportResponse>> {
    let report = csv_io::import_entries(&body, auth_user.id);
    if report.entries.is_empty() {
        return Err(AppError::Validation("No valid rows found in CSV file".into()));
    }

    let saved = db::food_entries::insert_many(&state.db, &report.entries).await?;
    tracing::info!(
        user_id = %auth_user.id,
        imported = saved.len(),
        skipped = report.skipped.len(),
        "CSV import finished"
    );

    Ok(Json(ImportResponse {
        imported: saved.len(),
        skipped: report.skipped,
    }))
}
