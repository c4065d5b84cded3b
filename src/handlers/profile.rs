use axum::{extract::State, Extension, Json};
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::db;
use crate::dto::UpdateProfileRequest;
use crate::error::AppResult;
use crate::models::profile::Profile;
use crate::AppState;

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Profile>> {
    let profile = db::profiles::get_or_create(&state.db, auth_user.id).await?;
    Ok(Json(profile))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> AppResult<Json<Profile>> {
    body.validate()?;

    let profile = db::profiles::replace(
        &state.db,
        auth_user.id,
        body.name.trim(),
        body.age,
        body.height,
        body.current_weight,
    )
    .await?;

    tracing::info!(user_id = %auth_user.id, "Profile updated");
    Ok(Json(profile))
}
