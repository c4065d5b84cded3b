use axum::{
    extract::{Query, State},
    Extension, Json,
};
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::db;
use crate::dto::{MicronutrientQuery, UpdateGoalsRequest};
use crate::error::AppResult;
use crate::models::goals::{MicronutrientGoals, NutritionGoals};
use crate::AppState;

pub async fn get_goals(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<NutritionGoals>> {
    let goals = db::goals::get_or_create(&state.db, auth_user.id).await?;
    Ok(Json(goals))
}

pub async fn update_goals(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<UpdateGoalsRequest>,
) -> AppResult<Json<NutritionGoals>> {
    body.validate()?;

    let goals = db::goals::replace(
        &state.db,
        auth_user.id,
        body.daily_calories,
        body.daily_carbs,
        body.daily_protein,
        body.daily_fat,
    )
    .await?;

    tracing::info!(user_id = %auth_user.id, daily_calories = goals.daily_calories, "Goals updated");
    Ok(Json(goals))
}

pub async fn micronutrient_goals(
    Query(query): Query<MicronutrientQuery>,
) -> AppResult<Json<MicronutrientGoals>> {
    query.validate()?;
    Ok(Json(MicronutrientGoals::for_profile(query.age, query.weight)))
}
