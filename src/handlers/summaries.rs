use axum::{
    extract::{Query, State},
    Extension, Json,
};

use crate::auth::middleware::AuthUser;
use crate::context::UserContext;
use crate::db;
use crate::dto::{DailySummaryResponse, DayQuery, PeriodQuery};
use crate::error::AppResult;
use crate::services::aggregation::{
    aggregate_by_day, local_date, micronutrient_progress, summarize_period, window_boundaries,
    DailyAggregate, PeriodSummary, WindowType,
};
use crate::AppState;

pub async fn daily_summary(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<DayQuery>,
) -> AppResult<Json<DailySummaryResponse>> {
    let ctx = UserContext::load(&state, &auth_user, query.tz.as_deref()).await?;
    let date = query.date.unwrap_or_else(|| ctx.today());

    let window = window_boundaries(date, 0, WindowType::Day, None)?;
    let (start, end) = window.utc_range(ctx.tz);
    let entries = db::food_entries::list_between(&state.db, ctx.user_id, start, end).await?;

    let totals = aggregate_by_day(&entries, ctx.tz)
        .remove(&date)
        .unwrap_or_else(|| DailyAggregate::empty(date));

    let profile = db::profiles::get_or_create(&state.db, ctx.user_id).await?;
    let logged_weight = db::weight_logs::latest(&state.db, ctx.user_id)
        .await?
        .map(|w| w.weight_kg);
    let micronutrient_goals = profile.micronutrient_goals(logged_weight);

    Ok(Json(DailySummaryResponse {
        date,
        timezone: ctx.tz.name().to_string(),
        progress: totals.progress(&ctx.goals),
        micronutrient_progress: micronutrient_progress(&totals.micronutrients, &micronutrient_goals),
        totals,
        goals: ctx.goals,
        micronutrient_goals,
        entries,
    }))
}

pub async fn weekly_summary(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<PeriodSummary>> {
    period_summary(&state, &auth_user, query, WindowType::Week).await
}

pub async fn monthly_summary(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<PeriodSummary>> {
    period_summary(&state, &auth_user, query, WindowType::Month).await
}

async fn period_summary(
    state: &AppState,
    auth_user: &AuthUser,
    query: PeriodQuery,
    kind: WindowType,
) -> AppResult<Json<PeriodSummary>> {
    let ctx = UserContext::load(state, auth_user, query.tz.as_deref()).await?;

    let first_entry = db::food_entries::first_logged_at(&state.db, ctx.user_id)
        .await?
        .map(|at| local_date(at, ctx.tz));
    let window = window_boundaries(ctx.today(), query.offset, kind, first_entry)?;

    let (start, end) = window.utc_range(ctx.tz);
    let entries = db::food_entries::list_between(&state.db, ctx.user_id, start, end).await?;

    tracing::debug!(
        user_id = %ctx.user_id,
        window = ?kind,
        offset = query.offset,
        entries = entries.len(),
        "Building period summary"
    );

    Ok(Json(summarize_period(&entries, window, ctx.tz, &ctx.goals)))
}
