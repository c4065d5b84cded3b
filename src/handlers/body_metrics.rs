use axum::Json;
use validator::Validate;

use crate::dto::BodyMetricsRequest;
use crate::error::AppResult;
use crate::services::body_metrics::{calculate, BodyMetrics, BodyProfile};

pub async fn body_metrics(Json(body): Json<BodyMetricsRequest>) -> AppResult<Json<BodyMetrics>> {
    body.validate()?;
    Ok(Json(calculate(&BodyProfile::from(body))))
}
