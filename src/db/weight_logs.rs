use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::weight_log::WeightLog;

pub async fn list(pool: &PgPool, user_id: Uuid) -> Result<Vec<WeightLog>, sqlx::Error> {
    sqlx::query_as::<_, WeightLog>(
        "SELECT * FROM weight_logs WHERE user_id = $1 ORDER BY logged_at ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn insert(
    pool: &PgPool,
    user_id: Uuid,
    weight_kg: f64,
    logged_at: DateTime<Utc>,
) -> Result<WeightLog, sqlx::Error> {
    sqlx::query_as::<_, WeightLog>(
        r#"
        INSERT INTO weight_logs (id, user_id, weight_kg, logged_at)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(weight_kg)
    .bind(logged_at)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM weight_logs WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn latest(pool: &PgPool, user_id: Uuid) -> Result<Option<WeightLog>, sqlx::Error> {
    sqlx::query_as::<_, WeightLog>(
        "SELECT * FROM weight_logs WHERE user_id = $1 ORDER BY logged_at DESC LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}
