use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::food_entry::{FoodEntry, NewFoodEntry};

const INSERT: &str = r#"
    INSERT INTO food_entries
        (id, user_id, food_name, calories, carbs, protein, fat,
         vitamin_a, vitamin_c, vitamin_d, calcium, iron, fiber, quantity, logged_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
    RETURNING *
"#;

/// Insert every entry in one transaction; either all rows land or none do.
pub async fn insert_many(pool: &PgPool, entries: &[NewFoodEntry]) -> Result<Vec<FoodEntry>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut saved = Vec::with_capacity(entries.len());

    for e in entries {
        let m = &e.micronutrients;
        let row = sqlx::query_as::<_, FoodEntry>(INSERT)
            .bind(Uuid::new_v4())
            .bind(e.user_id)
            .bind(&e.food_name)
            .bind(e.calories)
            .bind(e.carbs)
            .bind(e.protein)
            .bind(e.fat)
            .bind(m.vitamin_a)
            .bind(m.vitamin_c)
            .bind(m.vitamin_d)
            .bind(m.calcium)
            .bind(m.iron)
            .bind(m.fiber)
            .bind(&e.quantity)
            .bind(e.logged_at)
            .fetch_one(&mut *tx)
            .await?;
        saved.push(row);
    }

    tx.commit().await?;
    Ok(saved)
}

/// Entries with `start <= logged_at < end`, oldest first.
pub async fn list_between(
    pool: &PgPool,
    user_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<FoodEntry>, sqlx::Error> {
    sqlx::query_as::<_, FoodEntry>(
        r#"
        SELECT * FROM food_entries
        WHERE user_id = $1 AND logged_at >= $2 AND logged_at < $3
        ORDER BY logged_at ASC
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
}

pub async fn list_all(pool: &PgPool, user_id: Uuid) -> Result<Vec<FoodEntry>, sqlx::Error> {
    sqlx::query_as::<_, FoodEntry>(
        "SELECT * FROM food_entries WHERE user_id = $1 ORDER BY logged_at ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn first_logged_at(pool: &PgPool, user_id: Uuid) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
        "SELECT MIN(logged_at) FROM food_entries WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}

/// Full-record replacement. `None` when the entry does not exist or belongs to someone else.
pub async fn replace(
    pool: &PgPool,
    id: Uuid,
    entry: &NewFoodEntry,
) -> Result<Option<FoodEntry>, sqlx::Error> {
    let m = &entry.micronutrients;
    sqlx::query_as::<_, FoodEntry>(
        r#"
        UPDATE food_entries
        SET food_name = $3, calories = $4, carbs = $5, protein = $6, fat = $7,
            vitamin_a = $8, vitamin_c = $9, vitamin_d = $10, calcium = $11, iron = $12,
            fiber = $13, quantity = $14, logged_at = $15
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(entry.user_id)
    .bind(&entry.food_name)
    .bind(entry.calories)
    .bind(entry.carbs)
    .bind(entry.protein)
    .bind(entry.fat)
    .bind(m.vitamin_a)
    .bind(m.vitamin_c)
    .bind(m.vitamin_d)
    .bind(m.calcium)
    .bind(m.iron)
    .bind(m.fiber)
    .bind(&entry.quantity)
    .bind(entry.logged_at)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM food_entries WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
