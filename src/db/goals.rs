use sqlx::PgPool;
use uuid::Uuid;

use crate::models::goals::NutritionGoals;

/// Fetch the user's goals, inserting the defaults on first access.
pub async fn get_or_create(pool: &PgPool, user_id: Uuid) -> Result<NutritionGoals, sqlx::Error> {
    let defaults = NutritionGoals::defaults_for(user_id);
    sqlx::query(
        r#"
        INSERT INTO nutrition_goals (user_id, daily_calories, daily_carbs, daily_protein, daily_fat)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(defaults.user_id)
    .bind(defaults.daily_calories)
    .bind(defaults.daily_carbs)
    .bind(defaults.daily_protein)
    .bind(defaults.daily_fat)
    .execute(pool)
    .await?;

    sqlx::query_as::<_, NutritionGoals>("SELECT * FROM nutrition_goals WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

pub async fn replace(
    pool: &PgPool,
    user_id: Uuid,
    daily_calories: i32,
    daily_carbs: f64,
    daily_protein: f64,
    daily_fat: f64,
) -> Result<NutritionGoals, sqlx::Error> {
    sqlx::query_as::<_, NutritionGoals>(
        r#"
        INSERT INTO nutrition_goals (user_id, daily_calories, daily_carbs, daily_protein, daily_fat)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id) DO UPDATE SET
            daily_calories = EXCLUDED.daily_calories,
            daily_carbs = EXCLUDED.daily_carbs,
            daily_protein = EXCLUDED.daily_protein,
            daily_fat = EXCLUDED.daily_fat,
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(daily_calories)
    .bind(daily_carbs)
    .bind(daily_protein)
    .bind(daily_fat)
    .fetch_one(pool)
    .await
}
