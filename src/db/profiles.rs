use sqlx::PgPool;
use uuid::Uuid;

use crate::models::profile::Profile;

/// Fetch the user's profile, inserting an empty one on first access.
pub async fn get_or_create(pool: &PgPool, user_id: Uuid) -> Result<Profile, sqlx::Error> {
    sqlx::query("INSERT INTO profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(pool)
        .await?;

    sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

pub async fn replace(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
    age: Option<i32>,
    height: Option<f64>,
    current_weight: Option<f64>,
) -> Result<Profile, sqlx::Error> {
    sqlx::query_as::<_, Profile>(
        r#"
        INSERT INTO profiles (user_id, name, age, height, current_weight)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id) DO UPDATE SET
            name = EXCLUDED.name,
            age = EXCLUDED.age,
            height = EXCLUDED.height,
            current_weight = EXCLUDED.current_weight,
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(age)
    .bind(height)
    .bind(current_weight)
    .fetch_one(pool)
    .await
}
