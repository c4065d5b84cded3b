//! Request/response bodies for the JSON API.
//!
//! - `*Request`  → deserialized from client JSON body
//! - `*Query`    → deserialized from the query string
//! - `*Response` → serialized to client JSON
//!
//! Validation is expressed via `validator` derive macros and checked in the
//! handlers with `.validate()?`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::food_entry::{FoodEntry, FoodItemCandidate, Micronutrients, NewFoodEntry};
use crate::models::goals::{MicronutrientGoals, NutritionGoals};
use crate::services::aggregation::{DailyAggregate, GoalProgress, MicronutrientProgress};
use crate::services::body_metrics::{ActivityLevel, BodyProfile, Sex, WeightGoal};
use crate::services::csv_io::RowError;

// ============================================================================
// Common
// ============================================================================

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub id: Uuid,
}

fn non_negative_micronutrients(m: &Micronutrients) -> Result<(), ValidationError> {
    if m.is_non_negative() {
        Ok(())
    } else {
        Err(ValidationError::new("micronutrients_must_be_non_negative"))
    }
}

fn positive(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new("must_be_positive"))
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// POST /api/parse-food
#[derive(Debug, Deserialize, Validate)]
pub struct ParseFoodRequest {
    #[validate(length(min = 1, max = 2000, message = "Text must be 1-2000 characters"))]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ParseFoodResponse {
    pub food_items: Vec<FoodItemCandidate>,
}

/// POST /api/food-entries/from-text
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFromTextRequest {
    #[validate(length(min = 1, max = 2000, message = "Text must be 1-2000 characters"))]
    pub text: String,
    /// Defaults to the time of the request.
    pub logged_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Food entries
// ============================================================================

/// POST /api/food-entries and PUT /api/food-entries/:id
#[derive(Debug, Deserialize, Validate)]
pub struct FoodEntryRequest {
    #[validate(length(min = 1, max = 200, message = "Food name must be 1-200 characters"))]
    pub food_name: String,

    #[validate(range(min = 0, message = "Calories must be non-negative"))]
    pub calories: i32,

    #[validate(range(min = 0.0, message = "Carbs must be non-negative"))]
    pub carbs: f64,

    #[validate(range(min = 0.0, message = "Protein must be non-negative"))]
    pub protein: f64,

    #[validate(range(min = 0.0, message = "Fat must be non-negative"))]
    pub fat: f64,

    #[serde(flatten)]
    #[validate(custom = "non_negative_micronutrients")]
    pub micronutrients: Micronutrients,

    #[validate(length(max = 100, message = "Quantity too long"))]
    pub quantity: Option<String>,

    pub logged_at: Option<DateTime<Utc>>,
}

impl FoodEntryRequest {
    pub fn into_new_entry(self, user_id: Uuid) -> NewFoodEntry {
        NewFoodEntry {
            user_id,
            food_name: self.food_name.trim().to_string(),
            calories: self.calories,
            carbs: self.carbs,
            protein: self.protein,
            fat: self.fat,
            micronutrients: self.micronutrients,
            quantity: self
                .quantity
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty()),
            logged_at: self.logged_at.unwrap_or_else(Utc::now),
        }
    }
}

/// GET /api/food-entries and GET /api/summary/daily
#[derive(Debug, Deserialize)]
pub struct DayQuery {
    /// Local calendar day; today in `tz` when absent.
    pub date: Option<NaiveDate>,
    pub tz: Option<String>,
}

/// GET /api/summary/weekly and GET /api/summary/monthly
#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    #[serde(default)]
    pub offset: u32,
    pub tz: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub imported: usize,
    pub skipped: Vec<RowError>,
}

// ============================================================================
// Goals
// ============================================================================

/// PUT /api/goals
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateGoalsRequest {
    #[validate(range(min = 0, max = 20000, message = "Calories must be 0-20000"))]
    pub daily_calories: i32,

    #[validate(range(min = 0.0, max = 5000.0, message = "Carbs must be 0-5000 g"))]
    pub daily_carbs: f64,

    #[validate(range(min = 0.0, max = 5000.0, message = "Protein must be 0-5000 g"))]
    pub daily_protein: f64,

    #[validate(range(min = 0.0, max = 5000.0, message = "Fat must be 0-5000 g"))]
    pub daily_fat: f64,
}

/// GET /api/goals/micronutrients
#[derive(Debug, Deserialize, Validate)]
pub struct MicronutrientQuery {
    #[validate(range(min = 1, max = 130, message = "Age must be 1-130"))]
    pub age: Option<u32>,
    #[validate(range(min = 1.0, max = 500.0, message = "Weight must be 1-500 kg"))]
    pub weight: Option<f64>,
}

// ============================================================================
// Profile
// ============================================================================

/// PUT /api/profile
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: String,

    #[validate(range(min = 1, max = 130, message = "Age must be 1-130"))]
    pub age: Option<i32>,

    #[validate(range(min = 30.0, max = 300.0, message = "Height must be 30-300 cm"))]
    pub height: Option<f64>,

    #[validate(range(min = 1.0, max = 500.0, message = "Weight must be 1-500 kg"))]
    pub current_weight: Option<f64>,
}

// ============================================================================
// Summaries
// ============================================================================

#[derive(Debug, Serialize)]
pub struct DailySummaryResponse {
    pub date: NaiveDate,
    pub timezone: String,
    pub totals: DailyAggregate,
    pub progress: GoalProgress,
    pub goals: NutritionGoals,
    pub micronutrient_goals: MicronutrientGoals,
    pub micronutrient_progress: MicronutrientProgress,
    pub entries: Vec<FoodEntry>,
}

// ============================================================================
// Weight & body metrics
// ============================================================================

/// POST /api/weight-logs
#[derive(Debug, Deserialize, Validate)]
pub struct CreateWeightLogRequest {
    #[validate(custom = "positive")]
    pub weight_kg: f64,
    pub logged_at: Option<DateTime<Utc>>,
}

/// POST /api/body-metrics
#[derive(Debug, Deserialize, Validate)]
pub struct BodyMetricsRequest {
    #[validate(range(min = 1.0, max = 500.0, message = "Weight must be 1-500 kg"))]
    pub weight_kg: f64,

    #[validate(range(min = 30.0, max = 300.0, message = "Height must be 30-300 cm"))]
    pub height_cm: f64,

    #[validate(range(min = 1, max = 130, message = "Age must be 1-130"))]
    pub age: u32,

    pub sex: Sex,

    #[serde(default)]
    pub activity: ActivityLevel,

    #[serde(default)]
    pub goal: WeightGoal,
}

impl From<BodyMetricsRequest> for BodyProfile {
    fn from(r: BodyMetricsRequest) -> Self {
        BodyProfile {
            weight_kg: r.weight_kg,
            height_cm: r.height_cm,
            age: r.age,
            sex: r.sex,
            activity: r.activity,
            goal: r.goal,
        }
    }
}
