use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Micronutrient amounts carried by every entry. Absent values are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Micronutrients {
    /// mcg RAE
    #[serde(default)]
    pub vitamin_a: f64,
    /// mg
    #[serde(default)]
    pub vitamin_c: f64,
    /// mcg
    #[serde(default)]
    pub vitamin_d: f64,
    /// mg
    #[serde(default)]
    pub calcium: f64,
    /// mg
    #[serde(default)]
    pub iron: f64,
    /// g
    #[serde(default)]
    pub fiber: f64,
}

impl Micronutrients {
    pub fn add(&mut self, other: &Micronutrients) {
        self.vitamin_a += other.vitamin_a;
        self.vitamin_c += other.vitamin_c;
        self.vitamin_d += other.vitamin_d;
        self.calcium += other.calcium;
        self.iron += other.iron;
        self.fiber += other.fiber;
    }

    pub fn is_non_negative(&self) -> bool {
        [
            self.vitamin_a,
            self.vitamin_c,
            self.vitamin_d,
            self.calcium,
            self.iron,
            self.fiber,
        ]
        .iter()
        .all(|v| v.is_finite() && *v >= 0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FoodEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_name: String,
    pub calories: i32,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub micronutrients: Micronutrients,
    pub quantity: Option<String>,
    pub logged_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A nutrition record that has not been persisted yet: no owner, no timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItemCandidate {
    pub food_name: String,
    pub calories: i32,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
    pub quantity: Option<String>,
    #[serde(flatten)]
    pub micronutrients: Micronutrients,
}

impl FoodItemCandidate {
    /// Attach owner and timestamp, producing the row to insert.
    pub fn into_new_entry(self, user_id: Uuid, logged_at: DateTime<Utc>) -> NewFoodEntry {
        NewFoodEntry {
            user_id,
            food_name: self.food_name,
            calories: self.calories,
            carbs: self.carbs,
            protein: self.protein,
            fat: self.fat,
            micronutrients: self.micronutrients,
            quantity: self.quantity,
            logged_at,
        }
    }
}

/// Insert payload shared by the parser flow, manual entry and CSV import.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFoodEntry {
    pub user_id: Uuid,
    pub food_name: String,
    pub calories: i32,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
    pub micronutrients: Micronutrients,
    pub quantity: Option<String>,
    pub logged_at: DateTime<Utc>,
}

#[cfg(test)]
impl From<&FoodEntry> for NewFoodEntry {
    fn from(e: &FoodEntry) -> Self {
        Self {
            user_id: e.user_id,
            food_name: e.food_name.clone(),
            calories: e.calories,
            carbs: e.carbs,
            protein: e.protein,
            fat: e.fat,
            micronutrients: e.micronutrients,
            quantity: e.quantity.clone(),
            logged_at: e.logged_at,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_entry(calories: i32, logged_at: DateTime<Utc>) -> FoodEntry {
    FoodEntry {
        id: Uuid::new_v4(),
        user_id: Uuid::nil(),
        food_name: format!("item {}", calories),
        calories,
        carbs: 10.0,
        protein: 5.0,
        fat: 2.0,
        micronutrients: Micronutrients::default(),
        quantity: None,
        logged_at,
        created_at: logged_at,
    }
}
