use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_DAILY_CALORIES: i32 = 2000;
pub const DEFAULT_DAILY_CARBS: f64 = 250.0;
pub const DEFAULT_DAILY_PROTEIN: f64 = 150.0;
pub const DEFAULT_DAILY_FAT: f64 = 70.0;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NutritionGoals {
    pub user_id: Uuid,
    pub daily_calories: i32,
    pub daily_carbs: f64,
    pub daily_protein: f64,
    pub daily_fat: f64,
    pub updated_at: DateTime<Utc>,
}

impl NutritionGoals {
    pub fn defaults_for(user_id: Uuid) -> Self {
        Self {
            user_id,
            daily_calories: DEFAULT_DAILY_CALORIES,
            daily_carbs: DEFAULT_DAILY_CARBS,
            daily_protein: DEFAULT_DAILY_PROTEIN,
            daily_fat: DEFAULT_DAILY_FAT,
            updated_at: Utc::now(),
        }
    }
}

/// Daily micronutrient targets derived from age and body weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MicronutrientGoals {
    pub vitamin_a: f64,
    pub vitamin_c: f64,
    pub vitamin_d: f64,
    pub calcium: f64,
    pub iron: f64,
    pub fiber: f64,
}

impl MicronutrientGoals {
    /// General adult RDA values. Missing age counts as 30, missing weight as 70 kg.
    pub fn for_profile(age: Option<u32>, weight_kg: Option<f64>) -> Self {
        let age = age.unwrap_or(30);
        let weight = weight_kg.filter(|w| w.is_finite() && *w > 0.0).unwrap_or(70.0);

        let fiber = ((weight / 70.0) * 30.0).round().clamp(25.0, 38.0);

        Self {
            vitamin_a: if age < 50 { 800.0 } else { 700.0 },
            vitamin_c: if age < 50 { 80.0 } else { 90.0 },
            vitamin_d: if age < 70 { 15.0 } else { 20.0 },
            calcium: if age < 50 { 1000.0 } else { 1200.0 },
            iron: if age < 50 { 14.0 } else { 10.0 },
            fiber,
        }
    }
}

impl Default for MicronutrientGoals {
    fn default() -> Self {
        Self::for_profile(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_micronutrient_defaults_for_empty_profile() {
        let goals = MicronutrientGoals::default();
        assert_eq!(goals.vitamin_a, 800.0);
        assert_eq!(goals.vitamin_c, 80.0);
        assert_eq!(goals.vitamin_d, 15.0);
        assert_eq!(goals.calcium, 1000.0);
        assert_eq!(goals.iron, 14.0);
        assert_eq!(goals.fiber, 30.0);
    }

    #[test]
    fn test_micronutrient_goals_older_adult() {
        let goals = MicronutrientGoals::for_profile(Some(72), Some(70.0));
        assert_eq!(goals.vitamin_a, 700.0);
        assert_eq!(goals.vitamin_c, 90.0);
        assert_eq!(goals.vitamin_d, 20.0);
        assert_eq!(goals.calcium, 1200.0);
        assert_eq!(goals.iron, 10.0);
    }

    #[test]
    fn test_fiber_is_clamped() {
        assert_eq!(MicronutrientGoals::for_profile(None, Some(40.0)).fiber, 25.0);
        assert_eq!(MicronutrientGoals::for_profile(None, Some(140.0)).fiber, 38.0);
        assert_eq!(MicronutrientGoals::for_profile(None, Some(84.0)).fiber, 36.0);
    }

    #[test]
    fn test_default_goals() {
        let goals = NutritionGoals::defaults_for(Uuid::nil());
        assert_eq!(goals.daily_calories, 2000);
        assert_eq!(goals.daily_carbs, 250.0);
        assert_eq!(goals.daily_protein, 150.0);
        assert_eq!(goals.daily_fat, 70.0);
    }
}
