use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::goals::MicronutrientGoals;

/// Personal details used to tailor goals. Height is in cm, weight in kg.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub name: String,
    pub age: Option<i32>,
    pub height: Option<f64>,
    pub current_weight: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Micronutrient targets for this profile. `fallback_weight` is used
    /// when no current weight has been entered.
    pub fn micronutrient_goals(&self, fallback_weight: Option<f64>) -> MicronutrientGoals {
        let age = self.age.and_then(|a| u32::try_from(a).ok());
        MicronutrientGoals::for_profile(age, self.current_weight.or(fallback_weight))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(age: Option<i32>, current_weight: Option<f64>) -> Profile {
        Profile {
            user_id: Uuid::nil(),
            name: "Asha".into(),
            age,
            height: Some(162.0),
            current_weight,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_profile_age_drives_goals() {
        let goals = profile(Some(55), Some(70.0)).micronutrient_goals(None);
        assert_eq!(goals.calcium, 1200.0);
        assert_eq!(goals.iron, 10.0);
        assert_eq!(goals.vitamin_d, 15.0);
    }

    #[test]
    fn test_current_weight_wins_over_fallback() {
        let goals = profile(None, Some(93.3)).micronutrient_goals(Some(50.0));
        assert_eq!(goals.fiber, 38.0);
    }

    #[test]
    fn test_fallback_weight_used_when_unset() {
        let goals = profile(None, None).micronutrient_goals(Some(93.3));
        assert_eq!(goals.fiber, 38.0);
        let goals = profile(None, None).micronutrient_goals(None);
        assert_eq!(goals.fiber, 30.0);
        assert_eq!(goals.calcium, 1000.0);
    }

    #[test]
    fn test_negative_age_is_ignored() {
        let goals = profile(Some(-3), None).micronutrient_goals(None);
        assert_eq!(goals.calcium, 1000.0);
    }
}
