use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    #[default]
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    pub fn multiplier(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightGoal {
    Lose,
    #[default]
    Maintain,
    Gain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    NormalWeight,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::NormalWeight
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BodyProfile {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: u32,
    pub sex: Sex,
    pub activity: ActivityLevel,
    pub goal: WeightGoal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BodyMetrics {
    /// One decimal place.
    pub bmi: f64,
    pub category: BmiCategory,
    pub bmr: i64,
    pub tdee: i64,
    pub target_calories: i64,
}

const GOAL_ADJUSTMENT_KCAL: f64 = 500.0;

/// BMI plus Mifflin-St Jeor BMR, TDEE and a calorie target for the goal.
pub fn calculate(profile: &BodyProfile) -> BodyMetrics {
    let height_m = profile.height_cm / 100.0;
    let bmi = profile.weight_kg / (height_m * height_m);

    let base = 10.0 * profile.weight_kg + 6.25 * profile.height_cm - 5.0 * f64::from(profile.age);
    let bmr = match profile.sex {
        Sex::Male => base + 5.0,
        Sex::Female => base - 161.0,
    };

    let tdee = bmr * profile.activity.multiplier();
    let target = match profile.goal {
        WeightGoal::Lose => tdee - GOAL_ADJUSTMENT_KCAL,
        WeightGoal::Maintain => tdee,
        WeightGoal::Gain => tdee + GOAL_ADJUSTMENT_KCAL,
    };

    BodyMetrics {
        bmi: (bmi * 10.0).round() / 10.0,
        category: BmiCategory::from_bmi(bmi),
        bmr: bmr.round() as i64,
        tdee: tdee.round() as i64,
        target_calories: target.round() as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> BodyProfile {
        BodyProfile {
            weight_kg: 70.0,
            height_cm: 175.0,
            age: 30,
            sex: Sex::Male,
            activity: ActivityLevel::Sedentary,
            goal: WeightGoal::Maintain,
        }
    }

    #[test]
    fn test_male_lightly_active() {
        let m = calculate(&BodyProfile {
            activity: ActivityLevel::Light,
            ..profile()
        });
        assert_eq!(m.bmi, 22.9);
        assert_eq!(m.category, BmiCategory::NormalWeight);
        // 700 + 1093.75 - 150 + 5
        assert_eq!(m.bmr, 1649);
        // 1648.75 * 1.375
        assert_eq!(m.tdee, 2267);
        assert_eq!(m.target_calories, 2267);
    }

    #[test]
    fn test_female_lose_weight() {
        let m = calculate(&BodyProfile {
            sex: Sex::Female,
            activity: ActivityLevel::Moderate,
            goal: WeightGoal::Lose,
            ..profile()
        });
        // 1643.75 - 161 = 1482.75; * 1.55 = 2298.2625
        assert_eq!(m.bmr, 1483);
        assert_eq!(m.tdee, 2298);
        assert_eq!(m.target_calories, 1798);
    }

    #[test]
    fn test_gain_adds_surplus() {
        let m = calculate(&BodyProfile {
            goal: WeightGoal::Gain,
            activity: ActivityLevel::Active,
            ..profile()
        });
        assert_eq!(m.target_calories, m.tdee + 500);
    }

    #[test]
    fn test_bmi_categories() {
        assert_eq!(BmiCategory::from_bmi(18.4), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(18.5), BmiCategory::NormalWeight);
        assert_eq!(BmiCategory::from_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(30.0), BmiCategory::Obese);
    }

    #[test]
    fn test_activity_deserializes_snake_case() {
        let level: ActivityLevel = serde_json::from_str("\"very_active\"").unwrap();
        assert_eq!(level, ActivityLevel::VeryActive);
        assert_eq!(level.multiplier(), 1.9);
    }
}
