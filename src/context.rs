use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::db;
use crate::error::{AppError, AppResult};
use crate::models::goals::NutritionGoals;
use crate::AppState;

/// Everything the summary and entry handlers need to know about the caller,
/// resolved once per request.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: Uuid,
    pub tz: Tz,
    pub goals: NutritionGoals,
}

impl UserContext {
    pub async fn load(state: &AppState, user: &AuthUser, tz: Option<&str>) -> AppResult<Self> {
        let tz = resolve_timezone(tz, state.config.default_timezone)?;
        let goals = db::goals::get_or_create(&state.db, user.id).await?;
        Ok(Self {
            user_id: user.id,
            tz,
            goals,
        })
    }

    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }
}

pub fn resolve_timezone(name: Option<&str>, default: Tz) -> AppResult<Tz> {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        None => Ok(default),
        Some(name) => name
            .parse::<Tz>()
            .map_err(|_| AppError::Validation(format!("Unknown timezone: {}", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_timezone_uses_default() {
        assert_eq!(resolve_timezone(None, Tz::UTC).unwrap(), Tz::UTC);
        assert_eq!(
            resolve_timezone(Some(""), chrono_tz::Europe::Berlin).unwrap(),
            chrono_tz::Europe::Berlin
        );
    }

    #[test]
    fn test_iana_name_is_parsed() {
        assert_eq!(
            resolve_timezone(Some("America/New_York"), Tz::UTC).unwrap(),
            chrono_tz::America::New_York
        );
    }

    #[test]
    fn test_unknown_timezone_is_validation_error() {
        assert!(matches!(
            resolve_timezone(Some("Mars/Olympus"), Tz::UTC),
            Err(AppError::Validation(_))
        ));
    }
}
