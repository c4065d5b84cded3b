//! Day/week/month rollups over logged entries.
//!
//! Everything here is pure: callers fetch the entries for a window and pass
//! them in together with the user's zone and goals.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::models::food_entry::{FoodEntry, Micronutrients};
use crate::models::goals::{MicronutrientGoals, NutritionGoals};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    Day,
    Week,
    Month,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AggregationError {
    #[error("offset {offset} reaches before the first logged entry (max offset is {max})")]
    OffsetOutOfRange { offset: u32, max: u32 },

    #[error("date is out of the supported range")]
    DateOutOfRange,
}

/// Inclusive range of local calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub kind: WindowType,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Half-open UTC range `[start 00:00, day after end 00:00)` in `tz`.
    pub fn utc_range(&self, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
        let after_end = self.end.succ_opt().unwrap_or(self.end);
        (local_midnight(tz, self.start), local_midnight(tz, after_end))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub entry_count: u32,
    pub calories: i64,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
    pub micronutrients: Micronutrients,
}

impl DailyAggregate {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            entry_count: 0,
            calories: 0,
            carbs: 0.0,
            protein: 0.0,
            fat: 0.0,
            micronutrients: Micronutrients::default(),
        }
    }

    fn add(&mut self, entry: &FoodEntry) {
        self.entry_count += 1;
        self.calories += i64::from(entry.calories);
        self.carbs += entry.carbs;
        self.protein += entry.protein;
        self.fat += entry.fat;
        self.micronutrients.add(&entry.micronutrients);
    }

    pub fn progress(&self, goals: &NutritionGoals) -> GoalProgress {
        GoalProgress {
            calories: percentage_of_goal(self.calories as f64, f64::from(goals.daily_calories)),
            carbs: percentage_of_goal(self.carbs, goals.daily_carbs),
            protein: percentage_of_goal(self.protein, goals.daily_protein),
            fat: percentage_of_goal(self.fat, goals.daily_fat),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GoalProgress {
    pub calories: u8,
    pub carbs: u8,
    pub protein: u8,
    pub fat: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MicronutrientProgress {
    pub vitamin_a: u8,
    pub vitamin_c: u8,
    pub vitamin_d: u8,
    pub calcium: u8,
    pub iron: u8,
    pub fiber: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Averages {
    pub calories: f64,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub calories: i64,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
    pub micronutrients: Micronutrients,
}

/// Goals scaled to the number of days in a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodGoals {
    pub calories: i64,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub window: Window,
    /// Days with at least one entry, ascending.
    pub days: Vec<DailyAggregate>,
    pub days_logged: usize,
    pub totals: Totals,
    pub averages: Averages,
    pub average_progress: GoalProgress,
    pub period_goals: PeriodGoals,
    pub period_progress: GoalProgress,
}

/// Group entries by the local calendar day of `logged_at` and sum each group.
pub fn aggregate_by_day(entries: &[FoodEntry], tz: Tz) -> BTreeMap<NaiveDate, DailyAggregate> {
    let mut days: BTreeMap<NaiveDate, DailyAggregate> = BTreeMap::new();
    for entry in entries {
        let date = local_date(entry.logged_at, tz);
        days.entry(date)
            .or_insert_with(|| DailyAggregate::empty(date))
            .add(entry);
    }
    days
}

/// Resolve the window `offset` steps back from the one containing `reference`.
///
/// Weeks run Sunday to Saturday. Offset 0 is always valid; larger offsets
/// must still reach a window ending on or after `first_entry`, and with no
/// entries at all only offset 0 is valid.
pub fn window_boundaries(
    reference: NaiveDate,
    offset: u32,
    kind: WindowType,
    first_entry: Option<NaiveDate>,
) -> Result<Window, AggregationError> {
    if offset > 0 {
        let max = max_offset(reference, kind, first_entry);
        if offset > max {
            return Err(AggregationError::OffsetOutOfRange { offset, max });
        }
    }

    match kind {
        WindowType::Day => {
            let day = reference
                .checked_sub_days(Days::new(u64::from(offset)))
                .ok_or(AggregationError::DateOutOfRange)?;
            Ok(Window {
                kind,
                start: day,
                end: day,
            })
        }
        WindowType::Week => {
            let start = week_start(reference)
                .checked_sub_days(Days::new(7 * u64::from(offset)))
                .ok_or(AggregationError::DateOutOfRange)?;
            Ok(Window {
                kind,
                start,
                end: start + Duration::days(6),
            })
        }
        WindowType::Month => {
            let start = month_start(reference)
                .checked_sub_months(Months::new(offset))
                .ok_or(AggregationError::DateOutOfRange)?;
            let end = start
                .checked_add_months(Months::new(1))
                .and_then(|d| d.pred_opt())
                .ok_or(AggregationError::DateOutOfRange)?;
            Ok(Window { kind, start, end })
        }
    }
}

/// Mean of each macro over days that have at least one entry.
pub fn averages(days: &[DailyAggregate]) -> Averages {
    let logged: Vec<&DailyAggregate> = days.iter().filter(|d| d.entry_count > 0).collect();
    if logged.is_empty() {
        return Averages::default();
    }

    let n = logged.len() as f64;
    Averages {
        calories: logged.iter().map(|d| d.calories as f64).sum::<f64>() / n,
        carbs: logged.iter().map(|d| d.carbs).sum::<f64>() / n,
        protein: logged.iter().map(|d| d.protein).sum::<f64>() / n,
        fat: logged.iter().map(|d| d.fat).sum::<f64>() / n,
    }
}

/// `round(min(current / goal, 1) * 100)`.
///
/// A goal of zero (or below, or non-finite) yields 0 rather than an error.
pub fn percentage_of_goal(current: f64, goal: f64) -> u8 {
    if !goal.is_finite() || goal <= 0.0 || !current.is_finite() {
        return 0;
    }
    let ratio = (current / goal).clamp(0.0, 1.0);
    (ratio * 100.0).round() as u8
}

pub fn micronutrient_progress(
    totals: &Micronutrients,
    goals: &MicronutrientGoals,
) -> MicronutrientProgress {
    MicronutrientProgress {
        vitamin_a: percentage_of_goal(totals.vitamin_a, goals.vitamin_a),
        vitamin_c: percentage_of_goal(totals.vitamin_c, goals.vitamin_c),
        vitamin_d: percentage_of_goal(totals.vitamin_d, goals.vitamin_d),
        calcium: percentage_of_goal(totals.calcium, goals.calcium),
        iron: percentage_of_goal(totals.iron, goals.iron),
        fiber: percentage_of_goal(totals.fiber, goals.fiber),
    }
}

/// Roll the entries that fall inside `window` into a summary.
pub fn summarize_period(
    entries: &[FoodEntry],
    window: Window,
    tz: Tz,
    goals: &NutritionGoals,
) -> PeriodSummary {
    let in_window: Vec<FoodEntry> = entries
        .iter()
        .filter(|e| window.contains(local_date(e.logged_at, tz)))
        .cloned()
        .collect();

    let days: Vec<DailyAggregate> = aggregate_by_day(&in_window, tz).into_values().collect();

    let mut totals = Totals::default();
    for day in &days {
        totals.calories += day.calories;
        totals.carbs += day.carbs;
        totals.protein += day.protein;
        totals.fat += day.fat;
        totals.micronutrients.add(&day.micronutrients);
    }

    let averages = averages(&days);
    let average_progress = GoalProgress {
        calories: percentage_of_goal(averages.calories, f64::from(goals.daily_calories)),
        carbs: percentage_of_goal(averages.carbs, goals.daily_carbs),
        protein: percentage_of_goal(averages.protein, goals.daily_protein),
        fat: percentage_of_goal(averages.fat, goals.daily_fat),
    };

    let span = window.days();
    let period_goals = PeriodGoals {
        calories: i64::from(goals.daily_calories) * span,
        carbs: goals.daily_carbs * span as f64,
        protein: goals.daily_protein * span as f64,
        fat: goals.daily_fat * span as f64,
    };
    let period_progress = GoalProgress {
        calories: percentage_of_goal(totals.calories as f64, period_goals.calories as f64),
        carbs: percentage_of_goal(totals.carbs, period_goals.carbs),
        protein: percentage_of_goal(totals.protein, period_goals.protein),
        fat: percentage_of_goal(totals.fat, period_goals.fat),
    };

    PeriodSummary {
        window,
        days_logged: days.len(),
        days,
        totals,
        averages,
        average_progress,
        period_goals,
        period_progress,
    }
}

pub fn local_date(at: DateTime<Utc>, tz: Tz) -> NaiveDate {
    at.with_timezone(&tz).date_naive()
}

fn local_midnight(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::default());
    tz.from_local_datetime(&naive)
        .earliest()
        // Midnight can fall inside a DST gap; the day then starts an hour later.
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

fn max_offset(reference: NaiveDate, kind: WindowType, first_entry: Option<NaiveDate>) -> u32 {
    let Some(first) = first_entry else {
        return 0;
    };
    if first >= reference {
        return 0;
    }

    let steps = match kind {
        WindowType::Day => (reference - first).num_days(),
        WindowType::Week => (week_start(reference) - week_start(first)).num_days() / 7,
        WindowType::Month => {
            i64::from(reference.year() - first.year()) * 12 + i64::from(reference.month())
                - i64::from(first.month())
        }
    };
    u32::try_from(steps).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::food_entry::sample_entry;
    use chrono::Weekday;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn goals() -> NutritionGoals {
        NutritionGoals::defaults_for(Uuid::nil())
    }

    #[test]
    fn test_same_day_entries_sum() {
        let entries = vec![
            sample_entry(100, at("2024-01-17T08:00:00Z")),
            sample_entry(200, at("2024-01-17T12:30:00Z")),
            sample_entry(50, at("2024-01-17T23:59:59.999Z")),
        ];
        let days = aggregate_by_day(&entries, Tz::UTC);
        assert_eq!(days.len(), 1);
        let day = &days[&date(2024, 1, 17)];
        assert_eq!(day.calories, 350);
        assert_eq!(day.entry_count, 3);
        assert_eq!(day.carbs, 30.0);
    }

    #[test]
    fn test_two_days_are_kept_apart() {
        let entries = vec![
            sample_entry(100, at("2024-01-17T00:00:00Z")),
            sample_entry(300, at("2024-01-18T00:00:00Z")),
            sample_entry(20, at("2024-01-17T10:00:00Z")),
        ];
        let days = aggregate_by_day(&entries, Tz::UTC);
        assert_eq!(days.len(), 2);
        assert_eq!(days[&date(2024, 1, 17)].calories, 120);
        assert_eq!(days[&date(2024, 1, 18)].calories, 300);
    }

    #[test]
    fn test_grouping_uses_local_day() {
        // 22:30 and 01:00 in New York on different local days, same UTC day.
        let entries = vec![
            sample_entry(100, at("2024-03-05T03:30:00Z")),
            sample_entry(200, at("2024-03-05T06:00:00Z")),
        ];
        assert_eq!(aggregate_by_day(&entries, Tz::UTC).len(), 1);

        let ny = aggregate_by_day(&entries, chrono_tz::America::New_York);
        assert_eq!(ny.len(), 2);
        assert_eq!(ny[&date(2024, 3, 4)].calories, 100);
        assert_eq!(ny[&date(2024, 3, 5)].calories, 200);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let mut entries = vec![
            sample_entry(10, at("2024-01-01T01:00:00Z")),
            sample_entry(20, at("2024-01-02T01:00:00Z")),
            sample_entry(30, at("2024-01-01T05:00:00Z")),
        ];
        let forward = aggregate_by_day(&entries, Tz::UTC);
        entries.reverse();
        assert_eq!(forward, aggregate_by_day(&entries, Tz::UTC));
    }

    #[test]
    fn test_micronutrients_are_summed() {
        let mut a = sample_entry(10, at("2024-01-01T01:00:00Z"));
        a.micronutrients.iron = 1.5;
        let mut b = sample_entry(10, at("2024-01-01T02:00:00Z"));
        b.micronutrients.iron = 2.0;
        b.micronutrients.fiber = 4.0;
        let days = aggregate_by_day(&[a, b], Tz::UTC);
        let day = &days[&date(2024, 1, 1)];
        assert_eq!(day.micronutrients.iron, 3.5);
        assert_eq!(day.micronutrients.fiber, 4.0);
    }

    #[test]
    fn test_week_from_wednesday() {
        let wednesday = date(2024, 1, 17);
        assert_eq!(wednesday.weekday(), Weekday::Wed);

        let window = window_boundaries(wednesday, 0, WindowType::Week, None).unwrap();
        assert_eq!(window.start, date(2024, 1, 14));
        assert_eq!(window.end, date(2024, 1, 20));
        assert_eq!(window.start.weekday(), Weekday::Sun);
        assert_eq!(window.end.weekday(), Weekday::Sat);
        assert_eq!(window.days(), 7);
    }

    #[test]
    fn test_week_edges() {
        let sunday = window_boundaries(date(2024, 1, 14), 0, WindowType::Week, None).unwrap();
        assert_eq!(sunday.start, date(2024, 1, 14));
        let saturday = window_boundaries(date(2024, 1, 20), 0, WindowType::Week, None).unwrap();
        assert_eq!(saturday.start, date(2024, 1, 14));
    }

    #[test]
    fn test_week_offset() {
        let window =
            window_boundaries(date(2024, 1, 17), 2, WindowType::Week, Some(date(2023, 12, 1)))
                .unwrap();
        assert_eq!(window.start, date(2023, 12, 31));
        assert_eq!(window.end, date(2024, 1, 6));
    }

    #[test]
    fn test_month_windows() {
        let jan = window_boundaries(date(2024, 1, 17), 0, WindowType::Month, None).unwrap();
        assert_eq!((jan.start, jan.end), (date(2024, 1, 1), date(2024, 1, 31)));

        let dec = window_boundaries(date(2024, 1, 17), 1, WindowType::Month, Some(date(2023, 6, 3)))
            .unwrap();
        assert_eq!((dec.start, dec.end), (date(2023, 12, 1), date(2023, 12, 31)));

        let feb = window_boundaries(date(2024, 3, 31), 1, WindowType::Month, Some(date(2024, 2, 29)))
            .unwrap();
        assert_eq!((feb.start, feb.end), (date(2024, 2, 1), date(2024, 2, 29)));
        assert_eq!(feb.days(), 29);
    }

    #[test]
    fn test_day_window() {
        let window = window_boundaries(date(2024, 1, 17), 3, WindowType::Day, Some(date(2024, 1, 1)))
            .unwrap();
        assert_eq!((window.start, window.end), (date(2024, 1, 14), date(2024, 1, 14)));
    }

    #[test]
    fn test_offset_before_first_entry_is_rejected() {
        let first = Some(date(2024, 1, 10));
        assert!(window_boundaries(date(2024, 1, 17), 1, WindowType::Week, first).is_ok());
        assert_eq!(
            window_boundaries(date(2024, 1, 17), 2, WindowType::Week, first),
            Err(AggregationError::OffsetOutOfRange { offset: 2, max: 1 })
        );
        assert_eq!(
            window_boundaries(date(2024, 1, 17), 1, WindowType::Month, first),
            Err(AggregationError::OffsetOutOfRange { offset: 1, max: 0 })
        );
    }

    #[test]
    fn test_no_entries_only_allows_current_window() {
        assert!(window_boundaries(date(2024, 1, 17), 0, WindowType::Month, None).is_ok());
        assert_eq!(
            window_boundaries(date(2024, 1, 17), 1, WindowType::Day, None),
            Err(AggregationError::OffsetOutOfRange { offset: 1, max: 0 })
        );
    }

    #[test]
    fn test_utc_range_follows_zone() {
        let window = window_boundaries(date(2024, 1, 17), 0, WindowType::Day, None).unwrap();

        let (start, end) = window.utc_range(Tz::UTC);
        assert_eq!(start, at("2024-01-17T00:00:00Z"));
        assert_eq!(end, at("2024-01-18T00:00:00Z"));

        let (start, end) = window.utc_range(chrono_tz::Asia::Kolkata);
        assert_eq!(start, at("2024-01-16T18:30:00Z"));
        assert_eq!(end, at("2024-01-17T18:30:00Z"));
    }

    #[test]
    fn test_percentage_of_goal() {
        assert_eq!(percentage_of_goal(250.0, 1000.0), 25);
        assert_eq!(percentage_of_goal(1200.0, 1000.0), 100);
        assert_eq!(percentage_of_goal(0.0, 1000.0), 0);
        assert_eq!(percentage_of_goal(333.0, 1000.0), 33);
        assert_eq!(percentage_of_goal(335.0, 1000.0), 34);
    }

    #[test]
    fn test_zero_goal_is_zero_percent() {
        assert_eq!(percentage_of_goal(500.0, 0.0), 0);
        assert_eq!(percentage_of_goal(0.0, 0.0), 0);
        assert_eq!(percentage_of_goal(500.0, -10.0), 0);
        assert_eq!(percentage_of_goal(f64::NAN, 100.0), 0);
    }

    #[test]
    fn test_averages_skip_empty_days() {
        let days = vec![
            DailyAggregate {
                calories: 1000,
                carbs: 100.0,
                entry_count: 2,
                ..DailyAggregate::empty(date(2024, 1, 1))
            },
            DailyAggregate::empty(date(2024, 1, 2)),
            DailyAggregate {
                calories: 2000,
                carbs: 50.0,
                entry_count: 1,
                ..DailyAggregate::empty(date(2024, 1, 3))
            },
        ];
        let avg = averages(&days);
        assert_eq!(avg.calories, 1500.0);
        assert_eq!(avg.carbs, 75.0);
        assert_eq!(avg.fat, 0.0);
    }

    #[test]
    fn test_averages_of_nothing_is_zero() {
        assert_eq!(averages(&[]), Averages::default());
    }

    #[test]
    fn test_daily_progress() {
        let day = DailyAggregate {
            calories: 2500,
            carbs: 125.0,
            protein: 0.0,
            fat: 35.0,
            entry_count: 1,
            ..DailyAggregate::empty(date(2024, 1, 1))
        };
        let progress = day.progress(&goals());
        assert_eq!(
            progress,
            GoalProgress {
                calories: 100,
                carbs: 50,
                protein: 0,
                fat: 50
            }
        );
    }

    #[test]
    fn test_summarize_week() {
        let window = window_boundaries(date(2024, 1, 17), 0, WindowType::Week, None).unwrap();
        let entries = vec![
            sample_entry(1000, at("2024-01-14T09:00:00Z")),
            sample_entry(400, at("2024-01-14T19:00:00Z")),
            sample_entry(600, at("2024-01-16T12:00:00Z")),
            // Outside the window
            sample_entry(9999, at("2024-01-21T12:00:00Z")),
        ];

        let summary = summarize_period(&entries, window, Tz::UTC, &goals());
        assert_eq!(summary.days_logged, 2);
        assert_eq!(summary.days[0].date, date(2024, 1, 14));
        assert_eq!(summary.totals.calories, 2000);
        assert_eq!(summary.averages.calories, 1000.0);
        assert_eq!(summary.average_progress.calories, 50);
        assert_eq!(summary.period_goals.calories, 14000);
        assert_eq!(summary.period_progress.calories, 14);
    }

    #[test]
    fn test_micronutrient_progress() {
        let totals = Micronutrients {
            vitamin_c: 40.0,
            iron: 28.0,
            ..Micronutrients::default()
        };
        let progress = micronutrient_progress(&totals, &MicronutrientGoals::default());
        assert_eq!(progress.vitamin_c, 50);
        assert_eq!(progress.iron, 100);
        assert_eq!(progress.calcium, 0);
    }
}
