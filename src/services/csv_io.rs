//! CSV export and import of food entries.

use chrono::{DateTime, Utc};
use csv::{QuoteStyle, ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::Serialize;
use uuid::Uuid;

use crate::models::food_entry::{FoodEntry, Micronutrients, NewFoodEntry};

pub const HEADER: [&str; 13] = [
    "food_name",
    "calories",
    "carbs",
    "protein",
    "fat",
    "quantity",
    "logged_at",
    "vitamin_a",
    "vitamin_c",
    "vitamin_d",
    "calcium",
    "iron",
    "fiber",
];

/// Rows need at least the columns up to `logged_at`.
const REQUIRED_COLUMNS: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub entries: Vec<NewFoodEntry>,
    pub skipped: Vec<RowError>,
}

pub fn export_entries(entries: &[FoodEntry]) -> anyhow::Result<Vec<u8>> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(Vec::new());

    wtr.write_record(HEADER)?;
    for e in entries {
        let m = &e.micronutrients;
        wtr.write_record(&[
            e.food_name.clone(),
            e.calories.to_string(),
            e.carbs.to_string(),
            e.protein.to_string(),
            e.fat.to_string(),
            e.quantity.clone().unwrap_or_default(),
            e.logged_at.to_rfc3339(),
            m.vitamin_a.to_string(),
            m.vitamin_c.to_string(),
            m.vitamin_d.to_string(),
            m.calcium.to_string(),
            m.iron.to_string(),
            m.fiber.to_string(),
        ])?;
    }

    wtr.into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV export: {}", e.error()))
}

/// Parse an uploaded file into insertable rows for `user_id`.
///
/// Bad rows are collected in [`ImportReport::skipped`] instead of failing the
/// whole file.
pub fn import_entries(data: &[u8], user_id: Uuid) -> ImportReport {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(data);

    let mut report = ImportReport::default();
    for (idx, result) in rdr.records().enumerate() {
        // Header is line 1.
        let fallback_line = idx as u64 + 2;
        match result {
            Ok(record) => {
                let line = record
                    .position()
                    .map(|p| p.line())
                    .unwrap_or(fallback_line);
                match row_to_entry(&record, user_id) {
                    Ok(entry) => report.entries.push(entry),
                    Err(reason) => report.skipped.push(RowError { line, reason }),
                }
            }
            Err(e) => report.skipped.push(RowError {
                line: e.position().map(|p| p.line()).unwrap_or(fallback_line),
                reason: e.to_string(),
            }),
        }
    }

    if !report.skipped.is_empty() {
        tracing::warn!(
            skipped = report.skipped.len(),
            imported = report.entries.len(),
            "CSV import skipped rows"
        );
    }
    report
}

fn row_to_entry(record: &StringRecord, user_id: Uuid) -> Result<NewFoodEntry, String> {
    if record.len() < REQUIRED_COLUMNS {
        return Err(format!(
            "expected at least {} columns, found {}",
            REQUIRED_COLUMNS,
            record.len()
        ));
    }

    let field = |i: usize| record.get(i).unwrap_or("");

    let food_name = field(0).to_string();
    if food_name.is_empty() {
        return Err("food_name is empty".into());
    }

    let logged_at = DateTime::parse_from_rfc3339(field(6))
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid logged_at {:?}: {}", field(6), e))?;

    let quantity = Some(field(5).to_string()).filter(|q| !q.is_empty());

    Ok(NewFoodEntry {
        user_id,
        food_name,
        calories: number(field(1)).round() as i32,
        carbs: number(field(2)),
        protein: number(field(3)),
        fat: number(field(4)),
        micronutrients: Micronutrients {
            vitamin_a: number(field(7)),
            vitamin_c: number(field(8)),
            vitamin_d: number(field(9)),
            calcium: number(field(10)),
            iron: number(field(11)),
            fiber: number(field(12)),
        },
        quantity,
        logged_at,
    })
}

/// Unparsable, negative and non-finite values become 0.
fn number(raw: &str) -> f64 {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(0.0)
}
