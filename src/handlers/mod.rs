pub mod body_metrics;
pub mod food_entries;
pub mod goals;
pub mod health;
pub mod profile;
pub mod summaries;
pub mod weight_logs;
