pub mod food_entry;
pub mod goals;
pub mod profile;
pub mod weight_log;
