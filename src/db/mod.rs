pub mod food_entries;
pub mod goals;
pub mod pool;
pub mod profiles;
pub mod weight_logs;

pub use pool::create_pool;
