pub mod aggregation;
pub mod body_metrics;
pub mod csv_io;
pub mod llm;
pub mod nutrition_parser;
