mod aggregates;
mod batch;
mod employees;
mod limits;
mod queries;
mod row_sets;
mod transactions;
mod types;

use crate::{
    aggregates::aggregates,
    batch::batch,
    employees::{create_schema, employees},
    limits::limits,
    queries::queries,
    row_sets::row_sets,
    transactions::transactions,
    types::types,
};
use log::LevelFilter;
use quarry::Database;
use std::env;

pub use employees::{Schema, populate};

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Run the whole suite against `database`, the schema is created from scratch.
pub fn execute_tests(database: Database) {
    create_schema(&database).expect("Could not create the test schema");
    employees(&database);
    row_sets(&database);
    queries(&database);
    aggregates(&database);
    limits(&database);
    batch(&database);
    transactions(&database);
    types(&database);
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
