// src/lib.rs

pub mod cli;
pub mod config;
pub mod csv_import;
pub mod github;
pub mod impact;
pub mod ingest;
pub mod metrics;
pub mod models;
pub mod smells;
pub mod store;
