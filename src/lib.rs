pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod models;
pub mod payments;
pub mod schema;
pub mod services;
pub mod store;
