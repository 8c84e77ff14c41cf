//! Panel aggregator library exports

pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod transport;
