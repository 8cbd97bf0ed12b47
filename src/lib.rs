pub mod config;
pub mod curve;
pub mod database;
pub mod error;
pub mod kpi;
pub mod models;
pub mod routes;
pub mod share;
