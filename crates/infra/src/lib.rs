//! Infrastructure layer: stores, services, config and database wiring.

pub mod config;
pub mod db;
pub mod services;
pub mod store;
