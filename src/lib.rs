pub mod api;
pub mod auth;
pub mod backup;
pub mod bootstrap;
pub mod comments;
pub mod config;
pub mod database;
pub mod location;
pub mod masking;
pub mod notify;
pub mod telemetry;
pub mod utils;
