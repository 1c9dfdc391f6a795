pub mod api;
pub mod app;
pub mod config;
pub mod models;
pub mod queries;
pub mod views;

#[cfg(test)]
mod testing;

pub use api::*;
pub use app::{App, AppSnapshot, Destination};
pub use config::{Config, ModelConfig};
pub use models::*;
pub use queries::Queries;
