pub mod auth;
pub mod config;
pub mod error;
pub mod filters;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod services;
pub mod stats;
pub mod text_format;

use sqlx::SqlitePool;

use crate::config::Config;

pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Config,
}
