// src/config.rs

use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,

    /// Optional hard cutoff for late submissions, in minutes past a
    /// definition's time limit. Unset means late submissions are always
    /// accepted and graded, with the true elapsed time recorded.
    pub submission_grace_minutes: Option<i64>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let submission_grace_minutes = env::var("SUBMISSION_GRACE_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok());

        Self {
            database_url,
            port,
            rust_log,
            submission_grace_minutes,
        }
    }
}
