use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Backend API
    pub api_url: String,
    pub api_login: String,
    pub api_password: String,

    // Map
    pub city: String,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            api_url: env::var("CITYBEAT_API_URL")
                .unwrap_or_else(|_| "http://localhost:17112".to_string()),
            api_login: required_env("CITYBEAT_LOGIN"),
            api_password: required_env("CITYBEAT_PASSWORD"),
            city: env::var("CITYBEAT_CITY").unwrap_or_else(|_| "spb".to_string()),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
