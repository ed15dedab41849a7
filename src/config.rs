use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub provider_base_url: String,
    pub provider_api_key: String,
    /// Shared secret for the settlement endpoints. Absent means open
    /// (local/dev only).
    pub settle_api_key: Option<String>,
    /// Background sweep cadence; 0 disables the sweep task.
    pub sweep_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/settlement".to_string()),
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            provider_base_url: std::env::var("PROVIDER_BASE_URL")
                .unwrap_or_else(|_| "https://api.diamondexch.example".to_string()),
            provider_api_key: std::env::var("PROVIDER_API_KEY").unwrap_or_default(),
            settle_api_key: std::env::var("SETTLE_API_KEY").ok().filter(|k| !k.is_empty()),
            sweep_interval_secs: std::env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        }
    }
}
