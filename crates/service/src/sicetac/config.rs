use std::time::Duration;

pub(crate) const DEFAULT_ENDPOINT: &str =
    "http://rndcws.mintransporte.gov.co:8080/ws/rndcService";
const DEFAULT_TIMEOUT_SECONDS: f64 = 20.0;
const DEFAULT_RETRY_BASE_MS: u64 = 1_000;

const ENV_ENDPOINT: &str = "SICETAC_ENDPOINT";
const ENV_USERNAME: &str = "SICETAC_USERNAME";
const ENV_PASSWORD: &str = "SICETAC_PASSWORD";
const ENV_TIMEOUT_SECONDS: &str = "SICETAC_TIMEOUT_SECONDS";
const ENV_VERIFY_SSL: &str = "SICETAC_VERIFY_SSL";
const ENV_RETRY_BASE_MS: &str = "SICETAC_RETRY_BASE_MS";

/// Remote-service settings for one client instance. Built once from the
/// environment and passed in explicitly; nothing here is cached globally.
#[derive(Debug, Clone)]
pub struct SicetacConfig {
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
    pub verify_ssl: bool,
    pub retry_base: Duration,
}

impl SicetacConfig {
    pub fn from_env() -> Self {
        Self {
            endpoint: env_non_empty(ENV_ENDPOINT).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            username: env_non_empty(ENV_USERNAME).unwrap_or_default(),
            password: env_non_empty(ENV_PASSWORD).unwrap_or_default(),
            timeout: Duration::from_secs_f64(
                env_f64_or(ENV_TIMEOUT_SECONDS, DEFAULT_TIMEOUT_SECONDS).max(0.001),
            ),
            verify_ssl: env_bool_or(ENV_VERIFY_SSL, false),
            retry_base: Duration::from_millis(env_u64_or(ENV_RETRY_BASE_MS, DEFAULT_RETRY_BASE_MS)),
        }
    }

    /// Both credentials must be present before any network attempt.
    pub(crate) fn credentials(&self) -> Result<(&str, &str), String> {
        let username = self.username.trim();
        let password = self.password.trim();
        if username.is_empty() || password.is_empty() {
            return Err("sicetac username and password must be configured".to_string());
        }
        Ok((username, password))
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_f64_or(name: &str, default: f64) -> f64 {
    env_non_empty(name)
        .and_then(|value| value.parse::<f64>().ok())
        .unwrap_or(default)
}

fn env_u64_or(name: &str, default: u64) -> u64 {
    env_non_empty(name)
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_bool_or(name: &str, default: bool) -> bool {
    match env_non_empty(name) {
        Some(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}
