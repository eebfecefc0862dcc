use std::time::Duration;

use cotizador_core::quote::{minimum_payable, QuoteRequest, QuoteResponse, TariffQuote};

pub mod config;
mod numeric;
mod parse;
mod payload;
mod transport;

pub use config::SicetacConfig;
pub use transport::{HttpTransport, SicetacTransport};

pub(crate) const MAX_ATTEMPTS: u32 = 3;
const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Failure modes of one quotation round trip. Each variant maps to one HTTP
/// status at the API layer, so callers never have to string-match messages.
#[derive(Debug, thiserror::Error)]
pub enum SicetacError {
    #[error("invalid quote request: {0}")]
    Validation(String),
    #[error("sicetac configuration error: {0}")]
    Configuration(String),
    #[error("sicetac unreachable after {attempts} attempts: {message}")]
    Transport { attempts: u32, message: String },
    #[error("sicetac rejected the request: {0}")]
    RemoteService(String),
    #[error("sicetac returned no quotes for the requested criteria")]
    EmptyResult,
    #[error("sicetac response could not be parsed: {0}")]
    InvalidResponse(String),
}

/// Stateless SICETAC client. Validation, payload building, bounded retry,
/// parsing and derivation all happen inside one `fetch_quotes` call.
pub struct SicetacClient<T = HttpTransport> {
    config: SicetacConfig,
    transport: T,
}

impl SicetacClient<HttpTransport> {
    pub fn from_env() -> Result<Self, SicetacError> {
        Self::from_config(SicetacConfig::from_env())
    }

    pub fn from_config(config: SicetacConfig) -> Result<Self, SicetacError> {
        let transport =
            HttpTransport::from_config(&config).map_err(SicetacError::Configuration)?;
        Ok(Self { config, transport })
    }
}

impl<T: SicetacTransport> SicetacClient<T> {
    #[cfg_attr(not(test), allow(dead_code))]
    pub(crate) fn with_transport(config: SicetacConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// Runs one quotation: the request is checked and the credentials
    /// resolved before any network attempt, and each returned tariff carries
    /// its minimum payable figure for the requested logistics hours.
    pub fn fetch_quotes(&self, request: &QuoteRequest) -> Result<QuoteResponse, SicetacError> {
        request.validate().map_err(SicetacError::Validation)?;
        let (username, password) = self
            .config
            .credentials()
            .map_err(SicetacError::Configuration)?;
        let payload = payload::build_payload(request, username, password);

        let body = self.post_with_retry(&payload)?;
        let parsed = parse::parse_response(&body)?;

        let quotes = parsed
            .into_iter()
            .map(|doc| TariffQuote {
                minimum_payable: minimum_payable(
                    doc.mobilization_value,
                    doc.hour_value,
                    request.logistics_hours,
                ),
                route_code: doc.route_code,
                route_name: doc.route_name,
                unit_type: doc.unit_type,
                cargo_type: doc.cargo_type,
                mobilization_value: doc.mobilization_value,
                ton_value: doc.ton_value,
                hour_value: doc.hour_value,
                distance_km: doc.distance_km,
            })
            .collect();
        Ok(QuoteResponse {
            request: request.clone(),
            quotes,
        })
    }

    fn post_with_retry(&self, payload: &str) -> Result<String, SicetacError> {
        let mut last_error = String::new();
        for attempt in 1..=MAX_ATTEMPTS {
            match self.transport.send(payload) {
                Ok(body) => return Ok(body),
                Err(message) => {
                    log::warn!(
                        "event=sicetac_attempt_failed attempt={attempt} max={MAX_ATTEMPTS} error={message}"
                    );
                    last_error = message;
                    if attempt < MAX_ATTEMPTS {
                        let delay = retry_delay(self.config.retry_base, attempt);
                        if !delay.is_zero() {
                            std::thread::sleep(delay);
                        }
                    }
                }
            }
        }
        log::warn!("event=sicetac_gave_up attempts={MAX_ATTEMPTS} error={last_error}");
        Err(SicetacError::Transport {
            attempts: MAX_ATTEMPTS,
            message: last_error,
        })
    }
}

/// Exponential backoff with jitter. A zero base disables waiting, which the
/// retry tests rely on.
fn retry_delay(base: Duration, attempt: u32) -> Duration {
    if base.is_zero() {
        return Duration::ZERO;
    }
    let scaled = base.saturating_mul(1u32 << (attempt - 1).min(16));
    let capped = scaled.min(MAX_RETRY_DELAY);
    let jitter = rand::Rng::gen_range(&mut rand::thread_rng(), 0.5..=1.0);
    capped.mul_f64(jitter)
}
