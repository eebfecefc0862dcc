use serde::{Deserialize, Serialize};

/// RNDC variable names requested from SICETAC when the caller does not
/// override the list.
pub const DEFAULT_VARIABLES: [&str; 8] = [
    "RUTA",
    "NOMBREUNIDADTRANSPORTE",
    "NOMBRETIPOCARGA",
    "NOMBRERUTA",
    "VALOR",
    "VALORTONELADA",
    "VALORHORA",
    "DISTANCIA",
];

/// Vehicle configurations SICETAC publishes tariffs for.
pub const ALLOWED_CONFIGURATIONS: [&str; 6] = ["2", "3", "2S2", "2S3", "3S2", "3S3"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub period: String,
    pub configuration: String,
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub cargo_type: Option<String>,
    #[serde(default)]
    pub unit_type: Option<String>,
    #[serde(default)]
    pub logistics_hours: f64,
    #[serde(default)]
    pub variables: Option<Vec<String>>,
}

impl QuoteRequest {
    /// Checks the request against the SICETAC wire constraints. Must pass
    /// before a payload is built; nothing here touches the network.
    pub fn validate(&self) -> Result<(), String> {
        let period = self.period.trim();
        if period.len() != 6 || !period.bytes().all(|b| b.is_ascii_digit()) {
            return Err("period must follow yyyymm format".to_string());
        }
        let configuration = self.configuration.trim().to_uppercase();
        if configuration.is_empty() {
            return Err("configuration must not be empty".to_string());
        }
        if !ALLOWED_CONFIGURATIONS.contains(&configuration.as_str()) {
            return Err(format!(
                "configuration '{}' is not supported by sicetac",
                self.configuration.trim()
            ));
        }
        validate_divipola("origin", &self.origin)?;
        validate_divipola("destination", &self.destination)?;
        if self.logistics_hours < 0.0 || !self.logistics_hours.is_finite() {
            return Err("logistics_hours must be a non-negative number".to_string());
        }
        Ok(())
    }

    /// Variables to request from the remote service: caller-supplied entries
    /// trimmed, emptied-entry-filtered and upper-cased, or the default
    /// 8-field list when nothing usable remains.
    pub fn normalized_variables(&self) -> Vec<String> {
        let supplied: Vec<String> = self
            .variables
            .iter()
            .flatten()
            .map(|v| v.trim().to_uppercase())
            .filter(|v| !v.is_empty())
            .collect();
        if supplied.is_empty() {
            DEFAULT_VARIABLES.iter().map(|v| v.to_string()).collect()
        } else {
            supplied
        }
    }
}

fn validate_divipola(field: &str, value: &str) -> Result<(), String> {
    let value = value.trim();
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) || !value.ends_with("000") {
        return Err(format!("{field} must be an 8-digit DIVIPOLA code ending in 000"));
    }
    Ok(())
}

/// One tariff returned by SICETAC for a matching route/vehicle/cargo
/// combination. Immutable after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TariffQuote {
    pub route_code: Option<String>,
    pub route_name: Option<String>,
    pub unit_type: Option<String>,
    pub cargo_type: Option<String>,
    pub mobilization_value: f64,
    pub ton_value: Option<f64>,
    pub hour_value: Option<f64>,
    pub distance_km: Option<f64>,
    pub minimum_payable: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub request: QuoteRequest,
    pub quotes: Vec<TariffQuote>,
}

/// Minimum payable figure for one tariff: the mobilization value plus the
/// negotiated logistics hours priced at the hourly rate, when the remote
/// service published one.
pub fn minimum_payable(
    mobilization_value: f64,
    hour_value: Option<f64>,
    logistics_hours: f64,
) -> f64 {
    match hour_value {
        Some(hour_value) => mobilization_value + hour_value * logistics_hours,
        None => mobilization_value,
    }
}
