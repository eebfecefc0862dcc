use encoding_rs::WINDOWS_1252;

use super::config::SicetacConfig;

/// Seam between the retry loop and the wire. Implementations carry out one
/// attempt; retries and backoff stay in the client.
pub trait SicetacTransport {
    fn send(&self, payload: &str) -> Result<String, String>;
}

/// Blocking HTTP POST to the RNDC endpoint. The service speaks ISO-8859-1
/// on both directions, so the body is transcoded explicitly instead of
/// trusting reqwest's UTF-8 defaults.
pub struct HttpTransport {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn from_config(config: &SicetacConfig) -> Result<Self, String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|err| format!("failed to build http client: {err}"))?;
        Ok(Self {
            endpoint: config.endpoint.clone(),
            client,
        })
    }
}

impl SicetacTransport for HttpTransport {
    fn send(&self, payload: &str) -> Result<String, String> {
        let (body, _, _) = WINDOWS_1252.encode(payload);
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "text/xml; charset=ISO-8859-1")
            .body(body.into_owned())
            .send()
            .map_err(|err| format!("request failed: {err}"))?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("unexpected upstream status {status}"));
        }
        let raw = response
            .bytes()
            .map_err(|err| format!("failed to read response body: {err}"))?;
        let (decoded, _, _) = WINDOWS_1252.decode(&raw);
        Ok(decoded.into_owned())
    }
}
