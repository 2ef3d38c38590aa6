//! HTTP client for the EVE Swagger Interface.
//!
//! Two endpoints are used:
//!
//! | Endpoint | Purpose |
//! |----------|---------|
//! | `GET {base}/incursions/` | Current incursion snapshot |
//! | `GET {base}/universe/systems/{id}/` | `security_status` of a staging system |
//!
//! Both carry the `datasource` query parameter. Non-success statuses are
//! errors; bodies are decoded with `serde_json` so transport and decode
//! failures stay distinguishable.

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use incursion_types::{FeedIncursion, SolarSystemId};

use crate::error::FeedError;
use crate::source::FeedSource;

/// Connection settings for the feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EsiConfig {
    /// Base URL, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// `datasource` query parameter.
    #[serde(default = "default_datasource")]
    pub datasource: String,
    /// `User-Agent` header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EsiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            datasource: default_datasource(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://esi.evetech.net/latest".to_owned()
}

fn default_datasource() -> String {
    "tranquility".to_owned()
}

fn default_user_agent() -> String {
    concat!("incursion-tracker/", env!("CARGO_PKG_VERSION")).to_owned()
}

const fn default_timeout_secs() -> u64 {
    10
}

/// `GET /universe/systems/{id}/`, reduced to the one field used.
#[derive(Debug, Deserialize)]
struct SystemInfo {
    security_status: f64,
}

/// Feed client backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct EsiClient {
    client: reqwest::Client,
    base_url: String,
    datasource: String,
}

impl EsiClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &EsiConfig) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FeedError::Config(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            datasource: config.datasource.clone(),
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FeedError> {
        let url = format!("{}/{path}", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("datasource", self.datasource.as_str())])
            .send()
            .await
            .map_err(|e| FeedError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| FeedError::Transport {
            url: url.clone(),
            message: e.to_string(),
        })?;

        serde_json::from_str(&body).map_err(|e| FeedError::Decode {
            url,
            message: e.to_string(),
        })
    }
}

impl FeedSource for EsiClient {
    async fn fetch_incursions(&self) -> Result<Vec<FeedIncursion>, FeedError> {
        let incursions: Vec<FeedIncursion> = self.get_json("incursions/").await?;
        tracing::debug!(count = incursions.len(), "Fetched incursion feed");
        Ok(incursions)
    }

    async fn system_security(&self, system: SolarSystemId) -> Result<f64, FeedError> {
        let info: SystemInfo = self
            .get_json(&format!("universe/systems/{system}/"))
            .await?;
        tracing::debug!(
            system_id = %system,
            security_status = info.security_status,
            "Resolved system security"
        );
        Ok(info.security_status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = EsiConfig {
            base_url: "http://localhost:9000/latest/".to_owned(),
            ..EsiConfig::default()
        };
        let client = EsiClient::new(&config);
        assert!(client.is_ok_and(|c| c.base_url() == "http://localhost:9000/latest"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: Result<EsiConfig, _> = serde_json::from_str(r#"{"timeout_secs": 3}"#);
        assert!(config.is_ok_and(|c| c.timeout_secs == 3
            && c.datasource == "tranquility"
            && c.base_url == default_base_url()));
    }
}
