use std::time::Duration;

use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

const DATASOURCE: &str = "tranquility";

#[derive(Error, Debug)]
pub enum EsiError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid ESI URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("ESI returned {status}: {body}")]
    Api { status: StatusCode, body: String },
}

/// Public corporation sheet from `GET /corporations/{corporation_id}/`
#[derive(Debug, Clone, Deserialize)]
pub struct EsiCorporation {
    pub name: String,
    pub member_count: i32,
    pub alliance_id: Option<i64>,
    pub tax_rate: Decimal,
}

#[derive(Debug, Clone)]
pub struct EsiClient {
    client: Client,
    base_url: Url,
}

impl EsiClient {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, EsiError> {
        // Url::join drops the last path segment unless it ends with a slash
        let base_url = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))?;

        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, EsiError> {
        let mut url = self.base_url.join(path)?;
        url.query_pairs_mut().append_pair("datasource", DATASOURCE);
        Ok(url)
    }

    /// Fetches the public corporation sheet, including the current tax rate
    #[tracing::instrument(skip(self))]
    pub async fn corporation(&self, corporation_id: i64) -> Result<EsiCorporation, EsiError> {
        let url = self.endpoint(&format!("corporations/{}/", corporation_id))?;

        tracing::debug!(url = %url, "Fetching corporation from ESI");

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "ESI corporation request failed");
            return Err(EsiError::Api { status, body });
        }

        let corporation: EsiCorporation = response.json().await?;

        Ok(corporation)
    }

    /// Checks that ESI answers its status endpoint
    #[tracing::instrument(skip(self))]
    pub async fn status(&self) -> Result<(), EsiError> {
        let url = self.endpoint("status/")?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EsiError::Api { status, body });
        }

        Ok(())
    }
}
