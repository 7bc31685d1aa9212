//! HTTP client for the remote sensor API.
//!
//! Owns authentication, transport, and timeouts so the core never sees them;
//! the engine only depends on the `SensorStore` signature. Failures map into
//! the two adapter error classes: `Unavailable` for transport problems and
//! `Protocol` for responses the client cannot interpret.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use atrium_core::config::SensorApiConfig;
use atrium_core::errors::AdapterError;
use atrium_core::ports::SensorStore;
use atrium_core::{Reading, SensorId, SensorSeries, TimeRange};

pub struct SensorApiClient {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<SecretString>,
}

#[derive(Debug, Deserialize)]
struct ReadingRow {
    timestamp: DateTime<Utc>,
    value: f64,
}

impl SensorApiClient {
    pub fn from_config(config: &SensorApiConfig) -> Result<Self, AdapterError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| AdapterError::Unavailable(error.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    async fn fetch_one(
        &self,
        sensor_id: &SensorId,
        range: &TimeRange,
    ) -> Result<SensorSeries, AdapterError> {
        let url = format!("{}/sensors/{}/readings", self.base_url, sensor_id);
        let mut request = self.http.get(&url).query(&[
            ("start", range.start.to_rfc3339()),
            ("end", range.end.to_rfc3339()),
        ]);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await.map_err(classify_transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::Protocol(format!(
                "sensor API returned {status} for `{}`",
                sensor_id
            )));
        }
        let rows: Vec<ReadingRow> = response
            .json()
            .await
            .map_err(|error| AdapterError::Protocol(error.to_string()))?;

        let points = rows
            .into_iter()
            .map(|row| Reading::new(row.timestamp, row.value))
            .collect::<Vec<_>>();
        tracing::debug!(sensor_id = %sensor_id, points = points.len(), "fetched readings");
        Ok(SensorSeries::new(sensor_id.clone(), *range, points))
    }
}

fn classify_transport(error: reqwest::Error) -> AdapterError {
    if error.is_timeout() {
        AdapterError::Unavailable("sensor API request timed out".to_string())
    } else if error.is_connect() {
        AdapterError::Unavailable("could not connect to sensor API".to_string())
    } else {
        AdapterError::Protocol(error.to_string())
    }
}

#[async_trait]
impl SensorStore for SensorApiClient {
    async fn fetch(
        &self,
        sensor_ids: &[SensorId],
        range: &TimeRange,
    ) -> Result<Vec<SensorSeries>, AdapterError> {
        let mut series = Vec::with_capacity(sensor_ids.len());
        for sensor_id in sensor_ids {
            series.push(self.fetch_one(sensor_id, range).await?);
        }
        Ok(series)
    }
}
