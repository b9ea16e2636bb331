use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::models::Coordinates;

/// Errors that can occur when calling the geocoding API
#[derive(Debug, Error)]
pub enum GeocoderError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Source of coordinates for free-form addresses
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Coordinates of the most relevant match, `None` if nothing matched
    async fn fetch_coordinates(&self, address: &str) -> Result<Option<Coordinates>, GeocoderError>;
}

/// Yandex Geocoder HTTP API client
pub struct YandexGeocoder {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl YandexGeocoder {
    pub fn new(endpoint: String, api_key: String, timeout: Duration) -> Result<Self, GeocoderError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            endpoint,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl GeocodingProvider for YandexGeocoder {
    async fn fetch_coordinates(&self, address: &str) -> Result<Option<Coordinates>, GeocoderError> {
        tracing::debug!("Geocoding address: {}", address);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("geocode", address),
                ("apikey", self.api_key.as_str()),
                ("format", "json"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Geocoder failed for {:?}: {} - {}", address, status, body);
            return Err(GeocoderError::ApiError(format!("Geocoding failed: {}", status)));
        }

        let json: Value = response.json().await?;

        parse_coordinates(&json)
    }
}

/// Extract the first match from a geocoder response body
///
/// Points come back as `"<lon> <lat>"`.
pub fn parse_coordinates(json: &Value) -> Result<Option<Coordinates>, GeocoderError> {
    let found_places = json
        .pointer("/response/GeoObjectCollection/featureMember")
        .and_then(|f| f.as_array())
        .ok_or_else(|| GeocoderError::InvalidResponse("Missing featureMember array".into()))?;

    let Some(most_relevant) = found_places.first() else {
        return Ok(None);
    };

    let pos = most_relevant
        .pointer("/GeoObject/Point/pos")
        .and_then(|p| p.as_str())
        .ok_or_else(|| GeocoderError::InvalidResponse("Missing GeoObject.Point.pos".into()))?;

    let mut parts = pos.split_whitespace().map(str::parse::<f64>);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(lon)), Some(Ok(lat)), None) => Ok(Some(Coordinates { lat, lon })),
        _ => Err(GeocoderError::InvalidResponse(format!("Malformed point: {:?}", pos))),
    }
}
