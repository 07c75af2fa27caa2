use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::time::Duration;

use crate::{
    config::Endpoints,
    error::ResolveError,
    model::{Coordinates, GeocodingResult, PlaceQuery, Units, WeatherResult},
};

use super::{GeocodingApi, WeatherApi};

/// Client for the OpenWeather geocoding and current-weather endpoints.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    endpoints: Endpoints,
    units: Units,
    http: Client,
}

#[derive(Debug)]
pub struct OpenWeatherClientBuilder {
    api_key: String,
    endpoints: Endpoints,
    units: Units,
    timeout: Option<Duration>,
    http: Option<Client>,
}

impl OpenWeatherClientBuilder {
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use an existing client instead of building one. Ignores `timeout`.
    pub fn http_client(mut self, http: Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> Result<OpenWeatherClient> {
        let http = match self.http {
            Some(http) => http,
            None => {
                let mut builder = Client::builder();
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                builder.build().context("Failed to build HTTP client")?
            }
        };

        Ok(OpenWeatherClient {
            api_key: self.api_key,
            endpoints: self.endpoints,
            units: self.units,
            http,
        })
    }
}

impl OpenWeatherClient {
    pub fn builder(api_key: impl Into<String>) -> OpenWeatherClientBuilder {
        OpenWeatherClientBuilder {
            api_key: api_key.into(),
            endpoints: Endpoints::default(),
            units: Units::default(),
            timeout: None,
            http: None,
        }
    }

    pub fn units(&self) -> Units {
        self.units
    }

    fn geocoding_url(&self) -> String {
        format!("{}/direct", self.endpoints.geocoding.trim_end_matches('/'))
    }

    /// Send the request and return the body of a 2xx response.
    async fn fetch_body(&self, what: &str, request: RequestBuilder) -> Result<String, ResolveError> {
        let res = request
            .send()
            .await
            .map_err(|e| ResolveError::Network(format!("failed to send {what} request: {e}")))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            ResolveError::Network(format!("failed to read {what} response body: {e}"))
        })?;

        tracing::debug!(%status, body = %truncate_body(&body), "{what} response");

        if !status.is_success() {
            return Err(ResolveError::Provider(format!(
                "{what} request failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct OwPlace {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    country: String,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: i64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    dt: Option<i64>,
}

impl TryFrom<OwPlace> for GeocodingResult {
    type Error = ResolveError;

    fn try_from(place: OwPlace) -> Result<Self, Self::Error> {
        let coordinates = Coordinates::new(place.lat, place.lon).map_err(|e| {
            ResolveError::Provider(format!("geocoding returned bad coordinates: {e}"))
        })?;

        Ok(GeocodingResult {
            name: place.name,
            coordinates,
            country: place.country,
            state: place.state,
        })
    }
}

impl TryFrom<OwCurrentResponse> for WeatherResult {
    type Error = ResolveError;

    fn try_from(parsed: OwCurrentResponse) -> Result<Self, Self::Error> {
        let humidity_pct = u8::try_from(parsed.main.humidity)
            .ok()
            .filter(|h| *h <= 100)
            .ok_or_else(|| {
                ResolveError::Provider(format!(
                    "weather response humidity {} is outside 0..100",
                    parsed.main.humidity
                ))
            })?;

        if parsed.weather.is_empty() {
            return Err(ResolveError::Provider(
                "weather response contained no conditions".to_string(),
            ));
        }

        Ok(WeatherResult {
            temperature: parsed.main.temp,
            humidity_pct,
            conditions: parsed.weather.into_iter().map(|w| w.description).collect(),
            observed_at: parsed.dt.and_then(unix_to_utc),
        })
    }
}

#[async_trait]
impl GeocodingApi for OpenWeatherClient {
    async fn direct(
        &self,
        query: &PlaceQuery,
        limit: u32,
    ) -> Result<Vec<GeocodingResult>, ResolveError> {
        tracing::debug!(query = %query, limit, "geocoding request");

        let request = self.http.get(self.geocoding_url()).query(&[
            ("q", query.as_str()),
            ("limit", &limit.to_string()),
            ("appid", self.api_key.as_str()),
        ]);

        let body = self.fetch_body("geocoding", request).await?;

        let places: Vec<OwPlace> = serde_json::from_str(&body).map_err(|e| {
            ResolveError::Provider(format!("failed to parse geocoding JSON: {e}"))
        })?;

        places.into_iter().map(GeocodingResult::try_from).collect()
    }
}

#[async_trait]
impl WeatherApi for OpenWeatherClient {
    async fn current(&self, coords: Coordinates) -> Result<WeatherResult, ResolveError> {
        tracing::debug!(%coords, units = %self.units, "weather request");

        let mut params = vec![
            ("lat", coords.lat().to_string()),
            ("lon", coords.lon().to_string()),
            ("appid", self.api_key.clone()),
        ];
        if self.units != Units::Standard {
            params.push(("units", self.units.as_str().to_string()));
        }

        let request = self.http.get(&self.endpoints.weather).query(&params);
        let body = self.fetch_body("weather", request).await?;

        let parsed: OwCurrentResponse = serde_json::from_str(&body)
            .map_err(|e| ResolveError::Provider(format!("failed to parse weather JSON: {e}")))?;

        WeatherResult::try_from(parsed)
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
