use crate::{
    Config,
    error::ResolveError,
    model::{Coordinates, GeocodingResult, PlaceQuery, WeatherResult},
    provider::openweather::OpenWeatherClient,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Place name → candidate coordinates.
#[async_trait]
pub trait GeocodingApi: Send + Sync + Debug {
    /// Up to `limit` candidates in provider order. An empty list means no match.
    async fn direct(
        &self,
        query: &PlaceQuery,
        limit: u32,
    ) -> Result<Vec<GeocodingResult>, ResolveError>;
}

/// Coordinates → current conditions.
#[async_trait]
pub trait WeatherApi: Send + Sync + Debug {
    async fn current(&self, coords: Coordinates) -> Result<WeatherResult, ResolveError>;
}

/// Construct the OpenWeather client from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<OpenWeatherClient> {
    let api_key = config.require_api_key()?;

    OpenWeatherClient::builder(api_key)
        .endpoints(config.endpoints.clone())
        .units(config.units)
        .timeout(config.timeout())
        .build()
}
