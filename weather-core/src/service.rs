use std::sync::Arc;

use crate::{
    Config,
    error::ResolveError,
    model::{Coordinates, PlaceQuery, Resolved, WeatherResult},
    provider::{GeocodingApi, WeatherApi, provider_from_config},
};

/// Geocoding is always asked for a single candidate.
const GEOCODING_LIMIT: u32 = 1;

/// Turns a place name or a coordinate pair into current weather.
///
/// The geocoding call always completes before the weather call starts, and
/// the weather call is skipped when geocoding fails or finds nothing.
#[derive(Debug, Clone)]
pub struct WeatherService {
    geocoding: Arc<dyn GeocodingApi>,
    weather: Arc<dyn WeatherApi>,
}

impl WeatherService {
    pub fn new(geocoding: Arc<dyn GeocodingApi>, weather: Arc<dyn WeatherApi>) -> Self {
        Self { geocoding, weather }
    }

    /// Service backed by one OpenWeather client for both lookups.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = Arc::new(provider_from_config(config)?);
        Ok(Self::new(client.clone(), client))
    }

    pub async fn resolve_by_coordinates(
        &self,
        coords: Coordinates,
    ) -> Result<WeatherResult, ResolveError> {
        let res = self.weather.current(coords).await;
        if let Err(e) = &res {
            tracing::warn!(%coords, "weather lookup failed: {e}");
        }
        res
    }

    pub async fn resolve_by_name(&self, query: &str) -> Result<WeatherResult, ResolveError> {
        self.resolve_place(query).await.map(|resolved| resolved.weather)
    }

    /// Like [`resolve_by_name`](Self::resolve_by_name), keeping the geocoded place.
    pub async fn resolve_place(&self, query: &str) -> Result<Resolved, ResolveError> {
        let query = PlaceQuery::parse(query)?;

        let candidates = self
            .geocoding
            .direct(&query, GEOCODING_LIMIT)
            .await
            .inspect_err(|e| tracing::warn!(query = %query, "geocoding failed: {e}"))?;

        let place = candidates.into_iter().next().ok_or_else(|| {
            tracing::warn!(query = %query, "geocoding returned no candidates");
            ResolveError::NotFound
        })?;

        tracing::info!(query = %query, place = %place.label(), coords = %place.coordinates, "place resolved");

        let weather = self.resolve_by_coordinates(place.coordinates).await?;
        Ok(Resolved { place, weather })
    }
}
