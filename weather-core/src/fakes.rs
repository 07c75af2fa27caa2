//! In-memory lookups for unit tests.

use async_trait::async_trait;
use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use crate::{
    error::ResolveError,
    model::{Coordinates, GeocodingResult, PlaceQuery, WeatherResult},
    provider::{GeocodingApi, WeatherApi},
};

/// Query that never gets an answer.
pub const STALLED_PLACE: &str = "Slowtown";

#[derive(Debug)]
pub struct FakeGeocoder {
    response: Result<Vec<GeocodingResult>, ResolveError>,
    calls: AtomicUsize,
    pub limits: Mutex<Vec<u32>>,
}

impl FakeGeocoder {
    pub fn returning(response: Result<Vec<GeocodingResult>, ResolveError>) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
            limits: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeocodingApi for FakeGeocoder {
    async fn direct(
        &self,
        query: &PlaceQuery,
        limit: u32,
    ) -> Result<Vec<GeocodingResult>, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.limits.lock().unwrap().push(limit);

        if query.as_str() == STALLED_PLACE {
            std::future::pending::<()>().await;
        }
        self.response.clone()
    }
}

/// Reports the latitude as the temperature so results identify their request.
#[derive(Debug, Default)]
pub struct FakeWeather {
    calls: AtomicUsize,
    pub seen: Mutex<Vec<Coordinates>>,
    fail_with: Option<ResolveError>,
}

impl FakeWeather {
    pub fn failing(err: ResolveError) -> Self {
        Self {
            fail_with: Some(err),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherApi for FakeWeather {
    async fn current(&self, coords: Coordinates) -> Result<WeatherResult, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(coords);

        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        Ok(weather_at(coords))
    }
}

pub fn weather_at(coords: Coordinates) -> WeatherResult {
    WeatherResult {
        temperature: coords.lat(),
        humidity_pct: 60,
        conditions: vec!["clear sky".into()],
        observed_at: None,
    }
}

pub fn place(name: &str, lat: f64, lon: f64) -> GeocodingResult {
    GeocodingResult {
        name: name.into(),
        coordinates: Coordinates::new(lat, lon).unwrap(),
        country: "GB".into(),
        state: None,
    }
}
