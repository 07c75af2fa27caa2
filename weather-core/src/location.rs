//! Contracts for obtaining the device position, plus the implementations the
//! CLI ships with.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};
use tokio_util::sync::CancellationToken;

use crate::model::Coordinates;

const IPAPI_URL: &str = "https://ipapi.co/json/";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location provider unavailable")]
    ProviderUnavailable,
    #[error("no last known location and no live fix was produced")]
    NoLastKnownLocation,
    #[error("location request cancelled")]
    Cancelled,
    #[error("location error: {0}")]
    Other(String),
}

/// Source of the current position.
#[async_trait]
pub trait LocationProvider: Send + Sync + Debug {
    /// Cached fix, if the platform has one.
    async fn last_known(&self) -> Result<Option<Coordinates>, LocationError>;

    /// Ask for a fresh fix.
    async fn request_update(&self) -> Result<Coordinates, LocationError>;
}

/// Reports whether location access is already granted. If not, an
/// implementation may start a prompt but must not wait for it.
pub trait PermissionGate: Send + Sync {
    fn ensure_location_permission(&self) -> bool;
}

/// Last known position, falling back to a live update when there is none.
pub async fn current_location(
    provider: &dyn LocationProvider,
    cancel: &CancellationToken,
) -> Result<Coordinates, LocationError> {
    let lookup = async {
        if let Some(coords) = provider.last_known().await? {
            tracing::debug!(%coords, "using last known location");
            return Ok(coords);
        }

        tracing::debug!("last known location is empty, requesting location update");
        provider.request_update().await
    };

    tokio::select! {
        _ = cancel.cancelled() => Err(LocationError::Cancelled),
        res = lookup => res,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AlwaysGranted;

impl PermissionGate for AlwaysGranted {
    fn ensure_location_permission(&self) -> bool {
        true
    }
}

/// A position supplied up front, e.g. from command-line flags.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn last_known(&self) -> Result<Option<Coordinates>, LocationError> {
        Ok(Some(self.0))
    }

    async fn request_update(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

/// Approximate position from the public IP address. Keeps no fix between
/// calls, so every lookup is a live request.
#[derive(Debug, Clone)]
pub struct IpLocationProvider {
    http: Client,
    url: String,
}

impl IpLocationProvider {
    pub fn new(timeout: Duration) -> Result<Self, LocationError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LocationError::Other(e.to_string()))?;

        Ok(Self::with_client(http, IPAPI_URL))
    }

    pub fn with_client(http: Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    city: Option<String>,
}

#[async_trait]
impl LocationProvider for IpLocationProvider {
    async fn last_known(&self) -> Result<Option<Coordinates>, LocationError> {
        Ok(None)
    }

    async fn request_update(&self) -> Result<Coordinates, LocationError> {
        let res = self.http.get(&self.url).send().await.map_err(|e| {
            tracing::warn!("IP location request failed: {e}");
            LocationError::ProviderUnavailable
        })?;

        if !res.status().is_success() {
            tracing::warn!("IP location lookup returned status {}", res.status());
            return Err(LocationError::ProviderUnavailable);
        }

        let body: IpApiResponse = res
            .json()
            .await
            .map_err(|e| LocationError::Other(format!("unreadable IP location response: {e}")))?;

        match (body.latitude, body.longitude) {
            (Some(lat), Some(lon)) => {
                let coords = Coordinates::new(lat, lon)
                    .map_err(|e| LocationError::Other(e.to_string()))?;
                tracing::info!(city = ?body.city, %coords, "IP location resolved");
                Ok(coords)
            }
            _ => Err(LocationError::NoLastKnownLocation),
        }
    }
}
