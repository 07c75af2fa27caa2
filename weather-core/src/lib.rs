//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather geocoding and current-weather client
//! - The name → coordinates → weather resolution service
//! - The outcome state controller a front-end renders from
//! - Location provider contracts
//!
//! It is used by `weather-cli`, but can also be reused by other front-ends.

pub mod config;
pub mod controller;
pub mod error;
pub mod location;
pub mod model;
pub mod provider;
pub mod service;

#[cfg(test)]
mod fakes;

pub use config::{Config, Endpoints};
pub use controller::{Event, StateController};
pub use error::{ErrorKind, ResolveError};
pub use location::{LocationError, LocationProvider, PermissionGate};
pub use model::{
    Coordinates, GeocodingResult, PlaceQuery, ResolutionOutcome, Resolved, Units, WeatherResult,
};
pub use provider::{GeocodingApi, WeatherApi, openweather::OpenWeatherClient};
pub use service::WeatherService;
