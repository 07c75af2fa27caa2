use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

use crate::error::{ErrorKind, ResolveError};

/// A city name as typed by the user. Never empty or whitespace-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceQuery(String);

impl PlaceQuery {
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        if raw.trim().is_empty() {
            return Err(ResolveError::InvalidInput(
                "place name must not be empty".to_string(),
            ));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaceQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Latitude/longitude pair, always within the valid geographic range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    lat: f64,
    lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Result<Self, ResolveError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ResolveError::InvalidInput(format!(
                "latitude {lat} is outside -90..90"
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(ResolveError::InvalidInput(format!(
                "longitude {lon} is outside -180..180"
            )));
        }

        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// One candidate returned by the geocoding lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodingResult {
    pub name: String,
    pub coordinates: Coordinates,
    pub country: String,
    pub state: Option<String>,
}

impl GeocodingResult {
    /// "London, GB" style label.
    pub fn label(&self) -> String {
        if self.country.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.country)
        }
    }
}

/// Current conditions for a pair of coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherResult {
    /// Temperature in the units the provider was asked for.
    pub temperature: f64,
    pub humidity_pct: u8,
    /// Never empty; ordered as the provider returned them.
    pub conditions: Vec<String>,
    pub observed_at: Option<DateTime<Utc>>,
}

impl WeatherResult {
    pub fn description(&self) -> &str {
        self.conditions.first().map(String::as_str).unwrap_or_default()
    }
}

/// The weather together with the place it was resolved for.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub place: GeocodingResult,
    pub weather: WeatherResult,
}

/// Measurement system requested from the weather endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Provider default (Kelvin); not sent on the wire.
    #[default]
    Standard,
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Standard => "standard",
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Standard, Units::Metric, Units::Imperial]
    }

    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            Units::Standard => "K",
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Units {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "standard" => Ok(Units::Standard),
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown units '{value}'. Supported units: standard, metric, imperial."
            )),
        }
    }
}

/// What the surface should currently render.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResolutionOutcome {
    #[default]
    Idle,
    Loading,
    Success(WeatherResult),
    Failure { kind: ErrorKind, message: String },
}

impl ResolutionOutcome {
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        ResolutionOutcome::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ResolutionOutcome::Loading)
    }

    /// `Success` or `Failure`.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            ResolutionOutcome::Success(_) | ResolutionOutcome::Failure { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_queries_are_rejected() {
        for raw in ["", "   ", "\t\n"] {
            let err = PlaceQuery::parse(raw).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }

    #[test]
    fn query_is_kept_as_typed() {
        let q = PlaceQuery::parse("  São Paulo ").expect("valid query");
        assert_eq!(q.as_str(), "  São Paulo ");
    }

    #[test]
    fn coordinates_reject_out_of_range() {
        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert!(Coordinates::new(-90.0, -180.0).is_ok());
        assert!(Coordinates::new(90.5, 0.0).is_err());
        assert!(Coordinates::new(0.0, -180.1).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn description_is_first_condition() {
        let weather = WeatherResult {
            temperature: 1.0,
            humidity_pct: 10,
            conditions: vec!["mist".into(), "light rain".into()],
            observed_at: None,
        };
        assert_eq!(weather.description(), "mist");
    }

    #[test]
    fn units_parse_case_insensitive() {
        for u in Units::all() {
            let parsed = Units::try_from(u.as_str().to_uppercase().as_str()).expect("known unit");
            assert_eq!(*u, parsed);
        }
        assert!(Units::try_from("kelvinish").is_err());
    }

    #[test]
    fn label_includes_country_when_known() {
        let place = GeocodingResult {
            name: "London".into(),
            coordinates: Coordinates::new(51.5, -0.12).expect("valid"),
            country: "GB".into(),
            state: Some("England".into()),
        };
        assert_eq!(place.label(), "London, GB");
    }
}
