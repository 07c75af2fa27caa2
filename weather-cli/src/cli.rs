use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::{Select, Text};
use tokio::task::JoinHandle;
use weather_core::{
    Config, Coordinates, StateController, Units, WeatherService,
    location::{AlwaysGranted, IpLocationProvider},
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current weather by city name or location")]
pub struct Cli {
    /// Log requests and responses to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and preferred units.
    Configure,

    /// Show weather for a city.
    City {
        /// City name, e.g. "London" or "New York".
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },

    /// Show weather for a latitude/longitude pair.
    Coords {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },

    /// Show weather for the current location, estimated from the public IP address.
    Here,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::City { name } => {
                let mut session = Session::from_config()?;
                let task = session.controller.trigger_by_name(name.join(" "));
                session.finish(Some(task)).await
            }
            Command::Coords { lat, lon } => {
                let coords = Coordinates::new(lat, lon)?;
                let mut session = Session::from_config()?;
                let task = session.controller.trigger_by_coordinates(coords);
                session.finish(Some(task)).await
            }
            Command::Here => {
                let mut session = Session::from_config()?;
                let locator = IpLocationProvider::new(session.config.timeout())?;
                let task = session
                    .controller
                    .trigger_by_location(Arc::new(locator), &AlwaysGranted);
                session.finish(task).await
            }
        }
    }
}

/// A controller built from the on-disk config plus env overrides.
struct Session {
    config: Config,
    controller: StateController,
}

impl Session {
    fn from_config() -> Result<Self> {
        let config = Config::load()?.with_env_overrides();
        let service = WeatherService::from_config(&config)?;

        Ok(Self {
            config,
            controller: StateController::new(service),
        })
    }

    /// Wait for the resolution (if one was started) and print the outcome.
    async fn finish(self, task: Option<JoinHandle<()>>) -> Result<()> {
        if let Some(task) = task {
            eprintln!("Fetching weather...");
            task.await.context("Weather task failed")?;
        }

        render::outcome(&self.controller.outcome(), self.config.units)
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = Text::new("OpenWeather API key:")
        .with_help_message("https://home.openweathermap.org/api_keys")
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key.trim().to_string());

    let start = Units::all()
        .iter()
        .position(|u| *u == config.units)
        .unwrap_or_default();
    config.units = Select::new("Units:", Units::all().to_vec())
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read units")?;

    let path = config.save()?;
    println!("Saved configuration to {}", path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_words_are_collected() {
        let cli = Cli::try_parse_from(["weather", "city", "New", "York"]).expect("parse");
        match cli.command {
            Command::City { name } => assert_eq!(name.join(" "), "New York"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn negative_coordinates_parse() {
        let cli = Cli::try_parse_from(["weather", "-v", "coords", "--lat", "-33.87", "--lon", "-70.6"])
            .expect("parse");

        assert!(cli.verbose);
        match cli.command {
            Command::Coords { lat, lon } => {
                assert_eq!(lat, -33.87);
                assert_eq!(lon, -70.6);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn city_requires_a_name() {
        assert!(Cli::try_parse_from(["weather", "city"]).is_err());
    }
}
