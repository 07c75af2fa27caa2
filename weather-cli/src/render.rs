use anyhow::{Result, anyhow};
use chrono::Local;
use weather_core::{ResolutionOutcome, Units, WeatherResult};

/// Print a successful outcome; turn a failure into the process error.
pub fn outcome(outcome: &ResolutionOutcome, units: Units) -> Result<()> {
    match outcome {
        ResolutionOutcome::Success(weather) => {
            println!("{}", weather_lines(weather, units));
            Ok(())
        }
        ResolutionOutcome::Failure { kind, message } => {
            tracing::debug!(%kind, "resolution failed");
            Err(anyhow!("{message}"))
        }
        ResolutionOutcome::Idle | ResolutionOutcome::Loading => {
            Err(anyhow!("Weather lookup did not complete"))
        }
    }
}

fn weather_lines(weather: &WeatherResult, units: Units) -> String {
    let mut out = format!(
        "Temperature: {} {}\nHumidity: {} %\nDescription: {}",
        weather.temperature,
        units.temperature_suffix(),
        weather.humidity_pct,
        weather.description(),
    );

    if let Some(at) = weather.observed_at {
        let local = at.with_timezone(&Local);
        out.push_str(&format!("\nObserved: {}", local.format("%Y-%m-%d %H:%M")));
    }

    out
}
