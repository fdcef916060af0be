use std::time::Duration;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use fairway_core::{
    Config, Coordinate, GolfWeatherEngine, ProviderId, provider::default_provider_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "fairway", version, about = "Golf weather and tee-time CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct Location {
    /// Latitude in degrees.
    #[arg(allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude in degrees.
    #[arg(allow_negative_numbers = true)]
    pub lon: f64,
}

impl Location {
    fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure a weather provider and make it the default.
    Configure {
        /// Provider short name, e.g. "openweather" or "openmeteo".
        provider: String,
    },

    /// Show current conditions and the playability score.
    Now {
        #[command(flatten)]
        location: Location,
    },

    /// Show the hourly forecast.
    Forecast {
        #[command(flatten)]
        location: Location,

        /// Number of hours to show.
        #[arg(long, default_value_t = 12)]
        hours: usize,
    },

    /// Show the daily forecast with suggested golf hours.
    Daily {
        #[command(flatten)]
        location: Location,

        /// Number of days to show.
        #[arg(long, default_value_t = 5)]
        days: usize,
    },

    /// Rank tee-time windows for a date, best first.
    TeeTimes {
        #[command(flatten)]
        location: Location,

        /// Target date (YYYY-MM-DD); if absent, means "today".
        #[arg(long)]
        date: Option<String>,
    },

    /// Show active weather alerts.
    Alerts {
        #[command(flatten)]
        location: Location,
    },

    /// Poll the playability score on a fixed interval.
    Watch {
        #[command(flatten)]
        location: Location,

        /// Seconds between polls.
        #[arg(long, default_value_t = 300)]
        interval_secs: u64,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Now { location } => now(location.coordinate()).await,
            Command::Forecast { location, hours } => forecast(location.coordinate(), hours).await,
            Command::Daily { location, days } => daily(location.coordinate(), days).await,
            Command::TeeTimes { location, date } => {
                tee_times(location.coordinate(), date.as_deref()).await
            }
            Command::Alerts { location } => alerts(location.coordinate()).await,
            Command::Watch {
                location,
                interval_secs,
            } => watch(location.coordinate(), interval_secs).await,
        }
    }
}

fn engine_from_config(config: &Config) -> anyhow::Result<GolfWeatherEngine> {
    let provider = default_provider_from_config(config)?;
    Ok(GolfWeatherEngine::new(provider, &config.cache))
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    if id.requires_api_key() {
        let api_key = inquire::Password::new("API key:")
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?;
        config.upsert_provider_api_key(id, api_key);
    }
    config.set_default_provider(id);
    config.save()?;

    println!("Configured '{id}' as the default provider.");
    Ok(())
}

async fn now(coordinate: Coordinate) -> anyhow::Result<()> {
    let config = Config::load()?;
    let engine = engine_from_config(&config)?;

    let score = engine.get_playability_score(coordinate).await?;
    let conditions = &score.conditions;

    println!("Conditions at {coordinate}:");
    println!(
        "  {}, {:.0}°F, wind {:.0} mph {}, humidity {:.0}%",
        conditions.condition,
        conditions.temperature_f,
        conditions.wind_speed_mph,
        conditions.wind_direction,
        conditions.humidity_pct,
    );
    println!(
        "  visibility {:.1} mi, UV {}, sunrise {}, sunset {}",
        conditions.visibility_mi, conditions.uv_index, conditions.sunrise, conditions.sunset,
    );
    println!(
        "  playability {}/10 ({})",
        score.overall, score.recommendation
    );
    Ok(())
}

async fn forecast(coordinate: Coordinate, hours: usize) -> anyhow::Result<()> {
    let config = Config::load()?;
    let engine = engine_from_config(&config)?;

    let points = engine.get_hourly_forecast(coordinate, hours).await?;

    println!("Hourly forecast for {coordinate}:");
    for point in &points {
        println!(
            "  {}  {:>3.0}°F  wind {:>2.0} mph  rain {:>3.0}%  {:<13}  {:>2}/10",
            point.time.format("%a %H:%M"),
            point.temperature_f,
            point.wind_speed_mph,
            point.precip_chance_pct,
            point.condition.to_string(),
            point.playability_score(),
        );
    }
    Ok(())
}

async fn daily(coordinate: Coordinate, days: usize) -> anyhow::Result<()> {
    let config = Config::load()?;
    let engine = engine_from_config(&config)?;

    let points = engine.get_daily_forecast(coordinate, days).await?;

    println!("Daily forecast for {coordinate}:");
    for day in &points {
        let hours = day.optimal_golf_hours();
        let hours_text = if hours.is_empty() {
            "none".to_string()
        } else {
            hours
                .iter()
                .map(|h| format!("{h}:00"))
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!(
            "  {}  low {:>3.0}°F high {:>3.0}°F  rain {:>3.0}%  {:<13}  golf hours: {}",
            day.date,
            day.low_f,
            day.high_f,
            day.precip_chance_pct,
            day.condition.to_string(),
            hours_text,
        );
    }
    Ok(())
}

async fn tee_times(coordinate: Coordinate, date: Option<&str>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let engine = engine_from_config(&config)?;

    let date = match date {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .context("Dates must be formatted YYYY-MM-DD")?,
        None => Utc::now().date_naive(),
    };

    let windows = engine.get_optimal_tee_times(coordinate, date).await?;
    if windows.is_empty() {
        println!("No playable tee times left on {date}.");
        return Ok(());
    }

    println!("Tee times for {date}, best first:");
    for window in &windows {
        println!(
            "  {}-{}  {:>2}/10  {:.0}°F, wind up to {:.0} mph, rain up to {:.0}%  {}",
            window.starts_at.format("%H:%M"),
            window.ends_at.format("%H:%M"),
            window.score,
            window.avg_temperature_f,
            window.max_wind_mph,
            window.max_precip_chance_pct,
            window.recommendation,
        );
    }
    Ok(())
}

async fn alerts(coordinate: Coordinate) -> anyhow::Result<()> {
    let config = Config::load()?;
    let engine = engine_from_config(&config)?;

    let alerts = engine.get_alerts(coordinate).await;
    if alerts.is_empty() {
        println!("No active alerts for {coordinate}.");
        return Ok(());
    }

    println!("Active alerts for {coordinate}:");
    for alert in &alerts {
        println!(
            "  [{} / golf impact: {}] {}",
            alert.severity, alert.golf_impact, alert.title
        );
        println!("      {}", alert.description);
    }
    Ok(())
}

/// Fire-and-forget periodic monitor: poll, print, ignore failures, repeat.
async fn watch(coordinate: Coordinate, interval_secs: u64) -> anyhow::Result<()> {
    let config = Config::load()?;
    let engine = engine_from_config(&config)?;

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    println!("Watching {coordinate} every {interval_secs}s; Ctrl-C to stop.");

    loop {
        interval.tick().await;
        match engine.get_playability_score(coordinate).await {
            Ok(score) => println!(
                "{}  {}/10 ({})  {}, {:.0}°F, wind {:.0} mph",
                Utc::now().format("%H:%M:%S"),
                score.overall,
                score.recommendation,
                score.conditions.condition,
                score.conditions.temperature_f,
                score.conditions.wind_speed_mph,
            ),
            Err(err) => tracing::warn!(%err, "scheduled weather refresh failed"),
        }
    }
}
