use crate::{
    Config,
    error::Result,
    model::Coordinate,
    provider::{openmeteo::OpenMeteoProvider, openweather::OpenWeatherProvider},
};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug};

pub mod openmeteo;
pub mod openweather;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    OpenMeteo,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::OpenMeteo => "openmeteo",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::OpenMeteo]
    }

    /// Whether this backend needs an API key before it can be queried.
    pub const fn requires_api_key(self) -> bool {
        matches!(self, ProviderId::OpenWeather)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "openmeteo" => Ok(ProviderId::OpenMeteo),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, openmeteo."
            )),
        }
    }
}

/// Conversion factors from a provider's native units into the engine's
/// canonical mph/inches. Carried on every raw payload so normalization can
/// stay a pure multiply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProviderUnits {
    pub wind_to_mph: f64,
    pub precip_to_inches: f64,
}

impl ProviderUnits {
    /// Wind in m/s, precipitation in millimetres.
    pub const SI: ProviderUnits = ProviderUnits {
        wind_to_mph: 2.236_94,
        precip_to_inches: 0.039_370_1,
    };

    /// Wind in km/h, precipitation in millimetres.
    pub const METRIC_KMH: ProviderUnits = ProviderUnits {
        wind_to_mph: 0.621_371,
        precip_to_inches: 0.039_370_1,
    };
}

/// Raw current-conditions payload in the provider's native units and
/// vocabulary. The normalizer turns this into `WeatherConditions`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSnapshot {
    pub observed_at: i64,
    pub temperature_c: f64,
    pub humidity_pct: Option<f64>,
    pub wind_speed: f64,
    pub wind_deg: f64,
    pub precipitation: f64,
    /// Provider-vocabulary condition description, e.g. "light rain".
    pub condition: String,
    pub visibility_m: Option<f64>,
    pub uv_index: Option<f64>,
    pub sunrise: i64,
    pub sunset: i64,
    pub utc_offset_secs: i32,
    pub units: ProviderUnits,
}

/// One raw hourly forecast step.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderHourlyPoint {
    pub time: i64,
    pub temperature_c: f64,
    pub humidity_pct: Option<f64>,
    pub wind_speed: f64,
    pub wind_deg: f64,
    /// Probability of precipitation, 0–1.
    pub precip_chance: f64,
    pub precipitation: f64,
    pub condition: String,
    pub uv_index: Option<f64>,
    pub visibility_m: Option<f64>,
}

/// One raw daily forecast summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderDailyPoint {
    pub time: i64,
    pub low_c: f64,
    pub high_c: f64,
    pub humidity_pct: Option<f64>,
    pub wind_speed: f64,
    /// Probability of precipitation, 0–1.
    pub precip_chance: f64,
    pub precipitation: f64,
    pub condition: String,
    pub uv_index: Option<f64>,
    pub sunrise: i64,
    pub sunset: i64,
}

/// Hourly and daily series from a single provider fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderForecastBundle {
    pub hourly: Vec<ProviderHourlyPoint>,
    pub daily: Vec<ProviderDailyPoint>,
    pub utc_offset_secs: i32,
    pub units: ProviderUnits,
}

/// Raw active alert as reported by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderAlert {
    pub title: String,
    pub description: String,
    /// Provider severity word; empty when the feed carries none.
    pub severity: String,
    pub starts_at: i64,
    pub ends_at: Option<i64>,
}

/// The weather data capability the engine consumes. Implementations may be
/// slow or rate-limited; callers never hold cache locks across these calls.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_current(&self, coordinate: Coordinate) -> Result<ProviderSnapshot>;
    async fn fetch_forecast(&self, coordinate: Coordinate) -> Result<ProviderForecastBundle>;
    async fn fetch_alerts(&self, coordinate: Coordinate) -> Result<Vec<ProviderAlert>>;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let boxed: Box<dyn WeatherProvider> = match id {
        ProviderId::OpenWeather => {
            let api_key = config.provider_api_key(id).ok_or_else(|| {
                anyhow::anyhow!(
                    "No API key configured for provider '{id}'.\n\
                     Hint: run `fairway configure {id}` and enter your API key."
                )
            })?;
            Box::new(OpenWeatherProvider::new(api_key.to_owned()))
        }
        ProviderId::OpenMeteo => Box::new(OpenMeteoProvider::new()),
    };

    Ok(boxed)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config)
}
