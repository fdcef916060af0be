use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::model::Coordinate;

use super::{
    ProviderAlert, ProviderDailyPoint, ProviderForecastBundle, ProviderHourlyPoint,
    ProviderSnapshot, ProviderUnits, WeatherProvider,
};

const ONE_CALL_URL: &str = "https://api.openweathermap.org/data/3.0/onecall";

/// OpenWeather One Call backend. Reports wind in m/s and precipitation in
/// millimetres (`units=metric`).
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            http: Client::new(),
        }
    }

    async fn fetch_one_call(
        &self,
        coordinate: Coordinate,
        exclude: &str,
    ) -> Result<OwOneCallResponse> {
        debug!(%coordinate, exclude, "requesting OpenWeather one-call");

        let res = self
            .http
            .get(ONE_CALL_URL)
            .query(&[
                ("lat", coordinate.latitude.to_string()),
                ("lon", coordinate.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
                ("exclude", exclude.to_string()),
            ])
            .send()
            .await
            .map_err(|e| EngineError::fetch(format!("OpenWeather request failed: {e}")))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            EngineError::fetch(format!("failed to read OpenWeather response body: {e}"))
        })?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(EngineError::RateLimitExceeded);
        }
        if status == StatusCode::BAD_REQUEST || status == StatusCode::NOT_FOUND {
            return Err(EngineError::LocationUnavailable);
        }
        if !status.is_success() {
            return Err(EngineError::fetch(format!(
                "OpenWeather request failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| EngineError::fetch(format!("failed to parse OpenWeather JSON: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct OwOneCallResponse {
    timezone_offset: i32,
    current: Option<OwCurrent>,
    hourly: Option<Vec<OwHourly>>,
    daily: Option<Vec<OwDaily>>,
    alerts: Option<Vec<OwAlert>>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwPrecip {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrent {
    dt: i64,
    #[serde(default)]
    sunrise: i64,
    #[serde(default)]
    sunset: i64,
    temp: f64,
    humidity: Option<f64>,
    uvi: Option<f64>,
    visibility: Option<f64>,
    wind_speed: f64,
    #[serde(default)]
    wind_deg: f64,
    #[serde(default)]
    weather: Vec<OwWeather>,
    rain: Option<OwPrecip>,
    snow: Option<OwPrecip>,
}

#[derive(Debug, Deserialize)]
struct OwHourly {
    dt: i64,
    temp: f64,
    humidity: Option<f64>,
    uvi: Option<f64>,
    visibility: Option<f64>,
    wind_speed: f64,
    #[serde(default)]
    wind_deg: f64,
    #[serde(default)]
    pop: f64,
    #[serde(default)]
    weather: Vec<OwWeather>,
    rain: Option<OwPrecip>,
    snow: Option<OwPrecip>,
}

#[derive(Debug, Deserialize)]
struct OwDailyTemp {
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct OwDaily {
    dt: i64,
    #[serde(default)]
    sunrise: i64,
    #[serde(default)]
    sunset: i64,
    temp: OwDailyTemp,
    humidity: Option<f64>,
    uvi: Option<f64>,
    wind_speed: f64,
    #[serde(default)]
    pop: f64,
    rain: Option<f64>,
    snow: Option<f64>,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwAlert {
    event: String,
    description: String,
    #[serde(default)]
    severity: String,
    start: i64,
    end: Option<i64>,
}

fn first_description(weather: &[OwWeather]) -> String {
    weather
        .first()
        .map(|w| w.description.clone())
        .unwrap_or_else(|| "unknown".to_string())
}

fn precip_mm(rain: &Option<OwPrecip>, snow: &Option<OwPrecip>) -> f64 {
    let rain_mm = rain.as_ref().and_then(|p| p.one_hour).unwrap_or(0.0);
    let snow_mm = snow.as_ref().and_then(|p| p.one_hour).unwrap_or(0.0);
    rain_mm + snow_mm
}

fn snapshot_from(parsed: OwOneCallResponse) -> Result<ProviderSnapshot> {
    let current = parsed
        .current
        .ok_or_else(|| EngineError::fetch("OpenWeather response contained no current block"))?;

    Ok(ProviderSnapshot {
        observed_at: current.dt,
        temperature_c: current.temp,
        humidity_pct: current.humidity,
        wind_speed: current.wind_speed,
        wind_deg: current.wind_deg,
        precipitation: precip_mm(&current.rain, &current.snow),
        condition: first_description(&current.weather),
        visibility_m: current.visibility,
        uv_index: current.uvi,
        sunrise: current.sunrise,
        sunset: current.sunset,
        utc_offset_secs: parsed.timezone_offset,
        units: ProviderUnits::SI,
    })
}

fn bundle_from(parsed: OwOneCallResponse) -> Result<ProviderForecastBundle> {
    let hourly: Vec<ProviderHourlyPoint> = parsed
        .hourly
        .unwrap_or_default()
        .into_iter()
        .map(|h| ProviderHourlyPoint {
            time: h.dt,
            temperature_c: h.temp,
            humidity_pct: h.humidity,
            wind_speed: h.wind_speed,
            wind_deg: h.wind_deg,
            precip_chance: h.pop,
            precipitation: precip_mm(&h.rain, &h.snow),
            condition: first_description(&h.weather),
            uv_index: h.uvi,
            visibility_m: h.visibility,
        })
        .collect();

    if hourly.is_empty() {
        return Err(EngineError::forecast(
            "OpenWeather response contained no hourly data",
        ));
    }

    let daily: Vec<ProviderDailyPoint> = parsed
        .daily
        .unwrap_or_default()
        .into_iter()
        .map(|d| ProviderDailyPoint {
            time: d.dt,
            low_c: d.temp.min,
            high_c: d.temp.max,
            humidity_pct: d.humidity,
            wind_speed: d.wind_speed,
            precip_chance: d.pop,
            precipitation: d.rain.unwrap_or(0.0) + d.snow.unwrap_or(0.0),
            condition: first_description(&d.weather),
            uv_index: d.uvi,
            sunrise: d.sunrise,
            sunset: d.sunset,
        })
        .collect();

    Ok(ProviderForecastBundle {
        hourly,
        daily,
        utc_offset_secs: parsed.timezone_offset,
        units: ProviderUnits::SI,
    })
}

fn alerts_from(parsed: OwOneCallResponse) -> Vec<ProviderAlert> {
    parsed
        .alerts
        .unwrap_or_default()
        .into_iter()
        .map(|a| ProviderAlert {
            title: a.event,
            description: a.description,
            severity: a.severity,
            starts_at: a.start,
            ends_at: a.end,
        })
        .collect()
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_current(&self, coordinate: Coordinate) -> Result<ProviderSnapshot> {
        let parsed = self
            .fetch_one_call(coordinate, "minutely,hourly,daily,alerts")
            .await?;
        snapshot_from(parsed)
    }

    async fn fetch_forecast(&self, coordinate: Coordinate) -> Result<ProviderForecastBundle> {
        let parsed = self.fetch_one_call(coordinate, "minutely,current,alerts").await?;
        bundle_from(parsed)
    }

    async fn fetch_alerts(&self, coordinate: Coordinate) -> Result<Vec<ProviderAlert>> {
        let parsed = self
            .fetch_one_call(coordinate, "minutely,current,hourly,daily")
            .await?;
        Ok(alerts_from(parsed))
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        format!("{}...", &body[..MAX])
    } else {
        body.to_string()
    }
}
