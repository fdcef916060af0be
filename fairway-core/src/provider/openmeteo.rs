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

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

const CURRENT_FIELDS: &str =
    "temperature_2m,relative_humidity_2m,precipitation,weather_code,wind_speed_10m,wind_direction_10m,uv_index";
const HOURLY_FIELDS: &str =
    "temperature_2m,relative_humidity_2m,precipitation_probability,precipitation,weather_code,wind_speed_10m,wind_direction_10m,uv_index,visibility";
const DAILY_FIELDS: &str =
    "temperature_2m_max,temperature_2m_min,precipitation_probability_max,precipitation_sum,weather_code,wind_speed_10m_max,uv_index_max,sunrise,sunset";

/// Open-Meteo backend. Keyless; reports wind in km/h and precipitation in
/// millimetres. The service has no alert feed, so `fetch_alerts` always
/// reports none.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }

    async fn fetch(&self, coordinate: Coordinate, query: &[(&str, String)]) -> Result<OmResponse> {
        debug!(%coordinate, "requesting Open-Meteo forecast");

        let mut params = vec![
            ("latitude", coordinate.latitude.to_string()),
            ("longitude", coordinate.longitude.to_string()),
            ("timezone", "auto".to_string()),
            ("timeformat", "unixtime".to_string()),
            ("wind_speed_unit", "kmh".to_string()),
        ];
        params.extend(query.iter().cloned());

        let res = self
            .http
            .get(FORECAST_URL)
            .query(&params)
            .send()
            .await
            .map_err(|e| EngineError::fetch(format!("Open-Meteo request failed: {e}")))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            EngineError::fetch(format!("failed to read Open-Meteo response body: {e}"))
        })?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(EngineError::RateLimitExceeded);
        }
        if status == StatusCode::BAD_REQUEST || status == StatusCode::NOT_FOUND {
            return Err(EngineError::LocationUnavailable);
        }
        if !status.is_success() {
            return Err(EngineError::fetch(format!(
                "Open-Meteo request failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| EngineError::fetch(format!("failed to parse Open-Meteo JSON: {e}")))
    }
}

impl Default for OpenMeteoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    utc_offset_seconds: i32,
    current: Option<OmCurrent>,
    hourly: Option<OmHourly>,
    daily: Option<OmDaily>,
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    time: i64,
    temperature_2m: f64,
    relative_humidity_2m: Option<f64>,
    precipitation: Option<f64>,
    weather_code: u8,
    wind_speed_10m: f64,
    wind_direction_10m: Option<f64>,
    uv_index: Option<f64>,
}

/// Column-major hourly series, one array per variable.
#[derive(Debug, Deserialize)]
struct OmHourly {
    time: Vec<i64>,
    temperature_2m: Vec<f64>,
    relative_humidity_2m: Option<Vec<f64>>,
    precipitation_probability: Option<Vec<f64>>,
    precipitation: Option<Vec<f64>>,
    weather_code: Vec<u8>,
    wind_speed_10m: Vec<f64>,
    wind_direction_10m: Option<Vec<f64>>,
    uv_index: Option<Vec<f64>>,
    visibility: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct OmDaily {
    time: Vec<i64>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    precipitation_probability_max: Option<Vec<f64>>,
    precipitation_sum: Option<Vec<f64>>,
    weather_code: Vec<u8>,
    wind_speed_10m_max: Vec<f64>,
    uv_index_max: Option<Vec<f64>>,
    sunrise: Vec<i64>,
    sunset: Vec<i64>,
}

fn column(col: &Option<Vec<f64>>, index: usize) -> Option<f64> {
    col.as_ref().and_then(|v| v.get(index)).copied()
}

/// WMO weather interpretation codes → descriptive labels the shared
/// condition table understands.
fn weather_code_label(code: u8) -> &'static str {
    match code {
        0 => "clear sky",
        1 => "mainly clear",
        2 => "partly cloudy",
        3 => "overcast",
        45 => "fog",
        48 => "depositing rime fog",
        51 => "light drizzle",
        53 => "moderate drizzle",
        55 => "dense drizzle",
        56 | 57 => "freezing drizzle",
        61 => "slight rain",
        63 => "moderate rain",
        65 => "heavy rain",
        66 | 67 => "freezing rain",
        71 => "slight snow",
        73 => "moderate snow",
        75 => "heavy snow",
        77 => "snow grains",
        80 | 81 => "slight rain showers",
        82 => "violent rain showers",
        85 | 86 => "snow showers",
        95 => "thunderstorm",
        96 => "thunderstorm with slight hail",
        99 => "thunderstorm with heavy hail",
        _ => "partly cloudy",
    }
}

fn snapshot_from(parsed: OmResponse) -> Result<ProviderSnapshot> {
    let current = parsed
        .current
        .ok_or_else(|| EngineError::fetch("Open-Meteo response contained no current block"))?;

    let (sunrise, sunset) = parsed
        .daily
        .as_ref()
        .map(|d| {
            (
                d.sunrise.first().copied().unwrap_or(0),
                d.sunset.first().copied().unwrap_or(0),
            )
        })
        .unwrap_or((0, 0));

    Ok(ProviderSnapshot {
        observed_at: current.time,
        temperature_c: current.temperature_2m,
        humidity_pct: current.relative_humidity_2m,
        wind_speed: current.wind_speed_10m,
        wind_deg: current.wind_direction_10m.unwrap_or(0.0),
        precipitation: current.precipitation.unwrap_or(0.0),
        condition: weather_code_label(current.weather_code).to_string(),
        // Visibility is only published hourly; the normalizer defaults it.
        visibility_m: None,
        uv_index: current.uv_index,
        sunrise,
        sunset,
        utc_offset_secs: parsed.utc_offset_seconds,
        units: ProviderUnits::METRIC_KMH,
    })
}

fn bundle_from(parsed: OmResponse) -> Result<ProviderForecastBundle> {
    let hourly_cols = parsed
        .hourly
        .ok_or_else(|| EngineError::forecast("Open-Meteo response contained no hourly data"))?;

    let hourly: Vec<ProviderHourlyPoint> = hourly_cols
        .time
        .iter()
        .enumerate()
        .map(|(i, &time)| ProviderHourlyPoint {
            time,
            temperature_c: hourly_cols.temperature_2m.get(i).copied().unwrap_or(0.0),
            humidity_pct: column(&hourly_cols.relative_humidity_2m, i),
            wind_speed: hourly_cols.wind_speed_10m.get(i).copied().unwrap_or(0.0),
            wind_deg: column(&hourly_cols.wind_direction_10m, i).unwrap_or(0.0),
            // Published as 0–100; the raw contract wants 0–1.
            precip_chance: column(&hourly_cols.precipitation_probability, i).unwrap_or(0.0) / 100.0,
            precipitation: column(&hourly_cols.precipitation, i).unwrap_or(0.0),
            condition: weather_code_label(hourly_cols.weather_code.get(i).copied().unwrap_or(2))
                .to_string(),
            uv_index: column(&hourly_cols.uv_index, i),
            visibility_m: column(&hourly_cols.visibility, i),
        })
        .collect();

    if hourly.is_empty() {
        return Err(EngineError::forecast(
            "Open-Meteo response contained an empty hourly series",
        ));
    }

    let daily: Vec<ProviderDailyPoint> = parsed
        .daily
        .map(|d| {
            d.time
                .iter()
                .enumerate()
                .map(|(i, &time)| ProviderDailyPoint {
                    time,
                    low_c: d.temperature_2m_min.get(i).copied().unwrap_or(0.0),
                    high_c: d.temperature_2m_max.get(i).copied().unwrap_or(0.0),
                    humidity_pct: None,
                    wind_speed: d.wind_speed_10m_max.get(i).copied().unwrap_or(0.0),
                    precip_chance: column(&d.precipitation_probability_max, i).unwrap_or(0.0)
                        / 100.0,
                    precipitation: column(&d.precipitation_sum, i).unwrap_or(0.0),
                    condition: weather_code_label(d.weather_code.get(i).copied().unwrap_or(2))
                        .to_string(),
                    uv_index: column(&d.uv_index_max, i),
                    sunrise: d.sunrise.get(i).copied().unwrap_or(0),
                    sunset: d.sunset.get(i).copied().unwrap_or(0),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(ProviderForecastBundle {
        hourly,
        daily,
        utc_offset_secs: parsed.utc_offset_seconds,
        units: ProviderUnits::METRIC_KMH,
    })
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn fetch_current(&self, coordinate: Coordinate) -> Result<ProviderSnapshot> {
        let parsed = self
            .fetch(
                coordinate,
                &[
                    ("current", CURRENT_FIELDS.to_string()),
                    ("daily", "sunrise,sunset".to_string()),
                    ("forecast_days", "1".to_string()),
                ],
            )
            .await?;
        snapshot_from(parsed)
    }

    async fn fetch_forecast(&self, coordinate: Coordinate) -> Result<ProviderForecastBundle> {
        let parsed = self
            .fetch(
                coordinate,
                &[
                    ("hourly", HOURLY_FIELDS.to_string()),
                    ("daily", DAILY_FIELDS.to_string()),
                    ("forecast_days", "7".to_string()),
                ],
            )
            .await?;
        bundle_from(parsed)
    }

    async fn fetch_alerts(&self, _coordinate: Coordinate) -> Result<Vec<ProviderAlert>> {
        // No alert product on this backend; absence of alerts is the safe
        // default the facade expects.
        Ok(Vec::new())
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snapshot_maps_current_block_and_daily_sun_times() {
        let parsed: OmResponse = serde_json::from_value(json!({
            "utc_offset_seconds": 7200,
            "current": {
                "time": 1_755_000_000,
                "temperature_2m": 21.0,
                "relative_humidity_2m": 40.0,
                "precipitation": 0.0,
                "weather_code": 1,
                "wind_speed_10m": 12.0,
                "wind_direction_10m": 310.0,
                "uv_index": 5.0
            },
            "daily": {
                "time": [1_754_960_000i64],
                "temperature_2m_max": [26.0],
                "temperature_2m_min": [14.0],
                "weather_code": [1],
                "wind_speed_10m_max": [18.0],
                "sunrise": [1_754_980_000i64],
                "sunset": [1_755_030_000i64]
            }
        }))
        .unwrap();

        let snapshot = snapshot_from(parsed).unwrap();

        assert_eq!(snapshot.condition, "mainly clear");
        assert_eq!(snapshot.wind_speed, 12.0);
        assert_eq!(snapshot.units, ProviderUnits::METRIC_KMH);
        assert_eq!(snapshot.sunrise, 1_754_980_000);
        assert_eq!(snapshot.visibility_m, None);
    }

    #[test]
    fn bundle_transposes_column_major_series() {
        let parsed: OmResponse = serde_json::from_value(json!({
            "utc_offset_seconds": 0,
            "hourly": {
                "time": [1_755_000_000i64, 1_755_003_600i64],
                "temperature_2m": [18.0, 19.5],
                "relative_humidity_2m": [60.0, 58.0],
                "precipitation_probability": [35.0, 10.0],
                "precipitation": [0.2, 0.0],
                "weather_code": [61, 0],
                "wind_speed_10m": [10.0, 8.0],
                "wind_direction_10m": [200.0, 210.0],
                "uv_index": [1.0, 2.0],
                "visibility": [20000.0, 24000.0]
            },
            "daily": {
                "time": [1_754_960_000i64],
                "temperature_2m_max": [26.0],
                "temperature_2m_min": [14.0],
                "precipitation_probability_max": [45.0],
                "precipitation_sum": [1.2],
                "weather_code": [61],
                "wind_speed_10m_max": [18.0],
                "uv_index_max": [6.0],
                "sunrise": [1_754_980_000i64],
                "sunset": [1_755_030_000i64]
            }
        }))
        .unwrap();

        let bundle = bundle_from(parsed).unwrap();

        assert_eq!(bundle.hourly.len(), 2);
        assert_eq!(bundle.hourly[0].condition, "slight rain");
        assert!((bundle.hourly[0].precip_chance - 0.35).abs() < 1e-9);
        assert_eq!(bundle.hourly[1].condition, "clear sky");
        assert_eq!(bundle.daily.len(), 1);
        assert!((bundle.daily[0].precip_chance - 0.45).abs() < 1e-9);
        assert_eq!(bundle.daily[0].sunset, 1_755_030_000);
    }

    #[test]
    fn missing_hourly_block_is_a_forecast_error() {
        let parsed: OmResponse =
            serde_json::from_value(json!({"utc_offset_seconds": 0})).unwrap();
        let err = bundle_from(parsed).unwrap_err();
        assert!(matches!(err, EngineError::ForecastFailed(_)));
    }

    #[test]
    fn unknown_weather_code_falls_back_to_partly_cloudy() {
        assert_eq!(weather_code_label(42), "partly cloudy");
    }
}
