//! Unit and vocabulary normalization.
//!
//! Pure mapping functions, no side effects, no I/O. Normalization never
//! fails: absent optional provider fields get documented defaults instead
//! of propagating errors.

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::model::{ConditionKind, DailyForecastPoint, HourlyForecastPoint, WeatherConditions};
use crate::provider::{ProviderForecastBundle, ProviderHourlyPoint, ProviderSnapshot, ProviderUnits};

/// Visibility assumed when the provider omits it. Inherited tuning value;
/// changing it changes scores.
pub const DEFAULT_VISIBILITY_MI: f64 = 10.0;
/// Humidity assumed when the provider omits it.
pub const DEFAULT_HUMIDITY_PCT: f64 = 50.0;

pub const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Provider condition vocabulary → engine `ConditionKind`. Exact match on
/// the lowercased description; anything unrecognized maps to
/// `PartlyCloudy`, a conservative default rather than an error.
const CONDITION_TABLE: &[(&str, ConditionKind)] = &[
    ("clear sky", ConditionKind::Sunny),
    ("clear", ConditionKind::Sunny),
    ("sunny", ConditionKind::Sunny),
    ("mainly clear", ConditionKind::Sunny),
    ("few clouds", ConditionKind::PartlyCloudy),
    ("scattered clouds", ConditionKind::PartlyCloudy),
    ("partly cloudy", ConditionKind::PartlyCloudy),
    ("broken clouds", ConditionKind::Overcast),
    ("overcast clouds", ConditionKind::Overcast),
    ("overcast", ConditionKind::Overcast),
    ("cloudy", ConditionKind::Overcast),
    ("drizzle", ConditionKind::Drizzle),
    ("light drizzle", ConditionKind::Drizzle),
    ("light intensity drizzle", ConditionKind::Drizzle),
    ("moderate drizzle", ConditionKind::Drizzle),
    ("dense drizzle", ConditionKind::Drizzle),
    ("heavy intensity drizzle", ConditionKind::Drizzle),
    ("freezing drizzle", ConditionKind::Drizzle),
    ("light rain", ConditionKind::LightRain),
    ("slight rain", ConditionKind::LightRain),
    ("moderate rain", ConditionKind::LightRain),
    ("shower rain", ConditionKind::LightRain),
    ("light intensity shower rain", ConditionKind::LightRain),
    ("slight rain showers", ConditionKind::LightRain),
    ("moderate rain showers", ConditionKind::LightRain),
    ("heavy rain", ConditionKind::HeavyRain),
    ("heavy intensity rain", ConditionKind::HeavyRain),
    ("very heavy rain", ConditionKind::HeavyRain),
    ("extreme rain", ConditionKind::HeavyRain),
    ("violent rain showers", ConditionKind::HeavyRain),
    ("freezing rain", ConditionKind::HeavyRain),
    ("thunderstorm", ConditionKind::Thunderstorm),
    ("thunderstorm with light rain", ConditionKind::Thunderstorm),
    ("thunderstorm with rain", ConditionKind::Thunderstorm),
    ("thunderstorm with heavy rain", ConditionKind::Thunderstorm),
    ("thunderstorm with slight hail", ConditionKind::Thunderstorm),
    ("thunderstorm with heavy hail", ConditionKind::Thunderstorm),
    ("mist", ConditionKind::Fog),
    ("fog", ConditionKind::Fog),
    ("haze", ConditionKind::Fog),
    ("smoke", ConditionKind::Fog),
    ("depositing rime fog", ConditionKind::Fog),
    ("snow", ConditionKind::Snow),
    ("light snow", ConditionKind::Snow),
    ("slight snow", ConditionKind::Snow),
    ("moderate snow", ConditionKind::Snow),
    ("heavy snow", ConditionKind::Snow),
    ("snow grains", ConditionKind::Snow),
    ("snow showers", ConditionKind::Snow),
    ("sleet", ConditionKind::Snow),
];

pub fn fahrenheit_from_celsius(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn miles_from_meters(meters: f64) -> f64 {
    meters / 1609.344
}

/// Nearest of the 16 compass labels. Periodic in 360: `deg` and
/// `deg + 360` give the same label.
pub fn wind_direction_label(degrees: f64) -> &'static str {
    let deg = degrees.rem_euclid(360.0);
    let sector = (deg / 22.5).round() as usize % 16;
    COMPASS_POINTS[sector]
}

pub fn condition_from_provider(raw: &str) -> ConditionKind {
    let needle = raw.trim().to_lowercase();
    CONDITION_TABLE
        .iter()
        .find(|(label, _)| *label == needle)
        .map(|(_, kind)| *kind)
        .unwrap_or(ConditionKind::PartlyCloudy)
}

/// The location's fixed UTC offset; out-of-range values fall back to UTC.
pub fn location_offset(utc_offset_secs: i32) -> FixedOffset {
    FixedOffset::east_opt(utc_offset_secs).unwrap_or_else(|| Utc.fix())
}

fn uv_from_provider(raw: Option<f64>) -> u8 {
    raw.map(|v| v.round().max(0.0) as u8).unwrap_or(0)
}

fn local_time_of_day(unix: i64, offset: FixedOffset) -> String {
    match DateTime::<Utc>::from_timestamp(unix, 0) {
        Some(dt) => dt.with_timezone(&offset).format("%H:%M").to_string(),
        None => String::new(),
    }
}

fn wind_mph(speed: f64, units: ProviderUnits) -> f64 {
    speed * units.wind_to_mph
}

fn precip_inches(amount: f64, units: ProviderUnits) -> f64 {
    amount * units.precip_to_inches
}

pub fn conditions_from_snapshot(snapshot: &ProviderSnapshot) -> WeatherConditions {
    let offset = location_offset(snapshot.utc_offset_secs);
    WeatherConditions {
        temperature_f: fahrenheit_from_celsius(snapshot.temperature_c),
        humidity_pct: snapshot.humidity_pct.unwrap_or(DEFAULT_HUMIDITY_PCT),
        wind_speed_mph: wind_mph(snapshot.wind_speed, snapshot.units),
        wind_direction: wind_direction_label(snapshot.wind_deg).to_string(),
        precipitation_in: precip_inches(snapshot.precipitation, snapshot.units),
        condition: condition_from_provider(&snapshot.condition),
        visibility_mi: snapshot
            .visibility_m
            .map(miles_from_meters)
            .unwrap_or(DEFAULT_VISIBILITY_MI),
        uv_index: uv_from_provider(snapshot.uv_index),
        sunrise: local_time_of_day(snapshot.sunrise, offset),
        sunset: local_time_of_day(snapshot.sunset, offset),
    }
}

/// Normalize the hourly series of a bundle, chronological order preserved.
/// Steps with an unrepresentable timestamp are dropped.
pub fn hourly_points(bundle: &ProviderForecastBundle) -> Vec<HourlyForecastPoint> {
    let offset = location_offset(bundle.utc_offset_secs);
    bundle
        .hourly
        .iter()
        .filter_map(|raw| hourly_point(raw, offset, bundle.units))
        .collect()
}

fn hourly_point(
    raw: &ProviderHourlyPoint,
    offset: FixedOffset,
    units: ProviderUnits,
) -> Option<HourlyForecastPoint> {
    let time = DateTime::<Utc>::from_timestamp(raw.time, 0)?.with_timezone(&offset);
    Some(HourlyForecastPoint {
        time,
        temperature_f: fahrenheit_from_celsius(raw.temperature_c),
        humidity_pct: raw.humidity_pct.unwrap_or(DEFAULT_HUMIDITY_PCT),
        wind_speed_mph: wind_mph(raw.wind_speed, units),
        wind_direction: wind_direction_label(raw.wind_deg).to_string(),
        precip_chance_pct: (raw.precip_chance * 100.0).clamp(0.0, 100.0),
        precipitation_in: precip_inches(raw.precipitation, units),
        condition: condition_from_provider(&raw.condition),
        uv_index: uv_from_provider(raw.uv_index),
        visibility_mi: raw
            .visibility_m
            .map(miles_from_meters)
            .unwrap_or(DEFAULT_VISIBILITY_MI),
    })
}

/// Normalize the daily series of a bundle.
pub fn daily_points(bundle: &ProviderForecastBundle) -> Vec<DailyForecastPoint> {
    let offset = location_offset(bundle.utc_offset_secs);
    bundle
        .daily
        .iter()
        .filter_map(|raw| {
            let date = DateTime::<Utc>::from_timestamp(raw.time, 0)?
                .with_timezone(&offset)
                .date_naive();
            Some(DailyForecastPoint {
                date,
                high_f: fahrenheit_from_celsius(raw.high_c),
                low_f: fahrenheit_from_celsius(raw.low_c),
                humidity_pct: raw.humidity_pct.unwrap_or(DEFAULT_HUMIDITY_PCT),
                wind_speed_mph: wind_mph(raw.wind_speed, bundle.units),
                precip_chance_pct: (raw.precip_chance * 100.0).clamp(0.0, 100.0),
                precipitation_in: precip_inches(raw.precipitation, bundle.units),
                condition: condition_from_provider(&raw.condition),
                uv_index: uv_from_provider(raw.uv_index),
                sunrise: local_time_of_day(raw.sunrise, offset),
                sunset: local_time_of_day(raw.sunset, offset),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> ProviderSnapshot {
        ProviderSnapshot {
            observed_at: 1_755_000_000,
            temperature_c: 20.0,
            humidity_pct: Some(55.0),
            wind_speed: 5.0,
            wind_deg: 90.0,
            precipitation: 2.54,
            condition: "clear sky".to_string(),
            visibility_m: Some(16_093.44),
            uv_index: Some(4.2),
            sunrise: 1_755_000_000,
            sunset: 1_755_040_000,
            utc_offset_secs: 0,
            units: ProviderUnits::SI,
        }
    }

    #[test]
    fn wind_direction_is_periodic() {
        for deg in [0.0, 45.0, 123.0, 270.0, 359.0] {
            assert_eq!(wind_direction_label(deg), wind_direction_label(deg + 360.0));
        }
    }

    #[test]
    fn north_sector_spans_the_wraparound() {
        assert_eq!(wind_direction_label(0.0), "N");
        assert_eq!(wind_direction_label(360.0), "N");
        assert_eq!(wind_direction_label(11.0), "N");
        assert_eq!(wind_direction_label(349.0), "N");
        assert_eq!(wind_direction_label(348.8), "N");
    }

    #[test]
    fn cardinal_and_intercardinal_labels() {
        assert_eq!(wind_direction_label(90.0), "E");
        assert_eq!(wind_direction_label(180.0), "S");
        assert_eq!(wind_direction_label(225.0), "SW");
        assert_eq!(wind_direction_label(67.5), "ENE");
        assert_eq!(wind_direction_label(-90.0), "W");
    }

    #[test]
    fn condition_table_covers_both_provider_vocabularies() {
        assert_eq!(condition_from_provider("clear sky"), ConditionKind::Sunny);
        assert_eq!(condition_from_provider("Mainly Clear"), ConditionKind::Sunny);
        assert_eq!(
            condition_from_provider("scattered clouds"),
            ConditionKind::PartlyCloudy
        );
        assert_eq!(
            condition_from_provider("overcast clouds"),
            ConditionKind::Overcast
        );
        assert_eq!(
            condition_from_provider("light rain"),
            ConditionKind::LightRain
        );
        assert_eq!(
            condition_from_provider("heavy intensity rain"),
            ConditionKind::HeavyRain
        );
        assert_eq!(
            condition_from_provider("thunderstorm"),
            ConditionKind::Thunderstorm
        );
        assert_eq!(
            condition_from_provider("thunderstorm with heavy hail"),
            ConditionKind::Thunderstorm
        );
        assert_eq!(condition_from_provider("mist"), ConditionKind::Fog);
        assert_eq!(condition_from_provider("snow grains"), ConditionKind::Snow);
    }

    #[test]
    fn unrecognized_condition_defaults_to_partly_cloudy() {
        assert_eq!(
            condition_from_provider("volcanic ash"),
            ConditionKind::PartlyCloudy
        );
        assert_eq!(condition_from_provider(""), ConditionKind::PartlyCloudy);
    }

    #[test]
    fn unit_conversions() {
        assert!((fahrenheit_from_celsius(20.0) - 68.0).abs() < 1e-9);
        assert!((fahrenheit_from_celsius(-40.0) + 40.0).abs() < 1e-9);
        assert!((miles_from_meters(1609.344) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn snapshot_converts_si_units() {
        let conditions = conditions_from_snapshot(&snapshot());

        assert!((conditions.temperature_f - 68.0).abs() < 1e-9);
        // 5 m/s ≈ 11.18 mph
        assert!((conditions.wind_speed_mph - 11.1847).abs() < 1e-3);
        assert_eq!(conditions.wind_direction, "E");
        // 2.54 mm = 0.1 in
        assert!((conditions.precipitation_in - 0.1).abs() < 1e-4);
        assert!((conditions.visibility_mi - 10.0).abs() < 1e-6);
        assert_eq!(conditions.uv_index, 4);
        assert_eq!(conditions.condition, ConditionKind::Sunny);
    }

    #[test]
    fn missing_optionals_get_documented_defaults() {
        let mut raw = snapshot();
        raw.humidity_pct = None;
        raw.visibility_m = None;
        raw.uv_index = None;

        let conditions = conditions_from_snapshot(&raw);

        assert_eq!(conditions.humidity_pct, DEFAULT_HUMIDITY_PCT);
        assert_eq!(conditions.visibility_mi, DEFAULT_VISIBILITY_MI);
        assert_eq!(conditions.uv_index, 0);
    }

    #[test]
    fn kmh_units_convert_through_the_same_path() {
        let mut raw = snapshot();
        raw.units = ProviderUnits::METRIC_KMH;
        raw.wind_speed = 10.0;

        let conditions = conditions_from_snapshot(&raw);

        // 10 km/h ≈ 6.21 mph
        assert!((conditions.wind_speed_mph - 6.213_71).abs() < 1e-4);
    }

    #[test]
    fn hourly_points_carry_local_offset_and_percent_chance() {
        let bundle = ProviderForecastBundle {
            hourly: vec![ProviderHourlyPoint {
                time: 1_755_000_000,
                temperature_c: 15.0,
                humidity_pct: None,
                wind_speed: 3.0,
                wind_deg: 200.0,
                precip_chance: 0.35,
                precipitation: 0.0,
                condition: "light rain".to_string(),
                uv_index: Some(2.0),
                visibility_m: None,
            }],
            daily: Vec::new(),
            utc_offset_secs: 7200,
            units: ProviderUnits::SI,
        };

        let points = hourly_points(&bundle);

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].time.offset().local_minus_utc(), 7200);
        assert!((points[0].precip_chance_pct - 35.0).abs() < 1e-9);
        assert_eq!(points[0].condition, ConditionKind::LightRain);
        assert_eq!(points[0].humidity_pct, DEFAULT_HUMIDITY_PCT);
    }

    #[test]
    fn sunrise_formats_as_local_time_of_day() {
        let mut raw = snapshot();
        // 12:00:00 UTC exactly
        raw.sunrise = 1_755_000_000;
        raw.utc_offset_secs = 3600;

        let conditions = conditions_from_snapshot(&raw);

        assert_eq!(conditions.sunrise, "13:00");
    }
}
