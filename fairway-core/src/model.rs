use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A geographic point, latitude/longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Rounded fragment used when composing cache keys. Two queries within
    /// ~11 m of each other share cache entries.
    pub fn key_fragment(&self) -> String {
        format!("{:.4}_{:.4}", self.latitude, self.longitude)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Closed set of weather-condition categories used for scoring and display.
///
/// The discriminant order is load-bearing: the scoring tables are const
/// arrays indexed by it. Append new kinds at the end and extend every table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionKind {
    Sunny,
    PartlyCloudy,
    Overcast,
    Drizzle,
    LightRain,
    HeavyRain,
    Thunderstorm,
    Fog,
    Snow,
}

impl ConditionKind {
    pub const ALL: [ConditionKind; 9] = [
        ConditionKind::Sunny,
        ConditionKind::PartlyCloudy,
        ConditionKind::Overcast,
        ConditionKind::Drizzle,
        ConditionKind::LightRain,
        ConditionKind::HeavyRain,
        ConditionKind::Thunderstorm,
        ConditionKind::Fog,
        ConditionKind::Snow,
    ];

    pub(crate) const fn table_index(self) -> usize {
        self as usize
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConditionKind::Sunny => "sunny",
            ConditionKind::PartlyCloudy => "partly cloudy",
            ConditionKind::Overcast => "overcast",
            ConditionKind::Drizzle => "drizzle",
            ConditionKind::LightRain => "light rain",
            ConditionKind::HeavyRain => "heavy rain",
            ConditionKind::Thunderstorm => "thunderstorm",
            ConditionKind::Fog => "fog",
            ConditionKind::Snow => "snow",
        }
    }
}

impl std::fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Point-in-time snapshot of observed conditions, already normalized to the
/// engine's canonical units (°F, mph, inches, miles).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherConditions {
    pub temperature_f: f64,
    pub humidity_pct: f64,
    pub wind_speed_mph: f64,
    /// One of the 16 compass labels ("N", "NNE", ...).
    pub wind_direction: String,
    pub precipitation_in: f64,
    pub condition: ConditionKind,
    pub visibility_mi: f64,
    pub uv_index: u8,
    /// Local time of day, "HH:MM".
    pub sunrise: String,
    pub sunset: String,
}

/// One hour of forecast, timestamped in the location's local offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecastPoint {
    pub time: DateTime<FixedOffset>,
    pub temperature_f: f64,
    pub humidity_pct: f64,
    pub wind_speed_mph: f64,
    pub wind_direction: String,
    /// Probability of precipitation, 0–100.
    pub precip_chance_pct: f64,
    pub precipitation_in: f64,
    pub condition: ConditionKind,
    pub uv_index: u8,
    pub visibility_mi: f64,
}

/// One day of forecast summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecastPoint {
    pub date: NaiveDate,
    pub high_f: f64,
    pub low_f: f64,
    pub humidity_pct: f64,
    pub wind_speed_mph: f64,
    pub precip_chance_pct: f64,
    pub precipitation_in: f64,
    pub condition: ConditionKind,
    pub uv_index: u8,
    pub sunrise: String,
    pub sunset: String,
}

/// Recommendation tier derived from an overall playability score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Excellent,
    Good,
    Fair,
    Poor,
    Dangerous,
}

impl Recommendation {
    pub fn from_score(score: u8) -> Self {
        match score {
            9..=10 => Recommendation::Excellent,
            7..=8 => Recommendation::Good,
            5..=6 => Recommendation::Fair,
            3..=4 => Recommendation::Poor,
            _ => Recommendation::Dangerous,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::Excellent => "excellent",
            Recommendation::Good => "good",
            Recommendation::Fair => "fair",
            Recommendation::Poor => "poor",
            Recommendation::Dangerous => "dangerous",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The six 0–10 sub-factor scores behind an overall playability score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorScores {
    pub temperature: u8,
    pub wind: u8,
    pub precipitation: u8,
    pub visibility: u8,
    pub uv: u8,
    pub condition: u8,
}

impl FactorScores {
    pub fn sum(&self) -> u32 {
        u32::from(self.temperature)
            + u32::from(self.wind)
            + u32::from(self.precipitation)
            + u32::from(self.visibility)
            + u32::from(self.uv)
            + u32::from(self.condition)
    }
}

/// Overall playability assessment of a conditions snapshot. Cheap to
/// recompute, so it is derived fresh on every query rather than cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayabilityScore {
    pub coordinate: Coordinate,
    pub computed_at: DateTime<Utc>,
    /// Integer-truncated mean of the six factor scores, 0–10.
    pub overall: u8,
    pub factors: FactorScores,
    pub conditions: WeatherConditions,
    pub recommendation: Recommendation,
}

/// A candidate round of golf, scored and ranked by the window search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeeTimeWindow {
    pub starts_at: DateTime<FixedOffset>,
    pub ends_at: DateTime<FixedOffset>,
    pub score: u8,
    pub avg_temperature_f: f64,
    pub max_wind_mph: f64,
    pub max_precip_chance_pct: f64,
    /// Condition of the single worst-scoring hour in the window.
    pub worst_condition: ConditionKind,
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Minor,
    Moderate,
    Severe,
    Extreme,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AlertSeverity::Minor => "minor",
            AlertSeverity::Moderate => "moderate",
            AlertSeverity::Severe => "severe",
            AlertSeverity::Extreme => "extreme",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GolfImpact {
    Minimal,
    Moderate,
    Significant,
    Prohibitive,
}

impl std::fmt::Display for GolfImpact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            GolfImpact::Minimal => "minimal",
            GolfImpact::Moderate => "moderate",
            GolfImpact::Significant => "significant",
            GolfImpact::Prohibitive => "prohibitive",
        };
        f.write_str(label)
    }
}

/// An active weather alert with its golf-specific impact tier. Never cached:
/// alerts must always reflect the provider's latest state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAlert {
    pub title: String,
    pub description: String,
    pub severity: AlertSeverity,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub golf_impact: GolfImpact,
}
