//! Playability scoring.
//!
//! Two variants share the same weighting. The six-factor averaged scorer
//! grades an observed snapshot; the additive penalty scorer grades
//! probabilistic inputs (hourly points and aggregated tee-time windows),
//! which carry a precipitation *chance* rather than an observed condition
//! and so must be penalized probabilistically.

use chrono::{DateTime, Utc};

use crate::model::{
    ConditionKind, Coordinate, FactorScores, HourlyForecastPoint, PlayabilityScore,
    Recommendation, WeatherConditions,
};

// Condition-keyed tables, indexed by `ConditionKind::table_index`.
const PRECIPITATION_SCORES: [u8; 9] = [10, 10, 8, 4, 2, 0, 0, 6, 0];
const CONDITION_SCORES: [u8; 9] = [10, 9, 7, 4, 2, 0, 0, 5, 0];
const CONDITION_PENALTIES: [i32; 9] = [0, 0, 1, 3, 3, 6, 6, 2, 6];

pub fn temperature_score(temperature_f: f64) -> u8 {
    if (65.0..=80.0).contains(&temperature_f) {
        10
    } else if (55.0..=90.0).contains(&temperature_f) {
        8
    } else if (45.0..=95.0).contains(&temperature_f) {
        6
    } else if (35.0..=100.0).contains(&temperature_f) {
        4
    } else {
        2
    }
}

pub fn wind_score(wind_mph: f64) -> u8 {
    if wind_mph <= 5.0 {
        10
    } else if wind_mph <= 10.0 {
        8
    } else if wind_mph <= 15.0 {
        6
    } else if wind_mph <= 25.0 {
        4
    } else {
        2
    }
}

/// Precipitation factor graded by observed condition kind, not raw amount.
pub fn precipitation_score(condition: ConditionKind) -> u8 {
    PRECIPITATION_SCORES[condition.table_index()]
}

pub fn visibility_score(visibility_mi: f64) -> u8 {
    if visibility_mi >= 10.0 {
        10
    } else if visibility_mi >= 5.0 {
        8
    } else if visibility_mi >= 2.0 {
        6
    } else if visibility_mi >= 1.0 {
        4
    } else {
        2
    }
}

pub fn uv_score(uv_index: u8) -> u8 {
    match uv_index {
        0..=2 => 10,
        3..=5 => 9,
        6..=7 => 7,
        8..=10 => 5,
        _ => 3,
    }
}

pub fn condition_score(condition: ConditionKind) -> u8 {
    CONDITION_SCORES[condition.table_index()]
}

/// Grade an observed snapshot: six 0–10 factors averaged with integer
/// truncation (not rounding).
pub fn score_conditions(
    coordinate: Coordinate,
    computed_at: DateTime<Utc>,
    conditions: &WeatherConditions,
) -> PlayabilityScore {
    let factors = FactorScores {
        temperature: temperature_score(conditions.temperature_f),
        wind: wind_score(conditions.wind_speed_mph),
        precipitation: precipitation_score(conditions.condition),
        visibility: visibility_score(conditions.visibility_mi),
        uv: uv_score(conditions.uv_index),
        condition: condition_score(conditions.condition),
    };
    let overall = (factors.sum() / 6) as u8;

    PlayabilityScore {
        coordinate,
        computed_at,
        overall,
        factors,
        conditions: conditions.clone(),
        recommendation: Recommendation::from_score(overall),
    }
}

/// Penalty-subtraction scorer for probabilistic inputs, clamped to 0–10.
pub fn additive_score(
    temperature_f: f64,
    wind_mph: f64,
    precip_chance_pct: f64,
    condition: ConditionKind,
) -> u8 {
    let mut score: i32 = 10;
    score -= temperature_penalty(temperature_f);
    score -= wind_penalty(wind_mph);
    score -= precip_chance_penalty(precip_chance_pct);
    score -= CONDITION_PENALTIES[condition.table_index()];
    score.clamp(0, 10) as u8
}

pub(crate) fn temperature_penalty(temperature_f: f64) -> i32 {
    if !(32.0..=95.0).contains(&temperature_f) {
        4
    } else if !(45.0..=90.0).contains(&temperature_f) {
        2
    } else {
        0
    }
}

fn wind_penalty(wind_mph: f64) -> i32 {
    if wind_mph > 25.0 {
        4
    } else if wind_mph > 15.0 {
        2
    } else {
        0
    }
}

fn precip_chance_penalty(precip_chance_pct: f64) -> i32 {
    if precip_chance_pct >= 70.0 {
        5
    } else if precip_chance_pct >= 40.0 {
        3
    } else if precip_chance_pct >= 20.0 {
        1
    } else {
        0
    }
}

impl HourlyForecastPoint {
    /// Derived on demand rather than stored on the record.
    pub fn playability_score(&self) -> u8 {
        additive_score(
            self.temperature_f,
            self.wind_speed_mph,
            self.precip_chance_pct,
            self.condition,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conditions(temperature_f: f64, wind_mph: f64, condition: ConditionKind) -> WeatherConditions {
        WeatherConditions {
            temperature_f,
            humidity_pct: 50.0,
            wind_speed_mph: wind_mph,
            wind_direction: "N".to_string(),
            precipitation_in: 0.0,
            condition,
            visibility_mi: 10.0,
            uv_index: 4,
            sunrise: "06:12".to_string(),
            sunset: "20:41".to_string(),
        }
    }

    #[test]
    fn mild_sunny_day_scores_excellent() {
        let coord = Coordinate::new(40.0, -105.0);
        let score = score_conditions(coord, Utc::now(), &conditions(72.0, 8.0, ConditionKind::Sunny));

        assert_eq!(score.factors.temperature, 10);
        assert_eq!(score.factors.wind, 8);
        assert_eq!(score.factors.precipitation, 10);
        assert_eq!(score.factors.visibility, 10);
        assert_eq!(score.factors.uv, 9);
        assert_eq!(score.factors.condition, 10);
        assert_eq!(score.overall, 9);
        assert_eq!(score.recommendation, Recommendation::Excellent);
    }

    #[test]
    fn overall_is_truncated_mean_of_six_factors() {
        // 10+8+8+8+9+7 = 50, 50/6 = 8.33, truncates to 8.
        let mut snapshot = conditions(72.0, 8.0, ConditionKind::Overcast);
        snapshot.visibility_mi = 6.0;
        let score = score_conditions(Coordinate::new(0.0, 0.0), Utc::now(), &snapshot);

        assert_eq!(score.factors.sum(), 50);
        assert_eq!(score.overall, 8);
    }

    #[test]
    fn factor_outputs_stay_in_range() {
        for temp in [-60.0, -10.0, 20.0, 50.0, 72.0, 98.0, 130.0] {
            assert!(temperature_score(temp) <= 10);
        }
        for wind in [0.0, 4.0, 9.0, 14.0, 20.0, 60.0] {
            assert!(wind_score(wind) <= 10);
        }
        for vis in [0.0, 0.5, 1.5, 3.0, 7.0, 25.0] {
            assert!(visibility_score(vis) <= 10);
        }
        for uv in 0..=15 {
            assert!(uv_score(uv) <= 10);
        }
        for kind in ConditionKind::ALL {
            assert!(precipitation_score(kind) <= 10);
            assert!(condition_score(kind) <= 10);
        }
    }

    #[test]
    fn threshold_boundaries() {
        assert_eq!(temperature_score(65.0), 10);
        assert_eq!(temperature_score(80.0), 10);
        assert_eq!(temperature_score(80.5), 8);
        assert_eq!(temperature_score(34.9), 2);
        assert_eq!(wind_score(5.0), 10);
        assert_eq!(wind_score(25.0), 4);
        assert_eq!(wind_score(25.1), 2);
        assert_eq!(visibility_score(10.0), 10);
        assert_eq!(visibility_score(0.9), 2);
        assert_eq!(uv_score(2), 10);
        assert_eq!(uv_score(11), 3);
    }

    #[test]
    fn additive_scorer_clamps_at_zero() {
        // 10 - 4 (98°F) - 4 (30 mph) - 5 (80%) - 6 (thunderstorm) = -9.
        let score = additive_score(98.0, 30.0, 80.0, ConditionKind::Thunderstorm);
        assert_eq!(score, 0);
    }

    #[test]
    fn additive_scorer_perfect_hour() {
        assert_eq!(additive_score(70.0, 4.0, 5.0, ConditionKind::Sunny), 10);
    }

    #[test]
    fn additive_scorer_partial_penalties() {
        // 10 - 2 (43°F) - 2 (18 mph) - 1 (25%) - 1 (overcast) = 4.
        assert_eq!(additive_score(43.0, 18.0, 25.0, ConditionKind::Overcast), 4);
        // 10 - 3 (55%) - 3 (light rain) = 4.
        assert_eq!(additive_score(70.0, 5.0, 55.0, ConditionKind::LightRain), 4);
    }

    #[test]
    fn hourly_point_score_matches_additive_scorer() {
        let point = HourlyForecastPoint {
            time: chrono::DateTime::parse_from_rfc3339("2025-08-12T09:00:00+00:00").unwrap(),
            temperature_f: 70.0,
            humidity_pct: 50.0,
            wind_speed_mph: 4.0,
            wind_direction: "N".to_string(),
            precip_chance_pct: 5.0,
            precipitation_in: 0.0,
            condition: ConditionKind::Sunny,
            uv_index: 3,
            visibility_mi: 10.0,
        };
        assert_eq!(point.playability_score(), 10);
    }

    #[test]
    fn recommendation_tiers() {
        assert_eq!(Recommendation::from_score(10), Recommendation::Excellent);
        assert_eq!(Recommendation::from_score(9), Recommendation::Excellent);
        assert_eq!(Recommendation::from_score(8), Recommendation::Good);
        assert_eq!(Recommendation::from_score(7), Recommendation::Good);
        assert_eq!(Recommendation::from_score(6), Recommendation::Fair);
        assert_eq!(Recommendation::from_score(5), Recommendation::Fair);
        assert_eq!(Recommendation::from_score(4), Recommendation::Poor);
        assert_eq!(Recommendation::from_score(3), Recommendation::Poor);
        assert_eq!(Recommendation::from_score(2), Recommendation::Dangerous);
        assert_eq!(Recommendation::from_score(0), Recommendation::Dangerous);
    }
}
