//! Tee-time window search over an hourly forecast.
//!
//! Candidate round starts are enumerated across the playable part of the
//! day, each window is aggregated and scored with the additive scorer, and
//! the candidates come back ranked best-first.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};

use crate::model::{ConditionKind, DailyForecastPoint, HourlyForecastPoint, TeeTimeWindow};
use crate::score;

/// Default length of a round, in hours.
pub const DEFAULT_ROUND_HOURS: i64 = 4;

/// Earliest and latest considered start hours, local time.
const FIRST_TEE_HOUR: u32 = 6;
const LAST_TEE_HOUR: u32 = 19;

/// Candidate start hours for the coarse daily estimate.
const DAILY_CANDIDATE_HOURS: [u32; 7] = [7, 8, 9, 10, 16, 17, 18];

/// Enumerate, score and rank candidate tee-time windows on `date`.
///
/// Candidates whose start has already passed or whose span has no forecast
/// coverage are skipped; when nothing remains the result is simply empty.
/// Equal scores keep chronological order.
pub fn find_tee_times(
    hourly: &[HourlyForecastPoint],
    date: NaiveDate,
    round_duration: Duration,
    now: DateTime<Utc>,
) -> Vec<TeeTimeWindow> {
    let Some(first) = hourly.first() else {
        return Vec::new();
    };
    let offset = *first.time.offset();
    let now_local = now.with_timezone(&offset);

    let mut windows = Vec::new();
    for hour in FIRST_TEE_HOUR..=LAST_TEE_HOUR {
        let Some(start) = local_start(date, hour, offset) else {
            continue;
        };
        if start < now_local {
            continue;
        }
        let end = start + round_duration;
        let in_window: Vec<&HourlyForecastPoint> = hourly
            .iter()
            .filter(|p| p.time >= start && p.time <= end)
            .collect();
        if let Some(window) = build_window(start, end, &in_window) {
            windows.push(window);
        }
    }

    // `sort_by` is stable, so ties stay in tee-off order.
    windows.sort_by(|a, b| b.score.cmp(&a.score));
    windows
}

fn local_start(date: NaiveDate, hour: u32, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    date.and_hms_opt(hour, 0, 0)?
        .and_local_timezone(offset)
        .single()
}

fn build_window(
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    points: &[&HourlyForecastPoint],
) -> Option<TeeTimeWindow> {
    let avg_temperature_f =
        points.iter().map(|p| p.temperature_f).sum::<f64>() / points.len() as f64;
    // Golfers care about the worst moment, not the average.
    let max_wind_mph = points
        .iter()
        .map(|p| p.wind_speed_mph)
        .fold(f64::MIN, f64::max);
    let max_precip_chance_pct = points
        .iter()
        .map(|p| p.precip_chance_pct)
        .fold(f64::MIN, f64::max);
    // A single severe hour dominates the window's condition.
    let worst = points.iter().min_by_key(|p| p.playability_score())?;

    let score = score::additive_score(
        avg_temperature_f,
        max_wind_mph,
        max_precip_chance_pct,
        worst.condition,
    );

    Some(TeeTimeWindow {
        starts_at: start,
        ends_at: end,
        score,
        avg_temperature_f,
        max_wind_mph,
        max_precip_chance_pct,
        worst_condition: worst.condition,
        recommendation: window_recommendation(
            score,
            avg_temperature_f,
            max_wind_mph,
            max_precip_chance_pct,
        ),
    })
}

fn window_recommendation(
    score: u8,
    avg_temperature_f: f64,
    max_wind_mph: f64,
    max_precip_chance_pct: f64,
) -> String {
    match score {
        9..=10 => "Perfect conditions for golf".to_string(),
        7..=8 => "Great day for a round".to_string(),
        5..=6 => {
            if max_precip_chance_pct >= 40.0 {
                "Playable, but pack rain gear".to_string()
            } else if max_wind_mph > 15.0 {
                "Playable, but expect a breezy round".to_string()
            } else if avg_temperature_f < 50.0 {
                "Playable, but dress warm".to_string()
            } else {
                "Decent conditions for a round".to_string()
            }
        }
        3..=4 => "Tough conditions; consider another day".to_string(),
        _ => "Not a day for golf".to_string(),
    }
}

impl DailyForecastPoint {
    /// Coarse pass/fail sweep over fixed candidate hours using only this
    /// day's summary. Deliberately rougher than the hourly window search:
    /// the hour temperature is interpolated between the day's low and high.
    pub fn optimal_golf_hours(&self) -> Vec<u32> {
        DAILY_CANDIDATE_HOURS
            .iter()
            .copied()
            .filter(|&hour| daily_hour_score(self, hour) >= 6)
            .collect()
    }
}

fn daily_hour_score(day: &DailyForecastPoint, hour: u32) -> i32 {
    let temperature = estimate_hour_temperature(day.low_f, day.high_f, hour);
    let mut score = 10 - score::temperature_penalty(temperature);
    if day.precip_chance_pct > 50.0 {
        score -= 3;
    }
    if day.wind_speed_mph > 20.0 {
        score -= 2;
    }
    score
}

/// Linear estimate anchored at the low around 06:00 and the high at 15:00.
fn estimate_hour_temperature(low_f: f64, high_f: f64, hour: u32) -> f64 {
    let distance = (f64::from(hour) - 15.0).abs() / 9.0;
    low_f + (high_f - low_f) * (1.0 - distance.min(1.0))
}
