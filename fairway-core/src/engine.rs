//! Engine facade: cache-check, fetch, normalize, cache, derive.
//!
//! The facade owns the two TTL cache instances (injected tunables, no
//! ambient globals) and a boxed provider. Cache state is only touched
//! before and after a provider call, never during it, so concurrent
//! unrelated queries are never blocked and a cancelled fetch simply never
//! reaches the cache write.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::alerts;
use crate::cache::{TtlCache, cache_key};
use crate::config::CacheSettings;
use crate::error::{EngineError, Result};
use crate::model::{
    Coordinate, DailyForecastPoint, HourlyForecastPoint, PlayabilityScore, TeeTimeWindow,
    WeatherAlert, WeatherConditions,
};
use crate::normalize;
use crate::provider::WeatherProvider;
use crate::score;
use crate::teetime;

/// Hourly points a provider fetch is normalized down to. A cached
/// full-length entry can serve any shorter hourly request by slicing.
pub const FULL_HOURLY_COUNT: usize = 24;
/// Daily points cached from every bundle fetch.
pub const FULL_DAILY_COUNT: usize = 7;

const OP_CURRENT: &str = "current";
const OP_HOURLY: &str = "hourly";
const OP_DAILY: &str = "daily";

/// Cached forecast views. Hourly and daily series share the forecast cache
/// under distinct operation prefixes; a payload of the wrong shape reads
/// as a miss.
#[derive(Debug, Clone)]
enum ForecastPayload {
    Hourly(Vec<HourlyForecastPoint>),
    Daily(Vec<DailyForecastPoint>),
}

fn conditions_size(_: &WeatherConditions) -> usize {
    std::mem::size_of::<WeatherConditions>()
}

fn payload_size(payload: &ForecastPayload) -> usize {
    match payload {
        ForecastPayload::Hourly(points) => {
            points.len() * std::mem::size_of::<HourlyForecastPoint>()
        }
        ForecastPayload::Daily(points) => points.len() * std::mem::size_of::<DailyForecastPoint>(),
    }
}

pub struct GolfWeatherEngine {
    provider: Box<dyn WeatherProvider>,
    current_cache: TtlCache<WeatherConditions>,
    forecast_cache: TtlCache<ForecastPayload>,
}

impl GolfWeatherEngine {
    pub fn new(provider: Box<dyn WeatherProvider>, settings: &CacheSettings) -> Self {
        Self {
            provider,
            current_cache: TtlCache::new(
                Duration::from_secs(settings.current_ttl_secs),
                settings.max_entries,
                settings.max_bytes,
                conditions_size,
            ),
            forecast_cache: TtlCache::new(
                Duration::from_secs(settings.forecast_ttl_secs),
                settings.max_entries,
                settings.max_bytes,
                payload_size,
            ),
        }
    }

    /// Current conditions, served from cache within the TTL.
    pub async fn get_current_weather(&self, coordinate: Coordinate) -> Result<WeatherConditions> {
        let key = cache_key(OP_CURRENT, coordinate, None);
        if let Some(conditions) = self.current_cache.get(&key) {
            debug!(%coordinate, "current conditions served from cache");
            return Ok(conditions);
        }

        let snapshot = self.provider.fetch_current(coordinate).await?;
        let conditions = normalize::conditions_from_snapshot(&snapshot);
        self.current_cache.put(key, conditions.clone());
        info!(%coordinate, condition = %conditions.condition, "fetched current conditions");
        Ok(conditions)
    }

    /// Cache-only read: never touches the provider.
    pub fn get_cached_weather(&self, coordinate: Coordinate) -> Option<WeatherConditions> {
        self.current_cache
            .get(&cache_key(OP_CURRENT, coordinate, None))
    }

    /// The next `hours` hourly forecast points.
    pub async fn get_hourly_forecast(
        &self,
        coordinate: Coordinate,
        hours: usize,
    ) -> Result<Vec<HourlyForecastPoint>> {
        let key = cache_key(OP_HOURLY, coordinate, Some(hours));
        if let Some(ForecastPayload::Hourly(points)) = self.forecast_cache.get(&key) {
            debug!(%coordinate, hours, "hourly forecast served from cache");
            return Ok(points);
        }

        // A full-length entry can serve a shorter request by slicing.
        if hours < FULL_HOURLY_COUNT {
            let full_key = cache_key(OP_HOURLY, coordinate, Some(FULL_HOURLY_COUNT));
            if let Some(ForecastPayload::Hourly(full)) = self.forecast_cache.get(&full_key) {
                debug!(%coordinate, hours, "hourly forecast sliced from full-length entry");
                let points: Vec<_> = full.into_iter().take(hours).collect();
                self.forecast_cache
                    .put(key, ForecastPayload::Hourly(points.clone()));
                return Ok(points);
            }
        }

        let (hourly, daily) = self.fetch_bundle(coordinate).await?;
        let points: Vec<_> = hourly.into_iter().take(hours).collect();
        self.forecast_cache
            .put(key, ForecastPayload::Hourly(points.clone()));
        self.store_full_daily(coordinate, daily);
        Ok(points)
    }

    /// The next `days` daily forecast summaries.
    pub async fn get_daily_forecast(
        &self,
        coordinate: Coordinate,
        days: usize,
    ) -> Result<Vec<DailyForecastPoint>> {
        let key = cache_key(OP_DAILY, coordinate, Some(days));
        if let Some(ForecastPayload::Daily(points)) = self.forecast_cache.get(&key) {
            debug!(%coordinate, days, "daily forecast served from cache");
            return Ok(points);
        }

        if days < FULL_DAILY_COUNT {
            let full_key = cache_key(OP_DAILY, coordinate, Some(FULL_DAILY_COUNT));
            if let Some(ForecastPayload::Daily(full)) = self.forecast_cache.get(&full_key) {
                debug!(%coordinate, days, "daily forecast sliced from full-length entry");
                let points: Vec<_> = full.into_iter().take(days).collect();
                self.forecast_cache
                    .put(key, ForecastPayload::Daily(points.clone()));
                return Ok(points);
            }
        }

        // A miss performs the same bundle fetch as the hourly path and
        // caches both views of the payload, so the common "fetch hourly,
        // then derive daily" sequence costs one provider call.
        let (hourly, daily) = self.fetch_bundle(coordinate).await?;
        let hourly_full: Vec<_> = hourly.into_iter().take(FULL_HOURLY_COUNT).collect();
        self.forecast_cache.put(
            cache_key(OP_HOURLY, coordinate, Some(FULL_HOURLY_COUNT)),
            ForecastPayload::Hourly(hourly_full),
        );
        let points: Vec<_> = daily.iter().take(days).cloned().collect();
        self.store_full_daily(coordinate, daily);
        self.forecast_cache
            .put(key, ForecastPayload::Daily(points.clone()));
        Ok(points)
    }

    /// Score the current conditions. Derived fresh on every call from the
    /// (possibly cached) snapshot.
    pub async fn get_playability_score(&self, coordinate: Coordinate) -> Result<PlayabilityScore> {
        let conditions = self.get_current_weather(coordinate).await?;
        Ok(score::score_conditions(coordinate, Utc::now(), &conditions))
    }

    /// Rank candidate tee-time windows on `date`, best first.
    pub async fn get_optimal_tee_times(
        &self,
        coordinate: Coordinate,
        date: NaiveDate,
    ) -> Result<Vec<TeeTimeWindow>> {
        let hourly = self
            .get_hourly_forecast(coordinate, FULL_HOURLY_COUNT)
            .await?;
        Ok(teetime::find_tee_times(
            &hourly,
            date,
            chrono::Duration::hours(teetime::DEFAULT_ROUND_HOURS),
            Utc::now(),
        ))
    }

    /// Active alerts, classified. Always fetched fresh; provider failure
    /// degrades to an empty list so a broken alert feed cannot block the
    /// rest of the surface.
    pub async fn get_alerts(&self, coordinate: Coordinate) -> Vec<WeatherAlert> {
        match self.provider.fetch_alerts(coordinate).await {
            Ok(raw) => raw.iter().map(alerts::classify).collect(),
            Err(err) => {
                warn!(%coordinate, %err, "alert fetch failed, reporting none");
                Vec::new()
            }
        }
    }

    /// Drop everything from both caches. Explicit administrative action.
    pub fn clear_cache(&self) {
        self.current_cache.clear();
        self.forecast_cache.clear();
        info!("weather caches cleared");
    }

    async fn fetch_bundle(
        &self,
        coordinate: Coordinate,
    ) -> Result<(Vec<HourlyForecastPoint>, Vec<DailyForecastPoint>)> {
        let bundle = self.provider.fetch_forecast(coordinate).await?;
        let hourly = normalize::hourly_points(&bundle);
        let daily = normalize::daily_points(&bundle);
        if hourly.is_empty() {
            return Err(EngineError::forecast("provider returned an empty hourly series"));
        }
        debug!(%coordinate, hours = hourly.len(), days = daily.len(), "fetched forecast bundle");
        Ok((hourly, daily))
    }

    fn store_full_daily(&self, coordinate: Coordinate, daily: Vec<DailyForecastPoint>) {
        let daily: Vec<_> = daily.into_iter().take(FULL_DAILY_COUNT).collect();
        self.forecast_cache.put(
            cache_key(OP_DAILY, coordinate, Some(FULL_DAILY_COUNT)),
            ForecastPayload::Daily(daily),
        );
    }
}
