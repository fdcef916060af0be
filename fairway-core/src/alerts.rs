//! Best-effort classification of provider alerts.
//!
//! Severity is a pass-through of the provider's four-value vocabulary; an
//! unrecognized value becomes `Moderate` so an alert is never silently
//! dropped. The golf-impact tier comes from a case-insensitive keyword
//! search over the alert text. It is a heuristic and can misjudge unusual
//! phrasings; that is accepted, not treated as an error.

use chrono::{DateTime, Utc};

use crate::model::{AlertSeverity, GolfImpact, WeatherAlert};
use crate::provider::ProviderAlert;

// Checked in tier order, worst first, so "severe thunderstorm" wins over
// the bare "storm" match below it.
const PROHIBITIVE_KEYWORDS: [&str; 3] = ["tornado", "hurricane", "severe thunderstorm"];
const SIGNIFICANT_KEYWORDS: [&str; 3] = ["flood", "high wind", "storm"];
const MODERATE_KEYWORDS: [&str; 3] = ["rain", "snow", "fog"];

pub fn severity_from_provider(raw: &str) -> AlertSeverity {
    match raw.trim().to_lowercase().as_str() {
        "minor" => AlertSeverity::Minor,
        "moderate" => AlertSeverity::Moderate,
        "severe" => AlertSeverity::Severe,
        "extreme" => AlertSeverity::Extreme,
        _ => AlertSeverity::Moderate,
    }
}

pub fn impact_from_summary(summary: &str) -> GolfImpact {
    let haystack = summary.to_lowercase();
    if PROHIBITIVE_KEYWORDS.iter().any(|kw| haystack.contains(kw)) {
        GolfImpact::Prohibitive
    } else if SIGNIFICANT_KEYWORDS.iter().any(|kw| haystack.contains(kw)) {
        GolfImpact::Significant
    } else if MODERATE_KEYWORDS.iter().any(|kw| haystack.contains(kw)) {
        GolfImpact::Moderate
    } else {
        GolfImpact::Minimal
    }
}

pub fn classify(raw: &ProviderAlert) -> WeatherAlert {
    let summary = format!("{} {}", raw.title, raw.description);
    WeatherAlert {
        title: raw.title.clone(),
        description: raw.description.clone(),
        severity: severity_from_provider(&raw.severity),
        starts_at: DateTime::<Utc>::from_timestamp(raw.starts_at, 0)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        ends_at: raw
            .ends_at
            .and_then(|t| DateTime::<Utc>::from_timestamp(t, 0)),
        golf_impact: impact_from_summary(&summary),
    }
}
