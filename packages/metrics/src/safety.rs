//! Safety score model.
//!
//! Converts a point, a radius, and the active incidents inside it into a
//! 0-100 score. The operation is fail-soft end to end: malformed inputs
//! and store failures both yield the neutral midpoint instead of an
//! error, because the score is a user-facing indicator that must always
//! render.

use chrono::{DateTime, Duration, Utc};
use safewatch_report_models::Incident;
use safewatch_store::ReportStore;
use safewatch_store::filter::{GeoRadius, IncidentFilter};

/// Score substituted for malformed inputs or an unreachable store.
pub const NEUTRAL_SCORE: u8 = 50;

/// Score when no incidents exist inside the radius.
pub const NO_DATA_SCORE: u8 = 85;

/// Whether the inputs describe a real point and a usable radius.
///
/// The range checks also reject NaN; the radius must additionally be
/// finite and positive.
#[must_use]
pub fn valid_inputs(latitude: f64, longitude: f64, radius_km: f64) -> bool {
    (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
        && radius_km.is_finite()
        && radius_km > 0.0
}

/// 3 within the last 7 days, 2 within 30 days, else 1.
fn recency_weight(created_at: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let age = now - created_at;
    if age <= Duration::try_days(7).expect("constant fits in Duration") {
        3
    } else if age <= Duration::try_days(30).expect("constant fits in Duration") {
        2
    } else {
        1
    }
}

/// Scores an already fetched incident set.
///
/// Empty input scores [`NO_DATA_SCORE`]. Otherwise each incident
/// contributes `100 - severity_weight * 20` weighted by
/// `severity_weight * recency_weight`, and the weighted mean is rounded
/// and clamped to 0-100.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn score_incidents(incidents: &[Incident], now: DateTime<Utc>) -> u8 {
    if incidents.is_empty() {
        return NO_DATA_SCORE;
    }

    let mut total_weight = 0.0_f64;
    let mut weighted_score = 0.0_f64;
    for incident in incidents {
        let severity_weight = incident.severity.weight();
        let weight = f64::from(severity_weight * recency_weight(incident.created_at, now));
        total_weight += weight;
        weighted_score += weight * f64::from(100 - severity_weight * 20);
    }

    (weighted_score / total_weight).round().clamp(0.0, 100.0) as u8
}

/// Computes the safety score for a point, fetching active incidents
/// inside the radius.
///
/// Out-of-range or non-finite inputs return [`NEUTRAL_SCORE`] without
/// touching the store. A store failure also degrades to
/// [`NEUTRAL_SCORE`] with a logged warning, keeping the operation's
/// "always a number" contract.
pub async fn safety_score(
    store: &dyn ReportStore,
    latitude: f64,
    longitude: f64,
    radius_km: f64,
) -> u8 {
    if !valid_inputs(latitude, longitude, radius_km) {
        return NEUTRAL_SCORE;
    }

    let filter = IncidentFilter::active().near(GeoRadius::new(latitude, longitude, radius_km));
    match store.find_incidents(&filter).await {
        Ok(incidents) => score_incidents(&incidents, Utc::now()),
        Err(e) => {
            log::warn!("Safety score query failed, substituting neutral score: {e}");
            NEUTRAL_SCORE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FailingStore;
    use safewatch_report_models::{GeoPoint, IncidentCategory, Severity};
    use safewatch_store::memory::MemoryStore;

    fn incident_aged(severity: Severity, days_ago: i64, now: DateTime<Utc>) -> Incident {
        Incident::new(
            IncidentCategory::Theft,
            severity,
            GeoPoint::new(40.71, -74.0),
            now - Duration::try_days(days_ago).unwrap(),
        )
    }

    #[test]
    fn rejects_out_of_range_and_non_finite_inputs() {
        assert!(valid_inputs(40.71, -74.0, 5.0));
        assert!(!valid_inputs(91.0, -74.0, 5.0));
        assert!(!valid_inputs(-91.0, -74.0, 5.0));
        assert!(!valid_inputs(40.71, 181.0, 5.0));
        assert!(!valid_inputs(40.71, -74.0, 0.0));
        assert!(!valid_inputs(40.71, -74.0, -2.0));
        assert!(!valid_inputs(f64::NAN, -74.0, 5.0));
        assert!(!valid_inputs(40.71, f64::NAN, 5.0));
        assert!(!valid_inputs(40.71, -74.0, f64::NAN));
        assert!(!valid_inputs(40.71, -74.0, f64::INFINITY));
    }

    #[tokio::test]
    async fn out_of_bounds_latitude_scores_neutral() {
        let store = MemoryStore::new();
        assert_eq!(safety_score(&store, 91.0, -74.0, 5.0).await, NEUTRAL_SCORE);
    }

    #[tokio::test]
    async fn empty_radius_scores_no_data() {
        let store = MemoryStore::new();
        assert_eq!(safety_score(&store, 40.71, -74.0, 5.0).await, NO_DATA_SCORE);
    }

    #[tokio::test]
    async fn store_failure_scores_neutral() {
        assert_eq!(
            safety_score(&FailingStore, 40.71, -74.0, 5.0).await,
            NEUTRAL_SCORE
        );
    }

    #[test]
    fn recency_weight_bands() {
        let now = Utc::now();
        assert_eq!(recency_weight(now - Duration::try_days(3).unwrap(), now), 3);
        assert_eq!(recency_weight(now - Duration::try_days(7).unwrap(), now), 3);
        assert_eq!(recency_weight(now - Duration::try_days(8).unwrap(), now), 2);
        assert_eq!(recency_weight(now - Duration::try_days(30).unwrap(), now), 2);
        assert_eq!(recency_weight(now - Duration::try_days(31).unwrap(), now), 1);
    }

    #[test]
    fn single_recent_critical_scores_twenty() {
        let now = Utc::now();
        // One incident: the weighted mean collapses to its base score,
        // 100 - 4 * 20 = 20, regardless of recency.
        let incidents = vec![incident_aged(Severity::Critical, 1, now)];
        assert_eq!(score_incidents(&incidents, now), 20);
    }

    #[test]
    fn single_old_low_scores_eighty() {
        let now = Utc::now();
        let incidents = vec![incident_aged(Severity::Low, 60, now)];
        assert_eq!(score_incidents(&incidents, now), 80);
    }

    #[test]
    fn recent_critical_outweighs_old_low() {
        let now = Utc::now();
        // Critical 1 day ago: weight 4*3=12, score 20.
        // Low 60 days ago: weight 1*1=1, score 80.
        // Mean = (12*20 + 1*80) / 13 = 24.6 -> 25.
        let incidents = vec![
            incident_aged(Severity::Critical, 1, now),
            incident_aged(Severity::Low, 60, now),
        ];
        assert_eq!(score_incidents(&incidents, now), 25);
    }

    #[tokio::test]
    async fn score_reflects_only_incidents_inside_radius() {
        let now = Utc::now();
        let near = incident_aged(Severity::Critical, 1, now);
        let mut far = incident_aged(Severity::Low, 1, now);
        far.location = GeoPoint::new(41.5, -74.0);

        let store = MemoryStore::from_incidents(vec![near, far]);
        assert_eq!(safety_score(&store, 40.71, -74.0, 5.0).await, 20);
    }
}
