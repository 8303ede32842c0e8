//! Dashboard metrics and analytics services.
//!
//! [`MetricsService`] owns the cache-through snapshot path: look up,
//! recompute on miss via a concurrent facet fan-out, store, return.
//! [`AnalyticsService`] produces one-shot reports and safety
//! assessments; nothing it returns is cached. Both are plain constructed
//! values with no startup side effects; the hosting process decides
//! their lifetime.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use safewatch_metrics_models::{
    AnalyticsOptions, AnalyticsReport, BreakdownMetrics, HotspotIncident, MetricsSnapshot,
    SafetyReport,
};
use safewatch_report_models::{ConsumerRole, GeoPoint, IncidentStatus, Severity};
use safewatch_store::filter::{GeoRadius, IncidentFilter};
use safewatch_store::{ReportStore, StoreError};

use crate::cache::SnapshotCache;
use crate::{MetricsError, facets, geo, safety};

/// Radius in kilometers for the snapshot's location-conditioned facet.
///
/// Dashboard requests carry a point but no radius; this is the fixed
/// neighborhood the local numbers cover.
const LOCATION_RADIUS_KM: f64 = 5.0;

/// Newest incidents carried in a safety report.
const RECENT_INCIDENT_LIMIT: usize = 10;

/// Cache-through dashboard snapshot service.
pub struct MetricsService {
    store: Arc<dyn ReportStore>,
    cache: SnapshotCache,
    refresh_rate_seconds: u64,
}

impl MetricsService {
    /// Creates a service over the given store and cache.
    ///
    /// `refresh_rate_seconds` is stamped into every snapshot so clients
    /// know how often the background refresh recomputes.
    #[must_use]
    pub fn new(store: Arc<dyn ReportStore>, cache: SnapshotCache, refresh_rate_seconds: u64) -> Self {
        Self {
            store,
            cache,
            refresh_rate_seconds,
        }
    }

    /// The refresh cadence stamped into snapshots.
    #[must_use]
    pub const fn refresh_rate_seconds(&self) -> u64 {
        self.refresh_rate_seconds
    }

    /// Returns the snapshot for a role and optional location, serving
    /// from the cache when a live entry exists and recomputing otherwise.
    ///
    /// Concurrent misses on the same key recompute redundantly; the last
    /// write wins, which is safe because computation is idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Aggregation`] if any facet other than the
    /// alert summary fails. Nothing is cached on the error path.
    pub async fn dashboard_metrics(
        &self,
        role: ConsumerRole,
        location: Option<GeoPoint>,
    ) -> Result<Arc<MetricsSnapshot>, MetricsError> {
        if let Some(cached) = self.cache.get(role, location) {
            log::debug!(
                "Serving cached snapshot for {}",
                SnapshotCache::key(role, location)
            );
            return Ok(cached);
        }

        let snapshot = Arc::new(self.compute_snapshot(location, Utc::now()).await?);
        self.cache.put(role, location, Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Recomputes the global admin snapshot unconditionally and caches
    /// it. The refresh loop calls this every tick so pushes always carry
    /// fresh numbers instead of whatever the cache holds.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Aggregation`] if any facet other than the
    /// alert summary fails.
    pub async fn refresh_global(&self) -> Result<Arc<MetricsSnapshot>, MetricsError> {
        let snapshot = Arc::new(self.compute_snapshot(None, Utc::now()).await?);
        self.cache
            .put(ConsumerRole::Admin, None, Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Drops every cached snapshot. Administrative; effective before the
    /// next request.
    pub fn clear_cache(&self) {
        self.cache.clear();
        log::info!("Metrics cache cleared");
    }

    /// Drops expired cache entries. Returns how many were removed.
    pub fn sweep_cache(&self) -> usize {
        self.cache.sweep()
    }

    async fn compute_snapshot(
        &self,
        location: Option<GeoPoint>,
        now: DateTime<Utc>,
    ) -> Result<MetricsSnapshot, MetricsError> {
        let store = self.store.as_ref();
        let base = IncidentFilter::active();

        let location_facet = async {
            match location {
                Some(point) => facets::location(store, point, LOCATION_RADIUS_KM)
                    .await
                    .map(Some),
                None => Ok(None),
            }
        };
        let alerts_facet = async { Ok::<_, StoreError>(facets::alert_summary(store, now).await) };

        let (overview, trends, severity, types, performance, engagement, location_metrics, alerts) =
            futures::try_join!(
                facets::overview(store, &base, now),
                facets::trend(store, &base, now),
                facets::severity_breakdown(store, &base),
                facets::type_breakdown(store, &base),
                facets::response_metrics(store, &base),
                facets::engagement(store, &base),
                location_facet,
                alerts_facet,
            )
            .map_err(|e| {
                log::error!("Snapshot aggregation failed: {e}");
                MetricsError::Aggregation(e)
            })?;

        Ok(MetricsSnapshot {
            timestamp: now,
            overview,
            trends,
            breakdown: BreakdownMetrics { severity, types },
            performance,
            engagement,
            location: location_metrics,
            alerts,
            refresh_rate_seconds: self.refresh_rate_seconds,
        })
    }
}

/// One-shot analytics reports and safety assessments.
pub struct AnalyticsService {
    store: Arc<dyn ReportStore>,
}

impl AnalyticsService {
    /// Creates a service over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn ReportStore>) -> Self {
        Self { store }
    }

    /// Generates an analytics report for the options' window and area.
    ///
    /// The window facets run concurrently; the geographic distribution
    /// and hotspot clustering both derive from one fetched incident set.
    /// The week-over-week trend always covers the trailing two weeks
    /// regardless of the report window.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Report`] if any underlying query fails.
    pub async fn incident_analytics(
        &self,
        options: &AnalyticsOptions,
    ) -> Result<AnalyticsReport, MetricsError> {
        let store = self.store.as_ref();
        let now = Utc::now();
        let range = options.time_range;

        let mut scope = IncidentFilter::active();
        if let Some(point) = options.location {
            scope = scope.near(GeoRadius::new(
                point.latitude,
                point.longitude,
                options.radius_km,
            ));
        }
        if !options.include_resolved {
            scope = scope.without_status(IncidentStatus::Resolved);
        }
        let base = scope.clone().created_after(range.start_from(now));

        let (stats, time_series, trends, performance, engagement, incidents) = futures::try_join!(
            facets::report_stats(store, &base),
            facets::time_series(store, &base, range.bucket()),
            facets::trend(store, &scope, now),
            facets::response_metrics(store, &base),
            facets::engagement(store, &base),
            store.find_incidents(&base),
        )
        .map_err(|e| {
            log::error!("Analytics report aggregation failed: {e}");
            MetricsError::Report(e)
        })?;

        Ok(AnalyticsReport {
            time_range: range,
            generated_at: now,
            stats,
            time_series,
            geographic: geo::geographic_cells(&incidents),
            trends,
            performance,
            engagement,
            hotspots: geo::hotspots(&incidents),
        })
    }

    /// Safety score for a point, 0-100. Never fails; malformed inputs
    /// and store failures score the neutral midpoint.
    pub async fn safety_score(&self, latitude: f64, longitude: f64, radius_km: f64) -> u8 {
        safety::safety_score(self.store.as_ref(), latitude, longitude, radius_km).await
    }

    /// Full safety assessment for a point: score, severity counts,
    /// newest incidents, and hotspot clusters inside the radius.
    ///
    /// Malformed inputs yield the neutral report (score 50, empty
    /// sections) rather than an error, matching the bare score's
    /// fail-soft stance.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Report`] if the incident fetch fails.
    pub async fn safety_report(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    ) -> Result<SafetyReport, MetricsError> {
        let now = Utc::now();
        if !safety::valid_inputs(latitude, longitude, radius_km) {
            return Ok(SafetyReport {
                generated_at: now,
                latitude,
                longitude,
                radius_km,
                safety_score: safety::NEUTRAL_SCORE,
                total_incidents: 0,
                severity_counts: BTreeMap::new(),
                recent_incidents: Vec::new(),
                hotspots: Vec::new(),
            });
        }

        let filter = IncidentFilter::active().near(GeoRadius::new(latitude, longitude, radius_km));
        let incidents = self.store.find_incidents(&filter).await.map_err(|e| {
            log::error!("Safety report query failed: {e}");
            MetricsError::Report(e)
        })?;

        let mut severity_counts: BTreeMap<Severity, u64> = BTreeMap::new();
        for incident in &incidents {
            *severity_counts.entry(incident.severity).or_insert(0) += 1;
        }

        Ok(SafetyReport {
            generated_at: now,
            latitude,
            longitude,
            radius_km,
            safety_score: safety::score_incidents(&incidents, now),
            total_incidents: incidents.len() as u64,
            severity_counts,
            recent_incidents: incidents
                .iter()
                .take(RECENT_INCIDENT_LIMIT)
                .map(HotspotIncident::from)
                .collect(),
            hotspots: geo::hotspots(&incidents),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FailingStore;
    use chrono::Duration;
    use safewatch_metrics_models::{RiskLevel, TimeRange};
    use safewatch_report_models::{Incident, IncidentCategory};
    use safewatch_store::memory::MemoryStore;

    fn incident(
        category: IncidentCategory,
        severity: Severity,
        created_at: DateTime<Utc>,
    ) -> Incident {
        Incident::new(category, severity, GeoPoint::new(40.71, -74.0), created_at)
    }

    fn service_over(store: Arc<dyn ReportStore>) -> MetricsService {
        MetricsService::new(store, SnapshotCache::default(), 30)
    }

    #[tokio::test]
    async fn snapshot_round_trip_is_served_from_cache() {
        let now = Utc::now();
        let store = Arc::new(MemoryStore::from_incidents(vec![incident(
            IncidentCategory::Theft,
            Severity::Medium,
            now,
        )]));
        let service = service_over(store);

        let first = service
            .dashboard_metrics(ConsumerRole::Citizen, None)
            .await
            .unwrap();
        let second = service
            .dashboard_metrics(ConsumerRole::Citizen, None)
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn clear_cache_forces_recomputation() {
        let store = Arc::new(MemoryStore::new());
        let service = service_over(store);

        let first = service
            .dashboard_metrics(ConsumerRole::Citizen, None)
            .await
            .unwrap();
        service.clear_cache();
        let second = service
            .dashboard_metrics(ConsumerRole::Citizen, None)
            .await
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn snapshot_overview_matches_seeded_incidents() {
        let now = Utc::now();
        let store = Arc::new(MemoryStore::from_incidents(vec![
            incident(IncidentCategory::Fire, Severity::Critical, now),
            incident(
                IncidentCategory::Vandalism,
                Severity::Low,
                now - Duration::try_days(1).unwrap(),
            ),
        ]));
        let service = service_over(store);

        let snapshot = service
            .dashboard_metrics(ConsumerRole::Admin, None)
            .await
            .unwrap();
        assert_eq!(snapshot.overview.total, 2);
        assert_eq!(snapshot.overview.today, 1);
        assert_eq!(snapshot.overview.yesterday, 1);
        assert_eq!(snapshot.overview.critical, 1);
        assert_eq!(snapshot.overview.change_from_yesterday, 0);
        assert_eq!(snapshot.overview.resolution_rate, 0);
        assert!(snapshot.location.is_none());
        assert_eq!(snapshot.refresh_rate_seconds, 30);
    }

    #[tokio::test]
    async fn snapshot_with_location_carries_local_metrics() {
        let now = Utc::now();
        let store = Arc::new(MemoryStore::from_incidents(vec![
            incident(IncidentCategory::Theft, Severity::Critical, now),
            incident(IncidentCategory::Theft, Severity::Low, now),
        ]));
        let service = service_over(store);

        let snapshot = service
            .dashboard_metrics(ConsumerRole::Citizen, Some(GeoPoint::new(40.71, -74.0)))
            .await
            .unwrap();
        let local = snapshot.location.as_ref().unwrap();
        assert_eq!(local.incident_count, 2);
        assert_eq!(local.critical_count, 1);
        assert_eq!(local.dominant_category, Some(IncidentCategory::Theft));
        assert!((local.radius_km - LOCATION_RADIUS_KM).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn failing_store_surfaces_generic_error_and_caches_nothing() {
        let service = service_over(Arc::new(FailingStore));

        let err = service
            .dashboard_metrics(ConsumerRole::Citizen, None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to retrieve metrics");

        // A cached partial snapshot would short-circuit this second call.
        assert!(
            service
                .dashboard_metrics(ConsumerRole::Citizen, None)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn refresh_global_seeds_the_admin_cache_entry() {
        let store = Arc::new(MemoryStore::new());
        let service = service_over(store);

        let pushed = service.refresh_global().await.unwrap();
        let served = service
            .dashboard_metrics(ConsumerRole::Admin, None)
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&pushed, &served));
    }

    #[tokio::test]
    async fn analytics_report_excludes_resolved_by_default() {
        let now = Utc::now();
        let store = Arc::new(MemoryStore::from_incidents(vec![
            incident(IncidentCategory::Theft, Severity::Medium, now),
            incident(IncidentCategory::Theft, Severity::Medium, now)
                .with_status(IncidentStatus::Resolved),
        ]));
        let analytics = AnalyticsService::new(store);

        let report = analytics
            .incident_analytics(&AnalyticsOptions::default())
            .await
            .unwrap();
        assert_eq!(report.stats.total, 1);
        assert_eq!(report.stats.resolved, 0);

        let report = analytics
            .incident_analytics(&AnalyticsOptions {
                include_resolved: true,
                ..AnalyticsOptions::default()
            })
            .await
            .unwrap();
        assert_eq!(report.stats.total, 2);
        assert_eq!(report.stats.resolved, 1);
        assert_eq!(report.stats.resolution_rate, 50);
    }

    #[tokio::test]
    async fn analytics_report_derives_hotspots_and_series() {
        let now = Utc::now();
        let store = Arc::new(MemoryStore::from_incidents(vec![
            incident(IncidentCategory::Assault, Severity::High, now),
            incident(
                IncidentCategory::Assault,
                Severity::High,
                now - Duration::try_hours(1).unwrap(),
            ),
            incident(
                IncidentCategory::Assault,
                Severity::High,
                now - Duration::try_hours(2).unwrap(),
            ),
        ]));
        let analytics = AnalyticsService::new(store);

        let report = analytics
            .incident_analytics(&AnalyticsOptions {
                time_range: TimeRange::Week,
                ..AnalyticsOptions::default()
            })
            .await
            .unwrap();
        assert_eq!(report.time_range, TimeRange::Week);
        assert_eq!(report.hotspots.len(), 1);
        assert_eq!(report.hotspots[0].incident_count, 3);
        assert_eq!(report.hotspots[0].severity_score, 9);
        assert_eq!(report.hotspots[0].risk_level, RiskLevel::High);
        assert_eq!(report.geographic.len(), 1);
        assert!(!report.time_series.is_empty());
        assert_eq!(report.trends.this_week, 3);
    }

    #[tokio::test]
    async fn analytics_report_honors_location_radius() {
        let now = Utc::now();
        let mut far = incident(IncidentCategory::Theft, Severity::Low, now);
        far.location = GeoPoint::new(41.5, -74.0);
        let store = Arc::new(MemoryStore::from_incidents(vec![
            incident(IncidentCategory::Theft, Severity::Low, now),
            far,
        ]));
        let analytics = AnalyticsService::new(store);

        let report = analytics
            .incident_analytics(&AnalyticsOptions {
                location: Some(GeoPoint::new(40.71, -74.0)),
                radius_km: 5.0,
                ..AnalyticsOptions::default()
            })
            .await
            .unwrap();
        assert_eq!(report.stats.total, 1);
    }

    #[tokio::test]
    async fn analytics_failure_surfaces_generic_report_error() {
        let analytics = AnalyticsService::new(Arc::new(FailingStore));
        let err = analytics
            .incident_analytics(&AnalyticsOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to generate analytics report");
    }

    #[tokio::test]
    async fn safety_report_is_neutral_for_invalid_inputs() {
        let analytics = AnalyticsService::new(Arc::new(MemoryStore::new()));
        let report = analytics.safety_report(91.0, -74.0, 5.0).await.unwrap();
        assert_eq!(report.safety_score, safety::NEUTRAL_SCORE);
        assert_eq!(report.total_incidents, 0);
        assert!(report.severity_counts.is_empty());
        assert!(report.hotspots.is_empty());
    }

    #[tokio::test]
    async fn safety_report_summarizes_radius() {
        let now = Utc::now();
        let store = Arc::new(MemoryStore::from_incidents(vec![
            incident(IncidentCategory::Assault, Severity::High, now),
            incident(
                IncidentCategory::Theft,
                Severity::High,
                now - Duration::try_hours(1).unwrap(),
            ),
            incident(
                IncidentCategory::Theft,
                Severity::Low,
                now - Duration::try_hours(2).unwrap(),
            ),
        ]));
        let analytics = AnalyticsService::new(store);

        let report = analytics.safety_report(40.71, -74.0, 5.0).await.unwrap();
        assert_eq!(report.total_incidents, 3);
        assert_eq!(report.severity_counts[&Severity::High], 2);
        assert_eq!(report.severity_counts[&Severity::Low], 1);
        assert_eq!(report.recent_incidents.len(), 3);
        assert_eq!(report.recent_incidents[0].category, IncidentCategory::Assault);
        assert_eq!(report.hotspots.len(), 1);
        assert!(report.safety_score <= 100);
    }
}
