//! In-memory [`ReportStore`] used for development and tests.
//!
//! Documents live in plain vectors behind `RwLock`s; every query is a
//! linear scan. Plenty for a single process with demo-scale data, and it
//! keeps the rollup semantics in one obvious place.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use async_trait::async_trait;
use chrono::{Datelike as _, Weekday};
use safewatch_metrics_models::TimeBucket;
use safewatch_report_models::{Alert, Incident};

use crate::filter::{AlertFilter, IncidentFilter};
use crate::rollup::{
    AlertFacets, BucketCount, CategoryRollup, EngagementTotals, ResponseTimeSummary,
    SeverityRollup, WeekdayCount,
};
use crate::{ReportStore, StoreError};

/// Vector-backed store. Cheap to construct, safe to share via `Arc`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    incidents: RwLock<Vec<Incident>>,
    alerts: RwLock<Vec<Alert>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-loaded with the given incidents.
    #[must_use]
    pub fn from_incidents(incidents: Vec<Incident>) -> Self {
        Self {
            incidents: RwLock::new(incidents),
            alerts: RwLock::new(Vec::new()),
        }
    }

    fn read_incidents(&self) -> RwLockReadGuard<'_, Vec<Incident>> {
        self.incidents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn read_alerts(&self) -> RwLockReadGuard<'_, Vec<Alert>> {
        self.alerts.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn insert_incident(&self, incident: Incident) -> Result<(), StoreError> {
        self.incidents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(incident);
        Ok(())
    }

    async fn insert_alert(&self, alert: Alert) -> Result<(), StoreError> {
        self.alerts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(alert);
        Ok(())
    }

    async fn count_incidents(&self, filter: &IncidentFilter) -> Result<u64, StoreError> {
        let count = self
            .read_incidents()
            .iter()
            .filter(|incident| filter.matches(incident))
            .count();
        Ok(count as u64)
    }

    async fn find_incidents(&self, filter: &IncidentFilter) -> Result<Vec<Incident>, StoreError> {
        let mut matching: Vec<Incident> = self
            .read_incidents()
            .iter()
            .filter(|incident| filter.matches(incident))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = filter.limit {
            matching.truncate(limit);
        }
        Ok(matching)
    }

    async fn weekday_counts(
        &self,
        filter: &IncidentFilter,
    ) -> Result<Vec<WeekdayCount>, StoreError> {
        let mut groups: BTreeMap<u32, (Weekday, u64)> = BTreeMap::new();
        let incidents = self.read_incidents();
        for incident in &*incidents {
            if filter.matches(incident) {
                let weekday = incident.created_at.weekday();
                groups
                    .entry(weekday.num_days_from_sunday())
                    .or_insert((weekday, 0))
                    .1 += 1;
            }
        }
        Ok(groups
            .into_values()
            .map(|(weekday, count)| WeekdayCount { weekday, count })
            .collect())
    }

    async fn time_series(
        &self,
        filter: &IncidentFilter,
        bucket: TimeBucket,
    ) -> Result<Vec<BucketCount>, StoreError> {
        let mut groups: BTreeMap<String, u64> = BTreeMap::new();
        let incidents = self.read_incidents();
        for incident in &*incidents {
            if filter.matches(incident) {
                *groups.entry(bucket.key(incident.created_at)).or_insert(0) += 1;
            }
        }
        Ok(groups
            .into_iter()
            .map(|(bucket, count)| BucketCount { bucket, count })
            .collect())
    }

    async fn severity_rollup(
        &self,
        filter: &IncidentFilter,
    ) -> Result<Vec<SeverityRollup>, StoreError> {
        let mut groups: BTreeMap<_, SeverityRollup> = BTreeMap::new();
        let incidents = self.read_incidents();
        for incident in &*incidents {
            if !filter.matches(incident) {
                continue;
            }
            let row = groups
                .entry(incident.severity)
                .or_insert_with(|| SeverityRollup {
                    severity: incident.severity,
                    count: 0,
                    response_minutes_sum: 0.0,
                    response_count: 0,
                    verified: 0,
                });
            row.count += 1;
            if let Some(minutes) = incident.response_minutes {
                row.response_minutes_sum += minutes;
                row.response_count += 1;
            }
            if incident.verified_by.is_some() {
                row.verified += 1;
            }
        }
        Ok(groups.into_values().collect())
    }

    async fn category_rollup(
        &self,
        filter: &IncidentFilter,
    ) -> Result<Vec<CategoryRollup>, StoreError> {
        let mut groups: BTreeMap<_, CategoryRollup> = BTreeMap::new();
        let incidents = self.read_incidents();
        for incident in &*incidents {
            if !filter.matches(incident) {
                continue;
            }
            let row = groups
                .entry(incident.category)
                .or_insert_with(|| CategoryRollup {
                    category: incident.category,
                    count: 0,
                    severity_weight_sum: 0,
                    total_views: 0,
                });
            row.count += 1;
            row.severity_weight_sum += u64::from(incident.severity.weight());
            row.total_views += incident.analytics.views;
        }
        Ok(groups.into_values().collect())
    }

    #[allow(clippy::cast_precision_loss)]
    async fn response_time_summary(
        &self,
        filter: &IncidentFilter,
    ) -> Result<Option<ResponseTimeSummary>, StoreError> {
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut count: u64 = 0;
        let incidents = self.read_incidents();
        for incident in &*incidents {
            if !filter.matches(incident) {
                continue;
            }
            // Only responded-and-verified incidents count toward response stats.
            let (Some(minutes), Some(_)) = (incident.response_minutes, incident.verified_by)
            else {
                continue;
            };
            sum += minutes;
            min = min.min(minutes);
            max = max.max(minutes);
            count += 1;
        }
        if count == 0 {
            return Ok(None);
        }
        Ok(Some(ResponseTimeSummary {
            avg_minutes: sum / count as f64,
            min_minutes: min,
            max_minutes: max,
            count,
        }))
    }

    async fn engagement_totals(
        &self,
        filter: &IncidentFilter,
    ) -> Result<EngagementTotals, StoreError> {
        let mut totals = EngagementTotals::default();
        let incidents = self.read_incidents();
        for incident in &*incidents {
            if filter.matches(incident) {
                totals.views += incident.analytics.views;
                totals.engagements += incident.analytics.engagements;
                totals.votes += incident.community_votes.len() as u64;
            }
        }
        Ok(totals)
    }

    async fn alert_summary_facets(
        &self,
        filter: &AlertFilter,
    ) -> Result<AlertFacets, StoreError> {
        let mut facets = AlertFacets::default();
        let alerts = self.read_alerts();
        for alert in &*alerts {
            if !filter.matches(alert) {
                continue;
            }
            facets.total += 1;
            if alert.delivered {
                facets.delivered += 1;
            }
            *facets.by_kind.entry(alert.kind).or_insert(0) += 1;
            *facets.by_priority.entry(alert.priority).or_insert(0) += 1;
        }
        Ok(facets)
    }
}
