//! Test doubles shared by the in-file test modules.

use async_trait::async_trait;
use safewatch_metrics_models::TimeBucket;
use safewatch_report_models::{Alert, Incident};
use safewatch_store::filter::{AlertFilter, IncidentFilter};
use safewatch_store::rollup::{
    AlertFacets, BucketCount, CategoryRollup, EngagementTotals, ResponseTimeSummary,
    SeverityRollup, WeekdayCount,
};
use safewatch_store::{ReportStore, StoreError};

/// A store whose every query fails, for exercising degradation and
/// fatal-error paths.
pub struct FailingStore;

fn down() -> StoreError {
    StoreError::Unavailable {
        message: "connection refused".to_owned(),
    }
}

#[async_trait]
impl ReportStore for FailingStore {
    async fn insert_incident(&self, _incident: Incident) -> Result<(), StoreError> {
        Err(down())
    }

    async fn insert_alert(&self, _alert: Alert) -> Result<(), StoreError> {
        Err(down())
    }

    async fn count_incidents(&self, _filter: &IncidentFilter) -> Result<u64, StoreError> {
        Err(down())
    }

    async fn find_incidents(&self, _filter: &IncidentFilter) -> Result<Vec<Incident>, StoreError> {
        Err(down())
    }

    async fn weekday_counts(
        &self,
        _filter: &IncidentFilter,
    ) -> Result<Vec<WeekdayCount>, StoreError> {
        Err(down())
    }

    async fn time_series(
        &self,
        _filter: &IncidentFilter,
        _bucket: TimeBucket,
    ) -> Result<Vec<BucketCount>, StoreError> {
        Err(down())
    }

    async fn severity_rollup(
        &self,
        _filter: &IncidentFilter,
    ) -> Result<Vec<SeverityRollup>, StoreError> {
        Err(down())
    }

    async fn category_rollup(
        &self,
        _filter: &IncidentFilter,
    ) -> Result<Vec<CategoryRollup>, StoreError> {
        Err(down())
    }

    async fn response_time_summary(
        &self,
        _filter: &IncidentFilter,
    ) -> Result<Option<ResponseTimeSummary>, StoreError> {
        Err(down())
    }

    async fn engagement_totals(
        &self,
        _filter: &IncidentFilter,
    ) -> Result<EngagementTotals, StoreError> {
        Err(down())
    }

    async fn alert_summary_facets(
        &self,
        _filter: &AlertFilter,
    ) -> Result<AlertFacets, StoreError> {
        Err(down())
    }
}
