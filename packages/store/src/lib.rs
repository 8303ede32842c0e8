#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Queryable collection abstraction over incident and alert documents.
//!
//! The metrics engine never touches storage directly; it goes through the
//! [`ReportStore`] trait, one method per push-down aggregation. The
//! bundled [`MemoryStore`](memory::MemoryStore) backs development and
//! tests; a production deployment swaps in a database-backed
//! implementation behind the same trait.

pub mod filter;
pub mod memory;
pub mod rollup;

use async_trait::async_trait;
use safewatch_metrics_models::TimeBucket;
use safewatch_report_models::{Alert, Incident};

use crate::filter::{AlertFilter, IncidentFilter};
use crate::rollup::{
    AlertFacets, BucketCount, CategoryRollup, EngagementTotals, ResponseTimeSummary,
    SeverityRollup, WeekdayCount,
};

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A query was rejected or failed in the underlying storage.
    #[error("Query failed: {message}")]
    Query {
        /// Description of what went wrong.
        message: String,
    },

    /// The storage backend is unreachable or shutting down.
    #[error("Store unavailable: {message}")]
    Unavailable {
        /// Description of what went wrong.
        message: String,
    },
}

/// Trait every incident/alert store must implement.
///
/// Rollup methods return pre-grouped rows; derived ratios and averages are
/// computed by the caller. Sparse groups are omitted, never returned as
/// zero rows.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Persists a new incident document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    async fn insert_incident(&self, incident: Incident) -> Result<(), StoreError>;

    /// Persists a new alert document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    async fn insert_alert(&self, alert: Alert) -> Result<(), StoreError>;

    /// Counts incidents matching the filter. The filter's `limit` is
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn count_incidents(&self, filter: &IncidentFilter) -> Result<u64, StoreError>;

    /// Returns matching incidents newest-first, capped at the filter's
    /// `limit` when set.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn find_incidents(&self, filter: &IncidentFilter) -> Result<Vec<Incident>, StoreError>;

    /// Groups matching incidents by day of week, Sunday first. Days with
    /// no incidents are omitted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn weekday_counts(&self, filter: &IncidentFilter)
    -> Result<Vec<WeekdayCount>, StoreError>;

    /// Groups matching incidents into time buckets at the given
    /// granularity, chronologically ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn time_series(
        &self,
        filter: &IncidentFilter,
        bucket: TimeBucket,
    ) -> Result<Vec<BucketCount>, StoreError>;

    /// Groups matching incidents by severity with pre-summed response and
    /// verification columns.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn severity_rollup(
        &self,
        filter: &IncidentFilter,
    ) -> Result<Vec<SeverityRollup>, StoreError>;

    /// Groups matching incidents by category with pre-summed severity
    /// weight and view columns.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn category_rollup(
        &self,
        filter: &IncidentFilter,
    ) -> Result<Vec<CategoryRollup>, StoreError>;

    /// Response-time statistics over matching incidents that have both a
    /// recorded response time and a verifying authority. `None` when no
    /// incident qualifies.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn response_time_summary(
        &self,
        filter: &IncidentFilter,
    ) -> Result<Option<ResponseTimeSummary>, StoreError>;

    /// Sums engagement counters over matching incidents.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn engagement_totals(
        &self,
        filter: &IncidentFilter,
    ) -> Result<EngagementTotals, StoreError>;

    /// Computes total, delivered, by-kind, and by-priority alert counts in
    /// one round trip.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn alert_summary_facets(&self, filter: &AlertFilter)
    -> Result<AlertFacets, StoreError>;
}
