//! Grouped-aggregation row types returned by store rollup queries.
//!
//! These mirror what an aggregation pipeline would return: one row per
//! group with pre-summed columns. The metrics engine derives averages and
//! rates from them so backends never compute ratios.

use std::collections::BTreeMap;

use chrono::Weekday;
use safewatch_report_models::{AlertKind, AlertPriority, IncidentCategory, Severity};

/// Incident count for one day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekdayCount {
    /// Day of the week.
    pub weekday: Weekday,
    /// Incidents created on that day.
    pub count: u64,
}

/// Incident count for one time-series bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketCount {
    /// Rendered bucket key, chronologically sortable.
    pub bucket: String,
    /// Incidents in the bucket.
    pub count: u64,
}

/// Pre-summed aggregates for one severity level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeverityRollup {
    /// Severity level of the group.
    pub severity: Severity,
    /// Incidents in the group.
    pub count: u64,
    /// Sum of recorded response times in minutes.
    pub response_minutes_sum: f64,
    /// Incidents with a recorded response time.
    pub response_count: u64,
    /// Incidents with a verifying authority.
    pub verified: u64,
}

/// Pre-summed aggregates for one incident category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryRollup {
    /// Category of the group.
    pub category: IncidentCategory,
    /// Incidents in the group.
    pub count: u64,
    /// Sum of member severity weights (1-4 each).
    pub severity_weight_sum: u64,
    /// Sum of member view counts.
    pub total_views: u64,
}

/// Response-time statistics over incidents with both a recorded response
/// time and a verifying authority.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponseTimeSummary {
    /// Mean response time in minutes.
    pub avg_minutes: f64,
    /// Fastest response in minutes.
    pub min_minutes: f64,
    /// Slowest response in minutes.
    pub max_minutes: f64,
    /// Incidents contributing to the statistics.
    pub count: u64,
}

/// Summed engagement counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngagementTotals {
    /// Summed views.
    pub views: u64,
    /// Summed active interactions.
    pub engagements: u64,
    /// Summed community votes.
    pub votes: u64,
}

/// Faceted alert aggregates computed in one round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertFacets {
    /// Alerts matching the filter.
    pub total: u64,
    /// Matching alerts whose delivery completed.
    pub delivered: u64,
    /// Counts grouped by alert kind.
    pub by_kind: BTreeMap<AlertKind, u64>,
    /// Counts grouped by alert priority.
    pub by_priority: BTreeMap<AlertPriority, u64>,
}
