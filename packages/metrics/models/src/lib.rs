#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Metrics and analytics value types.
//!
//! Defines the immutable snapshot the dashboard consumes, the on-demand
//! analytics report, and the derived records they are assembled from
//! (hotspots, grid cells, facet slices). A snapshot is never mutated after
//! construction; recomputation always produces a replacement value.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use safewatch_report_models::{GeoPoint, Incident, IncidentCategory, Severity};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use uuid::Uuid;

pub mod window;

pub use window::{TimeBucket, TimeRange};

/// Headline counts for the dashboard overview panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewMetrics {
    /// Active incidents in total.
    pub total: u64,
    /// Incidents reported since local midnight UTC.
    pub today: u64,
    /// Incidents reported during the previous UTC day.
    pub yesterday: u64,
    /// Active critical-severity incidents.
    pub critical: u64,
    /// Incidents with resolved status.
    pub resolved: u64,
    /// Incidents with a verifying authority on record.
    pub verified: u64,
    /// Percent change of today vs yesterday, 0 when yesterday is 0.
    pub change_from_yesterday: i64,
    /// `round(resolved / total * 100)`, 0 when total is 0.
    pub resolution_rate: u8,
}

/// One day-of-week slice of the weekly trend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCount {
    /// Day name (`Sunday` .. `Saturday`).
    pub day: String,
    /// Incidents reported on that day of the current week.
    pub count: u64,
}

/// Week-over-week trend numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendMetrics {
    /// Incidents in the trailing 7 days.
    pub this_week: u64,
    /// Incidents in the 7 days before that.
    pub last_week: u64,
    /// Percent change of this week vs last week, 0 when last week is 0.
    pub weekly_change: i64,
    /// Current-week counts bucketed by day of week, Sunday first.
    pub daily_breakdown: Vec<DayCount>,
}

/// Per-severity aggregate slice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityStats {
    /// Incidents at this severity.
    pub count: u64,
    /// Mean response time in minutes over incidents with one recorded.
    pub avg_response_minutes: f64,
    /// Percent of incidents at this severity that were verified.
    pub verification_score: u8,
}

/// Per-category aggregate slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeStats {
    /// Incident category.
    pub category: IncidentCategory,
    /// Incidents in this category.
    pub count: u64,
    /// Mean severity weight (1-4) over the category.
    pub avg_severity: f64,
    /// Summed view counts over the category.
    pub total_views: u64,
}

/// Severity and category breakdowns of the active incident set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownMetrics {
    /// Aggregates keyed by severity level.
    pub severity: BTreeMap<Severity, SeverityStats>,
    /// Aggregates per incident category, largest count first.
    #[serde(rename = "type")]
    pub types: Vec<TypeStats>,
}

/// Authority response-time statistics.
///
/// Restricted to incidents that have both a recorded response time and a
/// verifying authority. The zero value stands in when no incident
/// qualifies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetrics {
    /// Mean response time in minutes.
    pub avg_response_minutes: f64,
    /// Fastest response in minutes.
    pub min_response_minutes: f64,
    /// Slowest response in minutes.
    pub max_response_minutes: f64,
    /// Incidents contributing to these statistics.
    pub total_verified: u64,
}

/// Community engagement totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementMetrics {
    /// Summed incident views.
    pub total_views: u64,
    /// Summed active interactions (shares, comments).
    pub total_engagements: u64,
    /// Summed community votes.
    pub total_votes: u64,
    /// `round(engagements / views * 100)`, 0 when views is 0. Views and
    /// engagements are independent counters, so this can exceed 100.
    pub engagement_rate: u64,
}

/// Location-conditioned metrics, present only when the snapshot was
/// requested for a specific point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationMetrics {
    /// Query point latitude.
    pub latitude: f64,
    /// Query point longitude.
    pub longitude: f64,
    /// Radius in kilometers the local numbers cover.
    pub radius_km: f64,
    /// Active incidents inside the radius.
    pub incident_count: u64,
    /// Critical incidents inside the radius.
    pub critical_count: u64,
    /// Most common category inside the radius, if any incidents exist.
    pub dominant_category: Option<IncidentCategory>,
    /// Safety score (0-100) for the query point.
    pub safety_score: u8,
}

/// A grouped count keyed by an enum's wire token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyCount {
    /// Group key (alert kind or priority token).
    pub key: String,
    /// Members in the group.
    pub count: u64,
}

/// Alert activity over the trailing 24 hours.
///
/// `Default` is the zero-valued placeholder substituted when the alert
/// sub-query fails; the rest of the snapshot is unaffected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertSummary {
    /// Alerts issued in the window.
    pub total: u64,
    /// Counts per alert kind.
    pub by_kind: Vec<KeyCount>,
    /// Counts per alert priority.
    pub by_priority: Vec<KeyCount>,
    /// `round(delivered / total * 100)`, 0 when total is 0.
    pub delivery_rate: u8,
}

/// One fully computed dashboard metrics result.
///
/// Assembled from independently computed facets once all of them settle;
/// cached per (role, location) key and replaced wholesale on refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// When the snapshot was computed.
    pub timestamp: DateTime<Utc>,
    /// Headline counts.
    pub overview: OverviewMetrics,
    /// Week-over-week trend.
    pub trends: TrendMetrics,
    /// Severity and category breakdowns.
    pub breakdown: BreakdownMetrics,
    /// Response-time statistics.
    pub performance: ResponseMetrics,
    /// Engagement totals.
    pub engagement: EngagementMetrics,
    /// Location-conditioned numbers, `null` for global snapshots.
    pub location: Option<LocationMetrics>,
    /// Alert activity summary.
    pub alerts: AlertSummary,
    /// How often the background refresh recomputes, in seconds.
    pub refresh_rate_seconds: u64,
}

/// Aggregate counts for an analytics report window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    /// Incidents in the window.
    pub total: u64,
    /// Critical incidents in the window.
    pub critical: u64,
    /// Resolved incidents in the window.
    pub resolved: u64,
    /// Verified incidents in the window.
    pub verified: u64,
    /// `round(resolved / total * 100)`, 0 when total is 0.
    pub resolution_rate: u8,
}

/// One time-series bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    /// Rendered bucket key (see [`TimeBucket::key`]).
    pub bucket: String,
    /// Incidents in the bucket.
    pub count: u64,
}

/// A coarse geographic grid cell (coordinates rounded to 2 decimals).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoCell {
    /// Cell center latitude.
    pub latitude: f64,
    /// Cell center longitude.
    pub longitude: f64,
    /// Incidents in the cell.
    pub count: u64,
    /// Critical incidents in the cell.
    pub critical_count: u64,
    /// Modal incident category in the cell.
    pub dominant_category: Option<IncidentCategory>,
}

/// Risk classification of a hotspot cell.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RiskLevel {
    /// Severity score below 4
    Low,
    /// Severity score 4-7
    Medium,
    /// Severity score 8-11
    High,
    /// Severity score 12 and above
    Critical,
}

impl RiskLevel {
    /// Classifies a summed severity score into a risk level.
    #[must_use]
    pub const fn classify(severity_score: u32) -> Self {
        match severity_score {
            12.. => Self::Critical,
            8.. => Self::High,
            4.. => Self::Medium,
            _ => Self::Low,
        }
    }
}

/// A trimmed incident summary carried inside hotspot and safety reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotIncident {
    /// Incident ID.
    pub id: Uuid,
    /// Incident category.
    pub category: IncidentCategory,
    /// Severity level.
    pub severity: Severity,
    /// When the incident was reported.
    pub created_at: DateTime<Utc>,
}

impl From<&Incident> for HotspotIncident {
    fn from(incident: &Incident) -> Self {
        Self {
            id: incident.id,
            category: incident.category,
            severity: incident.severity,
            created_at: incident.created_at,
        }
    }
}

/// A geographic cluster of incidents dense enough to flag.
///
/// Cells are 0.01 degrees on a side and only qualify with 3 or more
/// member incidents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    /// Cell center point.
    pub center: GeoPoint,
    /// Member incidents in the cell.
    pub incident_count: u64,
    /// Summed member severity weights.
    pub severity_score: u32,
    /// Risk classification of the severity score.
    pub risk_level: RiskLevel,
    /// Up to 5 newest member incidents.
    pub recent_incidents: Vec<HotspotIncident>,
}

/// Options for an on-demand analytics report.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsOptions {
    /// Symbolic window the report covers.
    pub time_range: TimeRange,
    /// Restrict the report to incidents near this point.
    pub location: Option<GeoPoint>,
    /// Radius in kilometers around `location`.
    pub radius_km: f64,
    /// Whether resolved incidents count toward the report.
    pub include_resolved: bool,
}

impl Default for AnalyticsOptions {
    fn default() -> Self {
        Self {
            time_range: TimeRange::default(),
            location: None,
            radius_km: 10.0,
            include_resolved: false,
        }
    }
}

/// On-demand analytics over a symbolic time window. Never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    /// Window the report covers.
    pub time_range: TimeRange,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Aggregate counts for the window.
    pub stats: ReportStats,
    /// Bucketed incident counts, chronological.
    pub time_series: Vec<TimeSeriesPoint>,
    /// Coarse-grid geographic distribution.
    pub geographic: Vec<GeoCell>,
    /// Week-over-week trend.
    pub trends: TrendMetrics,
    /// Response-time statistics for the window.
    pub performance: ResponseMetrics,
    /// Engagement totals for the window.
    pub engagement: EngagementMetrics,
    /// Qualifying hotspot clusters, highest severity score first.
    pub hotspots: Vec<Hotspot>,
}

/// A point-in-time safety assessment for a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyReport {
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Assessed point latitude.
    pub latitude: f64,
    /// Assessed point longitude.
    pub longitude: f64,
    /// Radius in kilometers the assessment covers.
    pub radius_km: f64,
    /// Safety score (0-100) for the point.
    pub safety_score: u8,
    /// Active incidents inside the radius.
    pub total_incidents: u64,
    /// Incident counts keyed by severity.
    pub severity_counts: BTreeMap<Severity, u64>,
    /// Newest incidents inside the radius.
    pub recent_incidents: Vec<HotspotIncident>,
    /// Hotspot clusters inside the radius.
    pub hotspots: Vec<Hotspot>,
}
