//! Independent facet queries combined into snapshots and reports.
//!
//! Each facet is a standalone async function over the store trait that
//! returns one typed slice of a snapshot. Facets never share state; the
//! caller issues them concurrently and assembles the result once all of
//! them settle. Every ratio in here guards its divisor being zero by
//! returning 0 instead of propagating NaN or infinity.

use std::cmp::Reverse;

use chrono::{DateTime, Duration, NaiveTime, Utc, Weekday};
use safewatch_metrics_models::{
    AlertSummary, DayCount, EngagementMetrics, KeyCount, LocationMetrics, OverviewMetrics,
    ReportStats, ResponseMetrics, SeverityStats, TimeBucket, TimeSeriesPoint, TrendMetrics,
    TypeStats,
};
use safewatch_report_models::{GeoPoint, IncidentStatus, Severity};
use safewatch_store::filter::{AlertFilter, GeoRadius, IncidentFilter};
use safewatch_store::{ReportStore, StoreError};

use crate::safety;

/// Days of the week in dashboard order.
const WEEK_DAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

const fn day_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sun => "Sunday",
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
    }
}

const fn day_index(weekday: Weekday) -> usize {
    match weekday {
        Weekday::Sun => 0,
        Weekday::Mon => 1,
        Weekday::Tue => 2,
        Weekday::Wed => 3,
        Weekday::Thu => 4,
        Weekday::Fri => 5,
        Weekday::Sat => 6,
    }
}

/// Rounded percent change from `previous` to `current`, 0 when `previous`
/// is 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn percent_change(current: u64, previous: u64) -> i64 {
    if previous == 0 {
        return 0;
    }
    ((current as f64 - previous as f64) / previous as f64 * 100.0).round() as i64
}

/// Rounded percentage `part` makes of `whole`, 0 when `whole` is 0.
///
/// For part-of-whole rates, where the result cannot exceed 100.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn percent_of(part: u64, whole: u64) -> u8 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u8
}

/// Rounded ratio of `part` to `whole` as a percentage, 0 when `whole` is
/// 0. Unlike [`percent_of`], the counters are independent and the result
/// is unbounded above.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn percent_ratio(part: u64, whole: u64) -> u64 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u64
}

/// Mean of a pre-summed column, 0 when the group is empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(sum: f64, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    sum / count as f64
}

fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

fn days(n: i64) -> Duration {
    Duration::try_days(n).expect("constant fits in Duration")
}

/// Headline counts: total, today, yesterday, critical, resolved, verified,
/// plus the guarded day-over-day change and resolution rate.
///
/// # Errors
///
/// Returns [`StoreError`] if any count query fails.
pub async fn overview(
    store: &dyn ReportStore,
    base: &IncidentFilter,
    now: DateTime<Utc>,
) -> Result<OverviewMetrics, StoreError> {
    let today_start = start_of_day(now);
    let yesterday_start = today_start - days(1);

    let today_filter = base.clone().created_after(today_start);
    let yesterday_filter = base
        .clone()
        .created_after(yesterday_start)
        .created_before(today_start);
    let critical_filter = base.clone().with_severity(Severity::Critical);
    let resolved_filter = base.clone().with_status(IncidentStatus::Resolved);
    let verified_filter = base.clone().with_verified(true);

    let (total, today, yesterday, critical, resolved, verified) = futures::try_join!(
        store.count_incidents(base),
        store.count_incidents(&today_filter),
        store.count_incidents(&yesterday_filter),
        store.count_incidents(&critical_filter),
        store.count_incidents(&resolved_filter),
        store.count_incidents(&verified_filter),
    )?;

    Ok(OverviewMetrics {
        total,
        today,
        yesterday,
        critical,
        resolved,
        verified,
        change_from_yesterday: percent_change(today, yesterday),
        resolution_rate: percent_of(resolved, total),
    })
}

/// Week-over-week counts and the current week bucketed by day of week,
/// Sunday first. Days without incidents appear with a zero count.
///
/// `scope` must not carry its own date window; the facet applies the week
/// windows itself.
///
/// # Errors
///
/// Returns [`StoreError`] if any underlying query fails.
pub async fn trend(
    store: &dyn ReportStore,
    scope: &IncidentFilter,
    now: DateTime<Utc>,
) -> Result<TrendMetrics, StoreError> {
    let week_ago = now - days(7);
    let two_weeks_ago = now - days(14);

    let this_week_filter = scope.clone().created_after(week_ago);
    let last_week_filter = scope
        .clone()
        .created_after(two_weeks_ago)
        .created_before(week_ago);

    let (this_week, last_week, weekdays) = futures::try_join!(
        store.count_incidents(&this_week_filter),
        store.count_incidents(&last_week_filter),
        store.weekday_counts(&this_week_filter),
    )?;

    let mut daily_breakdown: Vec<DayCount> = WEEK_DAYS
        .iter()
        .map(|weekday| DayCount {
            day: day_name(*weekday).to_owned(),
            count: 0,
        })
        .collect();
    for row in weekdays {
        daily_breakdown[day_index(row.weekday)].count = row.count;
    }

    Ok(TrendMetrics {
        this_week,
        last_week,
        weekly_change: percent_change(this_week, last_week),
        daily_breakdown,
    })
}

/// Per-severity aggregates: count, mean response time, verification score.
///
/// # Errors
///
/// Returns [`StoreError`] if the rollup query fails.
pub async fn severity_breakdown(
    store: &dyn ReportStore,
    base: &IncidentFilter,
) -> Result<std::collections::BTreeMap<Severity, SeverityStats>, StoreError> {
    let rows = store.severity_rollup(base).await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            (
                row.severity,
                SeverityStats {
                    count: row.count,
                    avg_response_minutes: mean(row.response_minutes_sum, row.response_count),
                    verification_score: percent_of(row.verified, row.count),
                },
            )
        })
        .collect())
}

/// Per-category aggregates sorted by count descending: count, mean
/// severity weight, total views.
///
/// # Errors
///
/// Returns [`StoreError`] if the rollup query fails.
#[allow(clippy::cast_precision_loss)]
pub async fn type_breakdown(
    store: &dyn ReportStore,
    base: &IncidentFilter,
) -> Result<Vec<TypeStats>, StoreError> {
    let rows = store.category_rollup(base).await?;
    let mut types: Vec<TypeStats> = rows
        .into_iter()
        .map(|row| TypeStats {
            category: row.category,
            count: row.count,
            avg_severity: mean(row.severity_weight_sum as f64, row.count),
            total_views: row.total_views,
        })
        .collect();
    types.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(types)
}

/// Response-time statistics over responded-and-verified incidents. The
/// zero-valued record stands in when no incident qualifies.
///
/// # Errors
///
/// Returns [`StoreError`] if the summary query fails.
pub async fn response_metrics(
    store: &dyn ReportStore,
    base: &IncidentFilter,
) -> Result<ResponseMetrics, StoreError> {
    let summary = store.response_time_summary(base).await?;
    Ok(summary.map_or_else(ResponseMetrics::default, |row| ResponseMetrics {
        avg_response_minutes: row.avg_minutes,
        min_response_minutes: row.min_minutes,
        max_response_minutes: row.max_minutes,
        total_verified: row.count,
    }))
}

/// Engagement totals plus the guarded engagement rate.
///
/// # Errors
///
/// Returns [`StoreError`] if the totals query fails.
pub async fn engagement(
    store: &dyn ReportStore,
    base: &IncidentFilter,
) -> Result<EngagementMetrics, StoreError> {
    let totals = store.engagement_totals(base).await?;
    Ok(EngagementMetrics {
        total_views: totals.views,
        total_engagements: totals.engagements,
        total_votes: totals.votes,
        engagement_rate: percent_ratio(totals.engagements, totals.views),
    })
}

/// Aggregate counts for an analytics report window.
///
/// # Errors
///
/// Returns [`StoreError`] if any count query fails.
pub async fn report_stats(
    store: &dyn ReportStore,
    base: &IncidentFilter,
) -> Result<ReportStats, StoreError> {
    let critical_filter = base.clone().with_severity(Severity::Critical);
    let resolved_filter = base.clone().with_status(IncidentStatus::Resolved);
    let verified_filter = base.clone().with_verified(true);

    let (total, critical, resolved, verified) = futures::try_join!(
        store.count_incidents(base),
        store.count_incidents(&critical_filter),
        store.count_incidents(&resolved_filter),
        store.count_incidents(&verified_filter),
    )?;

    Ok(ReportStats {
        total,
        critical,
        resolved,
        verified,
        resolution_rate: percent_of(resolved, total),
    })
}

/// Bucketed incident counts over the window, chronological.
///
/// # Errors
///
/// Returns [`StoreError`] if the grouping query fails.
pub async fn time_series(
    store: &dyn ReportStore,
    base: &IncidentFilter,
    bucket: TimeBucket,
) -> Result<Vec<TimeSeriesPoint>, StoreError> {
    let rows = store.time_series(base, bucket).await?;
    Ok(rows
        .into_iter()
        .map(|row| TimeSeriesPoint {
            bucket: row.bucket,
            count: row.count,
        })
        .collect())
}

/// Alert activity over the trailing 24 hours.
///
/// Degrades on failure: a failed alert query yields the zero-valued
/// summary and a logged warning instead of failing the whole snapshot.
pub async fn alert_summary(store: &dyn ReportStore, now: DateTime<Utc>) -> AlertSummary {
    let window = AlertFilter::active()
        .created_after(now - Duration::try_hours(24).expect("constant fits in Duration"));
    match store.alert_summary_facets(&window).await {
        Ok(facets) => AlertSummary {
            total: facets.total,
            by_kind: facets
                .by_kind
                .into_iter()
                .map(|(kind, count)| KeyCount {
                    key: kind.to_string(),
                    count,
                })
                .collect(),
            by_priority: facets
                .by_priority
                .into_iter()
                .map(|(priority, count)| KeyCount {
                    key: priority.to_string(),
                    count,
                })
                .collect(),
            delivery_rate: percent_of(facets.delivered, facets.total),
        },
        Err(e) => {
            log::warn!("Alert summary query failed, substituting zeroed summary: {e}");
            AlertSummary::default()
        }
    }
}

/// Location-conditioned metrics around a point: counts, dominant category,
/// and the safety score for the area.
///
/// # Errors
///
/// Returns [`StoreError`] if a count or rollup query fails. The embedded
/// safety score never fails; it degrades to its neutral value instead.
pub async fn location(
    store: &dyn ReportStore,
    point: GeoPoint,
    radius_km: f64,
) -> Result<LocationMetrics, StoreError> {
    let area = GeoRadius::new(point.latitude, point.longitude, radius_km);
    let base = IncidentFilter::active().near(area);
    let critical_filter = base.clone().with_severity(Severity::Critical);

    let (incident_count, critical_count, categories) = futures::try_join!(
        store.count_incidents(&base),
        store.count_incidents(&critical_filter),
        store.category_rollup(&base),
    )?;

    let dominant_category = categories
        .iter()
        .max_by_key(|row| (row.count, Reverse(row.category)))
        .map(|row| row.category);
    let safety_score =
        safety::safety_score(store, point.latitude, point.longitude, radius_km).await;

    Ok(LocationMetrics {
        latitude: point.latitude,
        longitude: point.longitude,
        radius_km,
        incident_count,
        critical_count,
        dominant_category,
        safety_score,
    })
}
