//! Query filters for incident and alert lookups.
//!
//! A filter is the push-down predicate a store implementation translates
//! into its native query. [`IncidentFilter::matches`] is the reference
//! predicate; any backend must agree with it.

use chrono::{DateTime, Utc};
use safewatch_report_models::{Alert, GeoPoint, Incident, IncidentStatus, Severity};

/// Meters per degree of latitude, the flat-earth approximation used for
/// radius filtering. Error is negligible at neighborhood scale.
const METERS_PER_DEGREE: f64 = 111_000.0;

/// A circular geographic constraint around a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoRadius {
    /// Center latitude in decimal degrees.
    pub latitude: f64,
    /// Center longitude in decimal degrees.
    pub longitude: f64,
    /// Radius in kilometers.
    pub radius_km: f64,
}

impl GeoRadius {
    /// Creates a radius constraint around a center point.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64, radius_km: f64) -> Self {
        Self {
            latitude,
            longitude,
            radius_km,
        }
    }

    /// Returns the radius converted to approximate decimal degrees.
    #[must_use]
    pub fn degree_radius(&self) -> f64 {
        self.radius_km * 1000.0 / METERS_PER_DEGREE
    }

    /// Whether the point falls inside the radius, measured in degree space.
    #[must_use]
    pub fn contains(&self, point: GeoPoint) -> bool {
        let d_lat = point.latitude - self.latitude;
        let d_lng = point.longitude - self.longitude;
        d_lat.hypot(d_lng) <= self.degree_radius()
    }
}

/// Predicate over incident documents. All set fields must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentFilter {
    /// Match the soft-delete flag.
    pub is_active: Option<bool>,
    /// Only incidents created at or after this instant.
    pub created_after: Option<DateTime<Utc>>,
    /// Only incidents created before this instant.
    pub created_before: Option<DateTime<Utc>>,
    /// Only incidents at this severity.
    pub severity: Option<Severity>,
    /// Only incidents with this status.
    pub status: Option<IncidentStatus>,
    /// Exclude incidents with this status.
    pub exclude_status: Option<IncidentStatus>,
    /// Require (or forbid) a verifying authority on record.
    pub verified: Option<bool>,
    /// Only incidents inside this radius.
    pub near: Option<GeoRadius>,
    /// Cap the number of documents returned by find queries. Ignored by
    /// counts and rollups.
    pub limit: Option<usize>,
}

impl IncidentFilter {
    /// Filter matching active incidents only, the base of every metrics
    /// query.
    #[must_use]
    pub fn active() -> Self {
        Self {
            is_active: Some(true),
            ..Self::default()
        }
    }

    /// Restricts to incidents created at or after `instant`.
    #[must_use]
    pub const fn created_after(mut self, instant: DateTime<Utc>) -> Self {
        self.created_after = Some(instant);
        self
    }

    /// Restricts to incidents created before `instant`.
    #[must_use]
    pub const fn created_before(mut self, instant: DateTime<Utc>) -> Self {
        self.created_before = Some(instant);
        self
    }

    /// Restricts to one severity level.
    #[must_use]
    pub const fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Restricts to one status.
    #[must_use]
    pub const fn with_status(mut self, status: IncidentStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Excludes one status.
    #[must_use]
    pub const fn without_status(mut self, status: IncidentStatus) -> Self {
        self.exclude_status = Some(status);
        self
    }

    /// Requires (`true`) or forbids (`false`) a verifying authority.
    #[must_use]
    pub const fn with_verified(mut self, verified: bool) -> Self {
        self.verified = Some(verified);
        self
    }

    /// Restricts to incidents inside the given radius.
    #[must_use]
    pub const fn near(mut self, radius: GeoRadius) -> Self {
        self.near = Some(radius);
        self
    }

    /// Caps find-query results.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether the incident satisfies every set field of this filter.
    #[must_use]
    pub fn matches(&self, incident: &Incident) -> bool {
        if let Some(active) = self.is_active
            && incident.is_active != active
        {
            return false;
        }
        if let Some(after) = self.created_after
            && incident.created_at < after
        {
            return false;
        }
        if let Some(before) = self.created_before
            && incident.created_at >= before
        {
            return false;
        }
        if let Some(severity) = self.severity
            && incident.severity != severity
        {
            return false;
        }
        if let Some(status) = self.status
            && incident.status != status
        {
            return false;
        }
        if let Some(excluded) = self.exclude_status
            && incident.status == excluded
        {
            return false;
        }
        if let Some(verified) = self.verified
            && incident.verified_by.is_some() != verified
        {
            return false;
        }
        if let Some(radius) = self.near
            && !radius.contains(incident.location)
        {
            return false;
        }
        true
    }
}

/// Predicate over alert documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertFilter {
    /// Match the soft-delete flag.
    pub is_active: Option<bool>,
    /// Only alerts issued at or after this instant.
    pub created_after: Option<DateTime<Utc>>,
}

impl AlertFilter {
    /// Filter matching active alerts only.
    #[must_use]
    pub fn active() -> Self {
        Self {
            is_active: Some(true),
            ..Self::default()
        }
    }

    /// Restricts to alerts issued at or after `instant`.
    #[must_use]
    pub const fn created_after(mut self, instant: DateTime<Utc>) -> Self {
        self.created_after = Some(instant);
        self
    }

    /// Whether the alert satisfies every set field of this filter.
    #[must_use]
    pub fn matches(&self, alert: &Alert) -> bool {
        if let Some(active) = self.is_active
            && alert.is_active != active
        {
            return false;
        }
        if let Some(after) = self.created_after
            && alert.created_at < after
        {
            return false;
        }
        true
    }
}
