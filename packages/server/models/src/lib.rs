#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! API request and response types for the safewatch server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the domain document types to allow independent evolution of the
//! API contract.

use chrono::{DateTime, Utc};
use safewatch_metrics_models::{AnalyticsOptions, TimeRange};
use safewatch_report_models::{
    Alert, AlertKind, AlertPriority, ConsumerRole, GeoPoint, Incident, IncidentCategory, Severity,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Radius applied to safety queries that omit one.
pub const DEFAULT_SAFETY_RADIUS_KM: f64 = 5.0;

/// Result cap applied to incident list queries that omit one.
pub const DEFAULT_INCIDENT_LIMIT: usize = 100;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Query parameters for the dashboard metrics endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQueryParams {
    /// Consumer role the snapshot is keyed by. Defaults to `citizen`.
    pub role: Option<ConsumerRole>,
    /// Latitude for the location-conditioned facet.
    pub lat: Option<f64>,
    /// Longitude for the location-conditioned facet.
    pub lng: Option<f64>,
}

impl DashboardQueryParams {
    /// The location facet's center, present only when both coordinates
    /// were supplied.
    #[must_use]
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        }
    }
}

/// Query parameters for the analytics report endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQueryParams {
    /// Window token (`24h`, `7d`, `30d`, `90d`, `1y`). Unknown tokens
    /// fall back to `30d`.
    pub time_range: Option<String>,
    /// Latitude restricting the report area.
    pub lat: Option<f64>,
    /// Longitude restricting the report area.
    pub lng: Option<f64>,
    /// Area radius in kilometers.
    pub radius_km: Option<f64>,
    /// Whether resolved incidents count toward the report.
    pub include_resolved: Option<bool>,
}

impl From<&AnalyticsQueryParams> for AnalyticsOptions {
    fn from(params: &AnalyticsQueryParams) -> Self {
        let defaults = Self::default();
        Self {
            time_range: params
                .time_range
                .as_deref()
                .map_or_else(TimeRange::default, TimeRange::parse),
            location: match (params.lat, params.lng) {
                (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
                _ => None,
            },
            radius_km: params.radius_km.unwrap_or(defaults.radius_km),
            include_resolved: params.include_resolved.unwrap_or(defaults.include_resolved),
        }
    }
}

/// Query parameters for the safety score and safety report endpoints.
///
/// Coordinates are not validated here; a missing coordinate flows into
/// the score as NaN and takes the calculator's fail-soft neutral path.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyQueryParams {
    /// Latitude of the assessed point.
    pub lat: Option<f64>,
    /// Longitude of the assessed point.
    pub lng: Option<f64>,
    /// Assessment radius in kilometers.
    pub radius_km: Option<f64>,
}

impl SafetyQueryParams {
    /// Latitude, NaN when absent.
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.lat.unwrap_or(f64::NAN)
    }

    /// Longitude, NaN when absent.
    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.lng.unwrap_or(f64::NAN)
    }

    /// Radius in kilometers, defaulted when absent.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius_km.unwrap_or(DEFAULT_SAFETY_RADIUS_KM)
    }
}

/// Query parameters for the incident list endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentQueryParams {
    /// Latitude restricting results to an area.
    pub lat: Option<f64>,
    /// Longitude restricting results to an area.
    pub lng: Option<f64>,
    /// Area radius in kilometers.
    pub radius_km: Option<f64>,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

/// Body of an incident submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitIncidentRequest {
    /// Incident type.
    pub category: IncidentCategory,
    /// Severity level; the category's default severity when omitted.
    pub severity: Option<Severity>,
    /// Free-text description.
    pub description: Option<String>,
    /// Latitude of the incident.
    pub latitude: f64,
    /// Longitude of the incident.
    pub longitude: f64,
    /// The submitting user, if authenticated.
    pub reporter_id: Option<Uuid>,
}

impl SubmitIncidentRequest {
    /// Builds the incident document this submission describes.
    #[must_use]
    pub fn into_incident(self, now: DateTime<Utc>) -> Incident {
        let severity = self
            .severity
            .unwrap_or_else(|| self.category.default_severity());
        let mut incident = Incident::new(
            self.category,
            severity,
            GeoPoint::new(self.latitude, self.longitude),
            now,
        );
        if let Some(description) = self.description {
            incident = incident.with_description(description);
        }
        if let Some(reporter) = self.reporter_id {
            incident = incident.with_reporter(reporter);
        }
        incident
    }
}

/// Body of an alert submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAlertRequest {
    /// Alert classification.
    pub kind: AlertKind,
    /// Delivery urgency.
    pub priority: AlertPriority,
    /// Alert text shown to users.
    pub message: String,
    /// Affected area center latitude.
    pub latitude: Option<f64>,
    /// Affected area center longitude.
    pub longitude: Option<f64>,
}

impl SubmitAlertRequest {
    /// Builds the alert document this submission describes.
    #[must_use]
    pub fn into_alert(self, now: DateTime<Utc>) -> Alert {
        let mut alert = Alert::new(self.kind, self.priority, self.message, now);
        if let (Some(lat), Some(lng)) = (self.latitude, self.longitude) {
            alert = alert.with_location(GeoPoint::new(lat, lng));
        }
        alert
    }
}

/// Response to a successful submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    /// ID assigned to the stored document.
    pub id: Uuid,
}
