#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Incident and alert document types shared across the safewatch system.
//!
//! This crate defines the canonical severity/category taxonomy and the
//! document shapes that citizens and authorities submit. All metrics and
//! analytics are computed over these types; the persistent store and the
//! API layer both speak them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Severity level for an incident, from 1 (low) to 4 (critical).
///
/// The numeric weight feeds the breakdown averages, hotspot scoring, and
/// the safety score model.
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
pub enum Severity {
    /// Nuisance-level incidents (noise, minor vandalism)
    Low = 1,
    /// Incidents warranting attention (theft, harassment)
    Medium = 2,
    /// Dangerous incidents (assault, fire)
    High = 3,
    /// Life-threatening incidents requiring immediate response
    Critical = 4,
}

impl Severity {
    /// Returns the numeric weight of this severity level (1-4).
    #[must_use]
    pub const fn weight(self) -> u32 {
        self as u32
    }

    /// Creates a severity level from a numeric weight.
    ///
    /// # Errors
    ///
    /// Returns an error if the weight is not in the range 1-4.
    pub const fn from_weight(weight: u32) -> Result<Self, InvalidSeverityError> {
        match weight {
            1 => Ok(Self::Low),
            2 => Ok(Self::Medium),
            3 => Ok(Self::High),
            4 => Ok(Self::Critical),
            _ => Err(InvalidSeverityError { weight }),
        }
    }

    /// Returns all variants of this enum, lowest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Low, Self::Medium, Self::High, Self::Critical]
    }
}

/// Error returned when attempting to create a [`Severity`] from an invalid
/// numeric weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSeverityError {
    /// The invalid weight that was provided.
    pub weight: u32,
}

impl std::fmt::Display for InvalidSeverityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid severity weight {}: expected 1-4", self.weight)
    }
}

impl std::error::Error for InvalidSeverityError {}

/// Lifecycle status of an incident report.
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
pub enum IncidentStatus {
    /// Submitted by a citizen, not yet reviewed
    Reported,
    /// Confirmed by an authority
    Verified,
    /// Handled and closed
    Resolved,
    /// Reviewed and rejected (duplicate, spam, unfounded)
    Dismissed,
}

/// Incident type taxonomy for community safety reports.
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
pub enum IncidentCategory {
    /// Theft, burglary, or robbery
    Theft,
    /// Physical attack or threat of violence
    Assault,
    /// Verbal abuse, stalking, intimidation
    Harassment,
    /// Property damage or graffiti
    Vandalism,
    /// Suspicious person, vehicle, or activity
    SuspiciousActivity,
    /// Road hazard, dangerous driving, collision
    TrafficHazard,
    /// Fire or smoke sighting
    Fire,
    /// Medical emergency in a public space
    MedicalEmergency,
    /// Anything not covered by the other categories
    Other,
}

impl IncidentCategory {
    /// Returns the severity pre-selected for this category when a report
    /// is submitted without one.
    #[must_use]
    pub const fn default_severity(self) -> Severity {
        match self {
            Self::Fire | Self::MedicalEmergency => Severity::Critical,
            Self::Assault => Severity::High,
            Self::Theft | Self::TrafficHazard => Severity::Medium,
            Self::Harassment | Self::Vandalism | Self::SuspiciousActivity | Self::Other => {
                Severity::Low
            }
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Theft,
            Self::Assault,
            Self::Harassment,
            Self::Vandalism,
            Self::SuspiciousActivity,
            Self::TrafficHazard,
            Self::Fire,
            Self::MedicalEmergency,
            Self::Other,
        ]
    }
}

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    /// Latitude in decimal degrees, positive north.
    pub latitude: f64,
    /// Longitude in decimal degrees, positive east.
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a point from latitude and longitude in decimal degrees.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// View and engagement counters attached to an incident.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementStats {
    /// Times the incident was opened in a client.
    pub views: u64,
    /// Shares, comments, and other active interactions.
    pub engagements: u64,
}

/// A community confirmation or dispute vote on an incident.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityVote {
    /// The voting user.
    pub user_id: Uuid,
    /// `true` confirms the report, `false` disputes it.
    pub upvote: bool,
    /// When the vote was cast.
    pub voted_at: DateTime<Utc>,
}

/// A geolocated incident report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    /// Unique incident ID.
    pub id: Uuid,
    /// Incident type.
    pub category: IncidentCategory,
    /// Severity level.
    pub severity: Severity,
    /// Lifecycle status.
    pub status: IncidentStatus,
    /// Free-text description supplied by the reporter.
    pub description: Option<String>,
    /// Where the incident happened.
    pub location: GeoPoint,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// The submitting user, if authenticated.
    pub reporter_id: Option<Uuid>,
    /// The authority user who verified the report, if any.
    pub verified_by: Option<Uuid>,
    /// Minutes from report to first authority response, once known.
    pub response_minutes: Option<f64>,
    /// Soft-delete flag; metrics only consider active incidents.
    pub is_active: bool,
    /// View/engagement counters.
    pub analytics: EngagementStats,
    /// Community confirmation votes.
    pub community_votes: Vec<CommunityVote>,
}

impl Incident {
    /// Creates an active, freshly reported incident with a random ID.
    #[must_use]
    pub fn new(
        category: IncidentCategory,
        severity: Severity,
        location: GeoPoint,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            category,
            severity,
            status: IncidentStatus::Reported,
            description: None,
            location,
            created_at,
            reporter_id: None,
            verified_by: None,
            response_minutes: None,
            is_active: true,
            analytics: EngagementStats::default(),
            community_votes: Vec::new(),
        }
    }

    /// Sets the lifecycle status.
    #[must_use]
    pub const fn with_status(mut self, status: IncidentStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the free-text description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the incident verified by the given authority user.
    #[must_use]
    pub const fn with_verified_by(mut self, authority: Uuid) -> Self {
        self.verified_by = Some(authority);
        self
    }

    /// Records the authority response time in minutes.
    #[must_use]
    pub const fn with_response_minutes(mut self, minutes: f64) -> Self {
        self.response_minutes = Some(minutes);
        self
    }

    /// Sets the view/engagement counters.
    #[must_use]
    pub const fn with_engagement(mut self, views: u64, engagements: u64) -> Self {
        self.analytics = EngagementStats { views, engagements };
        self
    }

    /// Attaches community votes.
    #[must_use]
    pub fn with_votes(mut self, votes: Vec<CommunityVote>) -> Self {
        self.community_votes = votes;
        self
    }

    /// Sets the submitting user.
    #[must_use]
    pub const fn with_reporter(mut self, reporter: Uuid) -> Self {
        self.reporter_id = Some(reporter);
        self
    }

    /// Deactivates the incident (soft delete).
    #[must_use]
    pub const fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// Broad classification of an alert.
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
pub enum AlertKind {
    /// Immediate danger, issued by authorities
    Emergency,
    /// General safety advisory
    Safety,
    /// Severe weather warning
    Weather,
    /// Road closure or traffic disruption
    Traffic,
    /// Neighborhood-level community notice
    Community,
}

/// Urgency of an alert, used for delivery prioritization.
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
pub enum AlertPriority {
    /// Informational
    Low,
    /// Should be seen soon
    Medium,
    /// Should be seen immediately
    High,
    /// Push through every channel
    Critical,
}

/// A broadcast alert issued by an authority or the community.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Unique alert ID.
    pub id: Uuid,
    /// Alert classification.
    pub kind: AlertKind,
    /// Delivery urgency.
    pub priority: AlertPriority,
    /// Alert text shown to users.
    pub message: String,
    /// Affected area center, when the alert is localized.
    pub location: Option<GeoPoint>,
    /// When the alert was issued.
    pub created_at: DateTime<Utc>,
    /// Whether delivery to subscribers completed.
    pub delivered: bool,
    /// Soft-delete flag.
    pub is_active: bool,
}

impl Alert {
    /// Creates an active, undelivered alert with a random ID.
    #[must_use]
    pub fn new(
        kind: AlertKind,
        priority: AlertPriority,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            priority,
            message: message.into(),
            location: None,
            created_at,
            delivered: false,
            is_active: true,
        }
    }

    /// Sets the affected area center.
    #[must_use]
    pub const fn with_location(mut self, location: GeoPoint) -> Self {
        self.location = Some(location);
        self
    }

    /// Marks delivery as completed.
    #[must_use]
    pub const fn delivered(mut self) -> Self {
        self.delivered = true;
        self
    }
}

/// The consumer role a metrics snapshot is computed for.
///
/// Snapshots are cached per role so authority dashboards and citizen maps
/// can diverge later without a cache-key migration.
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
pub enum ConsumerRole {
    /// Resident viewing the public map and dashboard
    Citizen,
    /// Responder or moderator
    Authority,
    /// Operations staff; also the role the refresh loop computes for
    Admin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_weights_are_one_to_four() {
        assert_eq!(Severity::Low.weight(), 1);
        assert_eq!(Severity::Medium.weight(), 2);
        assert_eq!(Severity::High.weight(), 3);
        assert_eq!(Severity::Critical.weight(), 4);
    }

    #[test]
    fn severity_round_trips_through_weight() {
        for severity in Severity::all() {
            assert_eq!(Severity::from_weight(severity.weight()), Ok(*severity));
        }
    }

    #[test]
    fn rejects_out_of_range_weight() {
        assert!(Severity::from_weight(0).is_err());
        assert!(Severity::from_weight(5).is_err());
    }

    #[test]
    fn severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
    }

    #[test]
    fn category_serializes_snake_case() {
        let json = serde_json::to_string(&IncidentCategory::SuspiciousActivity).unwrap();
        assert_eq!(json, "\"suspicious_activity\"");
    }

    #[test]
    fn new_incident_is_active_and_reported() {
        let incident = Incident::new(
            IncidentCategory::Theft,
            IncidentCategory::Theft.default_severity(),
            GeoPoint::new(40.71, -74.0),
            Utc::now(),
        );
        assert!(incident.is_active);
        assert_eq!(incident.status, IncidentStatus::Reported);
        assert_eq!(incident.severity, Severity::Medium);
        assert!(incident.verified_by.is_none());
    }

    #[test]
    fn builder_methods_compose() {
        let authority = Uuid::new_v4();
        let incident = Incident::new(
            IncidentCategory::Assault,
            Severity::High,
            GeoPoint::new(40.71, -74.0),
            Utc::now(),
        )
        .with_status(IncidentStatus::Resolved)
        .with_verified_by(authority)
        .with_response_minutes(12.5)
        .with_engagement(100, 20);

        assert_eq!(incident.status, IncidentStatus::Resolved);
        assert_eq!(incident.verified_by, Some(authority));
        assert_eq!(incident.response_minutes, Some(12.5));
        assert_eq!(incident.analytics.views, 100);
    }
}
