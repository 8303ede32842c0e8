#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Metrics and analytics aggregation engine.
//!
//! Computes dashboard snapshots and on-demand analytics reports over the
//! incident/alert store: facet queries run concurrently and are combined
//! into one immutable result, cached per (role, location) with a TTL, and
//! periodically recomputed by a background refresh loop that pushes each
//! fresh global snapshot to subscribers.
//!
//! Services are plain constructed objects. Nothing here starts at module
//! load; the hosting process owns construction, the refresh loop's
//! lifecycle, and shutdown ordering.

pub mod cache;
pub mod facets;
pub mod geo;
pub mod publish;
pub mod refresh;
pub mod safety;
pub mod service;

#[cfg(test)]
mod test_support;

use safewatch_store::StoreError;

/// Errors surfaced by the aggregation services.
///
/// The Display form is what callers see. The underlying store failure is
/// chained as the source and logged where the error is raised, never
/// rendered to clients.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Snapshot aggregation failed.
    #[error("Failed to retrieve metrics")]
    Aggregation(#[source] StoreError),

    /// Analytics report generation failed.
    #[error("Failed to generate analytics report")]
    Report(#[source] StoreError),
}
