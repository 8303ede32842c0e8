//! Geographic grid distribution and hotspot clustering.
//!
//! Both computations bucket incident coordinates onto a 0.01 degree grid
//! (two decimal places, roughly a city block at mid latitudes). They are
//! pure functions over an already fetched incident set so a report derives
//! both from a single store query.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use safewatch_metrics_models::{GeoCell, Hotspot, HotspotIncident, RiskLevel};
use safewatch_report_models::{GeoPoint, Incident, IncidentCategory, Severity};

/// Grid cells per degree; 100 gives 0.01 degree cells.
const CELL_SCALE: f64 = 100.0;

/// Minimum member incidents for a cell to qualify as a hotspot.
const MIN_HOTSPOT_MEMBERS: usize = 3;

/// Hotspot output cap, highest severity first.
const MAX_HOTSPOTS: usize = 20;

/// Member incident summaries carried per hotspot.
const RECENT_MEMBERS: usize = 5;

#[allow(clippy::cast_possible_truncation)]
fn cell_key(point: GeoPoint) -> (i64, i64) {
    (
        (point.latitude * CELL_SCALE).round() as i64,
        (point.longitude * CELL_SCALE).round() as i64,
    )
}

#[allow(clippy::cast_precision_loss)]
const fn cell_center(key: (i64, i64)) -> GeoPoint {
    GeoPoint::new(key.0 as f64 / CELL_SCALE, key.1 as f64 / CELL_SCALE)
}

fn modal_category(counts: &BTreeMap<IncidentCategory, u64>) -> Option<IncidentCategory> {
    counts
        .iter()
        .max_by_key(|(category, count)| (**count, Reverse(**category)))
        .map(|(category, _)| *category)
}

#[derive(Default)]
struct CellAcc {
    count: u64,
    critical: u64,
    categories: BTreeMap<IncidentCategory, u64>,
}

/// Groups incidents into grid cells with per-cell count, critical count,
/// and modal category. Cells come out in grid order; empty input yields an
/// empty list.
#[must_use]
pub fn geographic_cells(incidents: &[Incident]) -> Vec<GeoCell> {
    let mut cells: BTreeMap<(i64, i64), CellAcc> = BTreeMap::new();
    for incident in incidents {
        let acc = cells.entry(cell_key(incident.location)).or_default();
        acc.count += 1;
        if incident.severity == Severity::Critical {
            acc.critical += 1;
        }
        *acc.categories.entry(incident.category).or_insert(0) += 1;
    }

    cells
        .into_iter()
        .map(|(key, acc)| {
            let center = cell_center(key);
            GeoCell {
                latitude: center.latitude,
                longitude: center.longitude,
                count: acc.count,
                critical_count: acc.critical,
                dominant_category: modal_category(&acc.categories),
            }
        })
        .collect()
}

/// Clusters incidents into hotspots: grid cells with at least 3 members,
/// scored by summed severity weight, sorted by score then member count
/// descending, capped at 20.
#[must_use]
pub fn hotspots(incidents: &[Incident]) -> Vec<Hotspot> {
    let mut cells: BTreeMap<(i64, i64), Vec<&Incident>> = BTreeMap::new();
    for incident in incidents {
        cells
            .entry(cell_key(incident.location))
            .or_default()
            .push(incident);
    }

    let mut spots: Vec<Hotspot> = cells
        .into_iter()
        .filter(|(_, members)| members.len() >= MIN_HOTSPOT_MEMBERS)
        .map(|(key, mut members)| {
            let severity_score: u32 = members
                .iter()
                .map(|incident| incident.severity.weight())
                .sum();
            members.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            let recent_incidents = members
                .iter()
                .take(RECENT_MEMBERS)
                .map(|incident| HotspotIncident::from(*incident))
                .collect();
            Hotspot {
                center: cell_center(key),
                incident_count: members.len() as u64,
                severity_score,
                risk_level: RiskLevel::classify(severity_score),
                recent_incidents,
            }
        })
        .collect();

    spots.sort_by(|a, b| {
        b.severity_score
            .cmp(&a.severity_score)
            .then(b.incident_count.cmp(&a.incident_count))
    });
    spots.truncate(MAX_HOTSPOTS);
    spots
}
