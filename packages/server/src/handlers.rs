//! HTTP handler functions for the safewatch API.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use safewatch_metrics_models::AnalyticsOptions;
use safewatch_report_models::ConsumerRole;
use safewatch_server_models::{
    AnalyticsQueryParams, ApiHealth, DEFAULT_INCIDENT_LIMIT, DEFAULT_SAFETY_RADIUS_KM,
    DashboardQueryParams, IncidentQueryParams, SafetyQueryParams, SubmitAlertRequest,
    SubmitIncidentRequest, SubmitResponse,
};
use safewatch_store::filter::{GeoRadius, IncidentFilter};
use tokio::sync::broadcast::error::RecvError;

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/incidents`
///
/// Lists active incidents newest-first, optionally restricted to a
/// radius around a point.
pub async fn list_incidents(
    state: web::Data<AppState>,
    params: web::Query<IncidentQueryParams>,
) -> HttpResponse {
    let mut filter =
        IncidentFilter::active().with_limit(params.limit.unwrap_or(DEFAULT_INCIDENT_LIMIT));
    if let (Some(lat), Some(lng)) = (params.lat, params.lng) {
        let radius = params.radius_km.unwrap_or(DEFAULT_SAFETY_RADIUS_KM);
        filter = filter.near(GeoRadius::new(lat, lng, radius));
    }

    match state.store.find_incidents(&filter).await {
        Ok(incidents) => HttpResponse::Ok().json(incidents),
        Err(e) => {
            log::error!("Failed to query incidents: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to query incidents"
            }))
        }
    }
}

/// `POST /api/incidents`
///
/// Stores a citizen or authority incident submission.
pub async fn submit_incident(
    state: web::Data<AppState>,
    body: web::Json<SubmitIncidentRequest>,
) -> HttpResponse {
    let incident = body.into_inner().into_incident(Utc::now());
    let id = incident.id;

    match state.store.insert_incident(incident).await {
        Ok(()) => HttpResponse::Created().json(SubmitResponse { id }),
        Err(e) => {
            log::error!("Failed to store incident submission: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to submit incident"
            }))
        }
    }
}

/// `POST /api/alerts`
///
/// Stores an alert issued by an authority or the community.
pub async fn submit_alert(
    state: web::Data<AppState>,
    body: web::Json<SubmitAlertRequest>,
) -> HttpResponse {
    let alert = body.into_inner().into_alert(Utc::now());
    let id = alert.id;

    match state.store.insert_alert(alert).await {
        Ok(()) => HttpResponse::Created().json(SubmitResponse { id }),
        Err(e) => {
            log::error!("Failed to store alert submission: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to submit alert"
            }))
        }
    }
}

/// `GET /api/metrics/dashboard`
///
/// Returns the dashboard snapshot for the requested role, cached per
/// (role, location).
pub async fn dashboard_metrics(
    state: web::Data<AppState>,
    params: web::Query<DashboardQueryParams>,
) -> HttpResponse {
    let role = params.role.unwrap_or(ConsumerRole::Citizen);

    match state.metrics.dashboard_metrics(role, params.location()).await {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot.as_ref()),
        // The service already logged the cause; the Display form is the
        // client-safe generic message.
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": e.to_string()
        })),
    }
}

/// `GET /api/metrics/stream`
///
/// SSE stream of published metrics events. Each broadcast snapshot
/// arrives as one `event:`/`data:` frame; a lagged subscriber skips
/// dropped events and keeps reading.
pub async fn metrics_stream(state: web::Data<AppState>) -> HttpResponse {
    let mut rx = state.publisher.subscribe();

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => match serde_json::to_string(&event.payload) {
                    Ok(json) => {
                        let frame = format!("event: {}\ndata: {json}\n\n", event.name);
                        yield Ok::<_, actix_web::Error>(web::Bytes::from(frame));
                    }
                    Err(e) => log::error!("Failed to serialize stream event: {e}"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Metrics stream subscriber lagged, skipped {skipped} events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream)
}

/// `GET /api/analytics/incidents`
///
/// Generates an analytics report for the requested window and area.
pub async fn incident_analytics(
    state: web::Data<AppState>,
    params: web::Query<AnalyticsQueryParams>,
) -> HttpResponse {
    let options = AnalyticsOptions::from(&*params);

    match state.analytics.incident_analytics(&options).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": e.to_string()
        })),
    }
}

/// `GET /api/analytics/safety-score`
///
/// Returns the 0-100 safety score for a point. Never fails; malformed
/// coordinates score the neutral midpoint.
pub async fn safety_score(
    state: web::Data<AppState>,
    params: web::Query<SafetyQueryParams>,
) -> HttpResponse {
    let score = state
        .analytics
        .safety_score(params.latitude(), params.longitude(), params.radius())
        .await;

    HttpResponse::Ok().json(serde_json::json!({
        "latitude": params.lat,
        "longitude": params.lng,
        "radiusKm": params.radius(),
        "safetyScore": score,
    }))
}

/// `GET /api/analytics/safety-report`
///
/// Returns the full safety assessment for a point.
pub async fn safety_report(
    state: web::Data<AppState>,
    params: web::Query<SafetyQueryParams>,
) -> HttpResponse {
    match state
        .analytics
        .safety_report(params.latitude(), params.longitude(), params.radius())
        .await
    {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": e.to_string()
        })),
    }
}

/// `POST /api/admin/cache/clear`
///
/// Drops every cached snapshot, effective before the next request.
pub async fn clear_metrics_cache(state: web::Data<AppState>) -> HttpResponse {
    state.metrics.clear_cache();
    HttpResponse::Ok().json(serde_json::json!({ "cleared": true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};
    use safewatch_metrics::cache::SnapshotCache;
    use safewatch_metrics::publish::BroadcastPublisher;
    use safewatch_metrics::service::{AnalyticsService, MetricsService};
    use safewatch_report_models::{GeoPoint, Incident, IncidentCategory, Severity};
    use safewatch_store::ReportStore;
    use safewatch_store::memory::MemoryStore;
    use std::sync::Arc;

    fn test_state(store: MemoryStore) -> web::Data<AppState> {
        let store: Arc<dyn ReportStore> = Arc::new(store);
        web::Data::new(AppState {
            store: Arc::clone(&store),
            metrics: Arc::new(MetricsService::new(
                Arc::clone(&store),
                SnapshotCache::default(),
                30,
            )),
            analytics: Arc::new(AnalyticsService::new(Arc::clone(&store))),
            publisher: Arc::new(BroadcastPublisher::new()),
        })
    }

    #[actix_web::test]
    async fn health_reports_healthy() {
        let app = test::init_service(
            App::new()
                .app_data(test_state(MemoryStore::new()))
                .configure(crate::configure_api),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/health").to_request(),
        )
        .await;
        assert!(resp.status().is_success());
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["healthy"], true);
    }

    #[actix_web::test]
    async fn submit_then_list_round_trips() {
        let app = test::init_service(
            App::new()
                .app_data(test_state(MemoryStore::new()))
                .configure(crate::configure_api),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/incidents")
                .set_json(serde_json::json!({
                    "category": "theft",
                    "latitude": 40.71,
                    "longitude": -74.0,
                }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::CREATED);

        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/incidents").to_request(),
        )
        .await;
        assert!(resp.status().is_success());
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["category"], "theft");
        // Theft submissions without a severity default to medium.
        assert_eq!(body[0]["severity"], "medium");
    }

    #[actix_web::test]
    async fn dashboard_returns_snapshot_for_seeded_store() {
        let state = test_state(MemoryStore::new());
        state
            .store
            .insert_incident(Incident::new(
                IncidentCategory::Fire,
                Severity::Critical,
                GeoPoint::new(40.71, -74.0),
                Utc::now(),
            ))
            .await
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(state)
                .configure(crate::configure_api),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/metrics/dashboard")
                .to_request(),
        )
        .await;
        assert!(resp.status().is_success());
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["overview"]["total"], 1);
        assert_eq!(body["overview"]["critical"], 1);
        assert_eq!(body["refreshRateSeconds"], 30);
        assert!(body["location"].is_null());
    }

    #[actix_web::test]
    async fn safety_score_is_neutral_without_coordinates() {
        let app = test::init_service(
            App::new()
                .app_data(test_state(MemoryStore::new()))
                .configure(crate::configure_api),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/analytics/safety-score")
                .to_request(),
        )
        .await;
        assert!(resp.status().is_success());
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["safetyScore"], 50);
    }

    #[actix_web::test]
    async fn analytics_report_carries_requested_window() {
        let state = test_state(MemoryStore::new());
        state
            .store
            .insert_incident(Incident::new(
                IncidentCategory::Theft,
                Severity::Medium,
                GeoPoint::new(40.71, -74.0),
                Utc::now(),
            ))
            .await
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(state)
                .configure(crate::configure_api),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/analytics/incidents?timeRange=7d")
                .to_request(),
        )
        .await;
        assert!(resp.status().is_success());
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["timeRange"], "7d");
        assert_eq!(body["stats"]["total"], 1);
    }

    #[actix_web::test]
    async fn cache_clear_acknowledges() {
        let app = test::init_service(
            App::new()
                .app_data(test_state(MemoryStore::new()))
                .configure(crate::configure_api),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/admin/cache/clear")
                .to_request(),
        )
        .await;
        assert!(resp.status().is_success());
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["cleared"], true);
    }

    #[actix_web::test]
    async fn metrics_stream_opens_an_event_stream() {
        let app = test::init_service(
            App::new()
                .app_data(test_state(MemoryStore::new()))
                .configure(crate::configure_api),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/metrics/stream")
                .to_request(),
        )
        .await;
        assert!(resp.status().is_success());
        let content_type = resp
            .headers()
            .get(actix_web::http::header::CONTENT_TYPE)
            .unwrap();
        assert_eq!(content_type, "text/event-stream");
    }
}
