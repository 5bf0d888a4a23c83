use std::sync::Arc;

use axum::extract::Query;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use fonds_barnier::geocoding::{AddressCandidate, GeocodingGateway};
use fonds_barnier::hazards::HazardRegistry;
use fonds_barnier::{AddressResolver, Coordinates, EligibilityEvaluator, HazardFlags, Verdict};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::infra::AppState;

#[derive(Debug, Deserialize)]
pub(crate) struct SuggestParams {
    #[serde(default)]
    pub(crate) q: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SuggestResponse {
    pub(crate) candidates: Vec<AddressCandidate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CheckRequest {
    pub(crate) latitude: f64,
    pub(crate) longitude: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct CheckResponse {
    pub(crate) verdict: Verdict,
    pub(crate) message: &'static str,
    pub(crate) flags: HazardFlags,
}

pub(crate) fn pipeline_router<G, R>(
    resolver: Arc<AddressResolver<G>>,
    evaluator: Arc<EligibilityEvaluator<R>>,
) -> Router
where
    G: GeocodingGateway + 'static,
    R: HazardRegistry + 'static,
{
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/address/suggest", get(suggest_endpoint::<G>))
        .route("/api/v1/eligibility/check", post(check_endpoint::<R>))
        .layer(Extension(resolver))
        .layer(Extension(evaluator))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Resolves partial address text into ranked candidates. Too-short queries
/// and provider failures both answer with an empty list; this endpoint
/// never returns an error status.
pub(crate) async fn suggest_endpoint<G>(
    Extension(resolver): Extension<Arc<AddressResolver<G>>>,
    Query(params): Query<SuggestParams>,
) -> Json<SuggestResponse>
where
    G: GeocodingGateway,
{
    let batch = resolver.resolve(&params.q).await;
    Json(SuggestResponse {
        candidates: batch.candidates,
    })
}

/// Runs the TRI → PPRI → PAPI chain for a coordinate pair. Registry
/// failures fail closed inside the evaluator, so this always answers with a
/// concrete verdict.
pub(crate) async fn check_endpoint<R>(
    Extension(evaluator): Extension<Arc<EligibilityEvaluator<R>>>,
    Json(payload): Json<CheckRequest>,
) -> Json<CheckResponse>
where
    R: HazardRegistry,
{
    let coords = Coordinates {
        latitude: payload.latitude,
        longitude: payload.longitude,
    };
    let outcome = evaluator.evaluate(coords).await;
    Json(CheckResponse {
        verdict: outcome.verdict,
        message: outcome.verdict.message(),
        flags: outcome.flags,
    })
}
