use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use fonds_barnier::config::AppConfig;
use fonds_barnier::error::AppError;
use fonds_barnier::geocoding::GeoapifyClient;
use fonds_barnier::hazards::GeorisquesClient;
use fonds_barnier::{AddressResolver, EligibilityEvaluator};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// The production pipeline: Geoapify-backed resolution and
/// Géorisques-backed evaluation sharing one HTTP client.
pub(crate) struct Pipeline {
    pub(crate) resolver: Arc<AddressResolver<GeoapifyClient>>,
    pub(crate) evaluator: Arc<EligibilityEvaluator<GeorisquesClient>>,
}

pub(crate) fn build_pipeline(config: &AppConfig) -> Result<Pipeline, AppError> {
    let http = reqwest::Client::new();

    let geocoder = Arc::new(GeoapifyClient::new(http.clone(), &config.geocoding)?);
    let resolver = Arc::new(AddressResolver::new(geocoder));

    let registry = Arc::new(GeorisquesClient::new(http, &config.hazards)?);
    let evaluator = Arc::new(EligibilityEvaluator::with_radius(
        registry,
        config.hazards.radius_meters,
    ));

    Ok(Pipeline {
        resolver,
        evaluator,
    })
}
