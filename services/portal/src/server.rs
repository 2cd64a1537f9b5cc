use crate::cli::ServeArgs;
use crate::infra::{AppState, PortalSession};
use crate::routes::with_portal_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use loan_eligibility::config::{parse_endpoint, AppConfig};
use loan_eligibility::error::AppError;
use loan_eligibility::telemetry;
use loan_eligibility::workflows::eligibility::{FlowController, HttpSubmissionClient};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(endpoint) = args.endpoint.take() {
        config.prediction.endpoint = parse_endpoint(&endpoint)?;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let client = Arc::new(HttpSubmissionClient::new(
        config.prediction.endpoint.clone(),
    ));
    let session = Arc::new(PortalSession::new(
        FlowController::new(config.prediction.ordering),
        client.clone(),
    ));

    let app = with_portal_routes(session)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        endpoint = %client.endpoint(),
        ordering = %config.prediction.ordering,
        "loan eligibility portal ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
