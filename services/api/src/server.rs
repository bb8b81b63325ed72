use crate::cli::ServeArgs;
use crate::infra::{seeded_repository, AppState, InMemoryAuditPublisher};
use crate::routes::with_origination_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use loan_origination::config::AppConfig;
use loan_origination::error::AppError;
use loan_origination::telemetry;
use loan_origination::workflows::origination::OriginationService;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(seeded_repository());
    let audit = Arc::new(InMemoryAuditPublisher::default());
    let origination_service = Arc::new(OriginationService::new(repository, audit));

    let app = with_origination_routes(origination_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "loan origination service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
