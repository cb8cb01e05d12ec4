use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_credit_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use credit_decision::config::AppConfig;
use credit_decision::decisioning::{CreditDecisionService, EngineMode};
use credit_decision::error::AppError;
use credit_decision::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

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
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let service = Arc::new(CreditDecisionService::from_config(&config.decisioning)?);
    match service.engine().mode() {
        EngineMode::Model { revision } => info!(%revision, "decisions served by loaded model"),
        EngineMode::Heuristic {
            approval_cutoff,
            absence_reason,
        } => warn!(
            approval_cutoff,
            %absence_reason,
            "no model loaded; decisions served by amount heuristic"
        ),
    }

    let app = with_credit_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "credit decisioning service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
