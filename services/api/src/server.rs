use crate::cli::ServeArgs;
use crate::infra::{load_config, prepare_store, AppState};
use crate::routes::with_client_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use leadflow::clients::ClientService;
use leadflow::error::AppError;
use leadflow::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = load_config(args.database.db_path.take())?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (store, _) = prepare_store(&config.database)?;
    let client_service = Arc::new(ClientService::new(Arc::new(store)));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = with_client_routes(client_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, database = %config.database.path, "lead router ready");

    axum::serve(listener, app).await?;
    Ok(())
}
