use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryEmployerRepository, InMemoryIdentityProvider, InMemoryProfileStore,
    LoggingNotifier,
};
use crate::routes::build_router;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use employer_network::access::Gatekeeper;
use employer_network::config::AppConfig;
use employer_network::error::AppError;
use employer_network::telemetry;
use employer_network::workflows::accounts::AccountProvisioningService;
use employer_network::workflows::employers::EmployerDirectoryService;
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

    let identity = Arc::new(InMemoryIdentityProvider::default());
    let profiles = Arc::new(InMemoryProfileStore::default());
    let employers = Arc::new(InMemoryEmployerRepository::default());
    let notifier = Arc::new(LoggingNotifier::new(
        config.notifications.from_address.clone(),
    ));

    let accounts = Arc::new(AccountProvisioningService::new(
        identity.clone(),
        profiles.clone(),
        config.accounts.clone(),
    ));
    let directory = Arc::new(EmployerDirectoryService::new(
        employers,
        profiles.clone(),
        notifier,
    ));
    let gate = Gatekeeper::new(identity, profiles);

    let app = build_router(directory, accounts, gate)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        public_url = %config.accounts.public_url,
        "employer network directory ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
