use std::io::Error;
use std::sync::Arc;

use poem::{Route, Server, listener::TcpListener};
use poem_openapi::OpenApiService;
use tokio::main;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use push_fanout::{
    application::{
        handlers::notification_dispatcher::NotificationDispatcher,
        services::push::PushTransport,
        usecases::{bind_device::BindDeviceUseCase, list_deliveries::ListDeliveriesUseCase},
    },
    config::Config,
    domain::repositories::{DeliveryRecordRepository, GroupRepository, UserRepository},
    infrastructure::{
        push::{http::HttpPushTransport, logging::LoggingPushTransport},
        repositories::{
            in_memory::{
                InMemoryDeliveryRecordRepository, InMemoryGroupRepository, InMemoryUserRepository,
            },
            postgres::{
                self, PostgresDeliveryRecordRepository, PostgresGroupRepository,
                PostgresUserRepository,
            },
        },
    },
    presentation::http::endpoints::{
        deliveries::DeliveriesEndpoints,
        devices::DevicesEndpoints,
        health::HealthEndpoints,
        root::ApiState,
    },
};

type Repositories = (
    Arc<dyn UserRepository>,
    Arc<dyn GroupRepository>,
    Arc<dyn DeliveryRecordRepository>,
);

#[main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::try_parse().map_err(Error::other)?;

    let (users, groups, records) = repositories(&config).await.map_err(Error::other)?;

    let transport: Arc<dyn PushTransport> = match config.push.clone() {
        Some(push) => HttpPushTransport::new(push),
        None => {
            warn!("PUSH_HOST is not set, pushes will only be logged");
            LoggingPushTransport::new()
        }
    };
    info!(transport = transport.name(), "push transport ready");

    let notifier = Arc::new(NotificationDispatcher::new(
        users.clone(),
        groups,
        records.clone(),
        transport,
        config.push_options,
    ));

    let state = Arc::new(ApiState {
        list_deliveries_usecase: Arc::new(ListDeliveriesUseCase::new(records)),
        bind_device_usecase: Arc::new(BindDeviceUseCase::new(users, notifier)),
    });

    let server_url = format!("{}://{}:{}", config.scheme, config.host, config.port);

    info!("Starting server at {}", server_url);

    let api_service = OpenApiService::new(
        (
            HealthEndpoints,
            DeliveriesEndpoints::new(state.clone()),
            DevicesEndpoints::new(state),
        ),
        "Push Fanout API",
        "0.1.0",
    )
    .server(format!("{}/api", server_url));
    let ui = api_service.swagger_ui();
    let app = Route::new().nest("/api", api_service).nest("/", ui);

    Server::new(TcpListener::bind(format!("0.0.0.0:{}", config.port)))
        .run(app)
        .await
}

async fn repositories(config: &Config) -> anyhow::Result<Repositories> {
    let Some(url) = &config.database_url else {
        warn!("DATABASE_URL is not set, falling back to in-memory repositories");
        let user_store = Arc::new(InMemoryUserRepository::new());
        let groups: Arc<dyn GroupRepository> =
            Arc::new(InMemoryGroupRepository::new(&user_store));
        let users: Arc<dyn UserRepository> = user_store;
        let records: Arc<dyn DeliveryRecordRepository> =
            Arc::new(InMemoryDeliveryRecordRepository::new());
        return Ok((users, groups, records));
    };

    let pool = postgres::connect(url, config.database_max_connections).await?;
    info!("using postgres repositories");
    let users: Arc<dyn UserRepository> = PostgresUserRepository::new(pool.clone());
    let groups: Arc<dyn GroupRepository> = PostgresGroupRepository::new(pool.clone());
    let records: Arc<dyn DeliveryRecordRepository> = PostgresDeliveryRecordRepository::new(pool);
    Ok((users, groups, records))
}
