use std::sync::Arc;
use std::net::SocketAddr;
use anyhow::Context;
use busly_api::{app, AppState};
use busly_core::repository::{BookingRepository, CatalogRepository, UserRepository};
use busly_core::{CatalogSeed, InMemoryStore};
use busly_store::{app_config::Config, DbClient, StoreBookingRepository, StoreCatalogRepository, StoreUserRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct Repositories {
    catalog: Arc<dyn CatalogRepository>,
    bookings: Arc<dyn BookingRepository>,
    users: Arc<dyn UserRepository>,
}

async fn open_repositories(config: &Config) -> anyhow::Result<Repositories> {
    match config.database.postgres_url() {
        Some(url) => {
            let db = DbClient::new(url, config.database.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            tracing::info!("Using PostgreSQL store");

            Ok(Repositories {
                catalog: Arc::new(StoreCatalogRepository::new(db.pool.clone())),
                bookings: Arc::new(StoreBookingRepository::new(db.pool.clone())),
                users: Arc::new(StoreUserRepository::new(db.pool)),
            })
        }
        None => {
            tracing::warn!("No database url configured, using in-memory store");
            let store = Arc::new(InMemoryStore::new());
            Ok(Repositories { catalog: store.clone(), bookings: store.clone(), users: store })
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "busly_api=debug,busly_core=debug,busly_store=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Busly API on port {}", config.server.port);

    let repos = open_repositories(&config).await?;

    if config.database.seed_demo {
        let today = chrono::Utc::now().date_naive();
        repos.catalog.load_catalog(&CatalogSeed::demo(today)).await
            .context("Failed to seed demo catalog")?;
    }

    let app_state = AppState::new(&config, repos.catalog, repos.bookings, repos.users);
    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
