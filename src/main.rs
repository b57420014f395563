use std::sync::Arc;

use anyhow::Context;
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use dotenv::dotenv;
use estatehub::{
    config::Config,
    db::{DBClient, MemoryStore, Store},
    routes::create_router,
    AppState,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};

async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    let Some(database_url) = &config.database_url else {
        tracing::warn!("DATABASE_URL is not set, using the in-memory store");
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        return Ok(store);
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to the database")?;
    tracing::info!("connection to the database is successful");

    let db_client = DBClient::new(pool);
    db_client
        .migrate()
        .await
        .context("failed to run database migrations")?;

    let store: Arc<dyn Store> = Arc::new(db_client);
    Ok(store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::init()?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    let db_client = connect_store(&config).await?;

    let allowed_origins = config
        .cors_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .context("CORS_ORIGINS contains an invalid origin")?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_credentials(true)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);

    let port = config.port;
    let app_state = Arc::new(AppState::new(db_client, config));
    let app = create_router(app_state).layer(cors);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("failed to bind port {}", port))?;
    tracing::info!("server is running on http://localhost:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
