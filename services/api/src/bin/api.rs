//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{CloudinaryAdapter, InMemoryStore, MockMediaStore, PgDocumentStore},
    config::Config,
    error::ApiError,
    web::{router, state::AppState, ApiDoc},
};
use axum::Router;
use recipe_social_core::ports::{DocumentStore, MediaStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect the Document Store ---
    let store: Arc<dyn DocumentStore> = match &config.database_url {
        Some(url) => {
            info!("Connecting to database...");
            let pool = PgPoolOptions::new().max_connections(5).connect(url).await?;
            let pg_store = PgDocumentStore::new(pool);
            info!("Running database migrations...");
            pg_store.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(pg_store)
        }
        None => {
            warn!("DATABASE_URL is not set; documents are kept in memory and lost on exit");
            Arc::new(InMemoryStore::new())
        }
    };

    // --- 3. Initialize the Media Adapter ---
    let media: Arc<dyn MediaStore> = match &config.cloudinary {
        Some(credentials) => {
            info!("Uploading to Cloudinary cloud '{}'", credentials.cloud_name);
            Arc::new(CloudinaryAdapter::new(
                reqwest::Client::new(),
                credentials.clone(),
                &config.cloudinary_api_base,
            ))
        }
        None => {
            warn!("Cloudinary credentials are not configured; uploads are mocked");
            Arc::new(MockMediaStore::new())
        }
    };

    // --- 4. Build the Shared AppState & Router ---
    let app_state = Arc::new(AppState::new(config.clone(), store, media));
    let app = Router::new()
        .merge(router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    let listener = match tokio::net::TcpListener::bind(&config.bind_address).await {
        Ok(listener) => listener,
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            error!(
                "Port {} is already in use. Stop the other process or set PORT to a free port.",
                config.bind_address.port()
            );
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };
    info!("Server listening on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    axum::serve(listener, app).await?;

    Ok(())
}
