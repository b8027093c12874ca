//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{MongoStore, PostgresStore},
    config::Config,
    error::ApiError,
    web::{create_router, AppState},
};
use mongodb::{bson::doc, Client as MongoClient};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to PostgreSQL ---
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    info!("Connected to Postgres");

    // --- 3. Connect to MongoDB ---
    let mongo_client = MongoClient::with_uri_str(&config.mongo_url).await?;
    let mongo_db = mongo_client.database(&config.mongo_database);
    mongo_db.run_command(doc! { "ping": 1 }, None).await?;
    info!("Connected to Mongo");

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        postgres: Arc::new(PostgresStore::new(db_pool)),
        mongo: Arc::new(MongoStore::new(&mongo_db)),
    });

    let app = create_router(app_state);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
