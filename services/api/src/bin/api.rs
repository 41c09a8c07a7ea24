//! services/api/src/bin/api.rs

use async_openai::{config::OpenAIConfig, types::audio::SpeechModel, Client};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Router,
};
use monogatari_api::{
    adapters::{
        DbAdapter, OpenAiImageAdapter, OpenAiStoryAdapter, OpenAiTtsAdapter, PgAudioQueue,
        SupabaseAuthAdapter, SupabaseStorageAdapter,
    },
    config::Config,
    error::ApiError,
    web::{build_router, rest::ApiDoc, AppState},
    worker::run_worker,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn speech_model(name: &str) -> SpeechModel {
    match name {
        "tts-1" => SpeechModel::Tts1,
        "tts-1-hd" => SpeechModel::Tts1Hd,
        other => SpeechModel::Other(other.to_string()),
    }
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let openai_api_key = config
        .openai_api_key
        .clone()
        .ok_or_else(|| ApiError::Internal("OPENAI_API_KEY is required".to_string()))?;
    let openai_config = OpenAIConfig::new()
        .with_api_key(openai_api_key.clone())
        .with_api_base(config.openai_base_url.clone());
    let openai_client = Client::with_config(openai_config);
    let http = reqwest::Client::new();

    let auth = Arc::new(SupabaseAuthAdapter::new(
        http.clone(),
        config.supabase.url.clone(),
        config.supabase.anon_key.clone(),
    ));
    let storage = Arc::new(SupabaseStorageAdapter::new(
        http.clone(),
        config.supabase.url.clone(),
        config.supabase.service_role_key.clone(),
    ));
    let text_adapter = Arc::new(OpenAiStoryAdapter::new(
        openai_client.clone(),
        config.story_model.clone(),
    ));
    let image_adapter = Arc::new(OpenAiImageAdapter::new(
        http.clone(),
        config.openai_base_url.clone(),
        openai_api_key,
        config.image_model.clone(),
    ));
    let speech_adapter = Arc::new(OpenAiTtsAdapter::new(
        openai_client.clone(),
        speech_model(&config.speech_model),
    ));
    let audio_queue = Arc::new(PgAudioQueue::new(
        db_pool.clone(),
        config.worker.queue_name.clone(),
        config.worker.retry_delay,
        config.worker.max_attempts,
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        db: db_adapter,
        config: config.clone(),
        auth,
        storage,
        text_adapter,
        image_adapter,
        speech_adapter,
        audio_queue,
    });

    // --- 5. Start the Narration Worker ---
    let shutdown = CancellationToken::new();
    let worker_handle = if config.worker.enabled {
        Some(tokio::spawn(run_worker(app_state.clone(), shutdown.clone())))
    } else {
        info!("Narration worker disabled; jobs stay queued for another consumer.");
        None
    };

    // --- 6. Create the Web Router ---
    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS_ORIGIN '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    let app = Router::new()
        .merge(build_router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors);

    // --- 7. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received.");
            server_shutdown.cancel();
        })
        .await?;

    shutdown.cancel();
    if let Some(handle) = worker_handle {
        if let Err(e) = handle.await {
            error!("Narration worker panicked: {}", e);
        }
    }

    Ok(())
}
