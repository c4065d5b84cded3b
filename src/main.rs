use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod context;
mod db;
mod dto;
mod error;
mod handlers;
mod models;
mod services;

use auth::rate_limit::RateLimitState;
use config::Config;
use services::llm::GeminiBackend;
use services::nutrition_parser::NutritionParser;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub parser: Arc<NutritionParser>,
    pub rate_limiter: RateLimitState,
    /// Cancelled on shutdown; parser calls run under child tokens.
    pub shutdown: CancellationToken,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nutrilog_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env()?);

    let db = db::create_pool(&config.database_url).await?;
    db::pool::run_migrations(&db).await?;

    if config.gemini_api_key.is_empty() {
        tracing::warn!("GEMINI_API_KEY is not set; food parsing endpoints will return 503");
    }
    let backend = Arc::new(GeminiBackend::from_config(&config)?);
    let parser = Arc::new(NutritionParser::from_config(backend, &config));

    let rate_limiter = RateLimitState::new();
    auth::rate_limit::spawn_cleanup_worker(rate_limiter.clone());

    let shutdown = CancellationToken::new();
    let state = AppState {
        db,
        config: config.clone(),
        parser,
        rate_limiter,
        shutdown: shutdown.clone(),
    };

    let app = build_router(state, cors_layer(&config)?);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown signal received");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}

fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz));

    // Endpoints that call the text-generation service. The limiter reads
    // the AuthUser, so auth is layered outside it.
    let parse_routes = Router::new()
        .route("/api/parse-food", post(handlers::food_entries::parse_food))
        .route(
            "/api/food-entries/from-text",
            post(handlers::food_entries::create_from_text),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_parse,
        ));

    let protected_routes = Router::new()
        .merge(parse_routes)
        // Food entries
        .route("/api/food-entries", get(handlers::food_entries::list_entries))
        .route("/api/food-entries", post(handlers::food_entries::create_entry))
        .route(
            "/api/food-entries/export",
            get(handlers::food_entries::export_entries),
        )
        .route(
            "/api/food-entries/import",
            post(handlers::food_entries::import_entries),
        )
        .route("/api/food-entries/:id", put(handlers::food_entries::update_entry))
        .route(
            "/api/food-entries/:id",
            delete(handlers::food_entries::delete_entry),
        )
        // Goals
        .route("/api/goals", get(handlers::goals::get_goals))
        .route("/api/goals", put(handlers::goals::update_goals))
        .route(
            "/api/goals/micronutrients",
            get(handlers::goals::micronutrient_goals),
        )
        // Profile
        .route("/api/profile", get(handlers::profile::get_profile))
        .route("/api/profile", put(handlers::profile::update_profile))
        // Summaries
        .route("/api/summary/daily", get(handlers::summaries::daily_summary))
        .route("/api/summary/weekly", get(handlers::summaries::weekly_summary))
        .route("/api/summary/monthly", get(handlers::summaries::monthly_summary))
        // Weight & body metrics
        .route(
            "/api/weight-logs",
            get(handlers::weight_logs::list_weight_logs),
        )
        .route(
            "/api/weight-logs",
            post(handlers::weight_logs::create_weight_log),
        )
        .route(
            "/api/weight-logs/:id",
            delete(handlers::weight_logs::delete_weight_log),
        )
        .route("/api/body-metrics", post(handlers::body_metrics::body_metrics))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = vec![config
        .frontend_url
        .parse::<HeaderValue>()
        .map_err(|e| anyhow::anyhow!("FRONTEND_URL is not a valid origin: {}", e))?];
    // In dev, also allow LAN access (e.g. testing from another device)
    for o in &config.cors_extra_origins {
        if let Ok(hv) = o.parse::<HeaderValue>() {
            origins.push(hv);
        }
    }

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_DISPOSITION])
        .allow_credentials(true))
}
