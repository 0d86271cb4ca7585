mod cache;
mod chat;
mod classifier;
mod clock;
mod config;
mod errors;
mod llm_client;
mod models;
mod rate_limit;
mod resume_store;
mod roles;
mod routes;
mod state;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use std::net::SocketAddr;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::cache::{start_periodic_sweep, EntryStore, FileStore, MemoryStore, ResponseCache};
use crate::classifier::RelevanceClassifier;
use crate::clock::{Clock, SystemClock};
use crate::config::{CacheBackend, Config};
use crate::llm_client::prompts::load_system_instruction;
use crate::llm_client::GeminiClient;
use crate::rate_limit::IpRateLimiter;
use crate::resume_store::ResumeStore;
use crate::roles::RoleRegistry;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting résumé chat API v{}", env!("CARGO_PKG_VERSION"));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Roles feed the classifier's fallback priorities
    let roles = RoleRegistry::load(&config.roles_dir());
    info!("Roles available: {:?}", roles.get_available_roles());

    let classifier = RelevanceClassifier::new(roles.priorities())
        .context("Relevance classifier tables failed to compile")?;

    // Response cache
    let store: Box<dyn EntryStore> = match config.cache_backend {
        CacheBackend::File => {
            let store = FileStore::open(&config.cache_dir).with_context(|| {
                format!("Cannot create cache directory {}", config.cache_dir.display())
            })?;
            info!("File cache at {}", store.dir().display());
            Box::new(store)
        }
        CacheBackend::Memory => {
            info!("In-memory cache");
            Box::new(MemoryStore::new())
        }
    };
    let cache = Arc::new(ResponseCache::new(store, config.cache_ttl, clock.clone()));
    if config.cache_enabled && !config.cache_sweep_interval.is_zero() {
        start_periodic_sweep(cache.clone(), config.cache_sweep_interval);
        info!(
            "Periodic cache sweep every {}s",
            config.cache_sweep_interval.as_secs()
        );
    }

    let rate_limiter = IpRateLimiter::new(config.rate_limits(), clock);
    info!(
        "Rate limiting {} (window {}s)",
        if config.rate_limit_enabled { "enabled" } else { "disabled" },
        config.rate_limit_window.as_secs()
    );

    // Initialize LLM client
    let llm = GeminiClient::new(config.gemini_api_key.clone(), config.gemini_model.clone())
        .context("Failed to build HTTP client")?;
    info!("LLM client initialized (model: {})", llm.model());

    let system_instruction = load_system_instruction(&config.system_instruction_path());

    let cors = cors_layer(&config)?;

    // Build app state
    let state = AppState {
        resume: Arc::new(ResumeStore::new(&config.data_dir)),
        config: config.clone(),
        classifier: Arc::new(classifier),
        rate_limiter: Arc::new(rate_limiter),
        cache,
        roles: Arc::new(roles),
        llm: Arc::new(llm),
        system_instruction: Arc::from(system_instruction),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Any origin unless `CORS_ORIGINS` names specific ones.
fn cors_layer(config: &Config) -> Result<CorsLayer> {
    let Some(origins) = &config.cors_origins else {
        return Ok(CorsLayer::permissive());
    };
    let origins = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin '{o}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}
