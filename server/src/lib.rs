//! HTTP boundary for the chunked synthesis pipeline.

pub mod config;
pub mod error;
pub mod metrics;
pub mod routes;

use std::sync::Arc;

use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::GlobalKeyExtractor, GovernorLayer,
};
use tracing::{info, warn};

use tts_core::{PipelineConfig, SynthesisEngine, VoiceRegistry};

use crate::config::ServerConfig;
use crate::metrics::AppMetrics;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn SynthesisEngine>,
    pub registry: Arc<VoiceRegistry>,
    pub pipeline: PipelineConfig,
    pub metrics: Arc<AppMetrics>,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(
        engine: Arc<dyn SynthesisEngine>,
        registry: VoiceRegistry,
        config: ServerConfig,
    ) -> Self {
        Self {
            engine,
            registry: Arc::new(registry),
            pipeline: config.pipeline(),
            metrics: Arc::new(AppMetrics::new()),
            config,
        }
    }
}

/// Tag every request and response with an `x-request-id` for tracing.
async fn add_request_id(mut request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    request.headers_mut().insert(
        "x-request-id",
        axum::http::HeaderValue::from_str(&request_id).unwrap(),
    );
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        "x-request-id",
        axum::http::HeaderValue::from_str(&request_id).unwrap(),
    );
    response
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let methods = [
        axum::http::Method::GET,
        axum::http::Method::POST,
        axum::http::Method::OPTIONS,
    ];

    if let Some(ref allowed_origins) = config.cors_allowed_origins {
        let origins: Vec<axum::http::HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| origin.parse::<axum::http::HeaderValue>().ok())
            .collect();

        if origins.is_empty() {
            warn!("CORS_ALLOWED_ORIGINS is empty, falling back to permissive CORS");
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(methods)
                .allow_headers(tower_http::cors::Any)
        } else {
            info!("CORS configured for {} origin(s)", origins.len());
            CorsLayer::new()
                .allow_origin(tower_http::cors::AllowOrigin::list(origins))
                .allow_methods(methods)
                .allow_headers(tower_http::cors::Any)
        }
    } else {
        warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (development mode)");
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any)
    }
}

/// Build the full application router, middleware included.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    // Global rate limit; per-IP extraction is unreliable behind proxies.
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(((state.config.rate_limit_per_minute / 60).max(1)) as u64)
            .burst_size(state.config.rate_limit_per_minute)
            .key_extractor(GlobalKeyExtractor)
            .finish()
            .expect("valid rate limit configuration"),
    );

    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(GovernorLayer::new(governor_conf))
        .layer(TimeoutLayer::new(state.config.request_timeout()))
        .layer(cors)
        .into_inner();

    Router::new()
        .route("/health", get(routes::health_check))
        .route("/v1/models", get(routes::list_models))
        .route("/v1/audio/voices", get(routes::list_voices))
        .route("/v1/audio/speech", post(routes::create_speech))
        .route("/metrics", get(routes::metrics_endpoint))
        .layer(axum::middleware::from_fn(add_request_id))
        .layer(middleware_stack)
        .with_state(state)
}
