pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::asset_store::AssetStore;
use crate::services::upscale_service::UpscaleService;
use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::upscale::upscale_api,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::upscale::UpscaleForm,
            api::handlers::upscale::UpscaleResponse,
            api::handlers::upscale::StageFailure,
            api::handlers::health::HealthResponse,
            models::RenderedImage,
            services::stage::Stage,
        )
    ),
    tags(
        (name = "upscale", description = "Image upscaling endpoints"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AssetStore>,
    pub service: Arc<UpscaleService>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn AssetStore>, config: AppConfig) -> Self {
        let service = Arc::new(UpscaleService::new(store.clone(), &config));
        Self {
            store,
            service,
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(api::handlers::upscale::index))
        .route("/upscale", post(api::handlers::upscale::upscale_page))
        .route("/api/upscale", post(api::handlers::upscale::upscale_api))
        .route("/health", get(api::handlers::health::health_check))
        .layer(from_fn(api::middleware::security::security_headers))
        .layer(from_fn(api::middleware::metrics::metrics_middleware))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST]),
        )
        .layer(axum::extract::DefaultBodyLimit::max(
            state.config.max_file_size + 1024 * 1024, // 1MB buffer for multipart overhead
        ))
        .with_state(state)
}
