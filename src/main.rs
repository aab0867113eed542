use axum::{Router, http::header, routing::get};
use divvy::{
    DivvyService, InMemoryLogging, InMemoryStorage,
    api::{handlers::api_routes, openapi::ApiDoc},
    config::CONFIG,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&CONFIG.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    info!("Loaded configuration: {:?}", *CONFIG);

    let storage = InMemoryStorage::new();
    let logging = InMemoryLogging::new();
    let service = Arc::new(DivvyService::new(storage, logging));

    let app = Router::new()
        .route("/", get(|| async { "OK" }))
        .nest("/api", api_routes(service))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(CONFIG.request_timeout_secs)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([http::Method::GET, http::Method::POST, http::Method::DELETE])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from((CONFIG.host, CONFIG.port));
    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
