// src/bin/api_server.rs

use record_crud::infra::config;
use record_crud::transport;
use record_crud::{CrudOptions, CrudService};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // --- Service Initialization ---
    let database_url = config::database_url()?;
    let options = CrudOptions::from_env();
    tracing::info!(
        check_access = options.check_access,
        cache_result = options.cache_result,
        log_crud = options.log_crud,
        max_query_limit = options.max_query_limit,
        "initializing CRUD service"
    );
    let crud = CrudService::connect(&database_url, config::db_max_connections(), options).await?;
    {
        let registry = crud.registry();
        let models = registry.read().await.list_models();
        if models.is_empty() {
            tracing::warn!("no tables found in the public schema; reads will project every column");
        } else {
            tracing::info!(tables = models.len(), "model registry warm-started from the catalog");
        }
    }

    // --- API Server Initialization ---
    let app_state = transport::http::AppState { crud };
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(cors);

    let bind_addr = config::api_bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("API server listening on http://{}", bind_addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", bind_addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    Ok(())
}
