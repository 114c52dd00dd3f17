// src/bin/api_server.rs

use idv_gateway::infra::logging;
use idv_gateway::transport;
use idv_gateway::AppConfig;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init("info")?;

    // --- Configuration ---
    let config = AppConfig::from_env()?;
    info!(
        base_url = %config.didit.base_url,
        tolerance_secs = config.webhook_tolerance_secs,
        "configuration loaded"
    );

    // --- Service Initialization ---
    let app_state = transport::http::AppState::from_config(&config).await?;

    // --- API Server Initialization ---
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(cors);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "API server listening");
    info!("Swagger UI available at /swagger-ui");

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(e) = result {
                error!(error = %e, "server stopped");
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    Ok(())
}
