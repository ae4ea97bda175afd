use axum::{
    middleware,
    routing::{get_service, post_service},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handler::{handle_blank_request, handle_json_request};
use super::handlers::{close_session, divide, health, open_session, register_problems, sum};
use super::middleware::logging_middleware;
use crate::config::ApiConfig;

pub fn create_router(config: Arc<ApiConfig>) -> Router {
    register_problems();

    Router::new()
        // Health check
        .route(
            "/health",
            get_service(handle_blank_request("health", config.clone(), health)),
        )
        // Arithmetic endpoints
        .route(
            "/v1/sum",
            post_service(handle_json_request("sum", config.clone(), sum)),
        )
        .route(
            "/v1/divide",
            post_service(handle_json_request("divide", config.clone(), divide)),
        )
        // Sessions
        .route(
            "/v1/session",
            post_service(handle_blank_request("open_session", config.clone(), open_session))
                .delete_service(handle_blank_request("close_session", config, close_session)),
        )
        // Add middleware (order matters: logging -> trace)
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}
