use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::Router;
use billchat_chat::SessionDispatcher;
use tower_http::cors::{Any, CorsLayer};

use crate::bootstrap::{Application, BootstrapError};
use crate::health::{self, HealthState};
use crate::reply::AgentReplyService;
use crate::ws;

/// Full HTTP surface: the chat socket plus the health probe, behind CORS for
/// the configured browser origin.
pub fn app_router(app: &Application) -> Result<Router, BootstrapError> {
    let dispatcher = Arc::new(SessionDispatcher::new(Arc::new(AgentReplyService::new(
        Arc::clone(&app.runtime),
    ))));
    let health_state = HealthState::new(Arc::clone(&app.auth), &app.config.llm);

    Ok(Router::new()
        .merge(ws::router(dispatcher))
        .merge(health::router(health_state))
        .layer(cors_layer(&app.config.server.allowed_origin)?))
}

fn cors_layer(allowed_origin: &str) -> Result<CorsLayer, BootstrapError> {
    let layer = CorsLayer::new().allow_methods([Method::GET, Method::POST]);
    if allowed_origin.trim() == "*" {
        return Ok(layer.allow_origin(Any));
    }

    let origin = allowed_origin.trim().parse::<HeaderValue>().map_err(|error| {
        BootstrapError::AllowedOrigin { origin: allowed_origin.to_string(), reason: error.to_string() }
    })?;
    Ok(layer.allow_origin(origin))
}
