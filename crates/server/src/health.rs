use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use billchat_billing::AuthSession;
use billchat_core::config::LlmConfig;
use chrono::Utc;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    auth: Arc<AuthSession>,
    llm: LlmCheck,
}

impl HealthState {
    pub fn new(auth: Arc<AuthSession>, llm: &LlmConfig) -> Self {
        Self {
            auth,
            llm: LlmCheck { base_url: llm.base_url.clone(), model: llm.model.clone() },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LlmCheck {
    pub base_url: String,
    pub model: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BillingCheck {
    pub authenticated: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub llm: LlmCheck,
    pub billing: BillingCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

/// Always answers 200: without a billing token the gateway still serves chat
/// turns, only with failure replies.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let authenticated = state.auth.is_authenticated().await;

    let payload = HealthResponse {
        status: if authenticated { "ok" } else { "degraded" },
        llm: state.llm.clone(),
        billing: BillingCheck { authenticated },
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}
