use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::backend::{BillingBackend, Credentials};

/// Process-wide bearer token for the billing backend.
///
/// The token has no tracked expiry. It starts empty, is set by a successful
/// login, and is cleared whenever a login fails.
pub struct AuthSession {
    backend: Arc<dyn BillingBackend>,
    credentials: Credentials,
    token: RwLock<Option<String>>,
}

impl AuthSession {
    pub fn new(backend: Arc<dyn BillingBackend>, credentials: Credentials) -> Self {
        Self { backend, credentials, token: RwLock::new(None) }
    }

    /// Exchanges the configured credentials for a fresh token.
    ///
    /// Never fails past this boundary: the outcome is reported as a boolean and
    /// logged.
    pub async fn login(&self) -> bool {
        match self.backend.login(&self.credentials).await {
            Ok(token) => {
                *self.token.write().await = Some(token);
                info!(
                    event_name = "billing.auth.login.succeeded",
                    username = %self.credentials.username,
                    "billing backend login succeeded"
                );
                true
            }
            Err(error) => {
                *self.token.write().await = None;
                warn!(
                    event_name = "billing.auth.login.failed",
                    username = %self.credentials.username,
                    error = %error,
                    "billing backend login failed"
                );
                false
            }
        }
    }

    pub async fn current_token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Returns the stored token, logging in first when none is held.
    pub async fn ensure_token(&self) -> Option<String> {
        if let Some(token) = self.current_token().await {
            return Some(token);
        }
        if self.login().await {
            self.current_token().await
        } else {
            None
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }
}
