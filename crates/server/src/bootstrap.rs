use std::sync::Arc;
use std::time::Duration;

use billchat_agent::{
    AgentRuntime, KeywordIntentResolver, LlmClient, LlmError, LlmIntentResolver, OllamaClient,
    ResolverChain,
};
use billchat_billing::{
    AuthSession, BackendError, BillingBackend, BillingOrchestrator, Credentials, DetailPage,
    HttpBillingBackend, PaymentCache,
};
use billchat_core::config::{AppConfig, ConfigError};
use billchat_core::ResolutionDefaults;
use thiserror::Error;
use tracing::{info, warn};

pub struct Application {
    pub config: AppConfig,
    pub auth: Arc<AuthSession>,
    pub runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("billing backend client could not be built: {0}")]
    BillingClient(#[source] BackendError),
    #[error("language model client could not be built: {0}")]
    LlmClient(#[source] LlmError),
    #[error("server.allowed_origin `{origin}` is not a valid origin: {reason}")]
    AllowedOrigin { origin: String, reason: String },
}

/// Builds the live clients and performs the startup login.
///
/// A failed login is not fatal: the gateway starts unauthenticated and every
/// billing request retries the login first.
pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        llm_model = %config.llm.model,
        billing_base_url = %config.billing.base_url,
        "starting application bootstrap"
    );

    let backend =
        HttpBillingBackend::from_config(&config.billing).map_err(BootstrapError::BillingClient)?;
    let llm = OllamaClient::from_config(&config.llm).map_err(BootstrapError::LlmClient)?;
    let app = assemble(config, Arc::new(backend), Arc::new(llm));

    if app.auth.login().await {
        info!(
            event_name = "system.bootstrap.billing_authenticated",
            correlation_id = "bootstrap",
            "billing backend session established"
        );
    } else {
        warn!(
            event_name = "system.bootstrap.billing_unauthenticated",
            correlation_id = "bootstrap",
            "billing backend login failed, continuing without a token"
        );
    }

    Ok(app)
}

/// Wires the shared auth session, payment cache, orchestrator and resolver
/// chain around the given clients.
pub fn assemble(
    config: AppConfig,
    backend: Arc<dyn BillingBackend>,
    llm: Arc<dyn LlmClient>,
) -> Application {
    let credentials = Credentials {
        username: config.billing.username.clone(),
        password: config.billing.password.clone(),
    };
    let auth = Arc::new(AuthSession::new(Arc::clone(&backend), credentials));
    let orchestrator = BillingOrchestrator::new(
        backend,
        Arc::clone(&auth),
        PaymentCache::new(Duration::from_secs(config.billing.payment_cache_ttl_secs)),
        DetailPage::first(config.billing.detail_page_size),
    );

    let defaults = ResolutionDefaults::new(config.billing.default_subscriber_no.clone());
    let resolver = ResolverChain::new(
        Arc::new(LlmIntentResolver::new(llm, defaults.clone())),
        KeywordIntentResolver::new(defaults),
    );
    let runtime = Arc::new(AgentRuntime::new(resolver, Arc::new(orchestrator)));

    Application { config, auth, runtime }
}
