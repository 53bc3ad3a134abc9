use std::sync::Arc;

use billchat_billing::render::HELP_MESSAGE;
use billchat_billing::BillingOrchestrator;
use billchat_core::{Intent, OperationFailure};
use serde_json::Value;
use tracing::info;

use crate::resolver::ResolverChain;

/// What the agent has to say about one chat message.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentOutcome {
    pub text: String,
    pub data: Option<Value>,
    pub intent: Option<Intent>,
}

/// Resolves a message and, for bill operations, runs it against the backend.
pub struct AgentRuntime {
    resolver: ResolverChain,
    orchestrator: Arc<BillingOrchestrator>,
}

impl AgentRuntime {
    pub fn new(resolver: ResolverChain, orchestrator: Arc<BillingOrchestrator>) -> Self {
        Self { resolver, orchestrator }
    }

    pub fn orchestrator(&self) -> &Arc<BillingOrchestrator> {
        &self.orchestrator
    }

    pub async fn handle_message(&self, text: &str) -> Result<AgentOutcome, OperationFailure> {
        let descriptor = self.resolver.resolve(text).await;
        info!(
            event_name = "agent.resolve.completed",
            intent = %descriptor.intent(),
            period = %descriptor.period(),
            has_amount = descriptor.amount().is_some(),
            "message resolved"
        );

        if descriptor.intent() == Intent::Greeting {
            return Ok(AgentOutcome { text: HELP_MESSAGE.to_string(), data: None, intent: None });
        }

        let result = self.orchestrator.execute(&descriptor).await?;
        Ok(AgentOutcome { text: result.message, data: result.data, intent: Some(descriptor.intent()) })
    }
}
