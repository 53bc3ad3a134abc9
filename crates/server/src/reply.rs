use std::sync::Arc;

use async_trait::async_trait;
use billchat_agent::AgentRuntime;
use billchat_chat::{AgentReply, ReplyError, ReplyService, TurnContext};
use tracing::{debug, info_span, Instrument};

/// Answers chat turns with the agent runtime.
pub struct AgentReplyService {
    runtime: Arc<AgentRuntime>,
}

impl AgentReplyService {
    pub fn new(runtime: Arc<AgentRuntime>) -> Self {
        Self { runtime }
    }
}

#[async_trait]
impl ReplyService for AgentReplyService {
    async fn reply(&self, text: &str, ctx: &TurnContext) -> Result<AgentReply, ReplyError> {
        debug!(
            event_name = "ingress.chat.reply_start",
            correlation_id = %ctx.correlation_id,
            "handing message to agent runtime"
        );
        // Resolver and billing events inherit the connection id from this span.
        let span = info_span!("chat_turn", correlation_id = %ctx.correlation_id);
        let outcome = self.runtime.handle_message(text).instrument(span).await?;
        Ok(AgentReply { text: outcome.text, data: outcome.data, intent: outcome.intent })
    }
}
