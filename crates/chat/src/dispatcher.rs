use std::sync::Arc;

use async_trait::async_trait;
use billchat_core::{Intent, OperationFailure, GENERIC_ERROR_MESSAGE};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::events::{ChatTurn, InboundMessage, OutboundEvent};
use crate::transport::{ConnectionTransport, TransportError};

pub const WELCOME_MESSAGE: &str = "Hello! How can I help you?";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnContext {
    pub correlation_id: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AgentReply {
    pub text: String,
    pub data: Option<Value>,
    pub intent: Option<Intent>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReplyError {
    #[error(transparent)]
    Operation(#[from] OperationFailure),
    #[error("reply task aborted: {0}")]
    Aborted(String),
}

/// Produces the agent's reply to a single user message.
#[async_trait]
pub trait ReplyService: Send + Sync {
    async fn reply(&self, text: &str, ctx: &TurnContext) -> Result<AgentReply, ReplyError>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub messages_handled: usize,
    pub failed_turns: usize,
}

/// Drives one chat connection: greets, then answers each message in arrival
/// order.
///
/// A failing or panicking reply becomes one generic agent turn. Only a
/// transport error ends the session early.
pub struct SessionDispatcher {
    service: Arc<dyn ReplyService>,
}

impl SessionDispatcher {
    pub fn new(service: Arc<dyn ReplyService>) -> Self {
        Self { service }
    }

    pub async fn run<T>(
        &self,
        transport: &mut T,
        connection_id: &str,
    ) -> Result<SessionSummary, TransportError>
    where
        T: ConnectionTransport + ?Sized,
    {
        info!(
            event_name = "ingress.chat.connected",
            correlation_id = %connection_id,
            "chat client connected"
        );
        transport.send(&OutboundEvent::Message(ChatTurn::agent(WELCOME_MESSAGE))).await?;

        let mut summary = SessionSummary::default();
        while let Some(frame) = transport.next_frame().await? {
            let message = InboundMessage::parse(&frame);
            let ctx = TurnContext { correlation_id: connection_id.to_string() };
            if !self.handle_message(transport, message, ctx).await? {
                summary.failed_turns += 1;
            }
            summary.messages_handled += 1;
        }

        info!(
            event_name = "ingress.chat.disconnected",
            correlation_id = %connection_id,
            messages_handled = summary.messages_handled,
            failed_turns = summary.failed_turns,
            "chat client disconnected"
        );
        Ok(summary)
    }

    /// Returns whether the turn produced a real reply.
    async fn handle_message<T>(
        &self,
        transport: &mut T,
        message: InboundMessage,
        ctx: TurnContext,
    ) -> Result<bool, TransportError>
    where
        T: ConnectionTransport + ?Sized,
    {
        info!(
            event_name = "ingress.chat.message_received",
            correlation_id = %ctx.correlation_id,
            chars = message.text.chars().count(),
            "received chat message"
        );
        transport.send(&OutboundEvent::Message(ChatTurn::user(message.text.clone()))).await?;
        transport.send(&OutboundEvent::typing(true)).await?;

        let service = Arc::clone(&self.service);
        let correlation_id = ctx.correlation_id.clone();
        let task = tokio::spawn(async move { service.reply(&message.text, &ctx).await });
        let outcome = match task.await {
            Ok(result) => result,
            Err(join_error) => Err(ReplyError::Aborted(join_error.to_string())),
        };

        transport.send(&OutboundEvent::typing(false)).await?;

        let (turn, replied) = match outcome {
            Ok(reply) => (ChatTurn::agent_with(reply.text, reply.data, reply.intent), true),
            Err(ReplyError::Aborted(reason)) => {
                error!(
                    event_name = "ingress.chat.reply_aborted",
                    correlation_id = %correlation_id,
                    reason = %reason,
                    "reply task aborted"
                );
                (ChatTurn::agent(GENERIC_ERROR_MESSAGE), false)
            }
            Err(reply_error) => {
                warn!(
                    event_name = "ingress.chat.reply_failed",
                    correlation_id = %correlation_id,
                    error = %reply_error,
                    "reply failed"
                );
                (ChatTurn::agent(GENERIC_ERROR_MESSAGE), false)
            }
        };

        transport.send(&OutboundEvent::Message(turn)).await?;
        Ok(replied)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use billchat_core::{Intent, OperationFailure, GENERIC_ERROR_MESSAGE};
    use serde_json::json;
    use tokio::sync::Mutex;

    use super::{
        AgentReply, ReplyError, ReplyService, SessionDispatcher, TurnContext, WELCOME_MESSAGE,
    };
    use crate::events::{OutboundEvent, Speaker};
    use crate::transport::ChannelTransport;

    #[derive(Default)]
    struct ScriptedService {
        seen: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl ReplyService for ScriptedService {
        async fn reply(&self, text: &str, ctx: &TurnContext) -> Result<AgentReply, ReplyError> {
            self.seen.lock().await.push((text.to_owned(), ctx.correlation_id.clone()));
            match text {
                "boom" => Err(OperationFailure::Internal("malformed payload".to_owned()).into()),
                "panic" => panic!("reply service exploded"),
                other => Ok(AgentReply {
                    text: format!("echo: {other}"),
                    data: Some(json!({ "len": other.len() })),
                    intent: Some(Intent::QueryBill),
                }),
            }
        }
    }

    fn texts(events: &[OutboundEvent]) -> Vec<String> {
        events
            .iter()
            .map(|event| match event {
                OutboundEvent::Message(turn) => format!("{:?}:{}", turn.speaker, turn.text),
                OutboundEvent::Typing(indicator) => format!("typing:{}", indicator.is_typing),
            })
            .collect()
    }

    async fn run_session(frames: &[&str]) -> (Vec<OutboundEvent>, Arc<ScriptedService>, usize) {
        let service = Arc::new(ScriptedService::default());
        let dispatcher = SessionDispatcher::new(service.clone());
        let (mut transport, inbound, mut outbound) = ChannelTransport::pair(64);
        for frame in frames {
            inbound.send((*frame).to_owned()).await.expect("queue frame");
        }
        drop(inbound);

        let summary = dispatcher.run(&mut transport, "conn-1").await.expect("session");
        drop(transport);

        let mut events = Vec::new();
        while let Some(event) = outbound.recv().await {
            events.push(event);
        }
        (events, service, summary.failed_turns)
    }

    #[tokio::test]
    async fn emits_welcome_then_ordered_turn_sequence() {
        let (events, service, failed) = run_session(&[r#"{"text":"first"}"#, "second"]).await;

        assert_eq!(
            texts(&events),
            vec![
                format!("Agent:{WELCOME_MESSAGE}"),
                "User:first".to_owned(),
                "typing:true".to_owned(),
                "typing:false".to_owned(),
                "Agent:echo: first".to_owned(),
                "User:second".to_owned(),
                "typing:true".to_owned(),
                "typing:false".to_owned(),
                "Agent:echo: second".to_owned(),
            ]
        );
        assert_eq!(failed, 0);

        let seen = service.seen.lock().await;
        assert_eq!(seen[0], ("first".to_owned(), "conn-1".to_owned()));
        assert_eq!(seen[1].0, "second");
    }

    #[tokio::test]
    async fn agent_turn_carries_data_and_intent() {
        let (events, _, _) = run_session(&["hello"]).await;

        let OutboundEvent::Message(turn) = events.last().expect("agent turn") else {
            panic!("expected message event");
        };
        assert_eq!(turn.speaker, Speaker::Agent);
        assert_eq!(turn.intent, Some(Intent::QueryBill));
        assert_eq!(turn.data, Some(json!({ "len": 5 })));
    }

    #[tokio::test]
    async fn failed_turn_yields_one_generic_reply_and_session_continues() {
        let (events, _, failed) = run_session(&["boom", "after"]).await;

        let rendered = texts(&events);
        assert_eq!(rendered.iter().filter(|text| text.contains(GENERIC_ERROR_MESSAGE)).count(), 1);
        assert_eq!(rendered[4], format!("Agent:{GENERIC_ERROR_MESSAGE}"));
        assert_eq!(rendered.last().map(String::as_str), Some("Agent:echo: after"));
        assert_eq!(failed, 1);
    }

    #[tokio::test]
    async fn panicking_reply_is_contained() {
        let (events, _, failed) = run_session(&["panic", "still here"]).await;

        let rendered = texts(&events);
        assert_eq!(rendered[3], "typing:false");
        assert_eq!(rendered[4], format!("Agent:{GENERIC_ERROR_MESSAGE}"));
        assert_eq!(rendered.last().map(String::as_str), Some("Agent:echo: still here"));
        assert_eq!(failed, 1);
    }
}
