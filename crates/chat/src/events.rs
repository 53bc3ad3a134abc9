use billchat_core::Intent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A user message as received from the chat client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct TextFrame {
    text: String,
}

impl InboundMessage {
    /// Accepts `{"text": ...}`, a bare JSON string, or plain text.
    pub fn parse(frame: &str) -> Self {
        if let Ok(TextFrame { text }) = serde_json::from_str::<TextFrame>(frame) {
            return Self { text };
        }
        if let Ok(text) = serde_json::from_str::<String>(frame) {
            return Self { text };
        }
        Self { text: frame.to_string() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Agent,
    User,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatTurn {
    #[serde(rename = "type")]
    pub speaker: Speaker,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    pub timestamp: DateTime<Utc>,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Speaker::User, text.into(), None, None)
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(Speaker::Agent, text.into(), None, None)
    }

    pub fn agent_with(text: impl Into<String>, data: Option<Value>, intent: Option<Intent>) -> Self {
        Self::new(Speaker::Agent, text.into(), data, intent)
    }

    fn new(speaker: Speaker, text: String, data: Option<Value>, intent: Option<Intent>) -> Self {
        Self { speaker, text, data, intent, timestamp: Utc::now() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TypingIndicator {
    #[serde(rename = "isTyping")]
    pub is_typing: bool,
}

/// Events pushed to the chat client, framed as `{"event": ..., "payload": ...}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum OutboundEvent {
    Message(ChatTurn),
    Typing(TypingIndicator),
}

impl OutboundEvent {
    pub fn typing(is_typing: bool) -> Self {
        Self::Typing(TypingIndicator { is_typing })
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::Typing(_) => "typing",
        }
    }
}
