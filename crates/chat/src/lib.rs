//! Chat side of the gateway: the event shapes exchanged with the browser
//! client, the per-connection transport seam, and the session dispatcher
//! that sequences one conversation.

pub mod dispatcher;
pub mod events;
pub mod transport;

pub use dispatcher::{
    AgentReply, ReplyError, ReplyService, SessionDispatcher, SessionSummary, TurnContext,
    WELCOME_MESSAGE,
};
pub use events::{ChatTurn, InboundMessage, OutboundEvent, Speaker, TypingIndicator};
pub use transport::{ChannelTransport, ConnectionTransport, TransportError};
