use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use billchat_chat::{ConnectionTransport, OutboundEvent, SessionDispatcher, TransportError};
use tracing::{trace, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ChatState {
    dispatcher: Arc<SessionDispatcher>,
}

pub fn router(dispatcher: Arc<SessionDispatcher>) -> Router {
    Router::new().route("/ws", get(upgrade)).with_state(ChatState { dispatcher })
}

async fn upgrade(ws: WebSocketUpgrade, State(state): State<ChatState>) -> Response {
    let connection_id = Uuid::new_v4().to_string();
    ws.on_upgrade(move |socket| serve_socket(socket, state.dispatcher, connection_id))
}

async fn serve_socket(socket: WebSocket, dispatcher: Arc<SessionDispatcher>, connection_id: String) {
    let mut transport = WsTransport::new(socket);
    if let Err(error) = dispatcher.run(&mut transport, &connection_id).await {
        warn!(
            event_name = "ingress.chat.transport_error",
            correlation_id = %connection_id,
            error = %error,
            "chat connection closed on transport error"
        );
    }
}

/// WebSocket connection speaking JSON text frames.
pub struct WsTransport {
    socket: WebSocket,
}

impl WsTransport {
    pub fn new(socket: WebSocket) -> Self {
        Self { socket }
    }
}

#[async_trait]
impl ConnectionTransport for WsTransport {
    async fn next_frame(&mut self) -> Result<Option<String>, TransportError> {
        while let Some(message) = self.socket.recv().await {
            match message.map_err(|error| TransportError::Receive(error.to_string()))? {
                Message::Text(text) => return Ok(Some(text.as_str().to_owned())),
                Message::Close(_) => return Ok(None),
                // Control frames are answered by axum itself.
                Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => {}
            }
        }
        Ok(None)
    }

    async fn send(&mut self, event: &OutboundEvent) -> Result<(), TransportError> {
        let json =
            serde_json::to_string(event).map_err(|error| TransportError::Encode(error.to_string()))?;
        trace!(event_name = "ingress.chat.frame_sent", chat_event = event.event_name(), "sending chat event");
        self.socket
            .send(Message::Text(json.into()))
            .await
            .map_err(|error| TransportError::Send(error.to_string()))
    }
}
