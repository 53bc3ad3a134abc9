use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::events::OutboundEvent;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("transport send failed: {0}")]
    Send(String),
    #[error("outbound event could not be encoded: {0}")]
    Encode(String),
}

/// One duplex chat connection.
///
/// `next_frame` yields `Ok(None)` once the peer has gone away.
#[async_trait]
pub trait ConnectionTransport: Send {
    async fn next_frame(&mut self) -> Result<Option<String>, TransportError>;
    async fn send(&mut self, event: &OutboundEvent) -> Result<(), TransportError>;
}

/// In-process transport backed by a pair of channels.
pub struct ChannelTransport {
    inbound: mpsc::Receiver<String>,
    outbound: mpsc::Sender<OutboundEvent>,
}

impl ChannelTransport {
    pub fn new(inbound: mpsc::Receiver<String>, outbound: mpsc::Sender<OutboundEvent>) -> Self {
        Self { inbound, outbound }
    }

    /// Returns the transport plus the client's ends of both channels.
    pub fn pair(
        capacity: usize,
    ) -> (Self, mpsc::Sender<String>, mpsc::Receiver<OutboundEvent>) {
        let (inbound_tx, inbound_rx) = mpsc::channel(capacity);
        let (outbound_tx, outbound_rx) = mpsc::channel(capacity);
        (Self::new(inbound_rx, outbound_tx), inbound_tx, outbound_rx)
    }
}

#[async_trait]
impl ConnectionTransport for ChannelTransport {
    async fn next_frame(&mut self) -> Result<Option<String>, TransportError> {
        Ok(self.inbound.recv().await)
    }

    async fn send(&mut self, event: &OutboundEvent) -> Result<(), TransportError> {
        self.outbound
            .send(event.clone())
            .await
            .map_err(|error| TransportError::Send(error.to_string()))
    }
}
