use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use loopcall_core::SignalingMessage;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Sends serialized messages into the inbound queue of another router.
#[derive(Clone)]
pub struct ChannelSignaling {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelSignaling {
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self { tx }
    }

    /// Sends raw text as is, for messages this side did not build itself.
    pub fn send_raw(&self, text: impl Into<String>) -> bool {
        self.tx.send(text.into()).is_ok()
    }
}

#[async_trait]
impl SignalingOutput for ChannelSignaling {
    async fn send(&self, msg: SignalingMessage) {
        match msg.to_json() {
            Ok(json) => {
                debug!("Sending {} message", msg.kind());
                if self.tx.send(json).is_err() {
                    warn!("Signaling channel closed, dropped {} message", msg.kind());
                }
            }
            Err(e) => error!("Failed to serialize signal message: {}", e),
        }
    }
}

/// One side of an in-process signaling link.
pub struct SignalingLink {
    /// Delivers to the other side.
    pub output: ChannelSignaling,
    /// Messages addressed to this side.
    pub inbound: mpsc::UnboundedReceiver<String>,
    /// Pushes into this side's own inbound queue, standing in for the server.
    pub server: ChannelSignaling,
}

/// Two linked sides: whatever one sends, the other receives, in order.
pub fn channel_pair() -> (SignalingLink, SignalingLink) {
    let (a_tx, a_rx) = mpsc::unbounded_channel();
    let (b_tx, b_rx) = mpsc::unbounded_channel();

    let a = SignalingLink {
        output: ChannelSignaling::new(b_tx.clone()),
        inbound: a_rx,
        server: ChannelSignaling::new(a_tx.clone()),
    };
    let b = SignalingLink {
        output: ChannelSignaling::new(a_tx),
        inbound: b_rx,
        server: ChannelSignaling::new(b_tx),
    };
    (a, b)
}
