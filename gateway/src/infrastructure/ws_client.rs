//! WebSocket transport for the venue feed (spec §6). Connects, sends the
//! subscribe request, and forwards parsed messages to the gateway's queue.
//! Grounded in `trading-infra/gateway/src/infrastructure/ws_client.rs`'s
//! reader-task-over-`mpsc` shape; generalized to parse straight into a
//! [`VenueEvent`] instead of a dynamic request/response envelope, since
//! this venue's wire format carries no `id`/`result` pairing — just a flat,
//! sequenced event stream.

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::domain::{SubscribeRequest, VenueEvent};

#[derive(Debug, Error)]
pub enum WsError {
    #[error("connection error: {0}")]
    Connection(#[from] tokio_tungstenite::tungstenite::Error),
}

/// One item handed from the reader task to the gateway's processor loop.
#[derive(Debug)]
pub enum WsEvent {
    Message(VenueEvent),
    /// Malformed or unrecognized message (spec §7.1): the caller logs and
    /// drops it; sequence continuity resumes from the next parseable one.
    ParseError(String),
    Disconnected,
}

pub struct WsClient {
    url: String,
}

impl WsClient {
    pub fn new(url: impl Into<String>) -> Self {
        WsClient { url: url.into() }
    }

    /// Connects, sends the `subscribe` request for `product_id`, and spawns
    /// a reader task that forwards parsed events until the socket closes or
    /// the returned [`WsHandle`] is closed.
    pub async fn connect(
        &self,
        product_id: &str,
    ) -> Result<(WsHandle, mpsc::Receiver<WsEvent>), WsError> {
        let (ws_stream, _) = connect_async(&self.url).await?;
        let (mut write, mut read) = ws_stream.split();

        let subscribe = SubscribeRequest::new(product_id);
        let text = serde_json::to_string(&subscribe).expect("SubscribeRequest always serializes");
        write.send(Message::Text(text.into())).await?;

        let (event_tx, event_rx) = mpsc::channel(1024);
        let (close_tx, mut close_rx) = mpsc::channel::<()>(1);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = close_rx.recv() => {
                        let _ = write.close().await;
                        break;
                    }
                    next = read.next() => {
                        let Some(msg) = next else {
                            let _ = event_tx.send(WsEvent::Disconnected).await;
                            break;
                        };
                        match msg {
                            Ok(Message::Text(text)) => {
                                let event = match serde_json::from_str::<VenueEvent>(&text) {
                                    Ok(parsed) => WsEvent::Message(parsed),
                                    Err(err) => WsEvent::ParseError(err.to_string()),
                                };
                                if event_tx.send(event).await.is_err() {
                                    break;
                                }
                            }
                            Ok(Message::Close(_)) => {
                                let _ = event_tx.send(WsEvent::Disconnected).await;
                                break;
                            }
                            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                            Ok(_) => {}
                            Err(err) => {
                                tracing::error!(error = %err, "venue socket error");
                                let _ = event_tx.send(WsEvent::Disconnected).await;
                                break;
                            }
                        }
                    }
                }
            }
        });

        Ok((WsHandle { close_tx }, event_rx))
    }
}

/// A live connection's shutdown handle. Closing it tells the reader task to
/// send a close frame and exit; reconnect logic is the supervisor's concern
/// (spec §7.3), not this client's.
pub struct WsHandle {
    close_tx: mpsc::Sender<()>,
}

impl WsHandle {
    pub async fn close(&self) {
        let _ = self.close_tx.send(()).await;
    }
}
