//! WebSocket relay capability.
//!
//! [`WsRelay`] implements [`PrivacyApi`] for a provider that lives in another
//! process and listens on a WebSocket (for example an extension's native
//! host).  Each request opens its own connection:
//!
//! 1. send the [`Message`] as one JSON text frame, in exactly the wire shape
//!    the bridge built;
//! 2. read the first text frame back as a [`RelayReply`];
//! 3. close.
//!
//! Keeping one connection per request means concurrent calls never share a
//! socket or a pending-reply table.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use privacy_types::{CapabilityError, Message};
use serde::{Deserialize, Serialize};
use tokio_tungstenite::{connect_async, tungstenite::Message as Frame};
use tracing::{debug, warn};

use crate::capability::PrivacyApi;

/// Reply frame sent by the relay host: `{"result": …}` or
/// `{"error": {"message": …, "data": …}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayReply {
    Result(serde_json::Value),
    Error(CapabilityError),
}

/// A privacy capability reached over a WebSocket.
#[derive(Debug, Clone)]
pub struct WsRelay {
    /// `ws://host:port/path` of the relay host.
    url: String,
}

impl WsRelay {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Decode a relay reply frame into the capability's result.
fn decode_reply(text: &str) -> Result<serde_json::Value, CapabilityError> {
    match serde_json::from_str::<RelayReply>(text) {
        Ok(RelayReply::Result(value)) => Ok(value),
        Ok(RelayReply::Error(err)) => Err(err),
        Err(e) => Err(CapabilityError::new(format!("malformed relay reply: {e}"))),
    }
}

#[async_trait]
impl PrivacyApi for WsRelay {
    async fn request(&self, message: Message) -> Result<serde_json::Value, CapabilityError> {
        let kind = message.kind();
        let frame = serde_json::to_string(&message)
            .map_err(|e| CapabilityError::new(format!("failed to encode {kind}: {e}")))?;

        let (mut ws, _) = connect_async(self.url.as_str()).await.map_err(|e| {
            CapabilityError::new(format!("relay connect to {} failed: {e}", self.url))
        })?;
        debug!(url = %self.url, %kind, "relay connected");

        ws.send(Frame::Text(frame.into()))
            .await
            .map_err(|e| CapabilityError::new(format!("relay send failed: {e}")))?;

        let reply = loop {
            match ws.next().await {
                Some(Ok(Frame::Text(text))) => break text,
                Some(Ok(Frame::Close(_))) | None => {
                    return Err(CapabilityError::new("relay closed before replying"));
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    return Err(CapabilityError::new(format!("relay receive failed: {e}")));
                }
            }
        };

        if let Err(e) = ws.close(None).await {
            warn!(url = %self.url, error = %e, "relay close failed");
        }

        decode_reply(reply.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    /// Accept one connection, hand the request frame to `respond`, and send
    /// back whatever it returns.  Resolves to the request as received.
    async fn serve_once<F>(respond: F) -> (String, tokio::task::JoinHandle<serde_json::Value>)
    where
        F: FnOnce(&serde_json::Value) -> String + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            let request = loop {
                if let Some(Ok(Frame::Text(text))) = ws.next().await {
                    break serde_json::from_str::<serde_json::Value>(text.as_str()).unwrap();
                }
            };
            ws.send(Frame::Text(respond(&request).into())).await.unwrap();
            // Drain until the client closes.
            while let Some(Ok(frame)) = ws.next().await {
                if matches!(frame, Frame::Close(_)) {
                    break;
                }
            }
            request
        });
        (format!("ws://{addr}"), handle)
    }

    #[tokio::test]
    async fn forwards_wire_message_and_returns_result() {
        let (url, server) = serve_once(|req| {
            serde_json::to_string(&RelayReply::Result(json!({"echo": req["id"]}))).unwrap()
        })
        .await;

        let relay = WsRelay::new(url);
        let reply = relay.request(Message::ConfirmOperation { id: 7 }).await.unwrap();

        assert_eq!(reply, json!({"echo": 7}));
        assert_eq!(
            server.await.unwrap(),
            json!({"type": "CONFIRM_OPERATION", "id": 7})
        );
    }

    #[tokio::test]
    async fn relay_error_is_returned_verbatim() {
        let (url, server) = serve_once(|_| {
            json!({"error": {"message": "seed locked", "data": {"retry": false}}}).to_string()
        })
        .await;

        let err = WsRelay::new(url)
            .request(Message::GetSeed)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            CapabilityError {
                message: "seed locked".to_string(),
                data: Some(json!({"retry": false})),
            }
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_relay_is_a_capability_error() {
        // Bind then drop to get a port nobody listens on.
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let err = WsRelay::new(format!("ws://{addr}"))
            .request(Message::GetSeed)
            .await
            .unwrap_err();
        assert!(err.message.contains("connect"));
    }

    #[test]
    fn malformed_reply_is_reported() {
        let err = decode_reply(r#"{"status": "ok"}"#).unwrap_err();
        assert!(err.message.contains("malformed relay reply"));
    }

    #[test]
    fn reply_envelope_shapes() {
        assert_eq!(
            serde_json::to_value(RelayReply::Result(json!(18))).unwrap(),
            json!({"result": 18})
        );
        assert_eq!(
            decode_reply(r#"{"result": {"name": "USD Coin"}}"#).unwrap(),
            json!({"name": "USD Coin"})
        );
    }
}
