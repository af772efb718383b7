//! WebSocket frame source.
//!
//! Connects to the broker bridge and feeds `(topic, payload)` frames
//! to the router. Frames arrive as JSON text envelopes:
//!
//! ```json
//! {"topic": "telemetry/santa-casa", "payload": "{...}"}
//! ```
//!
//! Reconnects with a fixed delay when the connection drops. The loop
//! exits only on cancellation.

use std::time::Duration;

use futures::StreamExt;
use serde::Deserialize;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::router::MessageRouter;

/// Reconnection delay after a WebSocket failure.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Incoming frame envelope.
#[derive(Debug, Deserialize)]
struct FrameEnvelope {
    topic: String,
    payload: String,
}

/// Run the ingestion loop until `cancel` fires.
pub async fn run(ws_url: &str, router: &MessageRouter, cancel: CancellationToken) {
    loop {
        tracing::info!(url = %ws_url, "Connecting to broker bridge");

        tokio::select! {
            _ = cancel.cancelled() => break,
            connection = connect_async(ws_url) => match connection {
                Ok((ws_stream, _response)) => {
                    tracing::info!("Broker bridge connected");
                    run_session(ws_stream, router, &cancel).await;
                    tracing::warn!("Broker bridge session ended, reconnecting");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Broker bridge connection failed");
                }
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(RECONNECT_DELAY) => {}
        }
    }

    tracing::info!("Ingestion loop stopped");
}

/// Drive a single session: decode envelopes and route them, one at a
/// time (the ingestion path is sequential by design).
async fn run_session(
    ws_stream: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    router: &MessageRouter,
    cancel: &CancellationToken,
) {
    let mut stream = ws_stream;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_frame(router, &text).await;
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                        // Handled automatically by tungstenite.
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!(?frame, "Broker bridge closed the connection");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Binary / Frame — ignore.
                    }
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "WebSocket receive error");
                        break;
                    }
                    None => {
                        tracing::info!("WebSocket stream exhausted");
                        break;
                    }
                }
            }
        }
    }
}

/// Parse an envelope and route it. A malformed envelope is logged and
/// dropped, like any other undecodable message.
async fn handle_frame(router: &MessageRouter, text: &str) {
    match serde_json::from_str::<FrameEnvelope>(text) {
        Ok(envelope) => {
            router
                .route(&envelope.topic, envelope.payload.as_bytes())
                .await;
        }
        Err(e) => {
            tracing::warn!(error = %e, raw = %text, "Malformed frame envelope");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_parses_topic_and_payload() {
        let envelope: FrameEnvelope = serde_json::from_str(
            r#"{"topic": "telemetry/x", "payload": "{\"Hospital\": \"X\"}"}"#,
        )
        .expect("envelope should parse");
        assert_eq!(envelope.topic, "telemetry/x");
        assert_eq!(envelope.payload, r#"{"Hospital": "X"}"#);
    }

    #[test]
    fn envelope_without_topic_is_rejected() {
        let result = serde_json::from_str::<FrameEnvelope>(r#"{"payload": "x"}"#);
        assert!(result.is_err());
    }
}
