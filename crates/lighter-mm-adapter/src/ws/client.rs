/*
[INPUT]:  Public stream URL and order book subscriptions
[OUTPUT]: Parsed order book pushes via an mpsc channel
[POS]:    WebSocket layer - real-time data stream handling
[UPDATE]: When adding new channels or changing connection logic
*/

use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info};

use crate::http::{LighterError, Result};
use crate::ws::message::{WebSocketMessage, order_book_channel};

/// Public stream endpoint on mainnet
pub const DEFAULT_STREAM_URL: &str = "wss://mainnet.zklighter.elliot.ai/stream";
const CHANNEL_CAPACITY: usize = 256;
const MESSAGE_SAMPLE_LIMIT: usize = 3;
const SUBSCRIPTION_LOG_LIMIT: usize = 10;
const PARSE_FAIL_LOG_LIMIT: usize = 3;
const RAW_LOG_MAX_BYTES: usize = 1024;

static MESSAGE_SAMPLE_COUNT: AtomicUsize = AtomicUsize::new(0);
static SUBSCRIBE_LOG_COUNT: AtomicUsize = AtomicUsize::new(0);
static PARSE_FAIL_LOG_COUNT: AtomicUsize = AtomicUsize::new(0);

/// WebSocket client for the Lighter public stream
#[derive(Debug)]
pub struct LighterWebSocket {
    url: String,
    message_tx: mpsc::Sender<WebSocketMessage>,
    message_rx: Option<mpsc::Receiver<WebSocketMessage>>,
    outbound_tx: Arc<Mutex<Option<mpsc::Sender<WsMessage>>>>,
}

impl LighterWebSocket {
    /// Create a client for the mainnet stream
    pub fn new() -> Self {
        Self::with_url(DEFAULT_STREAM_URL)
    }

    /// Create a client for a custom stream URL
    pub fn with_url(url: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        Self {
            url: url.into(),
            message_tx: tx,
            message_rx: Some(rx),
            outbound_tx: Arc::new(Mutex::new(None)),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get the message receiver
    pub fn take_receiver(&mut self) -> Option<mpsc::Receiver<WebSocketMessage>> {
        self.message_rx.take()
    }

    /// Subscribe to order book pushes for a market
    pub async fn subscribe_order_book(&self, market_id: u16) -> Result<()> {
        let msg = serde_json::json!({
            "type": "subscribe",
            "channel": order_book_channel(market_id),
        });
        self.send_subscription(msg).await
    }

    /// Unsubscribe from order book pushes for a market
    pub async fn unsubscribe_order_book(&self, market_id: u16) -> Result<()> {
        let msg = serde_json::json!({
            "type": "unsubscribe",
            "channel": order_book_channel(market_id),
        });
        self.send_subscription(msg).await
    }

    /// Whether the writer task is alive
    pub async fn is_connected(&self) -> bool {
        self.outbound_tx.lock().await.is_some()
    }

    /// Close the connection; the reader task exits after sending a close frame.
    pub async fn close(&self) {
        let mut guard = self.outbound_tx.lock().await;
        guard.take();
    }

    /// Open the connection and spawn the read/write task
    pub async fn connect(&self) -> Result<()> {
        let (ws_stream, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|err| LighterError::WebSocket(err.to_string()))?;
        let (mut write, mut read) = ws_stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<WsMessage>(CHANNEL_CAPACITY);
        let outbound_state = self.outbound_tx.clone();

        {
            let mut guard = outbound_state.lock().await;
            if guard.is_some() {
                return Err(LighterError::WebSocket(
                    "WebSocket already connected".to_string(),
                ));
            }
            *guard = Some(outbound_tx);
        }
        info!(url = %self.url, "ws connected");

        let message_tx = self.message_tx.clone();
        let outbound_state_for_task = outbound_state.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    outbound = outbound_rx.recv() => {
                        match outbound {
                            Some(message) => {
                                if write.send(message).await.is_err() {
                                    break;
                                }
                            }
                            None => {
                                let _ = write.send(WsMessage::Close(None)).await;
                                break;
                            }
                        }
                    }
                    incoming = read.next() => {
                        match incoming {
                            Some(Ok(WsMessage::Close(_))) => {
                                let _ = write.send(WsMessage::Close(None)).await;
                                break;
                            }
                            Some(Ok(WsMessage::Ping(payload))) => {
                                if write.send(WsMessage::Pong(payload)).await.is_err() {
                                    break;
                                }
                            }
                            Some(Ok(WsMessage::Pong(_))) => {}
                            Some(Ok(message)) => match parse_message(message) {
                                Some(WebSocketMessage::Ping) => {
                                    let pong = serde_json::json!({ "type": "pong" }).to_string();
                                    if write.send(WsMessage::Text(pong.into())).await.is_err() {
                                        break;
                                    }
                                }
                                Some(parsed) => {
                                    if message_tx.send(parsed).await.is_err() {
                                        break;
                                    }
                                }
                                None => {}
                            },
                            Some(Err(err)) => {
                                debug!(error = %err, "ws read failed");
                                break;
                            }
                            None => break,
                        }
                    }
                }
            }

            let mut guard = outbound_state_for_task.lock().await;
            *guard = None;
            info!("ws connection closed");
        });

        Ok(())
    }

    async fn send_subscription(&self, message: serde_json::Value) -> Result<()> {
        let sender = {
            let guard = self.outbound_tx.lock().await;
            guard
                .clone()
                .ok_or_else(|| LighterError::WebSocket("WebSocket not connected".to_string()))?
        };

        sender
            .send(WsMessage::Text(message.to_string().into()))
            .await
            .map_err(|_| LighterError::WebSocket("WebSocket send channel closed".to_string()))?;

        log_subscription_sent(&message);

        Ok(())
    }
}

impl Default for LighterWebSocket {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_message(message: WsMessage) -> Option<WebSocketMessage> {
    let text: String = match message {
        WsMessage::Text(text) => text.to_string(),
        WsMessage::Binary(bytes) => String::from_utf8(bytes.to_vec()).ok()?,
        _ => return None,
    };

    match serde_json::from_str::<WebSocketMessage>(&text) {
        Ok(parsed) => {
            log_message_sample_once(&parsed);
            Some(parsed)
        }
        Err(err) => {
            log_parse_fail_once(&err, &text);
            None
        }
    }
}

fn log_subscription_sent(message: &serde_json::Value) {
    let count = SUBSCRIBE_LOG_COUNT.fetch_add(1, Ordering::Relaxed);
    if count >= SUBSCRIPTION_LOG_LIMIT {
        return;
    }

    let action = message.get("type").and_then(|value| value.as_str()).unwrap_or("?");
    let channel = message
        .get("channel")
        .and_then(|value| value.as_str())
        .unwrap_or("?");
    info!(
        sample_index = count + 1,
        sample_limit = SUBSCRIPTION_LOG_LIMIT,
        action,
        channel,
        "ws subscription sent"
    );
}

fn log_message_sample_once(message: &WebSocketMessage) {
    let count = MESSAGE_SAMPLE_COUNT.fetch_add(1, Ordering::Relaxed);
    if count >= MESSAGE_SAMPLE_LIMIT {
        return;
    }

    let kind = match message {
        WebSocketMessage::Connected => "connected",
        WebSocketMessage::OrderBookSnapshot { .. } => "order_book_snapshot",
        WebSocketMessage::OrderBookUpdate { .. } => "order_book_update",
        WebSocketMessage::Ping => "ping",
        WebSocketMessage::Other => "other",
    };
    info!(
        sample_index = count + 1,
        sample_limit = MESSAGE_SAMPLE_LIMIT,
        kind,
        market_id = ?message.market_id(),
        "ws message sample"
    );
}

fn log_parse_fail_once(err: &serde_json::Error, raw: &str) {
    let count = PARSE_FAIL_LOG_COUNT.fetch_add(1, Ordering::Relaxed);
    if count < PARSE_FAIL_LOG_LIMIT {
        info!(
            sample_index = count + 1,
            sample_limit = PARSE_FAIL_LOG_LIMIT,
            error = %err,
            bytes = raw.len(),
            "ws message parse failed"
        );
        let preview = truncate_for_log(raw, RAW_LOG_MAX_BYTES);
        debug!(
            sample_index = count + 1,
            sample_limit = PARSE_FAIL_LOG_LIMIT,
            error = %err,
            message = %preview,
            "ws message parse failed"
        );
    }
}

fn truncate_for_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::with_capacity(end + 3);
    out.push_str(&value[..end]);
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_message_drops_non_json_frames() {
        assert!(parse_message(WsMessage::Text("not json".into())).is_none());
        assert!(parse_message(WsMessage::Ping(Vec::new().into())).is_none());
    }

    #[test]
    fn parse_message_reads_binary_json() {
        let raw = br#"{"type":"ping"}"#.to_vec();
        assert_eq!(
            parse_message(WsMessage::Binary(raw.into())),
            Some(WebSocketMessage::Ping)
        );
    }

    #[test]
    fn truncate_for_log_respects_char_boundaries() {
        let value = "ééé";
        let out = truncate_for_log(value, 3);
        assert_eq!(out, "é...");
    }

    #[tokio::test]
    async fn subscribe_without_connection_fails() {
        let ws = LighterWebSocket::with_url("ws://127.0.0.1:9");
        let err = ws.subscribe_order_book(1).await.unwrap_err();
        assert!(matches!(err, LighterError::WebSocket(_)));
        assert!(!ws.is_connected().await);
    }
}
