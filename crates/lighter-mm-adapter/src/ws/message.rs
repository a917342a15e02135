/*
[INPUT]:  Raw WebSocket text frames
[OUTPUT]: Parsed WebSocketMessage values
[POS]:    WebSocket layer - message parsing and validation
[UPDATE]: When adding new message types or changing format
*/

use serde::{Deserialize, Serialize};

use crate::types::PriceLevel;

/// Messages pushed on the public stream, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum WebSocketMessage {
    #[serde(rename = "connected")]
    Connected,
    /// Full book sent right after subscribing.
    #[serde(rename = "subscribed/order_book")]
    OrderBookSnapshot {
        channel: String,
        order_book: OrderBookData,
    },
    /// Incremental changes; a level with zero size is removed.
    #[serde(rename = "update/order_book")]
    OrderBookUpdate {
        channel: String,
        order_book: OrderBookData,
    },
    #[serde(rename = "ping")]
    Ping,
    #[serde(other)]
    Other,
}

impl WebSocketMessage {
    /// Market id carried by an order book channel (`order_book:48` or `order_book/48`).
    pub fn market_id(&self) -> Option<u16> {
        let channel = match self {
            WebSocketMessage::OrderBookSnapshot { channel, .. }
            | WebSocketMessage::OrderBookUpdate { channel, .. } => channel,
            _ => return None,
        };
        channel
            .rsplit(|c: char| c == ':' || c == '/')
            .next()
            .and_then(|id| id.parse().ok())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct OrderBookData {
    #[serde(default)]
    pub asks: Vec<PriceLevel>,
    #[serde(default)]
    pub bids: Vec<PriceLevel>,
}

/// Channel name used in subscribe/unsubscribe requests.
pub fn order_book_channel(market_id: u16) -> String {
    format!("order_book/{market_id}")
}
