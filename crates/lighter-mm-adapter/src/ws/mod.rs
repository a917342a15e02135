/*
[INPUT]:  Public stream URL and market subscriptions
[OUTPUT]: Parsed order book pushes and a locally maintained book
[POS]:    WebSocket layer - module root
[UPDATE]: When WebSocket modules change
*/

pub mod book;
pub mod client;
pub mod message;

pub use book::LocalOrderBook;
pub use client::{DEFAULT_STREAM_URL, LighterWebSocket};
pub use message::{OrderBookData, WebSocketMessage, order_book_channel};
