/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Lighter adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod http;
pub mod signer;
pub mod types;
pub mod ws;

// Re-export commonly used types from http
pub use http::{ClientConfig, DEFAULT_BASE_URL, LighterClient, LighterError, Result};

// Re-export signing seam
pub use signer::{MockTxSigner, RemoteSigner, SignedTx, TxSigner};

// Re-export all types
pub use types::*;

// Re-export commonly used types from ws
pub use ws::{
    DEFAULT_STREAM_URL, LighterWebSocket, LocalOrderBook, OrderBookData, WebSocketMessage,
};
