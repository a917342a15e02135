/*
[INPUT]:  Failures from reqwest, Lighter result codes, serde, the signer and the stream
[OUTPUT]: `LighterError` and the crate-wide `Result` alias
[POS]:    Error handling layer - shared by REST, WebSocket and signer code
[UPDATE]: When a new failure source is introduced
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Everything the adapter can fail with. Callers decide whether to try again;
/// nothing in this crate retries.
#[derive(Error, Debug)]
pub enum LighterError {
    /// Transport failure, including request timeouts
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Lighter answered with a result code other than 200, or a non-2xx status
    #[error("API error (code {code}): {message}")]
    Api { code: i64, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Payload decoded but is unusable (missing market, empty accounts, bad scale)
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Signer error: {0}")]
    Signer(String),
}

impl LighterError {
    /// Non-2xx HTTP response whose body carries no Lighter result code.
    pub fn from_status(status: StatusCode, body: impl Into<String>) -> Self {
        LighterError::Api {
            code: i64::from(status.as_u16()),
            message: body.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LighterError>;
