/*
[INPUT]:  Market symbols
[OUTPUT]: Market metadata (ids, tick decimals)
[POS]:    HTTP layer - public market data endpoints (no auth required)
[UPDATE]: When adding new public endpoints or changing response format
*/

use crate::http::{LighterClient, LighterError, Result};
use crate::types::{OrderBookInfo, OrderBooksResponse};
use reqwest::Method;

impl LighterClient {
    /// List all order books
    ///
    /// GET /api/v1/orderBooks
    pub async fn order_books(&self) -> Result<OrderBooksResponse> {
        let builder = self.request(Method::GET, "/api/v1/orderBooks")?;
        self.send_json(builder).await
    }

    /// Resolve a market by symbol, ignoring case
    pub async fn find_market(&self, symbol: &str) -> Result<OrderBookInfo> {
        let books = self.order_books().await?;
        books
            .find_symbol(symbol)
            .cloned()
            .ok_or_else(|| LighterError::InvalidResponse(format!("symbol {symbol} not found")))
    }
}
