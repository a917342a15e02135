/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust response structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

use super::models::{Account, OrderBookInfo};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBooksResponse {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub order_books: Vec<OrderBookInfo>,
}

impl OrderBooksResponse {
    /// Case-insensitive symbol lookup.
    pub fn find_symbol(&self, symbol: &str) -> Option<&OrderBookInfo> {
        self.order_books
            .iter()
            .find(|book| book.symbol.eq_ignore_ascii_case(symbol))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountsResponse {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub accounts: Vec<Account>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextNonceResponse {
    #[serde(default)]
    pub code: i32,
    pub nonce: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendTxResponse {
    pub code: i32,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub tx_hash: String,
}
