/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Lighter encodes sells as asks.
    pub fn is_ask(self) -> bool {
        matches!(self, Side::Sell)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction type codes accepted by `sendTx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum TxType {
    CreateOrder,
    CancelOrder,
    CancelAllOrders,
}

impl From<TxType> for u8 {
    fn from(value: TxType) -> Self {
        match value {
            TxType::CreateOrder => 14,
            TxType::CancelOrder => 15,
            TxType::CancelAllOrders => 16,
        }
    }
}

impl TryFrom<u8> for TxType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            14 => Ok(TxType::CreateOrder),
            15 => Ok(TxType::CancelOrder),
            16 => Ok(TxType::CancelAllOrders),
            other => Err(format!("unknown tx type {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum OrderType {
    Limit,
    Market,
}

impl From<OrderType> for u8 {
    fn from(value: OrderType) -> Self {
        match value {
            OrderType::Limit => 0,
            OrderType::Market => 1,
        }
    }
}

impl TryFrom<u8> for OrderType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OrderType::Limit),
            1 => Ok(OrderType::Market),
            other => Err(format!("unknown order type {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum TimeInForce {
    ImmediateOrCancel,
    GoodTillTime,
    PostOnly,
}

impl From<TimeInForce> for u8 {
    fn from(value: TimeInForce) -> Self {
        match value {
            TimeInForce::ImmediateOrCancel => 0,
            TimeInForce::GoodTillTime => 1,
            TimeInForce::PostOnly => 2,
        }
    }
}

impl TryFrom<u8> for TimeInForce {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TimeInForce::ImmediateOrCancel),
            1 => Ok(TimeInForce::GoodTillTime),
            2 => Ok(TimeInForce::PostOnly),
            other => Err(format!("unknown time in force {other}")),
        }
    }
}

/// Time-in-force variants for the account-wide cancel-all transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum CancelAllTimeInForce {
    Immediate,
    Scheduled,
    Abort,
}

impl From<CancelAllTimeInForce> for u8 {
    fn from(value: CancelAllTimeInForce) -> Self {
        match value {
            CancelAllTimeInForce::Immediate => 0,
            CancelAllTimeInForce::Scheduled => 1,
            CancelAllTimeInForce::Abort => 2,
        }
    }
}

impl TryFrom<u8> for CancelAllTimeInForce {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CancelAllTimeInForce::Immediate),
            1 => Ok(CancelAllTimeInForce::Scheduled),
            2 => Ok(CancelAllTimeInForce::Abort),
            other => Err(format!("unknown cancel-all time in force {other}")),
        }
    }
}
