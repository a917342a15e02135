/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::http::{LighterError, Result};

/// Market metadata as listed by `GET /api/v1/orderBooks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookInfo {
    pub symbol: String,
    pub market_id: u16,
    #[serde(default)]
    pub status: String,
    pub supported_price_decimals: u32,
    pub supported_size_decimals: u32,
}

impl OrderBookInfo {
    /// Smallest price increment, `10^-supported_price_decimals`.
    pub fn price_tick(&self) -> Result<Decimal> {
        tick_for("price", self.supported_price_decimals)
    }

    /// Smallest size increment, `10^-supported_size_decimals`.
    pub fn size_tick(&self) -> Result<Decimal> {
        tick_for("size", self.supported_size_decimals)
    }
}

fn tick_for(kind: &str, decimals: u32) -> Result<Decimal> {
    Decimal::try_new(1, decimals).map_err(|_| {
        LighterError::InvalidResponse(format!("unsupported {kind} decimals {decimals}"))
    })
}

/// Account entry returned by `GET /api/v1/account`.
///
/// Numeric fields that fail to parse are read as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub index: i64,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_decimal_or_zero",
        serialize_with = "serde_helpers::serialize_decimal"
    )]
    pub available_balance: Decimal,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_decimal_or_zero",
        serialize_with = "serde_helpers::serialize_decimal"
    )]
    pub total_asset_value: Decimal,
    #[serde(default)]
    pub positions: Vec<AccountPosition>,
}

impl Account {
    /// Signed position size for a market, zero when the market is not held.
    pub fn position_for(&self, market_id: u16) -> Decimal {
        self.positions
            .iter()
            .find(|position| position.market_id == market_id)
            .map(AccountPosition::signed_position)
            .unwrap_or(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountPosition {
    pub market_id: u16,
    #[serde(default)]
    pub symbol: String,
    #[serde(default = "default_sign")]
    pub sign: i32,
    #[serde(
        default,
        deserialize_with = "serde_helpers::deserialize_decimal_or_zero",
        serialize_with = "serde_helpers::serialize_decimal"
    )]
    pub position: Decimal,
}

impl AccountPosition {
    /// Lighter reports an unsigned size plus a direction flag.
    pub fn signed_position(&self) -> Decimal {
        if self.sign < 0 {
            -self.position.abs()
        } else {
            self.position
        }
    }
}

fn default_sign() -> i32 {
    1
}

/// One price level of an order book push. Values stay raw; consumers parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: String,
    pub size: String,
}

impl PriceLevel {
    pub fn new(price: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            price: price.into(),
            size: size.into(),
        }
    }
}

mod serde_helpers {
    use super::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;
    use std::str::FromStr;

    /// Reads a decimal from a string or number. Null, empty and unparsable
    /// values become zero instead of failing the whole payload.
    pub fn deserialize_decimal_or_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let parsed = match &value {
            Value::String(raw) => Decimal::from_str(raw.trim()).ok(),
            Value::Number(number) => Decimal::from_str(&number.to_string())
                .or_else(|_| Decimal::from_scientific(&number.to_string()))
                .ok(),
            _ => None,
        };
        Ok(parsed.unwrap_or(Decimal::ZERO))
    }

    pub fn serialize_decimal<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).expect("valid decimal")
    }

    #[test]
    fn order_book_info_ticks_follow_decimals() {
        let info = OrderBookInfo {
            symbol: "PAXG".to_string(),
            market_id: 48,
            status: "active".to_string(),
            supported_price_decimals: 2,
            supported_size_decimals: 4,
        };
        assert_eq!(info.price_tick().unwrap(), dec("0.01"));
        assert_eq!(info.size_tick().unwrap(), dec("0.0001"));
    }

    #[test]
    fn order_book_info_rejects_scale_beyond_decimal_range() {
        let info = OrderBookInfo {
            symbol: "PAXG".to_string(),
            market_id: 48,
            status: "active".to_string(),
            supported_price_decimals: 30,
            supported_size_decimals: 4,
        };
        let err = info.price_tick().unwrap_err();
        assert!(matches!(err, LighterError::InvalidResponse(ref msg) if msg.contains("price decimals 30")));
        assert!(info.size_tick().is_ok());
    }

    #[test]
    fn account_fields_default_to_zero_when_malformed() {
        let value = json!({
            "index": 7,
            "available_balance": "not-a-number",
            "total_asset_value": null,
            "positions": [
                { "market_id": 48, "position": "", "sign": 1 }
            ]
        });
        let account: Account = serde_json::from_value(value).expect("account");
        assert_eq!(account.available_balance, Decimal::ZERO);
        assert_eq!(account.total_asset_value, Decimal::ZERO);
        assert_eq!(account.position_for(48), Decimal::ZERO);
    }

    #[test]
    fn account_accepts_numeric_fields() {
        let value = json!({
            "index": 7,
            "available_balance": 1000.5,
            "total_asset_value": "1200.25",
        });
        let account: Account = serde_json::from_value(value).expect("account");
        assert_eq!(account.available_balance, dec("1000.5"));
        assert_eq!(account.total_asset_value, dec("1200.25"));
        assert!(account.positions.is_empty());
    }

    #[test]
    fn position_for_applies_sign_and_defaults_to_zero() {
        let value = json!({
            "index": 7,
            "available_balance": "0",
            "total_asset_value": "0",
            "positions": [
                { "market_id": 1, "position": "0.5", "sign": -1 },
                { "market_id": 48, "position": "0.047" }
            ]
        });
        let account: Account = serde_json::from_value(value).expect("account");
        assert_eq!(account.position_for(1), dec("-0.5"));
        assert_eq!(account.position_for(48), dec("0.047"));
        assert_eq!(account.position_for(99), Decimal::ZERO);
    }
}
