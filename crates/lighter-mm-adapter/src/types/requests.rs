/*
[INPUT]:  Order parameters in exchange integer units
[OUTPUT]: Typed transaction requests handed to the signer
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When transaction fields or expiry rules change
*/

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{CancelAllTimeInForce, OrderType, Side, TimeInForce};

/// Resting orders expire after this many minutes unless filled or cancelled.
pub const ORDER_EXPIRY_MINUTES: i64 = 30;
/// Validity window of a cancel-all transaction, in minutes.
pub const CANCEL_ALL_EXPIRY_MINUTES: i64 = 5;

const CLIENT_ORDER_INDEX_MODULUS: i64 = 1_000_000_000_000;

/// Create-order transaction body. `base_amount` and `price` are tick counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub market_index: u16,
    pub client_order_index: i64,
    pub base_amount: i64,
    pub price: u32,
    pub is_ask: bool,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    pub reduce_only: bool,
    pub trigger_price: u32,
    pub order_expiry: i64,
}

impl CreateOrderRequest {
    /// Post-only limit order expiring [`ORDER_EXPIRY_MINUTES`] from now.
    pub fn post_only_limit(
        market_index: u16,
        side: Side,
        base_amount: i64,
        price: u32,
        reduce_only: bool,
    ) -> Self {
        Self {
            market_index,
            client_order_index: next_client_order_index(),
            base_amount,
            price,
            is_ask: side.is_ask(),
            order_type: OrderType::Limit,
            time_in_force: TimeInForce::PostOnly,
            reduce_only,
            trigger_price: 0,
            order_expiry: (Utc::now() + Duration::minutes(ORDER_EXPIRY_MINUTES)).timestamp_millis(),
        }
    }
}

/// Account-wide cancel-all transaction body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelAllOrdersRequest {
    pub time_in_force: CancelAllTimeInForce,
    pub time: i64,
}

impl CancelAllOrdersRequest {
    pub fn immediate() -> Self {
        Self {
            time_in_force: CancelAllTimeInForce::Immediate,
            time: (Utc::now() + Duration::minutes(CANCEL_ALL_EXPIRY_MINUTES)).timestamp_millis(),
        }
    }
}

/// Client order index derived from the wall clock, bounded to 10^12.
pub fn next_client_order_index() -> i64 {
    let nanos = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros().saturating_mul(1_000));
    nanos.rem_euclid(CLIENT_ORDER_INDEX_MODULUS)
}
