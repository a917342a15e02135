/*
[INPUT]:  Writes from the order book callback and the control loop
[OUTPUT]: One lock-guarded aggregate of all mutable engine state
[POS]:    State layer - shared between the market-data context and the tick loop
[UPDATE]: When a new piece of cross-context state is introduced
*/

use std::sync::Arc;

use lighter_mm_adapter::Side;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tokio::time::Instant;

use crate::order_state::OrderState;
use crate::params::PricingParameters;

/// Latest mid price and when it was observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MidPriceSample {
    pub price: Decimal,
    pub observed_at: Instant,
}

/// Account figures as of the last successful refresh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountSnapshot {
    pub available_capital: Decimal,
    pub portfolio_value: Decimal,
    pub position_size: Decimal,
    pub fetched_at: Instant,
}

/// Everything both execution contexts touch.
///
/// Guards are held for field reads and assignments only, never across an await.
#[derive(Debug)]
pub struct EngineState {
    pub mid: Option<MidPriceSample>,
    pub account: Option<AccountSnapshot>,
    pub params: Option<PricingParameters>,
    pub side: Side,
    pub order: OrderState,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            mid: None,
            account: None,
            params: None,
            side: Side::Buy,
            order: OrderState::NoOrder,
        }
    }
}

pub type SharedState = Arc<RwLock<EngineState>>;

pub fn shared_state() -> SharedState {
    Arc::new(RwLock::new(EngineState::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_starts_buying_without_order() {
        let state = shared_state();
        let guard = state.read();
        assert_eq!(guard.side, Side::Buy);
        assert_eq!(guard.order, OrderState::NoOrder);
        assert!(guard.mid.is_none());
        assert!(guard.account.is_none());
    }
}
