/*
[INPUT]:  Submitted order details, refreshed positions, mid price
[OUTPUT]: Tracked single-order state and quoting side transitions
[POS]:    State layer - order lifecycle and accumulation/distribution mode
[UPDATE]: When order state transitions or side flip rules change
*/

use std::time::Duration;

use lighter_mm_adapter::Side;
use rust_decimal::Decimal;
use tokio::time::Instant;

/// Positions smaller than this are treated as flat.
pub const POSITION_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 9);

/// Relative mid move (0.1%) that invalidates a resting quote.
pub const PRICE_MOVE_THRESHOLD: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

/// The one order the engine is tracking.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    /// Client order index sent with the order.
    pub id: i64,
    pub side: Side,
    pub price: Decimal,
    pub size: Decimal,
    pub placed_at: Instant,
    pub reduce_only: bool,
    /// Mid price at submission; later mids are compared against it.
    pub reference_mid: Decimal,
    pub tx_hash: String,
}

impl OrderRecord {
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.placed_at)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum OrderState {
    #[default]
    NoOrder,
    OrderOpen(OrderRecord),
}

impl OrderState {
    pub fn is_open(&self) -> bool {
        matches!(self, OrderState::OrderOpen(_))
    }

    pub fn record(&self) -> Option<&OrderRecord> {
        match self {
            OrderState::NoOrder => None,
            OrderState::OrderOpen(record) => Some(record),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderState::NoOrder => "no_order",
            OrderState::OrderOpen(_) => "order_open",
        }
    }
}

/// True when `mid` moved more than [`PRICE_MOVE_THRESHOLD`] away from `reference`.
pub fn price_moved(reference: Decimal, mid: Decimal) -> bool {
    if reference <= Decimal::ZERO {
        return false;
    }
    (mid - reference).abs() / reference > PRICE_MOVE_THRESHOLD
}

/// Side to quote after a timed-out order was cancelled and the account refreshed.
pub fn evaluate_post_cycle(
    side: Side,
    position: Decimal,
    mid: Decimal,
    min_position_value: Decimal,
) -> Side {
    let notional = position * mid;
    match side {
        Side::Buy => {
            if position > Decimal::ZERO && notional >= min_position_value {
                Side::Sell
            } else {
                Side::Buy
            }
        }
        Side::Sell => {
            if position.abs() < POSITION_EPSILON || notional < min_position_value {
                // dust is abandoned
                Side::Buy
            } else {
                Side::Sell
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).expect("valid decimal")
    }

    #[test]
    fn constants_match_their_decimal_literals() {
        assert_eq!(POSITION_EPSILON, dec("0.000000001"));
        assert_eq!(PRICE_MOVE_THRESHOLD, dec("0.001"));
    }

    #[test]
    fn price_moved_uses_strict_threshold() {
        let reference = dec("100");
        assert!(!price_moved(reference, dec("100.1")));
        assert!(price_moved(reference, dec("100.11")));
        assert!(price_moved(reference, dec("99.89")));
        assert!(!price_moved(Decimal::ZERO, dec("100")));
    }

    #[test]
    fn buy_flips_to_sell_once_fill_is_material() {
        let floor = dec("15");
        assert_eq!(evaluate_post_cycle(Side::Buy, dec("0.2"), dec("100"), floor), Side::Sell);
        assert_eq!(evaluate_post_cycle(Side::Buy, dec("0.15"), dec("100"), floor), Side::Sell);
        assert_eq!(evaluate_post_cycle(Side::Buy, dec("0.1"), dec("100"), floor), Side::Buy);
        assert_eq!(evaluate_post_cycle(Side::Buy, Decimal::ZERO, dec("100"), floor), Side::Buy);
    }

    #[test]
    fn sell_returns_to_buy_when_flat_or_dust() {
        let floor = dec("15");
        assert_eq!(evaluate_post_cycle(Side::Sell, Decimal::ZERO, dec("100"), floor), Side::Buy);
        assert_eq!(
            evaluate_post_cycle(Side::Sell, dec("0.0000000001"), dec("100"), floor),
            Side::Buy
        );
        assert_eq!(evaluate_post_cycle(Side::Sell, dec("0.1"), dec("100"), floor), Side::Buy);
        assert_eq!(evaluate_post_cycle(Side::Sell, dec("2"), dec("100"), floor), Side::Sell);
    }

    #[test]
    fn order_state_accessors() {
        let record = OrderRecord {
            id: 1,
            side: Side::Buy,
            price: dec("99.9"),
            size: dec("1"),
            placed_at: Instant::now(),
            reduce_only: false,
            reference_mid: dec("100"),
            tx_hash: "0x1".to_string(),
        };
        let state = OrderState::OrderOpen(record.clone());
        assert!(state.is_open());
        assert_eq!(state.record(), Some(&record));
        assert_eq!(state.label(), "order_open");
        assert_eq!(OrderState::default(), OrderState::NoOrder);
        assert!(OrderState::NoOrder.record().is_none());
    }
}
