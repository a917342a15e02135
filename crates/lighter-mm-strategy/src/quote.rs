/*
[INPUT]:  Mid price, quoting side, optional pricing parameters, account figures
[OUTPUT]: Target price/size and tick-aligned order units
[POS]:    Pricing layer - pure quote computation (no I/O)
[UPDATE]: When pricing formulas, sizing rules or tick rounding change
*/

use lighter_mm_adapter::Side;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{EngineError, EngineResult};
use crate::market::MarketInfo;
use crate::params::PricingParameters;

#[derive(Debug, Clone, PartialEq)]
pub struct QuoteConfig {
    /// Fractional spread used when no pricing parameters are loaded.
    pub spread: Decimal,
    /// Fixed buy size when dynamic sizing is off or inputs are unusable.
    pub base_amount: Decimal,
    pub use_dynamic_sizing: bool,
    pub capital_usage: Decimal,
    pub safety_margin: Decimal,
    /// Sell only positions worth at least this much.
    pub min_position_value_usd: Decimal,
    /// Refuse to quote on the static spread when parameters are missing.
    pub require_params: bool,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            spread: Decimal::new(35, 5),
            base_amount: Decimal::new(47, 3),
            use_dynamic_sizing: true,
            capital_usage: Decimal::new(99, 2),
            safety_margin: Decimal::new(1, 2),
            min_position_value_usd: Decimal::from(15),
            require_params: false,
        }
    }
}

/// Price before tick rounding. `None` when parameters are required but missing.
pub fn target_price(
    mid: Decimal,
    side: Side,
    params: Option<&PricingParameters>,
    config: &QuoteConfig,
) -> Option<Decimal> {
    match (params, side) {
        (Some(params), Side::Buy) => Some(mid - params.delta_bid),
        (Some(params), Side::Sell) => Some(mid + params.delta_ask),
        (None, _) if config.require_params => None,
        (None, Side::Buy) => Some(mid * (Decimal::ONE - config.spread)),
        (None, Side::Sell) => Some(mid * (Decimal::ONE + config.spread)),
    }
}

/// Size before tick rounding. Zero means nothing to quote.
pub fn target_size(
    side: Side,
    mid: Decimal,
    position: Decimal,
    available_capital: Decimal,
    config: &QuoteConfig,
    size_tick: Decimal,
) -> Decimal {
    match side {
        Side::Sell => {
            if position <= Decimal::ZERO || position * mid < config.min_position_value_usd {
                Decimal::ZERO
            } else {
                position
            }
        }
        Side::Buy => {
            if !config.use_dynamic_sizing
                || available_capital <= Decimal::ZERO
                || mid <= Decimal::ZERO
            {
                return config.base_amount;
            }
            let usable = available_capital * (Decimal::ONE - config.safety_margin);
            let order_capital = usable * config.capital_usage;
            (order_capital / mid).max(size_tick)
        }
    }
}

/// Whole ticks contained in `value`; `None` when the tick is not positive
/// or the quotient overflows.
fn whole_ticks(value: Decimal, tick: Decimal) -> Option<Decimal> {
    if tick <= Decimal::ZERO {
        return None;
    }
    value.checked_div(tick).map(|steps| steps.floor())
}

/// Order expressed both as decimals and as integer exchange units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundedOrder {
    pub price: Decimal,
    pub size: Decimal,
    pub price_steps: u32,
    pub size_steps: i64,
}

/// Floor price and size to ticks. Price keeps at least one tick; size below one tick fails.
pub fn round_order(price: Decimal, size: Decimal, market: &MarketInfo) -> EngineResult<RoundedOrder> {
    let price_out_of_range = || EngineError::PriceOutOfRange {
        price,
        tick: market.price_tick,
    };
    let sizing_failure = || EngineError::SizingFailure {
        size,
        tick: market.size_tick,
    };

    let price_steps = whole_ticks(price, market.price_tick)
        .ok_or_else(price_out_of_range)?
        .max(Decimal::ONE)
        .to_u32()
        .ok_or_else(price_out_of_range)?;

    let size_steps = whole_ticks(size, market.size_tick).ok_or_else(sizing_failure)?;
    if size_steps < Decimal::ONE {
        return Err(sizing_failure());
    }
    let size_steps = size_steps.to_i64().ok_or_else(sizing_failure)?;

    Ok(RoundedOrder {
        price: Decimal::from(price_steps) * market.price_tick,
        size: Decimal::from(size_steps) * market.size_tick,
        price_steps,
        size_steps,
    })
}
