/*
[INPUT]:  Order book metadata from market discovery
[OUTPUT]: Immutable MarketInfo (id, symbol, ticks) for one run
[POS]:    Domain layer - per-run market constants
[UPDATE]: When markets expose new trading constraints
*/

use lighter_mm_adapter::{LighterError, OrderBookInfo};
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketInfo {
    pub market_id: u16,
    pub symbol: String,
    pub price_tick: Decimal,
    pub size_tick: Decimal,
}

impl TryFrom<&OrderBookInfo> for MarketInfo {
    type Error = LighterError;

    fn try_from(info: &OrderBookInfo) -> Result<Self, Self::Error> {
        Ok(Self {
            market_id: info.market_id,
            symbol: info.symbol.clone(),
            price_tick: info.price_tick()?,
            size_tick: info.size_tick()?,
        })
    }
}
