/*
[INPUT]:  Order book snapshots and incremental updates
[OUTPUT]: Sorted bid/ask levels for consumers
[POS]:    WebSocket layer - local book maintenance
[UPDATE]: When the update semantics of the order book channel change
*/

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::types::PriceLevel;
use crate::ws::message::OrderBookData;

/// Local copy of one market's book, keyed by price.
#[derive(Debug, Default, Clone)]
pub struct LocalOrderBook {
    bids: BTreeMap<Decimal, Decimal>,
    asks: BTreeMap<Decimal, Decimal>,
}

impl LocalOrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole book.
    pub fn apply_snapshot(&mut self, data: &OrderBookData) {
        self.bids.clear();
        self.asks.clear();
        self.apply_update(data);
    }

    /// Merge changed levels; zero size removes the level. Unparsable levels are ignored.
    pub fn apply_update(&mut self, data: &OrderBookData) {
        merge_levels(&mut self.bids, &data.bids);
        merge_levels(&mut self.asks, &data.asks);
    }

    /// Bids, best (highest) first.
    pub fn bids(&self) -> Vec<PriceLevel> {
        self.bids
            .iter()
            .rev()
            .map(|(price, size)| PriceLevel::new(price.to_string(), size.to_string()))
            .collect()
    }

    /// Asks, best (lowest) first.
    pub fn asks(&self) -> Vec<PriceLevel> {
        self.asks
            .iter()
            .map(|(price, size)| PriceLevel::new(price.to_string(), size.to_string()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

fn merge_levels(side: &mut BTreeMap<Decimal, Decimal>, levels: &[PriceLevel]) {
    for level in levels {
        let (Ok(price), Ok(size)) = (
            Decimal::from_str(level.price.trim()),
            Decimal::from_str(level.size.trim()),
        ) else {
            continue;
        };
        if size.is_zero() {
            side.remove(&price);
        } else {
            side.insert(price, size);
        }
    }
}
