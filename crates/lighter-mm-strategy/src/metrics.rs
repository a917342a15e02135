/*
[INPUT]:  Control-loop events (ticks, placements, cancels, heartbeat, price)
[OUTPUT]: Snapshot-friendly engine counters for heartbeat and shutdown logs
[POS]:    Shared runtime metrics between the control loop and the orchestrator
[UPDATE]: When adding/removing engine-level runtime signals
*/

use rust_decimal::Decimal;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineMetricsSnapshot {
    pub ticks: u64,
    pub stale_ticks: u64,
    pub failed_ticks: u64,
    pub orders_placed: u64,
    pub price_cancels: u64,
    pub timeout_cancels: u64,
    pub position_qty: Decimal,
    pub last_price: Option<Decimal>,
    pub last_heartbeat: Option<Instant>,
    pub last_update: Option<Instant>,
}

#[derive(Debug, Default)]
pub struct EngineMetrics {
    ticks: u64,
    stale_ticks: u64,
    failed_ticks: u64,
    orders_placed: u64,
    price_cancels: u64,
    timeout_cancels: u64,
    position_qty: Decimal,
    last_price: Option<Decimal>,
    last_heartbeat: Option<Instant>,
    last_update: Option<Instant>,
}

impl EngineMetrics {
    pub fn snapshot(&self) -> EngineMetricsSnapshot {
        EngineMetricsSnapshot {
            ticks: self.ticks,
            stale_ticks: self.stale_ticks,
            failed_ticks: self.failed_ticks,
            orders_placed: self.orders_placed,
            price_cancels: self.price_cancels,
            timeout_cancels: self.timeout_cancels,
            position_qty: self.position_qty,
            last_price: self.last_price,
            last_heartbeat: self.last_heartbeat,
            last_update: self.last_update,
        }
    }

    pub fn record_tick(&mut self) {
        self.ticks += 1;
        self.last_update = Some(Instant::now());
    }

    pub fn record_stale_tick(&mut self) {
        self.stale_ticks += 1;
    }

    pub fn record_failed_tick(&mut self) {
        self.failed_ticks += 1;
    }

    pub fn record_order_placed(&mut self) {
        self.orders_placed += 1;
        self.last_update = Some(Instant::now());
    }

    pub fn record_price_cancel(&mut self) {
        self.price_cancels += 1;
        self.last_update = Some(Instant::now());
    }

    pub fn record_timeout_cancel(&mut self) {
        self.timeout_cancels += 1;
        self.last_update = Some(Instant::now());
    }

    pub fn record_position_qty(&mut self, position_qty: Decimal) {
        self.position_qty = position_qty;
        self.last_update = Some(Instant::now());
    }

    pub fn record_price(&mut self, price: Decimal) {
        self.last_price = Some(price);
    }

    pub fn record_heartbeat(&mut self) {
        self.last_heartbeat = Some(Instant::now());
    }
}
