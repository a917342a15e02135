/*
[INPUT]:  Order book pushes for the tracked market (bids/asks, best first)
[OUTPUT]: Latest mid price with freshness, plus the subscription seam
[POS]:    Data layer - market data ingestion (no trading logic)
[UPDATE]: When changing the freshness window or the subscription transport
*/

use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::time::Duration;

use lighter_mm_adapter::{LighterError, LighterWebSocket, LocalOrderBook, PriceLevel, WebSocketMessage};
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::state::{MidPriceSample, SharedState};

/// Samples older than this are treated as absent.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(10);

const UNSUBSCRIBE_TIMEOUT: Duration = Duration::from_secs(5);
const LIVENESS_CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Writer side is the book callback, reader side the control loop.
#[derive(Debug, Clone)]
pub struct MidPriceFeed {
    state: SharedState,
}

impl MidPriceFeed {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    pub fn observe(&self, bids: &[PriceLevel], asks: &[PriceLevel]) -> bool {
        self.observe_at(bids, asks, Instant::now())
    }

    /// Store the mid of the best levels. Returns false when the update was dropped.
    pub fn observe_at(&self, bids: &[PriceLevel], asks: &[PriceLevel], now: Instant) -> bool {
        let (Some(best_bid), Some(best_ask)) = (bids.first(), asks.first()) else {
            return false;
        };
        let (Ok(bid), Ok(ask)) = (
            Decimal::from_str(&best_bid.price),
            Decimal::from_str(&best_ask.price),
        ) else {
            return false;
        };
        if bid <= Decimal::ZERO || ask <= Decimal::ZERO {
            return false;
        }
        let Some(price) = bid
            .checked_add(ask)
            .and_then(|sum| sum.checked_div(Decimal::TWO))
        else {
            return false;
        };

        let sample = MidPriceSample {
            price,
            observed_at: now,
        };
        self.state.write().mid = Some(sample);
        true
    }

    pub fn read(&self) -> (Decimal, bool) {
        self.read_at(Instant::now())
    }

    /// Last mid and whether it is younger than [`FRESHNESS_WINDOW`].
    pub fn read_at(&self, now: Instant) -> (Decimal, bool) {
        match self.state.read().mid {
            Some(sample) => (
                sample.price,
                now.saturating_duration_since(sample.observed_at) < FRESHNESS_WINDOW,
            ),
            None => (Decimal::ZERO, false),
        }
    }

    /// Poll until a fresh mid shows up. `None` on timeout or cancellation.
    pub async fn wait_for_fresh(
        &self,
        timeout: Duration,
        poll: Duration,
        shutdown: &CancellationToken,
    ) -> Option<Decimal> {
        let deadline = Instant::now() + timeout;
        loop {
            let (mid, fresh) = self.read();
            if fresh {
                return Some(mid);
            }
            if Instant::now() >= deadline {
                return None;
            }
            tokio::select! {
                _ = shutdown.cancelled() => return None,
                _ = tokio::time::sleep(poll) => {}
            }
        }
    }
}

/// Called with bids (best first) and asks (best first) after every book change.
pub type BookCallback = Box<dyn Fn(&[PriceLevel], &[PriceLevel]) + Send + Sync>;

pub trait MarketDataFeed: Send + Sync {
    fn subscribe(
        &self,
        market_id: u16,
        on_update: BookCallback,
    ) -> Pin<Box<dyn Future<Output = lighter_mm_adapter::Result<Subscription>> + Send + '_>>;
}

/// Live subscription handle. Dropping it stops delivery.
#[derive(Debug)]
pub struct Subscription {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(cancel: CancellationToken, handle: Option<JoinHandle<()>>) -> Self {
        Self { cancel, handle }
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
            && self
                .handle
                .as_ref()
                .is_none_or(|handle| !handle.is_finished())
    }

    /// Stop delivery and wait briefly for the feed task to detach.
    pub async fn unsubscribe(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take()
            && tokio::time::timeout(UNSUBSCRIBE_TIMEOUT, handle).await.is_err()
        {
            warn!("order book feed did not stop in time");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Order book feed over the Lighter public stream, one connection per subscription.
#[derive(Debug, Clone)]
pub struct LighterBookFeed {
    ws_url: String,
}

impl LighterBookFeed {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
        }
    }
}

impl MarketDataFeed for LighterBookFeed {
    fn subscribe(
        &self,
        market_id: u16,
        on_update: BookCallback,
    ) -> Pin<Box<dyn Future<Output = lighter_mm_adapter::Result<Subscription>> + Send + '_>> {
        Box::pin(async move {
            let mut ws = LighterWebSocket::with_url(self.ws_url.clone());
            let mut rx = ws
                .take_receiver()
                .ok_or_else(|| LighterError::WebSocket("receiver already taken".to_string()))?;
            ws.connect().await?;
            ws.subscribe_order_book(market_id).await?;
            info!(market_id, url = %self.ws_url, "order book subscribed");

            let cancel = CancellationToken::new();
            let task_cancel = cancel.clone();
            let handle = tokio::spawn(async move {
                let mut book = LocalOrderBook::new();
                let mut liveness = tokio::time::interval(LIVENESS_CHECK_INTERVAL);
                liveness.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

                loop {
                    tokio::select! {
                        _ = task_cancel.cancelled() => {
                            if let Err(err) = ws.unsubscribe_order_book(market_id).await {
                                debug!(market_id, error = %err, "unsubscribe failed");
                            }
                            ws.close().await;
                            info!(market_id, "order book unsubscribed");
                            break;
                        }
                        _ = liveness.tick() => {
                            if !ws.is_connected().await {
                                // no reconnect: the mid goes stale and ticks idle
                                warn!(market_id, "order book stream disconnected");
                                break;
                            }
                        }
                        message = rx.recv() => {
                            let Some(message) = message else {
                                warn!(market_id, "order book stream ended");
                                break;
                            };
                            if message.market_id() != Some(market_id) {
                                continue;
                            }
                            match &message {
                                WebSocketMessage::OrderBookSnapshot { order_book, .. } => {
                                    book.apply_snapshot(order_book);
                                }
                                WebSocketMessage::OrderBookUpdate { order_book, .. } => {
                                    book.apply_update(order_book);
                                }
                                _ => continue,
                            }
                            on_update(&book.bids(), &book.asks());
                        }
                    }
                }
            });

            Ok(Subscription::new(cancel, Some(handle)))
        })
    }
}
