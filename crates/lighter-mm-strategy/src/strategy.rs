/*
[INPUT]:  Mid price feed, account cache, pricing parameters, exchange gateway
[OUTPUT]: One hold/cancel/place decision per tick for the single tracked order
[POS]:    Strategy layer - order lifecycle state machine and side transitions
[UPDATE]: When changing cancel triggers, placement rules or side flip points
*/

use std::sync::Arc;
use std::time::Duration;

use lighter_mm_adapter::{CreateOrderRequest, Side};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::account::{AccountQuery, AccountStateCache};
use crate::error::{EngineError, EngineResult};
use crate::gateway::ExchangeGateway;
use crate::market::MarketInfo;
use crate::market_data::MidPriceFeed;
use crate::metrics::EngineMetrics;
use crate::order_state::{OrderRecord, OrderState, evaluate_post_cycle, price_moved};
use crate::params::ParameterStore;
use crate::quote::{QuoteConfig, round_order, target_price, target_size};
use crate::state::SharedState;

/// What a tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Tracked order left resting.
    Held,
    /// Mid drifted away from the order's reference; nothing placed this tick.
    CancelledOnPriceMove { previous: OrderRecord },
    /// Order outlived its timeout; `side` is the side after re-evaluation.
    CancelledOnTimeout { previous: OrderRecord, side: Side },
    Placed(OrderRecord),
    /// Quoting side has nothing to trade (e.g. sell side without a material position).
    NothingToQuote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleTimings {
    pub order_timeout: Duration,
    pub account_refresh: Duration,
}

impl Default for LifecycleTimings {
    fn default() -> Self {
        Self {
            order_timeout: Duration::from_secs(90),
            account_refresh: Duration::from_secs(15),
        }
    }
}

/// Drives the single tracked order through `NoOrder`/`OrderOpen`.
///
/// All mutable state lives in the shared aggregate, so `tick` takes `&self`.
/// Exchange calls are made without holding the state lock.
#[derive(Debug)]
pub struct OrderLifecycleController {
    market: MarketInfo,
    quote: QuoteConfig,
    timings: LifecycleTimings,
    state: SharedState,
    feed: MidPriceFeed,
    account: AccountStateCache,
    params: ParameterStore,
    metrics: Arc<Mutex<EngineMetrics>>,
}

impl OrderLifecycleController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        market: MarketInfo,
        quote: QuoteConfig,
        timings: LifecycleTimings,
        state: SharedState,
        feed: MidPriceFeed,
        account: AccountStateCache,
        params: ParameterStore,
        metrics: Arc<Mutex<EngineMetrics>>,
    ) -> Self {
        Self {
            market,
            quote,
            timings,
            state,
            feed,
            account,
            params,
            metrics,
        }
    }

    pub fn market(&self) -> &MarketInfo {
        &self.market
    }

    pub fn side(&self) -> Side {
        self.state.read().side
    }

    pub fn order_state(&self) -> OrderState {
        self.state.read().order.clone()
    }

    pub async fn tick(
        &self,
        gateway: &dyn ExchangeGateway,
        accounts: &dyn AccountQuery,
        now: Instant,
    ) -> EngineResult<TickOutcome> {
        self.metrics.lock().record_tick();

        let (mid, fresh) = self.feed.read_at(now);
        if !fresh {
            self.metrics.lock().record_stale_tick();
            return Err(EngineError::StaleData);
        }
        self.metrics.lock().record_price(mid);

        if self.account.is_due(now, self.timings.account_refresh) {
            match self.account.refresh(accounts).await {
                Ok(snapshot) => self.metrics.lock().record_position_qty(snapshot.position_size),
                Err(err) => warn!(error = %err, "account refresh failed, using previous snapshot"),
            }
        }

        let open = self.state.read().order.record().cloned();
        match open {
            Some(record) => self.manage_open_order(gateway, accounts, record, mid, now).await,
            None => self.place_quote(gateway, mid, now).await,
        }
    }

    async fn manage_open_order(
        &self,
        gateway: &dyn ExchangeGateway,
        accounts: &dyn AccountQuery,
        record: OrderRecord,
        mid: Decimal,
        now: Instant,
    ) -> EngineResult<TickOutcome> {
        if price_moved(record.reference_mid, mid) {
            gateway.cancel_all().await?;
            self.state.write().order = OrderState::NoOrder;
            self.metrics.lock().record_price_cancel();
            info!(
                order_id = record.id,
                side = %record.side,
                reference_mid = %record.reference_mid,
                mid = %mid,
                "mid moved away from order, cancelled"
            );
            return Ok(TickOutcome::CancelledOnPriceMove { previous: record });
        }

        let age = record.age(now);
        if age > self.timings.order_timeout {
            gateway.cancel_all().await?;
            self.state.write().order = OrderState::NoOrder;
            self.metrics.lock().record_timeout_cancel();
            info!(
                order_id = record.id,
                side = %record.side,
                age_secs = age.as_secs(),
                "order timed out, cancelled"
            );

            match self.account.refresh(accounts).await {
                Ok(snapshot) => self.metrics.lock().record_position_qty(snapshot.position_size),
                Err(err) => warn!(error = %err, "post-cancel account refresh failed"),
            }
            let side = self.evaluate_side(mid);
            return Ok(TickOutcome::CancelledOnTimeout {
                previous: record,
                side,
            });
        }

        debug!(order_id = record.id, age_secs = age.as_secs(), "holding order");
        Ok(TickOutcome::Held)
    }

    fn evaluate_side(&self, mid: Decimal) -> Side {
        let position = self.account.position();
        let (previous, next) = {
            let mut state = self.state.write();
            let previous = state.side;
            state.side =
                evaluate_post_cycle(previous, position, mid, self.quote.min_position_value_usd);
            (previous, state.side)
        };
        if previous != next {
            info!(from = %previous, to = %next, position = %position, mid = %mid, "side switched");
        }
        next
    }

    async fn place_quote(
        &self,
        gateway: &dyn ExchangeGateway,
        mid: Decimal,
        now: Instant,
    ) -> EngineResult<TickOutcome> {
        let side = self.side();
        let params = self.params.load_at(now);
        let price = target_price(mid, side, params.as_ref(), &self.quote)
            .ok_or(EngineError::ConfigurationUnavailable)?;

        let snapshot = self.account.snapshot();
        let position = snapshot.map(|s| s.position_size).unwrap_or_default();
        let capital = snapshot.map(|s| s.available_capital).unwrap_or_default();
        let size = target_size(side, mid, position, capital, &self.quote, self.market.size_tick);
        if size <= Decimal::ZERO {
            debug!(side = %side, position = %position, mid = %mid, "nothing to quote");
            return Ok(TickOutcome::NothingToQuote);
        }

        let reduce_only = side == Side::Sell;
        let record = self
            .submit(gateway, side, price, size, reduce_only, mid, now)
            .await?;
        self.state.write().order = OrderState::OrderOpen(record.clone());
        self.metrics.lock().record_order_placed();
        Ok(TickOutcome::Placed(record))
    }

    /// Reduce-only sell of `position` at `mid*(1+spread)`, used to flatten at startup.
    ///
    /// The order is not tracked; the caller polls the position instead.
    pub async fn submit_flatten_order(
        &self,
        gateway: &dyn ExchangeGateway,
        position: Decimal,
        mid: Decimal,
    ) -> EngineResult<OrderRecord> {
        let price = mid * (Decimal::ONE + self.quote.spread);
        self.submit(gateway, Side::Sell, price, position, true, mid, Instant::now())
            .await
    }

    /// Return to the initial quoting state after a startup flatten.
    pub fn reset_after_flatten(&self) {
        let mut state = self.state.write();
        state.side = Side::Buy;
        state.order = OrderState::NoOrder;
    }

    #[allow(clippy::too_many_arguments)]
    async fn submit(
        &self,
        gateway: &dyn ExchangeGateway,
        side: Side,
        price: Decimal,
        size: Decimal,
        reduce_only: bool,
        mid: Decimal,
        now: Instant,
    ) -> EngineResult<OrderRecord> {
        let rounded = round_order(price, size, &self.market)?;
        let req = CreateOrderRequest::post_only_limit(
            self.market.market_id,
            side,
            rounded.size_steps,
            rounded.price_steps,
            reduce_only,
        );
        let id = req.client_order_index;
        let tx_hash = gateway.submit(req).await?;

        info!(
            market = %self.market.symbol,
            order_id = id,
            side = %side,
            price = %rounded.price,
            size = %rounded.size,
            reduce_only,
            mid = %mid,
            "order placed"
        );
        Ok(OrderRecord {
            id,
            side,
            price: rounded.price,
            size: rounded.size,
            placed_at: now,
            reduce_only,
            reference_mid: mid,
            tx_hash,
        })
    }
}
