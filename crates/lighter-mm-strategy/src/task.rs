/*
[INPUT]:  Strategy configuration, exchange collaborators, shutdown token
[OUTPUT]: Running control loop for one market with startup and shutdown sequencing
[POS]:    Orchestration layer - wires feed, account cache, parameters and controller
[UPDATE]: When changing startup steps, tick cadence or shutdown behaviour
*/

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result, anyhow, bail};
use lighter_mm_adapter::PriceLevel;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::account::{AccountQuery, AccountStateCache};
use crate::config::StrategyConfig;
use crate::gateway::ExchangeGateway;
use crate::market::MarketInfo;
use crate::market_data::{MarketDataFeed, MidPriceFeed, Subscription};
use crate::metrics::EngineMetrics;
use crate::order_state::POSITION_EPSILON;
use crate::params::ParameterStore;
use crate::state::{SharedState, shared_state};
use crate::strategy::{OrderLifecycleController, TickOutcome};

const INITIAL_DATA_TIMEOUT: Duration = Duration::from_secs(30);
const INITIAL_DATA_POLL: Duration = Duration::from_millis(500);
const CLOSE_LONG_TIMEOUT: Duration = Duration::from_secs(60);
const CLOSE_LONG_POLL: Duration = Duration::from_secs(2);
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Init,
    Starting,
    Running,
    Stopping,
    Stopped,
    Failed,
}

/// External services the engine talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub gateway: Arc<dyn ExchangeGateway>,
    pub accounts: Arc<dyn AccountQuery>,
    pub market_data: Arc<dyn MarketDataFeed>,
}

/// One market-making engine bound to a single market.
pub struct Task {
    id: Uuid,
    config: StrategyConfig,
    collaborators: Collaborators,
    state: TaskState,
    shutdown: CancellationToken,
    engine: SharedState,
    metrics: Arc<Mutex<EngineMetrics>>,
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("symbol", &self.config.market.symbol)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Task {
    pub fn new(
        config: StrategyConfig,
        collaborators: Collaborators,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            collaborators,
            state: TaskState::Init,
            shutdown,
            engine: shared_state(),
            metrics: Arc::new(Mutex::new(EngineMetrics::default())),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Engine state shared with the feed callback; exposed for inspection.
    pub fn engine_state(&self) -> SharedState {
        self.engine.clone()
    }

    pub fn metrics(&self) -> Arc<Mutex<EngineMetrics>> {
        self.metrics.clone()
    }

    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }

    pub async fn run(mut self) -> Result<()> {
        self.state = TaskState::Starting;
        info!(
            task_uuid = %self.id,
            symbol = %self.config.market.symbol,
            "task starting"
        );

        let (controller, subscription) = match self.startup_sequence().await {
            Ok(started) => started,
            Err(err) if self.shutdown.is_cancelled() => {
                self.state = TaskState::Stopped;
                info!(task_uuid = %self.id, reason = %err, "shutdown during startup");
                return Ok(());
            }
            Err(err) => {
                self.state = TaskState::Failed;
                error!(
                    task_uuid = %self.id,
                    symbol = %self.config.market.symbol,
                    error = %format!("{err:#}"),
                    "startup sequence failed"
                );
                return Err(err).context("startup sequence failed");
            }
        };

        self.state = TaskState::Running;
        info!(
            task_uuid = %self.id,
            market = %controller.market().symbol,
            market_id = controller.market().market_id,
            tick_secs = self.config.tick_interval().as_secs(),
            "task running"
        );

        self.run_loop(&controller).await;

        self.state = TaskState::Stopping;
        info!(task_uuid = %self.id, "task stopping");
        subscription.unsubscribe().await;
        self.log_final_state(&controller);
        self.state = TaskState::Stopped;
        Ok(())
    }

    async fn startup_sequence(&self) -> Result<(OrderLifecycleController, Subscription)> {
        let symbol = self.config.market.symbol.clone();
        let gateway = self.collaborators.gateway.clone();

        let info = gateway
            .find_market(&symbol)
            .await
            .with_context(|| format!("discover market {symbol}"))?;
        let market =
            MarketInfo::try_from(&info).with_context(|| format!("discover market {symbol}"))?;
        info!(
            market = %market.symbol,
            market_id = market.market_id,
            price_tick = %market.price_tick,
            size_tick = %market.size_tick,
            "market discovered"
        );

        if let Err(err) = gateway.cancel_all().await {
            warn!(error = %err, "startup cancel-all failed");
        }

        let feed = MidPriceFeed::new(self.engine.clone());
        let writer = feed.clone();
        let subscription = self
            .collaborators
            .market_data
            .subscribe(
                market.market_id,
                Box::new(move |bids: &[PriceLevel], asks: &[PriceLevel]| {
                    writer.observe(bids, asks);
                }),
            )
            .await
            .context("subscribe order book")?;

        let mid = feed
            .wait_for_fresh(INITIAL_DATA_TIMEOUT, INITIAL_DATA_POLL, &self.shutdown)
            .await;
        if self.shutdown.is_cancelled() {
            bail!("shutdown requested while waiting for market data");
        }
        let mid = mid.ok_or_else(|| anyhow!("timed out waiting for initial mid price"))?;

        let account = AccountStateCache::new(
            self.engine.clone(),
            self.config.exchange.account_index,
            market.market_id,
        );
        let snapshot = account
            .refresh(self.collaborators.accounts.as_ref())
            .await
            .context("initial account fetch")?;
        self.metrics.lock().record_position_qty(snapshot.position_size);
        info!(
            mid = %mid,
            available = %snapshot.available_capital,
            portfolio = %snapshot.portfolio_value,
            position = %snapshot.position_size,
            "account ready"
        );

        let params = ParameterStore::from_paths(
            self.engine.clone(),
            self.config.param_candidates(),
            self.config.params_refresh(),
        );
        let controller = OrderLifecycleController::new(
            market,
            self.config.quote_config(),
            self.config.lifecycle_timings(),
            self.engine.clone(),
            feed.clone(),
            account.clone(),
            params,
            self.metrics.clone(),
        );

        if self.config.startup.close_long {
            self.close_existing_long(&controller, &feed, &account)
                .await
                .context("close-long")?;
        }

        Ok((controller, subscription))
    }

    /// Flatten a long position left over from a previous run before quoting.
    async fn close_existing_long(
        &self,
        controller: &OrderLifecycleController,
        feed: &MidPriceFeed,
        account: &AccountStateCache,
    ) -> Result<()> {
        let position = account.position();
        if position <= Decimal::ZERO {
            info!(position = %position, "no long position to close");
            return Ok(());
        }
        let (mid, fresh) = feed.read();
        if !fresh || mid <= Decimal::ZERO {
            bail!("mid price unavailable for close-long");
        }

        controller
            .submit_flatten_order(self.collaborators.gateway.as_ref(), position, mid)
            .await
            .context("place reduce-only sell")?;
        info!(position = %position, "reduce-only sell placed to close initial position");

        let deadline = Instant::now() + CLOSE_LONG_TIMEOUT;
        let mut poll = tokio::time::interval_at(Instant::now() + CLOSE_LONG_POLL, CLOSE_LONG_POLL);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    bail!("shutdown requested while closing position");
                }
                _ = tokio::time::sleep_until(deadline) => {
                    bail!("timed out waiting for position to close");
                }
                _ = poll.tick() => {
                    let snapshot = match account.refresh(self.collaborators.accounts.as_ref()).await {
                        Ok(snapshot) => snapshot,
                        Err(err) => {
                            warn!(error = %err, "account refresh during close-long failed");
                            continue;
                        }
                    };
                    if snapshot.position_size.abs() < POSITION_EPSILON {
                        controller.reset_after_flatten();
                        info!("position closed successfully");
                        return Ok(());
                    }
                    debug!(remaining = %snapshot.position_size, "waiting for position to close");
                }
            }
        }
    }

    async fn run_loop(&self, controller: &OrderLifecycleController) {
        let period = self.config.tick_interval();
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut heartbeat =
            tokio::time::interval_at(Instant::now() + HEARTBEAT_INTERVAL, HEARTBEAT_INTERVAL);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!(task_uuid = %self.id, "shutdown requested");
                    return;
                }
                _ = ticker.tick() => {
                    if self.shutdown.is_cancelled() {
                        return;
                    }
                    self.run_tick(controller).await;
                }
                _ = heartbeat.tick() => {
                    self.log_heartbeat(controller);
                }
            }
        }
    }

    async fn run_tick(&self, controller: &OrderLifecycleController) {
        let outcome = controller
            .tick(
                self.collaborators.gateway.as_ref(),
                self.collaborators.accounts.as_ref(),
                Instant::now(),
            )
            .await;
        match outcome {
            Ok(TickOutcome::Held) | Ok(TickOutcome::NothingToQuote) => {}
            Ok(outcome) => debug!(outcome = ?outcome, "tick completed"),
            Err(err) if err.is_quiet() => {
                debug!(error = %err, "tick skipped");
            }
            Err(err) => {
                self.metrics.lock().record_failed_tick();
                warn!(error = %err, "tick failed");
            }
        }
    }

    fn log_heartbeat(&self, controller: &OrderLifecycleController) {
        let snapshot = {
            let mut metrics = self.metrics.lock();
            metrics.record_heartbeat();
            metrics.snapshot()
        };
        let order = controller.order_state();
        info!(
            market = %controller.market().symbol,
            side = %controller.side(),
            order_state = order.label(),
            last_mid = ?snapshot.last_price,
            position = %snapshot.position_qty,
            ticks = snapshot.ticks,
            stale_ticks = snapshot.stale_ticks,
            failed_ticks = snapshot.failed_ticks,
            orders_placed = snapshot.orders_placed,
            price_cancels = snapshot.price_cancels,
            timeout_cancels = snapshot.timeout_cancels,
            "heartbeat"
        );
    }

    fn log_final_state(&self, controller: &OrderLifecycleController) {
        let snapshot = self.metrics.lock().snapshot();
        let order = controller.order_state();
        // resting orders are left on the book
        info!(
            task_uuid = %self.id,
            side = %controller.side(),
            order_state = order.label(),
            open_order_id = ?order.record().map(|record| record.id),
            ticks = snapshot.ticks,
            orders_placed = snapshot.orders_placed,
            "task stopped"
        );
    }
}
