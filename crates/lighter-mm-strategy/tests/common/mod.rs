/*
[INPUT]:  Test configuration and in-memory exchange requirements
[OUTPUT]: Shared fixtures: mock exchange, scripted order-book feed, config builder
[POS]:    Test infrastructure - shared across strategy integration tests
[UPDATE]: When collaborator traits or the config layout change
*/

//! Common test utilities for lighter-mm-strategy tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use lighter_mm_adapter::{
    Account, AccountPosition, AccountsResponse, CreateOrderRequest, LighterError, OrderBookInfo,
    PriceLevel,
};
use lighter_mm_strategy::gateway::{
    GatewayFuture, MarketDirectory, OrderCanceler, OrderSubmitter,
};
use lighter_mm_strategy::market_data::BookCallback;
use lighter_mm_strategy::{
    AccountQuery, Collaborators, MarketDataFeed, StrategyConfig, Subscription,
};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub const MARKET_ID: u16 = 48;
pub const ACCOUNT_INDEX: i64 = 42;

pub fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).expect("decimal")
}

#[derive(Debug, Clone)]
pub enum Call {
    Submit(CreateOrderRequest),
    CancelAll,
    FetchAccount,
}

/// In-memory exchange recording every call made by the engine.
///
/// Positions are served from a queue; the last entry repeats once the
/// queue drains.
pub struct MockExchange {
    calls: Mutex<Vec<Call>>,
    positions: std::sync::Mutex<VecDeque<Decimal>>,
    available: Decimal,
}

impl MockExchange {
    pub fn new(available: &str, positions: &[&str]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            positions: std::sync::Mutex::new(positions.iter().map(|p| dec(p)).collect()),
            available: dec(available),
        }
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    pub async fn submissions(&self) -> Vec<CreateOrderRequest> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| match call {
                Call::Submit(req) => Some(req.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn cancel_count(&self) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| matches!(call, Call::CancelAll))
            .count()
    }

    fn next_position(&self) -> Decimal {
        let mut queue = self.positions.lock().expect("positions lock");
        if queue.len() > 1 {
            queue.pop_front().unwrap_or_default()
        } else {
            queue.front().copied().unwrap_or_default()
        }
    }
}

impl OrderSubmitter for MockExchange {
    fn submit(&self, req: CreateOrderRequest) -> GatewayFuture<'_, String> {
        Box::pin(async move {
            let mut calls = self.calls.lock().await;
            calls.push(Call::Submit(req));
            Ok(format!("0xtx{}", calls.len()))
        })
    }
}

impl OrderCanceler for MockExchange {
    fn cancel_all(&self) -> GatewayFuture<'_, ()> {
        Box::pin(async move {
            self.calls.lock().await.push(Call::CancelAll);
            Ok(())
        })
    }
}

impl MarketDirectory for MockExchange {
    fn find_market(&self, symbol: &str) -> GatewayFuture<'_, OrderBookInfo> {
        let symbol = symbol.to_string();
        Box::pin(async move {
            if !symbol.eq_ignore_ascii_case("PAXG") {
                return Err(LighterError::InvalidResponse(format!(
                    "market {symbol} not found"
                )));
            }
            Ok(OrderBookInfo {
                symbol: "PAXG".to_string(),
                market_id: MARKET_ID,
                status: "active".to_string(),
                supported_price_decimals: 2,
                supported_size_decimals: 4,
            })
        })
    }
}

impl AccountQuery for MockExchange {
    fn fetch(
        &self,
        account_index: i64,
    ) -> Pin<Box<dyn Future<Output = lighter_mm_adapter::Result<AccountsResponse>> + Send + '_>>
    {
        Box::pin(async move {
            self.calls.lock().await.push(Call::FetchAccount);
            let position = self.next_position();
            Ok(AccountsResponse {
                code: 200,
                total: 1,
                accounts: vec![Account {
                    index: account_index,
                    available_balance: self.available,
                    total_asset_value: self.available,
                    positions: vec![AccountPosition {
                        market_id: MARKET_ID,
                        symbol: "PAXG".to_string(),
                        sign: if position < Decimal::ZERO { -1 } else { 1 },
                        position: position.abs(),
                    }],
                }],
            })
        })
    }
}

/// Order-book feed driven by the test.
///
/// When `initial` is set the book is delivered as soon as the engine
/// subscribes; later books go through [`ScriptedFeed::push`].
#[derive(Default)]
pub struct ScriptedFeed {
    initial: Option<(Vec<PriceLevel>, Vec<PriceLevel>)>,
    callback: std::sync::Mutex<Option<BookCallback>>,
    subscriptions: std::sync::Mutex<Vec<u16>>,
}

impl ScriptedFeed {
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn with_book(bid: &str, ask: &str) -> Self {
        Self {
            initial: Some(book(bid, ask)),
            ..Self::default()
        }
    }

    pub fn push(&self, bid: &str, ask: &str) {
        let (bids, asks) = book(bid, ask);
        if let Some(callback) = self.callback.lock().expect("callback lock").as_ref() {
            callback(&bids, &asks);
        }
    }

    pub fn subscribed_markets(&self) -> Vec<u16> {
        self.subscriptions.lock().expect("subscriptions lock").clone()
    }
}

impl MarketDataFeed for ScriptedFeed {
    fn subscribe(
        &self,
        market_id: u16,
        on_update: BookCallback,
    ) -> Pin<Box<dyn Future<Output = lighter_mm_adapter::Result<Subscription>> + Send + '_>> {
        Box::pin(async move {
            self.subscriptions
                .lock()
                .expect("subscriptions lock")
                .push(market_id);
            if let Some((bids, asks)) = &self.initial {
                on_update(bids, asks);
            }
            *self.callback.lock().expect("callback lock") = Some(on_update);
            Ok(Subscription::new(CancellationToken::new(), None))
        })
    }
}

pub fn book(bid: &str, ask: &str) -> (Vec<PriceLevel>, Vec<PriceLevel>) {
    (
        vec![PriceLevel::new(bid, "1.5")],
        vec![PriceLevel::new(ask, "2.0")],
    )
}

pub fn collaborators(exchange: Arc<MockExchange>, feed: Arc<ScriptedFeed>) -> Collaborators {
    Collaborators {
        gateway: exchange.clone(),
        accounts: exchange,
        market_data: feed,
    }
}

/// Engine config with no parameter files on disk and the given cadence.
pub fn test_config(tick_secs: u64, close_long: bool) -> StrategyConfig {
    let yaml = format!(
        "exchange:\n  account_index: {ACCOUNT_INDEX}\n  api_key_index: 3\n  signer_url: http://127.0.0.1:1\n\
         market:\n  symbol: PAXG\n\
         quoting:\n  tick_interval_secs: {tick_secs}\n\
         params:\n  candidates:\n    - /nonexistent/lighter-mm/params.json\n\
         startup:\n  close_long: {close_long}\n"
    );
    StrategyConfig::from_yaml_str(&yaml).expect("test config")
}
