/*
[INPUT]:  Account query responses (balances, per-market positions)
[OUTPUT]: AccountSnapshot for the tracked market, replaced atomically on refresh
[POS]:    Data layer - account/position cache, refreshed on demand
[UPDATE]: When account fields or the position lookup rule change
*/

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use lighter_mm_adapter::{AccountsResponse, LighterClient, LighterError};
use rust_decimal::Decimal;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::state::{AccountSnapshot, SharedState};

pub trait AccountQuery: Send + Sync {
    fn fetch(
        &self,
        account_index: i64,
    ) -> Pin<Box<dyn Future<Output = lighter_mm_adapter::Result<AccountsResponse>> + Send + '_>>;
}

impl AccountQuery for LighterClient {
    fn fetch(
        &self,
        account_index: i64,
    ) -> Pin<Box<dyn Future<Output = lighter_mm_adapter::Result<AccountsResponse>> + Send + '_>>
    {
        Box::pin(async move { LighterClient::account_by_index(self, account_index).await })
    }
}

#[derive(Debug, Clone)]
pub struct AccountStateCache {
    state: SharedState,
    account_index: i64,
    market_id: u16,
}

impl AccountStateCache {
    pub fn new(state: SharedState, account_index: i64, market_id: u16) -> Self {
        Self {
            state,
            account_index,
            market_id,
        }
    }

    /// Fetch the account and replace the snapshot. The old snapshot survives a failure.
    pub async fn refresh(
        &self,
        query: &dyn AccountQuery,
    ) -> lighter_mm_adapter::Result<AccountSnapshot> {
        let response = query.fetch(self.account_index).await?;
        let account = match response
            .accounts
            .iter()
            .find(|account| account.index == self.account_index)
        {
            Some(account) => account,
            None => {
                let first = response.accounts.first().ok_or_else(|| {
                    LighterError::InvalidResponse("account response empty".to_string())
                })?;
                warn!(
                    requested = self.account_index,
                    returned = first.index,
                    "account index not in response, using first account"
                );
                first
            }
        };

        let snapshot = AccountSnapshot {
            available_capital: account.available_balance,
            portfolio_value: account.total_asset_value,
            position_size: account.position_for(self.market_id),
            fetched_at: Instant::now(),
        };
        self.state.write().account = Some(snapshot);
        debug!(
            available = %snapshot.available_capital,
            portfolio = %snapshot.portfolio_value,
            position = %snapshot.position_size,
            "account refreshed"
        );
        Ok(snapshot)
    }

    pub fn snapshot(&self) -> Option<AccountSnapshot> {
        self.state.read().account
    }

    /// Tracked-market position; zero before the first refresh.
    pub fn position(&self) -> Decimal {
        self.snapshot()
            .map(|snapshot| snapshot.position_size)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn available_capital(&self) -> Decimal {
        self.snapshot()
            .map(|snapshot| snapshot.available_capital)
            .unwrap_or(Decimal::ZERO)
    }

    /// Advisory only: the cache never refreshes itself.
    pub fn is_due(&self, now: Instant, interval: Duration) -> bool {
        match self.snapshot() {
            Some(snapshot) => now.saturating_duration_since(snapshot.fetched_at) >= interval,
            None => true,
        }
    }
}
