/*
[INPUT]:  Public API exports for lighter-mm-strategy crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod account;
pub mod config;
pub mod error;
pub mod gateway;
pub mod market;
pub mod market_data;
pub mod metrics;
pub mod order_state;
pub mod params;
pub mod quote;
pub mod state;
pub mod strategy;
pub mod task;

// Re-export main types for convenience
pub use crate::account::{AccountQuery, AccountStateCache};
pub use crate::config::StrategyConfig;
pub use crate::error::{EngineError, EngineResult};
pub use crate::gateway::{ExchangeGateway, LighterGateway};
pub use crate::market_data::{LighterBookFeed, MarketDataFeed, MidPriceFeed, Subscription};
pub use crate::params::{ParameterStore, PricingParameters};
pub use crate::strategy::{OrderLifecycleController, TickOutcome};
pub use crate::task::{Collaborators, Task, TaskState};
