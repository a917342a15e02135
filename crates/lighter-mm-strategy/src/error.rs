/*
[INPUT]:  Failures raised while evaluating one control-loop tick
[OUTPUT]: EngineError taxonomy consumed by the orchestrator's logging
[POS]:    Error layer - per-tick failure classification
[UPDATE]: When adding a new way for a tick to be abandoned
*/

use lighter_mm_adapter::LighterError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Reasons a tick is abandoned. None of these stop the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No mid price younger than the freshness window.
    #[error("mid price is stale or missing")]
    StaleData,

    /// Pricing parameters are mandatory and none could be loaded.
    #[error("pricing parameters required but unavailable")]
    ConfigurationUnavailable,

    /// Size floored to zero ticks.
    #[error("order size {size} below minimum tick {tick}")]
    SizingFailure { size: Decimal, tick: Decimal },

    /// Price cannot be expressed in exchange tick units.
    #[error("price {price} out of range for tick {tick}")]
    PriceOutOfRange { price: Decimal, tick: Decimal },

    /// Exchange call failed.
    #[error("exchange call failed: {0}")]
    Transport(#[from] LighterError),
}

impl EngineError {
    /// Stale data is the normal idle state before the feed warms up.
    pub fn is_quiet(&self) -> bool {
        matches!(self, EngineError::StaleData)
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
