/*
[INPUT]:  YAML configuration file, LIGHTER_MM__* environment overrides
[OUTPUT]: Validated strategy configuration
[POS]:    Configuration layer - engine setup
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use lighter_mm_adapter::{DEFAULT_BASE_URL, DEFAULT_STREAM_URL};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::params::default_candidates;
use crate::quote::QuoteConfig;
use crate::strategy::LifecycleTimings;

const ENV_PREFIX: &str = "LIGHTER_MM";
const ENV_SEPARATOR: &str = "__";

/// Top-level configuration for the market maker
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyConfig {
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub quoting: QuotingConfig,
    #[serde(default)]
    pub params: ParamsConfig,
    #[serde(default)]
    pub account: AccountRefreshConfig,
    #[serde(default)]
    pub startup: StartupConfig,
}

/// Exchange endpoints and account identity
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExchangeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    pub account_index: i64,
    pub api_key_index: u8,
    /// Signing service holding the API key
    pub signer_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarketConfig {
    /// Market symbol (e.g., "PAXG")
    #[serde(default = "default_symbol")]
    pub symbol: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
        }
    }
}

/// Quote pricing, sizing and lifecycle timing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuotingConfig {
    #[serde(default = "default_spread")]
    pub spread: Decimal,
    #[serde(default = "default_base_amount")]
    pub base_amount: Decimal,
    #[serde(default = "default_true")]
    pub use_dynamic_sizing: bool,
    #[serde(default = "default_capital_usage")]
    pub capital_usage: Decimal,
    #[serde(default = "default_safety_margin")]
    pub safety_margin: Decimal,
    #[serde(default = "default_min_position_value_usd")]
    pub min_position_value_usd: Decimal,
    #[serde(default = "default_order_timeout_secs")]
    pub order_timeout_secs: u64,
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
}

impl Default for QuotingConfig {
    fn default() -> Self {
        Self {
            spread: default_spread(),
            base_amount: default_base_amount(),
            use_dynamic_sizing: true,
            capital_usage: default_capital_usage(),
            safety_margin: default_safety_margin(),
            min_position_value_usd: default_min_position_value_usd(),
            order_timeout_secs: default_order_timeout_secs(),
            tick_interval_secs: default_tick_interval_secs(),
        }
    }
}

/// Externally supplied pricing parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParamsConfig {
    #[serde(default = "default_params_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_params_refresh_secs")]
    pub refresh_secs: u64,
    /// Refuse to quote on the static spread when no parameters load
    #[serde(default)]
    pub require: bool,
    /// Explicit candidate files; empty means the default search list
    #[serde(default)]
    pub candidates: Vec<PathBuf>,
}

impl Default for ParamsConfig {
    fn default() -> Self {
        Self {
            dir: default_params_dir(),
            refresh_secs: default_params_refresh_secs(),
            require: false,
            candidates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountRefreshConfig {
    #[serde(default = "default_account_refresh_secs")]
    pub refresh_secs: u64,
}

impl Default for AccountRefreshConfig {
    fn default() -> Self {
        Self {
            refresh_secs: default_account_refresh_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StartupConfig {
    /// Flatten an existing long position before quoting
    #[serde(default)]
    pub close_long: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_ws_url() -> String {
    DEFAULT_STREAM_URL.to_string()
}

fn default_symbol() -> String {
    "PAXG".to_string()
}

fn default_spread() -> Decimal {
    Decimal::new(35, 5)
}

fn default_base_amount() -> Decimal {
    Decimal::new(47, 3)
}

fn default_true() -> bool {
    true
}

fn default_capital_usage() -> Decimal {
    Decimal::new(99, 2)
}

fn default_safety_margin() -> Decimal {
    Decimal::new(1, 2)
}

fn default_min_position_value_usd() -> Decimal {
    Decimal::from(15)
}

fn default_order_timeout_secs() -> u64 {
    90
}

fn default_tick_interval_secs() -> u64 {
    3
}

fn default_params_dir() -> PathBuf {
    PathBuf::from("params")
}

fn default_params_refresh_secs() -> u64 {
    15 * 60
}

fn default_account_refresh_secs() -> u64 {
    15
}

impl StrategyConfig {
    /// Load configuration from a YAML file, then apply `LIGHTER_MM__SECTION__KEY` overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_file_with_env(path, None)
    }

    /// `env` replaces the process environment as the override source when set.
    fn from_file_with_env(
        path: &Path,
        env: Option<::config::Map<String, String>>,
    ) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path).format(::config::FileFormat::Yaml))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .with_context(|| format!("read config {}", path.display()))?;
        settings
            .try_deserialize()
            .with_context(|| format!("parse config {}", path.display()))
    }

    /// Parse YAML text without environment overrides
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("parse yaml config")
    }

    pub fn validate(&self) -> Result<()> {
        if self.market.symbol.trim().is_empty() {
            bail!("market.symbol must not be empty");
        }
        if self.exchange.signer_url.trim().is_empty() {
            bail!("exchange.signer_url must not be empty");
        }
        if self.exchange.account_index < 0 {
            bail!("exchange.account_index must not be negative");
        }
        let q = &self.quoting;
        if q.spread <= Decimal::ZERO {
            bail!("quoting.spread must be positive");
        }
        if q.base_amount <= Decimal::ZERO {
            bail!("quoting.base_amount must be positive");
        }
        for (name, value) in [
            ("quoting.capital_usage", q.capital_usage),
            ("quoting.safety_margin", q.safety_margin),
        ] {
            if value < Decimal::ZERO || value > Decimal::ONE {
                bail!("{name} must be within [0, 1], got {value}");
            }
        }
        if q.min_position_value_usd < Decimal::ZERO {
            bail!("quoting.min_position_value_usd must not be negative");
        }
        if q.tick_interval_secs == 0 {
            bail!("quoting.tick_interval_secs must be positive");
        }
        if q.order_timeout_secs == 0 {
            bail!("quoting.order_timeout_secs must be positive");
        }
        if self.account.refresh_secs == 0 {
            bail!("account.refresh_secs must be positive");
        }
        Ok(())
    }

    pub fn quote_config(&self) -> QuoteConfig {
        QuoteConfig {
            spread: self.quoting.spread,
            base_amount: self.quoting.base_amount,
            use_dynamic_sizing: self.quoting.use_dynamic_sizing,
            capital_usage: self.quoting.capital_usage,
            safety_margin: self.quoting.safety_margin,
            min_position_value_usd: self.quoting.min_position_value_usd,
            require_params: self.params.require,
        }
    }

    pub fn lifecycle_timings(&self) -> LifecycleTimings {
        LifecycleTimings {
            order_timeout: Duration::from_secs(self.quoting.order_timeout_secs),
            account_refresh: Duration::from_secs(self.account.refresh_secs),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.quoting.tick_interval_secs)
    }

    pub fn params_refresh(&self) -> Duration {
        Duration::from_secs(self.params.refresh_secs)
    }

    /// Parameter files to try, highest priority first
    pub fn param_candidates(&self) -> Vec<PathBuf> {
        if self.params.candidates.is_empty() {
            default_candidates(&self.params.dir, &self.market.symbol)
        } else {
            self.params.candidates.clone()
        }
    }
}
