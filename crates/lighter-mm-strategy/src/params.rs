/*
[INPUT]:  Prioritized parameter sources (JSON files with limit_orders.delta_a/delta_b)
[OUTPUT]: Cached PricingParameters or None when every source is unusable
[POS]:    Config layer - externally supplied quote offsets with refresh TTL
[UPDATE]: When the parameter file layout or source priority changes
*/

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::state::SharedState;

/// Offsets from mid used to place quotes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingParameters {
    pub delta_ask: Decimal,
    pub delta_bid: Decimal,
    pub loaded_at: Instant,
}

/// One place parameters may come from. Each read may fail independently.
pub trait ParameterSource: Send + Sync + fmt::Debug {
    fn describe(&self) -> String;

    fn read(&self) -> std::io::Result<Vec<u8>>;
}

#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ParameterSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }
}

#[derive(Debug, Deserialize)]
struct ParameterFile {
    limit_orders: LimitOrders,
}

#[derive(Debug, Deserialize)]
struct LimitOrders {
    delta_a: Decimal,
    delta_b: Decimal,
}

/// Candidate files for a symbol, highest priority first.
pub fn default_candidates(params_dir: &Path, symbol: &str) -> Vec<PathBuf> {
    let file_name = format!("avellaneda_parameters_{symbol}.json");
    vec![
        params_dir.join(&file_name),
        Path::new("params").join(&file_name),
        PathBuf::from(&file_name),
        Path::new("TRADER").join(&file_name),
    ]
}

#[derive(Debug)]
pub struct ParameterStore {
    sources: Vec<Box<dyn ParameterSource>>,
    refresh_ttl: Duration,
    state: SharedState,
}

impl ParameterStore {
    pub fn new(
        state: SharedState,
        sources: Vec<Box<dyn ParameterSource>>,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            sources,
            refresh_ttl,
            state,
        }
    }

    pub fn from_paths(state: SharedState, paths: Vec<PathBuf>, refresh_ttl: Duration) -> Self {
        let sources = paths
            .into_iter()
            .map(|path| Box::new(FileSource::new(path)) as Box<dyn ParameterSource>)
            .collect();
        Self::new(state, sources, refresh_ttl)
    }

    pub fn load(&self) -> Option<PricingParameters> {
        self.load_at(Instant::now())
    }

    /// Cached parameters while younger than the TTL, otherwise the first usable source.
    ///
    /// `None` means degraded pricing, not an error.
    pub fn load_at(&self, now: Instant) -> Option<PricingParameters> {
        if let Some(cached) = self.state.read().params
            && now.saturating_duration_since(cached.loaded_at) < self.refresh_ttl
        {
            return Some(cached);
        }

        for source in &self.sources {
            let bytes = match source.read() {
                Ok(bytes) => bytes,
                Err(err) => {
                    debug!(source = %source.describe(), error = %err, "parameter source unreadable");
                    continue;
                }
            };
            let parsed: ParameterFile = match serde_json::from_slice(&bytes) {
                Ok(parsed) => parsed,
                Err(err) => {
                    warn!(source = %source.describe(), error = %err, "invalid parameter file");
                    continue;
                }
            };
            let LimitOrders { delta_a, delta_b } = parsed.limit_orders;
            if delta_a <= Decimal::ZERO || delta_b <= Decimal::ZERO {
                warn!(
                    source = %source.describe(),
                    %delta_a,
                    %delta_b,
                    "parameter file has non-positive deltas"
                );
                continue;
            }

            let params = PricingParameters {
                delta_ask: delta_a,
                delta_bid: delta_b,
                loaded_at: now,
            };
            info!(
                source = %source.describe(),
                delta_ask = %params.delta_ask,
                delta_bid = %params.delta_bid,
                "pricing parameters loaded"
            );
            self.state.write().params = Some(params);
            return Some(params);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::shared_state;
    use std::io::{Error, ErrorKind};
    use std::str::FromStr;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).expect("valid decimal")
    }

    #[derive(Debug)]
    struct StaticSource {
        body: Option<&'static str>,
        reads: Arc<AtomicUsize>,
    }

    impl StaticSource {
        fn boxed(body: Option<&'static str>, reads: &Arc<AtomicUsize>) -> Box<dyn ParameterSource> {
            Box::new(Self {
                body,
                reads: reads.clone(),
            })
        }
    }

    impl ParameterSource for StaticSource {
        fn describe(&self) -> String {
            "static".to_string()
        }

        fn read(&self) -> std::io::Result<Vec<u8>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.body
                .map(|body| body.as_bytes().to_vec())
                .ok_or_else(|| Error::new(ErrorKind::NotFound, "missing"))
        }
    }

    #[test]
    fn skips_unreadable_malformed_and_non_positive_candidates() {
        let reads = Arc::new(AtomicUsize::new(0));
        let store = ParameterStore::new(
            shared_state(),
            vec![
                StaticSource::boxed(None, &reads),
                StaticSource::boxed(Some("{not json"), &reads),
                StaticSource::boxed(
                    Some(r#"{"limit_orders":{"delta_a":0,"delta_b":0.4}}"#),
                    &reads,
                ),
                StaticSource::boxed(
                    Some(r#"{"limit_orders":{"delta_a":0.5,"delta_b":0.25}}"#),
                    &reads,
                ),
            ],
            Duration::from_secs(900),
        );

        let params = store.load_at(Instant::now()).expect("fourth candidate wins");
        assert_eq!(params.delta_ask, dec("0.5"));
        assert_eq!(params.delta_bid, dec("0.25"));
        assert_eq!(reads.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn returns_none_when_every_candidate_fails() {
        let reads = Arc::new(AtomicUsize::new(0));
        let store = ParameterStore::new(
            shared_state(),
            vec![
                StaticSource::boxed(None, &reads),
                StaticSource::boxed(Some(r#"{"limit_orders":{"delta_a":-1,"delta_b":1}}"#), &reads),
            ],
            Duration::from_secs(900),
        );
        assert!(store.load_at(Instant::now()).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn caches_until_ttl_elapses() {
        let reads = Arc::new(AtomicUsize::new(0));
        let state = shared_state();
        let store = ParameterStore::new(
            state.clone(),
            vec![StaticSource::boxed(
                Some(r#"{"limit_orders":{"delta_a":"0.5","delta_b":"0.25"}}"#),
                &reads,
            )],
            Duration::from_secs(60),
        );

        let first = store.load().expect("loaded");
        tokio::time::advance(Duration::from_secs(59)).await;
        let cached = store.load().expect("cached");
        assert_eq!(first, cached);
        assert_eq!(reads.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        let reloaded = store.load().expect("reloaded");
        assert_eq!(reads.load(Ordering::SeqCst), 2);
        assert!(reloaded.loaded_at > first.loaded_at);
        assert_eq!(state.read().params, Some(reloaded));
    }

    #[test]
    fn reads_files_in_priority_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let low = dir.path().join("low.json");
        let high = dir.path().join("high.json");
        std::fs::write(&low, r#"{"limit_orders":{"delta_a":2.0,"delta_b":2.0}}"#).unwrap();
        std::fs::write(&high, r#"{"limit_orders":{"delta_a":1.5,"delta_b":1.0}}"#).unwrap();

        let store = ParameterStore::from_paths(
            shared_state(),
            vec![dir.path().join("missing.json"), high, low],
            Duration::from_secs(900),
        );
        let params = store.load().expect("loaded");
        assert_eq!(params.delta_ask, dec("1.5"));
        assert_eq!(params.delta_bid, dec("1.0"));
    }

    #[test]
    fn default_candidates_follow_priority() {
        let candidates = default_candidates(Path::new("/srv/params"), "PAXG");
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/srv/params/avellaneda_parameters_PAXG.json"),
                PathBuf::from("params/avellaneda_parameters_PAXG.json"),
                PathBuf::from("avellaneda_parameters_PAXG.json"),
                PathBuf::from("TRADER/avellaneda_parameters_PAXG.json"),
            ]
        );
    }
}
