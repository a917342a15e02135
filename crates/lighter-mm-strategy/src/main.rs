/*
[INPUT]:  CLI arguments, YAML configuration file, OS shutdown signals
[OUTPUT]: Running single-market maker with graceful shutdown
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use lighter_mm_adapter::{ClientConfig, LighterClient, RemoteSigner};
use lighter_mm_strategy::{Collaborators, LighterBookFeed, LighterGateway, StrategyConfig, Task};

#[derive(Parser, Debug)]
#[command(name = "lighter-mm", version, about = "Lighter single-market maker")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: PathBuf,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    /// Write logs to a daily-rotated file in this directory instead of stdout
    #[arg(long = "log-dir", value_name = "DIR")]
    log_dir: Option<PathBuf>,
    #[arg(long = "dry-run")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let _log_guard = init_tracing(&args.log_level, args.log_dir.as_deref())?;

    info!(
        config_path = %args.config_path.display(),
        dry_run = args.dry_run,
        "starting lighter-mm"
    );

    let config = StrategyConfig::from_file(&args.config_path).context("load config")?;
    config.validate().context("validate config")?;
    info!(
        symbol = %config.market.symbol,
        account_index = config.exchange.account_index,
        close_long = config.startup.close_long,
        "configuration loaded"
    );

    if args.dry_run {
        info!("dry-run requested; configuration validated");
        return Ok(());
    }

    let collaborators = build_collaborators(&config)?;
    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    let task = Task::new(config, collaborators, shutdown.clone());
    let task_id = task.id();
    info!(task_uuid = %task_id, "spawning engine");

    let result = task.spawn().await.context("join engine task")?;
    if let Err(err) = &result {
        warn!(task_uuid = %task_id, error = %format!("{err:#}"), "engine exited with error");
    }
    info!("shutdown complete");
    result
}

fn build_collaborators(config: &StrategyConfig) -> Result<Collaborators> {
    let exchange = &config.exchange;
    let client =
        LighterClient::with_config_and_base_url(ClientConfig::default(), &exchange.base_url)
            .context("create REST client")?;
    let signer = RemoteSigner::new(
        ClientConfig::default(),
        &exchange.signer_url,
        exchange.account_index,
        exchange.api_key_index,
    )
    .context("create signer client")?;
    let gateway = LighterGateway::new(
        client.clone(),
        Arc::new(signer),
        exchange.account_index,
        exchange.api_key_index,
    );

    Ok(Collaborators {
        gateway: Arc::new(gateway),
        accounts: Arc::new(client),
        market_data: Arc::new(LighterBookFeed::new(exchange.ws_url.clone())),
    })
}

fn init_tracing(log_level: &str, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "lighter-mm.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|err| anyhow!(err))
                .context("initialize tracing subscriber")?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .try_init()
                .map_err(|err| anyhow!(err))
                .context("initialize tracing subscriber")?;
            Ok(None)
        }
    }
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
