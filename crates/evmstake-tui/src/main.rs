//! evmstake - terminal UI for delegating to EVM validator staking contracts.

mod action;
mod app;
mod event;
mod log_buffer;
mod theme;
mod tui;
mod ui;

use action::Action;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use app::App;
use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use event::{Event, EventHandler};
use evmstake_chain::{
    EvmClient, HttpUnbondingSource, StakingCall, UnbondingUpdate, drive_transaction,
    fetch_snapshot, parse_private_key, spawn_unbonding_watcher,
};
use evmstake_core::config::{backup_corrupted_config, get_config_path, load_config_from, save_config};
use evmstake_core::{
    AppConfig, ConfigError, ConnectionStatus, FailureReason, Project, TxEvent, Validator,
    WalletSession,
};
use log_buffer::{LogBuffer, LogBufferLayer};
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tui::Tui;

/// Requests from the UI loop to the chain task.
#[derive(Debug)]
enum ChainRequest {
    /// Read the staking snapshot of a validator contract.
    FetchSnapshot(Address),
    /// Sign and broadcast an approved call.
    Submit(StakingCall),
}

/// Validator staking TUI for EVM chains.
#[derive(Parser, Debug)]
#[command(name = "evmstake")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Project from the config file to open
    #[arg(short, long)]
    project: Option<String>,

    /// Override the project's JSON-RPC endpoint
    #[arg(long = "rpc-url")]
    rpc_url: Option<String>,

    /// Override the indexer API serving unbonding delegations
    #[arg(long = "api-url")]
    api_url: Option<String>,

    /// Override the block explorer base URL
    #[arg(long = "explorer-url")]
    explorer_url: Option<String>,

    /// Validator contract to open; added to the project if missing
    #[arg(long)]
    validator: Option<String>,

    /// Address to follow read-only when no signer key is set
    #[arg(long)]
    watch: Option<String>,

    /// Environment variable holding the signer's hex private key
    #[arg(long = "private-key-env", default_value = "EVMSTAKE_PRIVATE_KEY")]
    private_key_env: String,

    /// UI tick interval in milliseconds
    #[arg(long = "tick-ms")]
    tick_ms: Option<u64>,

    /// Write logs to stderr instead of the log panel
    #[arg(long = "log-stderr")]
    log_stderr: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    color_eyre::install()?;

    let log_buffer = LogBuffer::new();

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("evmstake=info".parse()?)
        .add_directive("evmstake_chain=info".parse()?)
        .add_directive("evmstake_core=info".parse()?);

    if args.log_stderr {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(LogBufferLayer::new(log_buffer.clone()))
            .init();
    }

    let mut config = load_app_config();
    let mut project = resolve_project(&config, &args)?;

    if let Some(validator) = &args.validator {
        validator
            .parse::<Address>()
            .wrap_err_with(|| format!("Invalid validator address '{}'", validator))?;
        if !project
            .validators
            .iter()
            .any(|v| v.address.eq_ignore_ascii_case(validator))
        {
            project.validators.push(Validator::new(validator.clone()));
            config.add_validator(&project.name, Validator::new(validator.clone()))?;
        }
    }

    let watch_address = match args.watch.as_deref().or(config.watch_address.as_deref()) {
        Some(raw) => Some(
            raw.parse::<Address>()
                .wrap_err_with(|| format!("Invalid watch address '{}'", raw))?,
        ),
        None => None,
    };

    let signer = load_signer(&args.private_key_env)?;

    config.remember(&project.name, None);
    persist(&config);

    let tick_ms = args.tick_ms.unwrap_or(config.tick_ms);
    let theme = theme::Theme::resolve(config.theme);

    const ACTION_CHANNEL_CAPACITY: usize = 100;
    let (action_tx, mut action_rx) = mpsc::channel::<Action>(ACTION_CHANNEL_CAPACITY);

    const REQUEST_CHANNEL_CAPACITY: usize = 50;
    let (request_tx, request_rx) = mpsc::channel::<ChainRequest>(REQUEST_CHANNEL_CAPACITY);

    let cancel = CancellationToken::new();

    let mut app = App::new(project.clone(), log_buffer, theme);

    let initial_query = app.sync_unbonding().unwrap_or_else(|| app.unbonding_query());
    let (query_tx, query_rx) = watch::channel(initial_query);
    let (unbonding_tx, mut unbonding_rx) = mpsc::channel::<UnbondingUpdate>(16);
    spawn_unbonding_watcher(
        HttpUnbondingSource::new()?,
        query_rx,
        unbonding_tx,
        cancel.clone(),
    );
    let action_tx_for_unbonding = action_tx.clone();
    tokio::spawn(async move {
        while let Some(update) = unbonding_rx.recv().await {
            if action_tx_for_unbonding
                .send(Action::Unbonding(update))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    let chain_action_tx = action_tx.clone();
    let chain_cancel = cancel.clone();
    let rpc_url = project.rpc_url.clone();
    tokio::spawn(async move {
        chain_task(
            rpc_url,
            signer,
            watch_address,
            chain_action_tx,
            request_rx,
            chain_cancel,
        )
        .await;
    });

    let mut remembered = config.last_validator.clone();
    let initial = args.validator.clone().or_else(|| config.last_validator.clone());
    if let Some(address) = initial
        && let Some(action) = app.open_by_address(&address)
    {
        dispatch(&mut app, action, &request_tx).await;
    }

    let mut tui = Tui::new()?;
    tui.enter()?;
    let mut events = EventHandler::new(tick_ms, cancel.clone());

    loop {
        tui.draw(|frame| ui::render(frame, &mut app))?;

        tokio::select! {
            event = events.next() => {
                let action = match event? {
                    Event::Tick => app.tick(Instant::now()),
                    Event::Key(key) => app.handle_key(key),
                    Event::Resize(_, _) => None,
                };
                if let Some(action) = action {
                    dispatch(&mut app, action, &request_tx).await;
                }
            }
            Some(action) = action_rx.recv() => {
                dispatch(&mut app, action, &request_tx).await;
            }
        }

        if let Some(query) = app.sync_unbonding() {
            let _ = query_tx.send(query);
        }

        if let Some(validator) = app.current_validator()
            && remembered.as_deref() != Some(validator.address.as_str())
        {
            remembered = Some(validator.address.clone());
            config.remember(&project.name, remembered.as_deref());
            persist(&config);
        }

        if app.should_quit {
            break;
        }
    }

    cancel.cancel();
    tui.exit()?;

    Ok(())
}

/// Route requests to the chain task, then let the app update its state.
async fn dispatch(app: &mut App, action: Action, requests: &mpsc::Sender<ChainRequest>) {
    match &action {
        Action::Refresh => {
            if let Some(validator) = app.current_validator().and_then(|v| v.contract_address()) {
                let _ = requests.send(ChainRequest::FetchSnapshot(validator)).await;
            }
        }
        Action::Submit(call) => {
            let _ = requests.send(ChainRequest::Submit(call.clone())).await;
        }
        _ => {}
    }
    app.handle_action(action);
}

/// Load the config file, backing up and replacing a corrupted one.
fn load_app_config() -> AppConfig {
    let path = match get_config_path() {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!("No config location available: {}", e);
            return AppConfig::default();
        }
    };

    match load_config_from(&path) {
        Ok(config) => {
            tracing::info!("Loaded {} project(s) from {}", config.projects.len(), path.display());
            config
        }
        Err(ConfigError::Json(e)) => {
            tracing::warn!("Config file is corrupted: {}", e);
            match backup_corrupted_config(&path) {
                Ok(backup) => tracing::info!("Backed up corrupted config to {}", backup.display()),
                Err(e) => tracing::warn!("Failed to back up corrupted config: {}", e),
            }
            AppConfig::default()
        }
        Err(e) => {
            tracing::warn!("Failed to load config: {}", e);
            AppConfig::default()
        }
    }
}

fn persist(config: &AppConfig) {
    if let Err(e) = save_config(config) {
        tracing::warn!("Failed to save config: {}", e);
    }
}

/// Project to open, with command-line overrides applied.
fn resolve_project(config: &AppConfig, args: &Args) -> Result<Project> {
    if let Some(name) = &args.project
        && config.project(name).is_none()
    {
        return Err(eyre!("Unknown project '{}'", name));
    }

    let mut project = config
        .select_project(args.project.as_deref())
        .cloned()
        .ok_or_else(|| eyre!("No project configured"))?;

    if let Some(url) = &args.rpc_url {
        project.rpc_url = url.clone();
    }
    if let Some(url) = &args.api_url {
        project.api_url = Some(url.clone());
    }
    if let Some(url) = &args.explorer_url {
        project.explorer_url = Some(url.clone());
    }
    Ok(project)
}

/// Signer from the named environment variable, if set.
fn load_signer(var: &str) -> Result<Option<PrivateKeySigner>> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => {
            let signer = parse_private_key(&key)?;
            tracing::info!("Signing as {}", signer.address());
            Ok(Some(signer))
        }
        _ => {
            tracing::info!("{} not set, running read-only", var);
            Ok(None)
        }
    }
}

/// Background task for chain operations.
async fn chain_task(
    rpc_url: String,
    signer: Option<PrivateKeySigner>,
    watch: Option<Address>,
    action_tx: mpsc::Sender<Action>,
    mut request_rx: mpsc::Receiver<ChainRequest>,
    cancel: CancellationToken,
) {
    const STATUS_CHANNEL_CAPACITY: usize = 10;
    let (status_tx, mut status_rx) = mpsc::channel::<ConnectionStatus>(STATUS_CHANNEL_CAPACITY);

    let action_tx_for_status = action_tx.clone();
    tokio::spawn(async move {
        while let Some(status) = status_rx.recv().await {
            let _ = action_tx_for_status
                .send(Action::UpdateConnectionStatus(status))
                .await;
        }
    });

    let fallback = signer.as_ref().map(|s| s.address()).or(watch);
    let client = match EvmClient::connect(&rpc_url, signer, status_tx).await {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::error!("Failed to connect to {}: {}", rpc_url, e);
            None
        }
    };

    let session = match &client {
        Some(client) => client.session(watch),
        None => fallback
            .map(WalletSession::new)
            .unwrap_or_else(WalletSession::disconnected),
    };
    let _ = action_tx.send(Action::SetSession(session.clone())).await;

    loop {
        let request = tokio::select! {
            _ = cancel.cancelled() => break,
            request = request_rx.recv() => match request {
                Some(request) => request,
                None => break,
            },
        };

        let Some(client) = client.clone() else {
            if let ChainRequest::Submit(call) = request {
                tracing::warn!("Cannot send {}: not connected", call.action().label());
                let _ = action_tx
                    .send(Action::Tx(TxEvent::Failed(FailureReason::Other(
                        "not connected".to_string(),
                    ))))
                    .await;
            }
            continue;
        };

        let action_tx = action_tx.clone();
        match request {
            ChainRequest::FetchSnapshot(validator) => {
                let session = session.clone();
                tokio::spawn(async move {
                    let snapshot = fetch_snapshot(&client, validator, &session).await;
                    let _ = action_tx
                        .send(Action::SetSnapshot {
                            validator,
                            snapshot: Box::new(snapshot),
                        })
                        .await;
                });
            }
            ChainRequest::Submit(call) => {
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    let (event_tx, mut event_rx) = mpsc::channel::<TxEvent>(4);
                    let drive = async move {
                        drive_transaction(&client, &call, &event_tx).await;
                    };
                    let forward = async {
                        while let Some(event) = event_rx.recv().await {
                            if action_tx.send(Action::Tx(event)).await.is_err() {
                                break;
                            }
                        }
                    };
                    tokio::select! {
                        _ = cancel.cancelled() => {}
                        _ = futures::future::join(drive, forward) => {}
                    }
                });
            }
        }
    }
    tracing::debug!("Chain task stopped");
}
