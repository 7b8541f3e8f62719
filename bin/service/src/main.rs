//! Custodial transaction orchestrator service.
//!
//! One binary, four modes: `standalone` runs the worker pool, the tracker
//! event source and the HTTP API together; `worker`, `sub` and `api` run
//! exactly one of them. All cross-component coordination goes through the
//! database, the durable queue and the message bus, so any combination of
//! processes can be scaled independently.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

use crate::cli::{Cli, GasOracleKind, ServiceMode};
use actix_web::web;
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use custodia_api::{AppState, AuthState};
use custodia_chain::ChainClient;
use custodia_events::{EventPub, EventSub};
use custodia_gas::{GasOracle, RpcGasOracle, StaticGasOracle};
use custodia_queue::{Queue, Runner};
use custodia_store::Pg;
use custodia_workers::{register_workers, ContractRegistry, EnsClient, WorkerContainer};
use std::{sync::Arc, time::Duration};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};

mod cli;

/// Deadline for in-flight jobs once shutdown begins.
const DRAIN_DEADLINE: Duration = Duration::from_secs(20);

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let cfg = Cli::parse();
    init_tracing_subscriber(cfg.v)?;
    run(cfg).await?;
    info!(target: "custodiad", "exiting");
    Ok(())
}

async fn run(cfg: Cli) -> Result<()> {
    let build = env!("CARGO_PKG_VERSION");
    info!(target: "custodiad", mode = ?cfg.mode, build, "starting custodial orchestrator");

    let run_worker = matches!(cfg.mode, ServiceMode::Standalone | ServiceMode::Worker);
    let run_api = matches!(cfg.mode, ServiceMode::Standalone | ServiceMode::Api);
    let run_sub = matches!(cfg.mode, ServiceMode::Standalone | ServiceMode::Sub);

    let store = Pg::connect(&cfg.database_url, cfg.database_pool_size)
        .await
        .context("could not initialize postgres store")?;
    store.bootstrap().await.context("store bootstrap actions failed")?;

    // The queue schema migrates inside one startup transaction.
    {
        let mut tx = store.begin().await?;
        Queue::migrate(&mut tx).await.context("queue schema migration failed")?;
        tx.commit().await?;
    }
    let queue = Queue::new(store.pool().clone());

    let chain = ChainClient::new_http(
        cfg.rpc_endpoint.parse().context("malformed rpc endpoint")?,
        cfg.chain_id,
    );

    let js = custodia_events::connect(&cfg.nats_endpoint)
        .await
        .context("could not connect to nats")?;
    let publisher = EventPub::new(
        js.clone(),
        Duration::from_secs(cfg.event_retention_hours * 60 * 60),
    )
    .await
    .context("could not provision outbound stream")?;

    let gas_oracle: Arc<dyn GasOracle> = match cfg.gas_oracle {
        GasOracleKind::Static => Arc::new(StaticGasOracle::default()),
        GasOracleKind::Rpc => Arc::new(RpcGasOracle::new(chain.clone())),
    };
    if run_worker {
        gas_oracle.start().await.context("could not initialize gas oracle")?;
    }

    let registry = ContractRegistry {
        registration_proxy: cfg.registration_proxy,
        gas_faucet: cfg.gas_faucet,
        token_index: cfg.token_index,
        pool_index: cfg.pool_index,
    };
    let ens = cfg
        .ens_endpoint
        .clone()
        .map(|endpoint| EnsClient::new(endpoint, cfg.ens_api_key.clone()));

    let cancel = CancellationToken::new();
    let mut tasks: JoinSet<Result<()>> = JoinSet::new();

    if run_worker {
        let container = Arc::new(WorkerContainer {
            store: store.clone(),
            queue: queue.clone(),
            gas_oracle: gas_oracle.clone(),
            chain: chain.clone(),
            publisher: publisher.clone(),
            registry,
            ens,
        });
        let mut runner = Runner::new(queue.clone(), cfg.effective_max_workers(), DRAIN_DEADLINE);
        register_workers(&mut runner, container);
        let token = cancel.clone();
        tasks.spawn(async move {
            runner.run(token).await;
            Ok(())
        });
        info!(target: "custodiad", max_workers = cfg.effective_max_workers(), "worker pool started");
    }

    if run_sub {
        let sub = EventSub::new(&js, &cfg.nats_consumer_id, store.clone(), publisher.clone())
            .await
            .context("could not initialize tracker consumer")?;
        let token = cancel.clone();
        tasks.spawn(async move {
            sub.process(token).await?;
            Ok(())
        });
        info!(target: "custodiad", consumer_id = %cfg.nats_consumer_id, "tracker consumer started");
    }

    let api_handle = if run_api {
        let auth = build_auth_state(&cfg)?;
        let state = web::Data::new(AppState {
            store: store.clone(),
            queue: queue.clone(),
            chain: chain.clone(),
            registry,
            banned_tokens: cfg.banned_tokens.iter().cloned().collect(),
            auth,
            build: build.to_string(),
        });
        let server = custodia_api::bind_server(state, &cfg.listen_address)
            .context("could not bind API listener")?;
        let handle = server.handle();
        tasks.spawn(async move {
            server.await.context("API server terminated")?;
            Ok(())
        });
        Some(handle)
    } else {
        None
    };

    wait_for_shutdown().await;
    info!(target: "custodiad", "shutdown signal received");

    // Stop taking requests first, then drain the pipeline, then drop the
    // bus and pool on the way out.
    if let Some(handle) = api_handle {
        handle.stop(true).await;
    }
    cancel.cancel();
    gas_oracle.stop();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(target: "custodiad", "component exited with error: {e:#}"),
            Err(e) => error!(target: "custodiad", "component panicked: {e}"),
        }
    }
    Ok(())
}

fn build_auth_state(cfg: &Cli) -> Result<AuthState> {
    let private_pem = cfg
        .jwt_private_key
        .as_ref()
        .ok_or_else(|| anyhow!("api mode requires --jwt-private-key"))?;
    let public_pem = cfg
        .jwt_public_key
        .as_ref()
        .ok_or_else(|| anyhow!("api mode requires --jwt-public-key"))?;
    AuthState::new(
        cfg.api_key.clone(),
        format!("custodia-{}", env!("CARGO_PKG_VERSION")),
        &std::fs::read(private_pem).context("could not read jwt private key")?,
        &std::fs::read(public_pem).context("could not read jwt public key")?,
    )
    .context("could not load jwt signing keys")
}

async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(target: "custodiad", "failed to listen for ctrl-c: {e}");
        }
    };
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            Ok(s) => s,
            Err(e) => {
                error!(target: "custodiad", "failed to install SIGTERM handler: {e}");
                ctrl_c.await;
                return;
            }
        };
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    ctrl_c.await;
}

/// Initializes the tracing subscriber from the verbosity count.
fn init_tracing_subscriber(verbosity_level: u8) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(match verbosity_level {
            0 => Level::ERROR,
            1 => Level::WARN,
            2 => Level::INFO,
            3 => Level::DEBUG,
            _ => Level::TRACE,
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber).map_err(|e| anyhow!(e))
}
