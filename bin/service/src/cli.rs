//! This module contains all CLI-specific code for the service binary.

use alloy_primitives::Address;
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

/// Which components this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServiceMode {
    /// Worker pool, event source and API in one process.
    Standalone,
    /// Worker pool only.
    Worker,
    /// HTTP API only.
    Api,
    /// Tracker event source only.
    Sub,
}

/// Gas oracle selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GasOracleKind {
    /// Fixed settings tuple.
    Static,
    /// Node-tracking oracle with periodic refresh.
    Rpc,
}

/// The service binary CLI application arguments.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Verbosity level (0-4)
    #[arg(long, short, help = "Verbosity level (0-4)", action = ArgAction::Count)]
    pub v: u8,
    /// Which components this process runs.
    #[clap(long, env = "SERVICE_MODE", value_enum, default_value = "standalone")]
    pub mode: ServiceMode,
    /// Postgres connection string.
    #[clap(long, env = "DATABASE_URL")]
    pub database_url: String,
    /// Connection pool size.
    #[clap(long, env = "DATABASE_POOL_SIZE", default_value = "10")]
    pub database_pool_size: u32,
    /// Address of the EVM JSON-RPC endpoint.
    #[clap(long, env = "RPC_ENDPOINT")]
    pub rpc_endpoint: String,
    /// Chain id transactions are signed for.
    #[clap(long, env = "CHAIN_ID")]
    pub chain_id: u64,
    /// NATS endpoint carrying the tracker and custodial streams.
    #[clap(long, env = "NATS_ENDPOINT", default_value = "nats://127.0.0.1:4222")]
    pub nats_endpoint: String,
    /// Durable consumer id on the tracker stream.
    #[clap(long, env = "NATS_CONSUMER_ID", default_value = "custodia")]
    pub nats_consumer_id: String,
    /// Retention of the outbound event stream, in hours.
    #[clap(long, env = "EVENT_RETENTION_HOURS", default_value = "48")]
    pub event_retention_hours: u64,
    /// Gas oracle variant.
    #[clap(long, env = "GAS_ORACLE", value_enum, default_value = "rpc")]
    pub gas_oracle: GasOracleKind,
    /// Queue concurrency; 0 means twice the CPU count.
    #[clap(long, env = "MAX_WORKERS", default_value = "0")]
    pub max_workers: usize,
    /// API listen address.
    #[clap(long, env = "LISTEN_ADDRESS", default_value = "127.0.0.1:5000")]
    pub listen_address: String,
    /// Service API key exchanged for JWTs at /auth/login.
    #[clap(long, env = "API_KEY", default_value = "")]
    pub api_key: String,
    /// Path to the Ed25519 private key PEM signing JWTs.
    #[clap(long, env = "JWT_PRIVATE_KEY")]
    pub jwt_private_key: Option<PathBuf>,
    /// Path to the Ed25519 public key PEM verifying JWTs.
    #[clap(long, env = "JWT_PUBLIC_KEY")]
    pub jwt_public_key: Option<PathBuf>,
    /// Custodial registration proxy contract.
    #[clap(long, env = "REGISTRATION_PROXY")]
    pub registration_proxy: Address,
    /// Gas faucet contract.
    #[clap(long, env = "GAS_FAUCET")]
    pub gas_faucet: Address,
    /// Global token index contract.
    #[clap(long, env = "TOKEN_INDEX")]
    pub token_index: Address,
    /// Global pool index contract.
    #[clap(long, env = "POOL_INDEX")]
    pub pool_index: Address,
    /// Token addresses refused for transfers, swaps and deposits.
    /// Matched case-sensitively; supply the checksummed form.
    #[clap(long, env = "BANNED_TOKENS", value_delimiter = ',', num_args = 0..)]
    pub banned_tokens: Vec<String>,
    /// ENS registration service endpoint; naming is skipped when unset.
    #[clap(long, env = "ENS_ENDPOINT")]
    pub ens_endpoint: Option<String>,
    /// ENS registration service API key.
    #[clap(long, env = "ENS_API_KEY", default_value = "")]
    pub ens_api_key: String,
}

impl Cli {
    /// Effective queue concurrency.
    pub fn effective_max_workers(&self) -> usize {
        if self.max_workers == 0 {
            std::thread::available_parallelism().map(|n| n.get() * 2).unwrap_or(4)
        } else {
            self.max_workers
        }
    }
}
