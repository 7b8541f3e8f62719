//! JSON HTTP surface of the custodial orchestrator.
//!
//! Mounted under `/api/v2` with JWT bearer auth. Handlers only validate,
//! enqueue intents and read the ledger; everything asynchronous flows
//! through the pipeline and is observed via tracking ids and the outbound
//! event stream.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

use actix_web::{web, App, HttpServer};
use custodia_chain::ChainClient;
use custodia_queue::Queue;
use custodia_store::Pg;
use custodia_workers::ContractRegistry;
use std::collections::HashSet;
use tracing::info;

mod auth;
pub use auth::{AuthClaims, AuthState, Claims};

mod error;
pub use error::{ApiError, ErrCode};

mod types;
pub use types::{ChecksumAddress, OkResponse, Pagination, DEFAULT_PAGE_SIZE};

mod handlers;

/// Everything the handlers need, shared across actix workers.
pub struct AppState {
    /// Shared persistence handle.
    pub store: Pg,
    /// Durable queue client for intent enqueueing.
    pub queue: Queue,
    /// Shared RPC client for synchronous reads.
    pub chain: ChainClient,
    /// Well-known contract addresses.
    pub registry: ContractRegistry,
    /// Token addresses refused for transfers, swaps and deposits.
    /// Matched case-sensitively against the checksummed request address.
    pub banned_tokens: HashSet<String>,
    /// JWT issue/verify state.
    pub auth: AuthState,
    /// Build identifier reported by `/system`.
    pub build: String,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").field("build", &self.build).finish_non_exhaustive()
    }
}

/// Builds and binds the HTTP server; the returned server must be awaited or
/// spawned by the caller, which can stop it through its handle.
pub fn bind_server(
    state: web::Data<AppState>,
    listen_address: &str,
) -> std::io::Result<actix_web::dev::Server> {
    info!(target: "api", %listen_address, "starting API HTTP server");
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().error_handler(|_, _| ApiError::InvalidJson.into()))
            .service(
                web::scope("/api/v2")
                    .route("/auth/login", web::post().to(handlers::auth_login))
                    .route("/auth/logout", web::post().to(handlers::auth_logout))
                    .route("/system", web::get().to(handlers::system_info))
                    .route("/account/create", web::post().to(handlers::account_create))
                    .route("/account/status/{address}", web::get().to(handlers::account_status))
                    .route("/account/otx/{address}", web::get().to(handlers::account_otx))
                    .route("/otx/track/{tracking_id}", web::get().to(handlers::track_otx))
                    .route("/token/transfer", web::post().to(handlers::token_transfer))
                    .route("/token/sweep", web::post().to(handlers::token_sweep))
                    .route("/pool/quote", web::post().to(handlers::pool_quote))
                    .route("/pool/swap", web::post().to(handlers::pool_swap))
                    .route("/pool/deposit", web::post().to(handlers::pool_deposit))
                    .route("/contracts/erc20", web::post().to(handlers::contracts_erc20))
                    .route(
                        "/contracts/erc20-demurrage",
                        web::post().to(handlers::contracts_erc20_demurrage),
                    )
                    .route("/contracts/pool", web::post().to(handlers::contracts_pool)),
            )
    })
    .bind(listen_address)?;
    Ok(server.run())
}
