//! Pool quote, swap and deposit.

use super::{ensure_active_account, ensure_allowed_token};
use crate::{ApiError, AppState, AuthClaims, ChecksumAddress, OkResponse};
use actix_web::{web, HttpResponse};
use custodia_chain::abi;
use custodia_primitives::parse_amount;
use custodia_queue::InsertOpts;
use custodia_workers::{kind, PoolDepositArgs, PoolSwapArgs};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuoteRequest {
    from_token_address: ChecksumAddress,
    to_token_address: ChecksumAddress,
    pool_address: ChecksumAddress,
    amount: String,
}

/// `POST /pool/quote`: synchronous swap quote; no origin transaction is
/// created.
pub(crate) async fn pool_quote(
    state: web::Data<AppState>,
    _claims: AuthClaims,
    body: web::Json<QuoteRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = body.into_inner();
    let amount = parse_amount(&req.amount).map_err(|e| ApiError::Validation(e.to_string()))?;

    let quoter = state.chain.call_function(*req.pool_address, abi::quoterCall {}).await?._0;
    let out_value = state
        .chain
        .call_function(
            quoter,
            abi::valueForCall {
                outToken: *req.to_token_address,
                inToken: *req.from_token_address,
                value: amount,
            },
        )
        .await?
        ._0;

    Ok(HttpResponse::Ok().json(OkResponse::new(
        "Pool quote",
        json!({
            "outValue": out_value.to_string(),
            "includesFeesDeduction": false,
        }),
    )))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SwapRequest {
    from: ChecksumAddress,
    from_token_address: ChecksumAddress,
    to_token_address: ChecksumAddress,
    pool_address: ChecksumAddress,
    amount: String,
}

/// `POST /pool/swap`: queues the approval dance and swap sequence.
pub(crate) async fn pool_swap(
    state: web::Data<AppState>,
    _claims: AuthClaims,
    body: web::Json<SwapRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = body.into_inner();
    let amount = parse_amount(&req.amount).map_err(|e| ApiError::Validation(e.to_string()))?;
    if amount.is_zero() {
        return Err(ApiError::Validation("amount must be greater than zero".into()));
    }
    ensure_allowed_token(&state, &req.from_token_address)?;
    ensure_allowed_token(&state, &req.to_token_address)?;

    let mut tx = state.store.begin().await?;
    ensure_active_account(&state, &mut tx, req.from).await?;

    let tracking_id = Uuid::new_v4();
    state
        .queue
        .insert_tx(
            &mut tx,
            kind::POOL_SWAP,
            &PoolSwapArgs {
                tracking_id,
                from: *req.from,
                from_token_address: *req.from_token_address,
                to_token_address: *req.to_token_address,
                pool_address: *req.pool_address,
                amount: req.amount,
            },
            InsertOpts::default(),
        )
        .await?;
    tx.commit().await.map_err(custodia_store::StoreError::from)?;

    Ok(HttpResponse::Ok().json(OkResponse::new(
        "Pool swap request successfully created",
        json!({ "trackingId": tracking_id }),
    )))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DepositRequest {
    from: ChecksumAddress,
    token_address: ChecksumAddress,
    pool_address: ChecksumAddress,
    amount: String,
}

/// `POST /pool/deposit`: queues the approval dance and deposit sequence.
pub(crate) async fn pool_deposit(
    state: web::Data<AppState>,
    _claims: AuthClaims,
    body: web::Json<DepositRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = body.into_inner();
    let amount = parse_amount(&req.amount).map_err(|e| ApiError::Validation(e.to_string()))?;
    if amount.is_zero() {
        return Err(ApiError::Validation("amount must be greater than zero".into()));
    }
    ensure_allowed_token(&state, &req.token_address)?;

    let mut tx = state.store.begin().await?;
    ensure_active_account(&state, &mut tx, req.from).await?;

    let tracking_id = Uuid::new_v4();
    state
        .queue
        .insert_tx(
            &mut tx,
            kind::POOL_DEPOSIT,
            &PoolDepositArgs {
                tracking_id,
                from: *req.from,
                token_address: *req.token_address,
                pool_address: *req.pool_address,
                amount: req.amount,
            },
            InsertOpts::default(),
        )
        .await?;
    tx.commit().await.map_err(custodia_store::StoreError::from)?;

    Ok(HttpResponse::Ok().json(OkResponse::new(
        "Pool deposit request successfully created",
        json!({ "trackingId": tracking_id }),
    )))
}
