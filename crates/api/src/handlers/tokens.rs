//! Token transfer and sweep intents.

use super::{ensure_active_account, ensure_allowed_token};
use crate::{ApiError, AppState, AuthClaims, ChecksumAddress, OkResponse};
use actix_web::{web, HttpResponse};
use custodia_primitives::parse_amount;
use custodia_queue::InsertOpts;
use custodia_workers::{kind, TokenSweepArgs, TokenTransferArgs};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransferRequest {
    from: ChecksumAddress,
    to: ChecksumAddress,
    token_address: ChecksumAddress,
    amount: String,
}

/// `POST /token/transfer`: queues an ERC20 transfer intent.
pub(crate) async fn token_transfer(
    state: web::Data<AppState>,
    _claims: AuthClaims,
    body: web::Json<TransferRequest>,
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
            kind::TOKEN_TRANSFER,
            &TokenTransferArgs {
                tracking_id,
                from: *req.from,
                to: *req.to,
                token_address: *req.token_address,
                amount: req.amount,
            },
            InsertOpts::default(),
        )
        .await?;
    tx.commit().await.map_err(custodia_store::StoreError::from)?;

    Ok(HttpResponse::Ok().json(OkResponse::new(
        "Transfer request successfully created",
        json!({ "trackingId": tracking_id }),
    )))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SweepRequest {
    from: ChecksumAddress,
    to: ChecksumAddress,
    token_address: ChecksumAddress,
}

/// `POST /token/sweep`: queues a full-balance sweep intent.
pub(crate) async fn token_sweep(
    state: web::Data<AppState>,
    _claims: AuthClaims,
    body: web::Json<SweepRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = body.into_inner();
    ensure_allowed_token(&state, &req.token_address)?;

    let mut tx = state.store.begin().await?;
    ensure_active_account(&state, &mut tx, req.from).await?;

    let tracking_id = Uuid::new_v4();
    state
        .queue
        .insert_tx(
            &mut tx,
            kind::TOKEN_SWEEP,
            &TokenSweepArgs {
                tracking_id,
                from: *req.from,
                to: *req.to,
                token_address: *req.token_address,
            },
            InsertOpts::default(),
        )
        .await?;
    tx.commit().await.map_err(custodia_store::StoreError::from)?;

    Ok(HttpResponse::Ok().json(OkResponse::new(
        "Sweep request successfully created",
        json!({ "trackingId": tracking_id }),
    )))
}
