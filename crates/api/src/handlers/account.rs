//! Account creation and status.

use crate::{ApiError, AppState, AuthClaims, ChecksumAddress, OkResponse};
use actix_web::{web, HttpResponse};
use custodia_primitives::KeyPair;
use custodia_queue::InsertOpts;
use custodia_workers::{kind, AccountCreateArgs};
use serde_json::json;
use uuid::Uuid;

/// `POST /account/create`: generates a keypair and queues its registration.
pub(crate) async fn account_create(
    state: web::Data<AppState>,
    _claims: AuthClaims,
) -> Result<HttpResponse, ApiError> {
    let keypair = KeyPair::generate();
    let tracking_id = Uuid::new_v4();

    state
        .queue
        .insert(
            kind::ACCOUNT_CREATE,
            &AccountCreateArgs { tracking_id, keypair: keypair.clone() },
            InsertOpts::default(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(OkResponse::new(
        "Account creation request successfully created",
        json!({
            "publicKey": keypair.public_address.to_checksum(None),
            "trackingId": tracking_id,
        }),
    )))
}

/// `GET /account/status/{address}`: ledger and network view of one account.
pub(crate) async fn account_status(
    state: web::Data<AppState>,
    _claims: AuthClaims,
    path: web::Path<ChecksumAddress>,
) -> Result<HttpResponse, ApiError> {
    let address = path.into_inner();

    let (active, internal_nonce) = {
        let mut tx = state.store.begin().await?;
        let active = state
            .store
            .check_keypair(&mut tx, *address)
            .await?
            .ok_or_else(|| ApiError::AccountMissing(address.to_string()))?;
        let internal_nonce = state.store.peek_nonce(&mut tx, *address).await?;
        tx.commit().await.map_err(custodia_store::StoreError::from)?;
        (active, internal_nonce)
    };

    let gas_balance = state.chain.balance(*address).await?;
    let network_nonce = state.chain.transaction_count(*address).await?;

    Ok(HttpResponse::Ok().json(OkResponse::new(
        "Current account status",
        json!({
            "gasBalance": gas_balance.to_string(),
            "networkNonce": network_nonce,
            "internalNonce": internal_nonce,
            "active": active,
        }),
    )))
}
