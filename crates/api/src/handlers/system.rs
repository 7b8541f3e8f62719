//! System information.

use crate::{ApiError, AppState, AuthClaims, OkResponse};
use actix_web::{web, HttpResponse};
use serde_json::json;

/// `GET /system`: reports the master signer and build.
pub(crate) async fn system_info(
    state: web::Data<AppState>,
    _claims: AuthClaims,
) -> Result<HttpResponse, ApiError> {
    let mut tx = state.store.begin().await?;
    let master = state.store.load_master_keypair(&mut tx).await?;
    tx.commit().await.map_err(custodia_store::StoreError::from)?;

    Ok(HttpResponse::Ok().json(OkResponse::new(
        "Current system information",
        json!({
            "systemSigner": master.public_address.to_checksum(None),
            "build": state.build,
        }),
    )))
}
