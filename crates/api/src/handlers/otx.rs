//! Origin-transaction queries.

use crate::{ApiError, AppState, AuthClaims, ChecksumAddress, OkResponse, Pagination};
use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

/// `GET /otx/track/{trackingId}`: every origin transaction of one intent.
pub(crate) async fn track_otx(
    state: web::Data<AppState>,
    _claims: AuthClaims,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let tracking_id = path.into_inner();

    let mut tx = state.store.begin().await?;
    let otx = state.store.get_otx_by_tracking_id(&mut tx, tracking_id).await?;
    tx.commit().await.map_err(custodia_store::StoreError::from)?;

    Ok(HttpResponse::Ok()
        .json(OkResponse::new("Current OTX chain status", json!({ "otx": otx }))))
}

/// `GET /account/otx/{address}`: cursor-paginated account timeline.
pub(crate) async fn account_otx(
    state: web::Data<AppState>,
    _claims: AuthClaims,
    path: web::Path<ChecksumAddress>,
    query: web::Query<Pagination>,
) -> Result<HttpResponse, ApiError> {
    let address = path.into_inner();
    let page = query.into_inner();

    let mut tx = state.store.begin().await?;
    let otx = if page.is_first_page() {
        state.store.get_otx_by_account(&mut tx, *address, page.limit()).await?
    } else if page.next {
        state
            .store
            .get_otx_by_account_next(&mut tx, *address, page.cursor, page.limit())
            .await?
    } else {
        state
            .store
            .get_otx_by_account_previous(&mut tx, *address, page.cursor, page.limit())
            .await?
    };
    tx.commit().await.map_err(custodia_store::StoreError::from)?;

    Ok(HttpResponse::Ok()
        .json(OkResponse::new("Account origin transactions", json!({ "otx": otx }))))
}
