//! Login and logout.

use crate::{ApiError, AppState, AuthClaims, OkResponse};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginRequest {
    api_key: String,
    #[serde(default)]
    service: Option<String>,
}

/// `POST /auth/login`: exchanges the service API key for a bearer token.
pub(crate) async fn auth_login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = body.into_inner();
    if !state.auth.api_key_matches(&req.api_key) {
        return Err(ApiError::BadKey);
    }
    let subject = req.service.unwrap_or_else(|| "service".to_string());
    let token = state.auth.issue(&subject)?;
    info!(target: "api", %subject, "issued service token");
    Ok(HttpResponse::Ok()
        .json(OkResponse::new("Service token issued", json!({ "token": token }))))
}

/// `POST /auth/logout`: revokes the presented token.
pub(crate) async fn auth_logout(
    state: web::Data<AppState>,
    claims: AuthClaims,
) -> Result<HttpResponse, ApiError> {
    state.auth.revoke(claims.0.jti).await;
    Ok(HttpResponse::Ok().json(OkResponse::new("Token revoked", json!({}))))
}
