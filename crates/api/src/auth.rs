//! JWT bearer authentication.
//!
//! `/auth/login` exchanges the service API key for an EdDSA-signed token;
//! `/auth/logout` revokes the presented token by its id. Every other
//! endpoint requires a live token via the [AuthClaims] extractor.

use crate::{ApiError, AppState};
use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use chrono::Utc;
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Issued token lifetime.
const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Claims carried by every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Token issuer.
    pub iss: String,
    /// Authenticated service identifier.
    pub sub: String,
    /// Token id, the revocation handle.
    pub jti: String,
    /// Marks service tokens as opposed to end-user ones.
    pub service: bool,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

/// Signing and verification state plus the revocation list.
pub struct AuthState {
    api_key: String,
    issuer: String,
    encoding: EncodingKey,
    decoding: DecodingKey,
    revoked: RwLock<HashSet<String>>,
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState").field("issuer", &self.issuer).finish_non_exhaustive()
    }
}

impl AuthState {
    /// Builds the auth state from an Ed25519 keypair in PEM form.
    pub fn new(
        api_key: String,
        issuer: String,
        private_key_pem: &[u8],
        public_key_pem: &[u8],
    ) -> Result<Self, jsonwebtoken::errors::Error> {
        Ok(Self {
            api_key,
            issuer,
            encoding: EncodingKey::from_ed_pem(private_key_pem)?,
            decoding: DecodingKey::from_ed_pem(public_key_pem)?,
            revoked: RwLock::new(HashSet::new()),
        })
    }

    /// Whether the presented service API key is the configured one.
    pub fn api_key_matches(&self, presented: &str) -> bool {
        self.api_key == presented
    }

    /// Issues a fresh token for `subject`.
    pub fn issue(&self, subject: &str) -> Result<String, ApiError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: self.issuer.clone(),
            sub: subject.to_string(),
            jti: Uuid::new_v4().to_string(),
            service: true,
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        };
        encode(&Header::new(Algorithm::EdDSA), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(e.into()))
    }

    /// Verifies a token's signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let validation = Validation::new(Algorithm::EdDSA);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| ApiError::Jwt)
    }

    /// Revokes a token id.
    pub async fn revoke(&self, jti: String) {
        self.revoked.write().await.insert(jti);
    }

    /// Whether a token id has been revoked.
    pub async fn is_revoked(&self, jti: &str) -> bool {
        self.revoked.read().await.contains(jti)
    }
}

/// Extractor enforcing a live bearer token on an endpoint.
#[derive(Debug, Clone)]
pub struct AuthClaims(pub Claims);

impl FromRequest for AuthClaims {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, ApiError>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let header = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        Box::pin(async move {
            let state = state
                .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("app state not mounted")))?;
            let token = header
                .as_deref()
                .and_then(|h| h.strip_prefix("Bearer "))
                .ok_or(ApiError::Jwt)?;
            let claims = state.auth.verify(token)?;
            if state.auth.is_revoked(&claims.jti).await {
                return Err(ApiError::Jwt);
            }
            Ok(Self(claims))
        })
    }
}
