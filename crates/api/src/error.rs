//! API error envelope.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

/// Machine-readable error codes of the JSON envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrCode {
    /// Internal server error.
    E01,
    /// Request body is not valid JSON.
    E02,
    /// Invalid service API key.
    E03,
    /// Validation failed on one or more fields.
    E04,
    /// The referenced account does not exist or is not active.
    E05,
    /// Missing, invalid or revoked JWT.
    E06,
    /// The requested record does not exist.
    E07,
    /// The token is on the banned list.
    E08,
    /// The symbol is already registered in the token index.
    E09,
}

/// An error surfaced to API clients.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Unexpected internal failure; details stay in the logs.
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
    /// Malformed JSON body.
    #[error("Invalid JSON")]
    InvalidJson,
    /// Wrong service API key at login.
    #[error("Invalid API key")]
    BadKey,
    /// Field validation failure.
    #[error("Validation failed: {0}")]
    Validation(String),
    /// Unknown or inactive account.
    #[error("Account {0} does not exist or is not yet active")]
    AccountMissing(String),
    /// Missing, invalid or revoked bearer token.
    #[error("Invalid or revoked token")]
    Jwt,
    /// Unknown record.
    #[error("Not found")]
    NotFound,
    /// Transfer/swap/deposit against a banned token.
    #[error("Token {0} is not allowed")]
    BannedToken(String),
    /// Duplicate ERC20 symbol.
    #[error("Symbol {0} already exists in the token index")]
    SymbolExists(String),
}

#[derive(Serialize)]
struct ErrResponse {
    ok: bool,
    description: String,
    #[serde(rename = "errorCode")]
    error_code: ErrCode,
}

impl ApiError {
    /// The envelope error code.
    pub const fn code(&self) -> ErrCode {
        match self {
            Self::Internal(_) => ErrCode::E01,
            Self::InvalidJson => ErrCode::E02,
            Self::BadKey => ErrCode::E03,
            Self::Validation(_) => ErrCode::E04,
            Self::AccountMissing(_) => ErrCode::E05,
            Self::Jwt => ErrCode::E06,
            Self::NotFound => ErrCode::E07,
            Self::BannedToken(_) => ErrCode::E08,
            Self::SymbolExists(_) => ErrCode::E09,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidJson | Self::Validation(_) | Self::SymbolExists(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::BadKey | Self::Jwt => StatusCode::UNAUTHORIZED,
            Self::AccountMissing(_) | Self::NotFound => StatusCode::NOT_FOUND,
            Self::BannedToken(_) => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let Self::Internal(source) = self {
            tracing::error!(target: "api", "internal error: {source:#}");
        }
        HttpResponse::build(self.status_code()).json(ErrResponse {
            ok: false,
            description: self.to_string(),
            error_code: self.code(),
        })
    }
}

impl From<custodia_store::StoreError> for ApiError {
    fn from(e: custodia_store::StoreError) -> Self {
        match e {
            custodia_store::StoreError::NotFound => Self::NotFound,
            other => Self::Internal(other.into()),
        }
    }
}

impl From<custodia_queue::QueueError> for ApiError {
    fn from(e: custodia_queue::QueueError) -> Self {
        Self::Internal(e.into())
    }
}

impl From<custodia_chain::ChainError> for ApiError {
    fn from(e: custodia_chain::ChainError) -> Self {
        Self::Internal(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_statuses_line_up() {
        let cases: [(ApiError, ErrCode, StatusCode); 9] = [
            (ApiError::Internal(anyhow::anyhow!("x")), ErrCode::E01, StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::InvalidJson, ErrCode::E02, StatusCode::BAD_REQUEST),
            (ApiError::BadKey, ErrCode::E03, StatusCode::UNAUTHORIZED),
            (ApiError::Validation("f".into()), ErrCode::E04, StatusCode::BAD_REQUEST),
            (ApiError::AccountMissing("a".into()), ErrCode::E05, StatusCode::NOT_FOUND),
            (ApiError::Jwt, ErrCode::E06, StatusCode::UNAUTHORIZED),
            (ApiError::NotFound, ErrCode::E07, StatusCode::NOT_FOUND),
            (ApiError::BannedToken("t".into()), ErrCode::E08, StatusCode::FORBIDDEN),
            (ApiError::SymbolExists("s".into()), ErrCode::E09, StatusCode::BAD_REQUEST),
        ];
        for (err, code, status) in cases {
            assert_eq!(err.code(), code);
            assert_eq!(err.status_code(), status);
        }
    }

    #[test]
    fn envelope_shape() {
        let body = serde_json::to_value(ErrResponse {
            ok: false,
            description: "Invalid JSON".into(),
            error_code: ErrCode::E02,
        })
        .unwrap();
        assert_eq!(body["ok"], false);
        assert_eq!(body["errorCode"], "E02");
    }
}
