//! Endpoint handlers.

use crate::{ApiError, AppState, ChecksumAddress};
use actix_web::web;
use sqlx::postgres::PgConnection;

mod account;
pub(crate) use account::{account_create, account_status};

mod auth;
pub(crate) use auth::{auth_login, auth_logout};

mod contracts;
pub(crate) use contracts::{contracts_erc20, contracts_erc20_demurrage, contracts_pool};

mod otx;
pub(crate) use otx::{account_otx, track_otx};

mod pools;
pub(crate) use pools::{pool_deposit, pool_quote, pool_swap};

mod system;
pub(crate) use system::system_info;

mod tokens;
pub(crate) use tokens::{token_sweep, token_transfer};

/// Short-circuits any movement of a banned token.
fn ensure_allowed_token(
    state: &web::Data<AppState>,
    token: &ChecksumAddress,
) -> Result<(), ApiError> {
    if state.banned_tokens.contains(&token.to_string()) {
        return Err(ApiError::BannedToken(token.to_string()));
    }
    Ok(())
}

/// Rejects intents signed by unknown or not-yet-activated accounts.
async fn ensure_active_account(
    state: &web::Data<AppState>,
    conn: &mut PgConnection,
    account: ChecksumAddress,
) -> Result<(), ApiError> {
    match state.store.check_keypair(conn, *account).await? {
        Some(true) => Ok(()),
        _ => Err(ApiError::AccountMissing(account.to_string())),
    }
}
