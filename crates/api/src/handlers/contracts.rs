//! Contract deployment intents.

use crate::{ApiError, AppState, AuthClaims, ChecksumAddress, OkResponse};
use actix_web::{web, HttpResponse};
use alloy_primitives::Address;
use custodia_chain::abi;
use custodia_primitives::parse_amount;
use custodia_queue::InsertOpts;
use custodia_workers::{
    kind, DemurrageTokenDeployArgs, PoolDeployArgs, TokenDeployArgs,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

fn validate_symbol(symbol: &str) -> Result<[u8; 32], ApiError> {
    let bytes = symbol.as_bytes();
    if bytes.is_empty() || bytes.len() > 32 || !symbol.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ApiError::Validation(format!(
            "symbol must be 1-32 uppercase ASCII characters: {symbol:?}"
        )));
    }
    let mut padded = [0u8; 32];
    padded[..bytes.len()].copy_from_slice(bytes);
    Ok(padded)
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::Validation("name must not be empty".into()));
    }
    Ok(())
}

/// Rejects a symbol that is already registered in the on-chain token index.
async fn ensure_fresh_symbol(
    state: &web::Data<AppState>,
    symbol: &str,
) -> Result<(), ApiError> {
    let padded = validate_symbol(symbol)?;
    let existing = state
        .chain
        .call_function(state.registry.token_index, abi::addressOfCall { symbol: padded.into() })
        .await?
        ._0;
    if existing != Address::ZERO {
        return Err(ApiError::SymbolExists(symbol.to_string()));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Erc20DeployRequest {
    name: String,
    symbol: String,
    decimals: u8,
    initial_supply: String,
    initial_mintee: ChecksumAddress,
    owner: ChecksumAddress,
}

/// `POST /contracts/erc20`: queues a standard ERC20 deployment.
pub(crate) async fn contracts_erc20(
    state: web::Data<AppState>,
    _claims: AuthClaims,
    body: web::Json<Erc20DeployRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = body.into_inner();
    validate_name(&req.name)?;
    parse_amount(&req.initial_supply).map_err(|e| ApiError::Validation(e.to_string()))?;
    ensure_fresh_symbol(&state, &req.symbol).await?;

    let tracking_id = Uuid::new_v4();
    state
        .queue
        .insert(
            kind::TOKEN_DEPLOY,
            &TokenDeployArgs {
                tracking_id,
                name: req.name,
                symbol: req.symbol,
                decimals: req.decimals,
                initial_supply: req.initial_supply,
                initial_mintee: *req.initial_mintee,
                owner: *req.owner,
            },
            InsertOpts::default(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(OkResponse::new(
        "ERC20 deploy request successfully created",
        json!({ "trackingId": tracking_id }),
    )))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DemurrageErc20DeployRequest {
    name: String,
    symbol: String,
    decimals: u8,
    initial_supply: String,
    initial_mintee: ChecksumAddress,
    owner: ChecksumAddress,
    sink_address: ChecksumAddress,
    demurrage_rate: String,
    demurrage_period: String,
}

/// `POST /contracts/erc20-demurrage`: queues a demurrage ERC20 deployment.
pub(crate) async fn contracts_erc20_demurrage(
    state: web::Data<AppState>,
    _claims: AuthClaims,
    body: web::Json<DemurrageErc20DeployRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = body.into_inner();
    validate_name(&req.name)?;
    parse_amount(&req.initial_supply).map_err(|e| ApiError::Validation(e.to_string()))?;
    let rate: f64 = req
        .demurrage_rate
        .parse()
        .map_err(|_| ApiError::Validation("malformed demurrage rate".into()))?;
    if !(0.0..100.0).contains(&rate) {
        return Err(ApiError::Validation("demurrage rate must be within [0, 100)".into()));
    }
    let period: u64 = req
        .demurrage_period
        .parse()
        .map_err(|_| ApiError::Validation("malformed demurrage period".into()))?;
    if period == 0 {
        return Err(ApiError::Validation("demurrage period must be at least one minute".into()));
    }
    ensure_fresh_symbol(&state, &req.symbol).await?;

    let tracking_id = Uuid::new_v4();
    state
        .queue
        .insert(
            kind::DEMURRAGE_TOKEN_DEPLOY,
            &DemurrageTokenDeployArgs {
                tracking_id,
                name: req.name,
                symbol: req.symbol,
                decimals: req.decimals,
                initial_supply: req.initial_supply,
                initial_mintee: *req.initial_mintee,
                owner: *req.owner,
                sink_address: *req.sink_address,
                demurrage_rate: req.demurrage_rate,
                demurrage_period: req.demurrage_period,
            },
            InsertOpts::default(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(OkResponse::new(
        "Demurrage ERC20 deploy request successfully created",
        json!({ "trackingId": tracking_id }),
    )))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PoolDeployRequest {
    name: String,
    symbol: String,
    decimals: u8,
    owner: ChecksumAddress,
}

/// `POST /contracts/pool`: queues a pool contract-suite deployment.
pub(crate) async fn contracts_pool(
    state: web::Data<AppState>,
    _claims: AuthClaims,
    body: web::Json<PoolDeployRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = body.into_inner();
    validate_name(&req.name)?;
    validate_symbol(&req.symbol)?;

    let tracking_id = Uuid::new_v4();
    state
        .queue
        .insert(
            kind::POOL_DEPLOY,
            &PoolDeployArgs {
                tracking_id,
                name: req.name,
                symbol: req.symbol,
                decimals: req.decimals,
                owner: *req.owner,
            },
            InsertOpts::default(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(OkResponse::new(
        "Pool deploy request successfully created",
        json!({ "trackingId": tracking_id }),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_are_validated_and_padded() {
        let padded = validate_symbol("FOO").unwrap();
        assert_eq!(&padded[..3], b"FOO");
        assert!(padded[3..].iter().all(|&b| b == 0));

        assert!(validate_symbol("").is_err());
        assert!(validate_symbol("foo").is_err());
        assert!(validate_symbol(&"A".repeat(33)).is_err());
    }
}
