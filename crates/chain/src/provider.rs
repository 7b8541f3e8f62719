//! A thin JSON-RPC client over an alloy provider.

use crate::ChainError;
use alloy_primitives::{Address, Bytes, TxKind, B256, U256, U64};
use alloy_provider::{Provider, ReqwestProvider};
use alloy_rpc_types::{TransactionInput, TransactionReceipt, TransactionRequest};
use alloy_sol_types::SolCall;
use alloy_transport::{RpcError, TransportErrorKind, TransportResult};

/// Shared JSON-RPC client for dispatch, receipt sweeps and read-only
/// contract calls. Clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ChainClient {
    inner: ReqwestProvider,
    chain_id: u64,
}

impl ChainClient {
    /// Creates a client for the given RPC endpoint.
    pub fn new_http(url: reqwest::Url, chain_id: u64) -> Self {
        Self { inner: ReqwestProvider::new_http(url), chain_id }
    }

    /// The chain id transactions are signed for.
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Submits a raw transaction, returning its hash.
    ///
    /// The raw transport error is surfaced so the dispatcher can classify it.
    pub async fn send_raw_transaction(
        &self,
        raw_hex: &str,
    ) -> Result<B256, RpcError<TransportErrorKind>> {
        self.inner.raw_request("eth_sendRawTransaction".into(), [raw_hex]).await
    }

    /// Fetches the receipt for a transaction hash, if one exists yet.
    pub async fn transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<Option<TransactionReceipt>, ChainError> {
        Ok(self.inner.raw_request("eth_getTransactionReceipt".into(), [tx_hash]).await?)
    }

    /// The current node gas price, in wei.
    pub async fn gas_price(&self) -> Result<u128, ChainError> {
        let price: U256 = self.inner.raw_request("eth_gasPrice".into(), ()).await?;
        Ok(price.to::<u128>())
    }

    /// The current suggested priority fee, in wei.
    pub async fn max_priority_fee(&self) -> Result<u128, ChainError> {
        let tip: U256 = self.inner.raw_request("eth_maxPriorityFeePerGas".into(), ()).await?;
        Ok(tip.to::<u128>())
    }

    /// The gas-token balance of an account.
    pub async fn balance(&self, address: Address) -> Result<U256, ChainError> {
        Ok(self.inner.raw_request("eth_getBalance".into(), (address, "latest")).await?)
    }

    /// The network transaction count (confirmed nonce) of an account.
    pub async fn transaction_count(&self, address: Address) -> Result<u64, ChainError> {
        let count: U64 =
            self.inner.raw_request("eth_getTransactionCount".into(), (address, "latest")).await?;
        Ok(count.to::<u64>())
    }

    /// Executes a read-only contract call and decodes its return value.
    pub async fn call_function<C: SolCall>(
        &self,
        to: Address,
        call: C,
    ) -> Result<C::Return, ChainError> {
        let request = TransactionRequest {
            to: Some(TxKind::Call(to)),
            input: TransactionInput::new(call.abi_encode().into()),
            ..Default::default()
        };
        let ret: TransportResult<Bytes> =
            self.inner.raw_request("eth_call".into(), (request, "latest")).await;
        C::abi_decode_returns(&ret?, true).map_err(|e| ChainError::AbiDecode(e.to_string()))
    }
}
