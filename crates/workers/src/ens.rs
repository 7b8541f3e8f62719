//! Best-effort ENS registration client.
//!
//! Registration runs after the accepting database transaction has committed
//! and never feeds back into the pipeline; a failure is logged and dropped.

use alloy_primitives::Address;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REGISTER_API_PATH: &str = "/api/v1/internal/register";

/// Suffix appended to every registered name.
pub const ENS_NAME_SUFFIX: &str = ".sarafu.eth";

#[derive(Debug, Serialize)]
struct RegisterInput {
    address: String,
    hint: String,
}

/// The name assignment reported by the ENS service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsRegisterResult {
    /// Registered address.
    pub address: String,
    /// Whether the service auto-picked a free name.
    #[serde(default)]
    pub auto_choose: bool,
    /// The assigned name.
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct RegisterResponse {
    ok: bool,
    #[serde(default)]
    description: String,
    result: Option<EnsRegisterResult>,
}

/// HTTP client for the internal ENS registration service.
#[derive(Debug, Clone)]
pub struct EnsClient {
    api_key: String,
    endpoint: String,
    http: reqwest::Client,
}

impl EnsClient {
    /// Creates a client for the given service endpoint.
    pub fn new(endpoint: String, api_key: String) -> Self {
        Self {
            api_key,
            endpoint,
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Registers a name hint for `address`.
    pub async fn register(&self, address: Address, hint: &str) -> Result<EnsRegisterResult> {
        let url = format!("{}{REGISTER_API_PATH}", self.endpoint);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&RegisterInput {
                address: address.to_checksum(None),
                hint: hint.to_string(),
            })
            .send()
            .await?;

        let status = resp.status();
        if status.is_client_error() || status.is_server_error() {
            bail!("ens server error: code={status} body={}", resp.text().await.unwrap_or_default());
        }

        let body: RegisterResponse = resp.json().await?;
        if !body.ok {
            bail!("ens registration rejected: {}", body.description);
        }
        body.result.ok_or_else(|| anyhow::anyhow!("ens response missing result"))
    }
}
