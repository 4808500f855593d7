//! HTTP JSON-RPC implementation of the chain transport.
//!
//! One JSON-RPC request per operation: `eth_call` pinned at the latest
//! block for reads, and for writes either local signing plus
//! `eth_sendRawTransaction`, or delegation to an injected external wallet.
//! The signing path is chosen once at construction, not per call.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use chain_core::{
    BlockNumber, CallPayload, ChainTransport, CodecError, ExternalSigner, TransactionId,
    TransactionPayload, TransportError,
};

use crate::signer::PrivateKey;
use crate::tx::LegacyTransaction;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// How a write gets signed and broadcast.
pub enum SubmitPath {
    /// Sign locally with the sender's key and broadcast the raw envelope.
    LocalKey(PrivateKey),
    /// Delegate signing and broadcast to an injected wallet.
    External(Arc<dyn ExternalSigner>),
}

/// JSON-RPC 2.0 transport against a single node endpoint.
pub struct RpcTransport {
    http: Client,
    url: String,
    chain_id: u64,
    submit_path: SubmitPath,
    next_id: AtomicU64,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

impl RpcTransport {
    pub fn new(
        url: impl Into<String>,
        chain_id: u64,
        submit_path: SubmitPath,
    ) -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self {
            http,
            url: url.into(),
            chain_id,
            submit_path,
            next_id: AtomicU64::new(1),
        })
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::trace!(method, id, "rpc request");

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if let Some(error) = parsed.error {
            return Err(TransportError::Rejected(format!(
                "{} (code {})",
                error.message, error.code
            )));
        }

        parsed
            .result
            .ok_or_else(|| TransportError::Network("response carries no result".to_string()))
    }

    async fn quantity(&self, method: &str, params: Value) -> Result<u64, TransportError> {
        parse_quantity(&self.request(method, params).await?)
    }
}

#[async_trait]
impl ChainTransport for RpcTransport {
    async fn call(&self, payload: &CallPayload) -> Result<Vec<u8>, TransportError> {
        let result = self
            .request(
                "eth_call",
                json!([
                    {
                        "to": payload.to.to_string(),
                        "data": format!("0x{}", hex::encode(&payload.data)),
                    },
                    "latest",
                ]),
            )
            .await?;
        parse_hex_bytes(&result)
    }

    async fn submit(&self, payload: &TransactionPayload) -> Result<TransactionId, TransportError> {
        match &self.submit_path {
            SubmitPath::LocalKey(key) => {
                if payload.from != key.address() {
                    return Err(TransportError::Rejected(format!(
                        "sender {} does not match the configured key {}",
                        payload.from,
                        key.address()
                    )));
                }

                let nonce = self
                    .quantity(
                        "eth_getTransactionCount",
                        json!([payload.from.to_string(), "pending"]),
                    )
                    .await?;
                let gas_price = self.quantity("eth_gasPrice", json!([])).await?;

                let tx = LegacyTransaction {
                    nonce,
                    gas_price: u128::from(gas_price),
                    gas_limit: payload.gas_limit,
                    to: payload.to,
                    value: 0,
                    data: payload.data.clone(),
                };
                let raw = tx
                    .sign(key, self.chain_id)
                    .map_err(|e| TransportError::SignerUnavailable(e.to_string()))?;

                let result = self
                    .request(
                        "eth_sendRawTransaction",
                        json!([format!("0x{}", hex::encode(&raw))]),
                    )
                    .await?;
                Ok(TransactionId::from_bytes(parse_hex_bytes(&result)?))
            }
            SubmitPath::External(signer) => signer.send_transaction(payload).await,
        }
    }

    async fn block_number(&self) -> Result<BlockNumber, TransportError> {
        Ok(BlockNumber(
            self.quantity("eth_blockNumber", json!([])).await?,
        ))
    }
}

fn expect_hex_str(value: &Value) -> Result<&str, TransportError> {
    let text = value.as_str().ok_or_else(|| {
        TransportError::Codec(CodecError::MalformedResponse(
            "expected a hex string result".to_string(),
        ))
    })?;
    Ok(text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text))
}

fn parse_hex_bytes(value: &Value) -> Result<Vec<u8>, TransportError> {
    let stripped = expect_hex_str(value)?;
    hex::decode(stripped).map_err(|_| {
        TransportError::Codec(CodecError::MalformedResponse(
            "result is not valid hex".to_string(),
        ))
    })
}

fn parse_quantity(value: &Value) -> Result<u64, TransportError> {
    let stripped = expect_hex_str(value)?;
    u64::from_str_radix(stripped, 16).map_err(|_| {
        TransportError::Codec(CodecError::MalformedResponse(
            "result is not a hex quantity".to_string(),
        ))
    })
}
