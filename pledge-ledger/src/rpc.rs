//! JSON-RPC signer gateway client
//!
//! The gateway holds the user's key and exposes four methods:
//! `ledger_chainId`, `ledger_simulate`, `ledger_submit` and `ledger_getReceipt`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::Stream;
use pledge_types::{ChainContext, ChainId, ConfirmationResult, ResolvedCall, TransactionHandle};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::{ConfirmationTracker, LedgerError, LedgerWriter, PreparedCall, Result};

/// EIP-1193 code for a request the user declined
const USER_REJECTED: i64 = 4001;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcLedgerConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for RpcLedgerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8545".to_string(),
            timeout_secs: 30,
            poll_interval_ms: 2000,
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Receipt {
    status: String,
    #[serde(default)]
    revert_reason: Option<String>,
}

pub struct RpcLedger {
    config: RpcLedgerConfig,
    http_client: reqwest::Client,
    next_id: AtomicU64,
}

impl RpcLedger {
    pub fn new(config: RpcLedgerConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LedgerError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            next_id: AtomicU64::new(1),
        })
    }

    /// Send one JSON-RPC request. The outer `Result` is transport, the inner
    /// one is the error object returned by the gateway.
    async fn request(&self, method: &str, params: Value) -> Result<std::result::Result<Value, JsonRpcError>> {
        let body = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let resp = self
            .http_client
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::Rpc(format!("{} request failed: {}", method, e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(LedgerError::Rpc(format!("{} failed ({}): {}", method, status, text)));
        }

        let reply: JsonRpcResponse = resp
            .json()
            .await
            .map_err(|e| LedgerError::Rpc(format!("Failed to parse {} response: {}", method, e)))?;

        match reply.error {
            Some(error) => Ok(Err(error)),
            None => Ok(Ok(reply.result.unwrap_or(Value::Null))),
        }
    }

    /// Chain the gateway's wallet is currently connected to
    pub async fn chain_id(&self) -> Result<ChainId> {
        let value = self
            .request("ledger_chainId", json!([]))
            .await?
            .map_err(|e| LedgerError::Rpc(e.message))?;

        let raw = value
            .as_str()
            .ok_or_else(|| LedgerError::Rpc(format!("Unexpected chain id: {}", value)))?;
        parse_chain_id(raw)
    }

    async fn simulate(&self, call: ResolvedCall, context: &ChainContext) -> Result<PreparedCall> {
        if let Some(reason) = precheck(&call, context) {
            return Ok(PreparedCall::invalid(call, reason));
        }

        let connected = self.chain_id().await?;
        if connected != context.chain {
            let reason = format!(
                "wrong network: wallet on {}, expected {}",
                connected.display_name(),
                context.chain.display_name()
            );
            return Ok(PreparedCall::invalid(call, reason));
        }

        tracing::debug!("Simulating {} on {}", call.function, call.contract);
        match self.request("ledger_simulate", call_params(&call, context)).await? {
            Ok(_) => Ok(PreparedCall::valid(call)),
            Err(e) => Ok(PreparedCall::invalid(call, e.message)),
        }
    }

    async fn submit(&self, prepared: PreparedCall, context: &ChainContext) -> Result<TransactionHandle> {
        if let Some(reason) = prepared.reason() {
            return Err(LedgerError::InvalidCall(reason.to_string()));
        }

        let call = prepared.call();
        tracing::info!("Submitting {} to {}", call.function, call.contract);

        let value = match self.request("ledger_submit", call_params(call, context)).await? {
            Ok(value) => value,
            Err(e) if e.code == USER_REJECTED => return Err(LedgerError::Rejected(e.message)),
            Err(e) => return Err(LedgerError::Submission(e.message)),
        };

        let hash = value
            .as_str()
            .ok_or_else(|| LedgerError::Submission(format!("Unexpected transaction hash: {}", value)))?;

        tracing::info!("Submitted! tx_hash: {}", hash);
        Ok(TransactionHandle {
            hash: hash.to_string(),
            chain: call.chain.clone(),
        })
    }

    async fn receipt(&self, hash: &str) -> Result<ConfirmationResult> {
        let value = self
            .request("ledger_getReceipt", json!([hash]))
            .await?
            .map_err(|e| LedgerError::Rpc(e.message))?;

        if value.is_null() {
            return Ok(ConfirmationResult::Pending);
        }

        let receipt: Receipt = serde_json::from_value(value)
            .map_err(|e| LedgerError::Rpc(format!("Failed to parse receipt: {}", e)))?;
        Ok(receipt_status(receipt))
    }
}

/// Checks that need no network round trip
fn precheck(call: &ResolvedCall, context: &ChainContext) -> Option<String> {
    if context.account.is_none() {
        return Some("no wallet account connected".to_string());
    }
    if call.chain != context.chain {
        return Some(format!(
            "wrong network: call targets {}, wallet on {}",
            call.chain.display_name(),
            context.chain.display_name()
        ));
    }
    if call.contract.is_empty() {
        return Some(format!("no contract address configured for {}", call.function));
    }
    None
}

fn call_params(call: &ResolvedCall, context: &ChainContext) -> Value {
    json!([{
        "from": context.account,
        "to": call.contract,
        "function": call.function,
        "args": call.args,
        "chainId": call.chain.to_string(),
    }])
}

fn parse_chain_id(raw: &str) -> Result<ChainId> {
    if raw.contains(':') {
        return ChainId::parse(raw).map_err(|e| LedgerError::Rpc(e.to_string()));
    }

    let id = match raw.strip_prefix("0x") {
        Some(hex_digits) => u64::from_str_radix(hex_digits, 16),
        None => raw.parse(),
    }
    .map_err(|e| LedgerError::Rpc(format!("Invalid chain id '{}': {}", raw, e)))?;

    Ok(ChainId::eip155(id))
}

fn receipt_status(receipt: Receipt) -> ConfirmationResult {
    match receipt.status.as_str() {
        "0x1" | "1" | "success" => ConfirmationResult::Success,
        _ => ConfirmationResult::Failure(
            receipt
                .revert_reason
                .unwrap_or_else(|| "transaction reverted".to_string()),
        ),
    }
}

impl LedgerWriter for RpcLedger {
    async fn prepare(
        &self,
        call: ResolvedCall,
        context: &ChainContext,
        cancel: &CancellationToken,
    ) -> Result<PreparedCall> {
        cancel
            .run_until_cancelled(self.simulate(call, context))
            .await
            .ok_or(LedgerError::Cancelled)?
    }

    async fn invoke(
        &self,
        prepared: PreparedCall,
        context: &ChainContext,
        cancel: &CancellationToken,
    ) -> Result<TransactionHandle> {
        cancel
            .run_until_cancelled(self.submit(prepared, context))
            .await
            .ok_or(LedgerError::Cancelled)?
    }
}

impl ConfirmationTracker for RpcLedger {
    fn track(
        &self,
        handle: &TransactionHandle,
        cancel: &CancellationToken,
    ) -> impl Stream<Item = ConfirmationResult> + Send {
        let interval = Duration::from_millis(self.config.poll_interval_ms);
        let hash = handle.hash.clone();
        let cancel = cancel.clone();

        // State: Some(polls so far) while the transaction is unresolved.
        futures::stream::unfold(Some(0u64), move |polls| {
            let hash = hash.clone();
            let cancel = cancel.clone();
            async move {
                let polls = polls?;
                if polls > 0 {
                    cancel.run_until_cancelled(tokio::time::sleep(interval)).await?;
                }

                let status = match cancel.run_until_cancelled(self.receipt(&hash)).await? {
                    Ok(status) => status,
                    Err(e) => {
                        tracing::debug!("Receipt poll {} for {} failed: {}", polls, hash, e);
                        ConfirmationResult::Pending
                    }
                };

                let next = if status.is_terminal() { None } else { Some(polls + 1) };
                Some((status, next))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pledge_types::{ArgValue, ContractBook};

    fn context() -> ChainContext {
        ChainContext::new(ChainId::eip155(84532), ContractBook::default()).with_account("0xme")
    }

    fn call(chain: ChainId) -> ResolvedCall {
        ResolvedCall {
            chain,
            contract: "0xgoal".to_string(),
            function: "watch".to_string(),
            args: vec![ArgValue::Uint(1)],
        }
    }

    #[test]
    fn test_precheck() {
        assert_eq!(precheck(&call(ChainId::eip155(84532)), &context()), None);

        let no_account = ChainContext::new(ChainId::eip155(84532), ContractBook::default());
        assert!(precheck(&call(ChainId::eip155(84532)), &no_account)
            .unwrap()
            .contains("no wallet account"));

        assert!(precheck(&call(ChainId::eip155(1)), &context())
            .unwrap()
            .starts_with("wrong network"));
    }

    #[test]
    fn test_parse_chain_id() {
        assert_eq!(parse_chain_id("0x14a34").unwrap(), ChainId::eip155(84532));
        assert_eq!(parse_chain_id("10").unwrap(), ChainId::eip155(10));
        assert_eq!(parse_chain_id("base:mainnet").unwrap(), ChainId::eip155(8453));
        assert!(parse_chain_id("0xzz").is_err());
    }

    #[test]
    fn test_receipt_status() {
        let ok: Receipt = serde_json::from_value(json!({ "status": "0x1" })).unwrap();
        assert!(receipt_status(ok).is_success());

        let reverted: Receipt =
            serde_json::from_value(json!({ "status": "0x0", "revertReason": "NotAuthor()" })).unwrap();
        assert_eq!(receipt_status(reverted), ConfirmationResult::Failure("NotAuthor()".to_string()));
    }

    #[test]
    fn test_call_params_shape() {
        let params = call_params(&call(ChainId::eip155(84532)), &context());
        assert_eq!(params[0]["from"], "0xme");
        assert_eq!(params[0]["chainId"], "eip155:84532");
        assert_eq!(params[0]["args"][0]["type"], "uint");
    }
}
