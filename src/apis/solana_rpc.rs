/// Minimal Solana JSON-RPC client over the shared fetcher
///
/// Used against Helius (holder counts) and for transaction lookups from the
/// log subscription.
use crate::apis::client::{ApiCategory, ApiFetcher};
use crate::apis::errors::ApiError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ContextValue<T> {
    value: T,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAccountBalance {
    pub address: String,
    /// Raw base-unit amount
    pub amount: String,
    #[serde(default)]
    pub decimals: u8,
}

#[derive(Debug, Deserialize)]
struct TransactionResult {
    #[serde(default)]
    meta: Option<TransactionMeta>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionMeta {
    #[serde(default)]
    post_token_balances: Vec<TokenBalance>,
}

#[derive(Debug, Deserialize)]
struct TokenBalance {
    mint: String,
}

pub struct SolanaRpcClient {
    fetcher: Arc<ApiFetcher>,
    url: String,
    category: ApiCategory,
    enabled: bool,
}

impl SolanaRpcClient {
    pub fn new(fetcher: Arc<ApiFetcher>, url: String, category: ApiCategory, enabled: bool) -> Self {
        Self {
            fetcher,
            url,
            category,
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn call<T>(&self, method: &str, params: serde_json::Value) -> Result<Option<T>, ApiError>
    where
        T: DeserializeOwned,
    {
        if !self.enabled {
            return Err(ApiError::Disabled);
        }

        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response: RpcResponse<T> = self.fetcher.post_json(self.category, &self.url, &body).await?;

        if let Some(err) = response.error {
            return Err(ApiError::InvalidResponse(format!(
                "RPC {} error {}: {}",
                method, err.code, err.message
            )));
        }
        Ok(response.result)
    }

    pub async fn get_token_largest_accounts(
        &self,
        mint: &str,
    ) -> Result<Vec<TokenAccountBalance>, ApiError> {
        let result: Option<ContextValue<Vec<TokenAccountBalance>>> = self
            .call("getTokenLargestAccounts", serde_json::json!([mint]))
            .await?;
        result
            .map(|r| r.value)
            .ok_or_else(|| ApiError::InvalidResponse("Empty getTokenLargestAccounts result".to_string()))
    }

    /// Accounts with a nonzero balance among the largest token accounts
    pub async fn holder_count(&self, mint: &str) -> Result<u64, ApiError> {
        let accounts = self.get_token_largest_accounts(mint).await?;
        Ok(count_nonzero_accounts(&accounts))
    }

    /// Mints appearing in a transaction's post token balances, `None` if the
    /// transaction is not available yet
    pub async fn get_transaction_mints(&self, signature: &str) -> Result<Option<Vec<String>>, ApiError> {
        let result: Option<TransactionResult> = self
            .call(
                "getTransaction",
                serde_json::json!([
                    signature,
                    {"encoding": "jsonParsed", "maxSupportedTransactionVersion": 0, "commitment": "confirmed"}
                ]),
            )
            .await?;

        Ok(result.map(|tx| {
            let mut mints: Vec<String> = Vec::new();
            for balance in tx.meta.map(|m| m.post_token_balances).unwrap_or_default() {
                if !mints.contains(&balance.mint) {
                    mints.push(balance.mint);
                }
            }
            mints
        }))
    }
}

pub fn count_nonzero_accounts(accounts: &[TokenAccountBalance]) -> u64 {
    accounts
        .iter()
        .filter(|a| a.amount.trim().parse::<u128>().map(|v| v > 0).unwrap_or(false))
        .count() as u64
}
