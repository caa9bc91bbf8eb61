/// Jupiter wire types
use serde::Deserialize;

/// One entry of `token.jup.ag/all`
#[derive(Debug, Clone, Deserialize)]
pub struct JupiterListToken {
    pub address: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub decimals: u8,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// `/v6/quote` response, amounts are base-unit integers encoded as strings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub input_mint: String,
    pub in_amount: String,
    pub output_mint: String,
    pub out_amount: String,
    #[serde(default)]
    pub price_impact_pct: Option<String>,
    #[serde(default)]
    pub route_plan: Vec<serde_json::Value>,
}
