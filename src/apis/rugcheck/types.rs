/// RugCheck report wire types (`/v1/tokens/{mint}/report`), only the fields used here
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RugcheckReport {
    #[serde(default)]
    pub mint: Option<String>,
    #[serde(default)]
    pub token_meta: Option<RugcheckTokenMeta>,
    /// Raw risk score, higher is riskier and unbounded
    #[serde(default)]
    pub score: Option<f64>,
    /// Safety score already scaled to 0-100
    #[serde(default, rename = "score_normalised")]
    pub score_normalised: Option<f64>,
    #[serde(default)]
    pub rugged: Option<bool>,
    #[serde(default)]
    pub risks: Option<Vec<RugcheckRisk>>,
    #[serde(default)]
    pub total_holders: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RugcheckTokenMeta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RugcheckRisk {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}
