use thiserror::Error;

/// Failure of a single external API call
///
/// Enrichment treats every variant as "no data from this source".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Not found")]
    NotFound,
    #[error("Request timeout")]
    Timeout,
    #[error("API disabled")]
    Disabled,
}

impl From<ApiError> for String {
    fn from(err: ApiError) -> String {
        err.to_string()
    }
}
