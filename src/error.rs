use thiserror::Error;

/// Errors returned by [`crate::client::StockApiClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    /// The server answered with `success: false`.
    #[error("{0}")]
    Api(String),
    #[error("response reported success but carried no data")]
    MissingData,
}
